mod spectrum_test;
