mod svd_projector_test;
