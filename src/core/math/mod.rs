pub mod spectrum;

// 테스트 모듈
#[cfg(test)]
mod __tests__;

// 재수출
pub use spectrum::{explained_ratio, singular_values, to_f64_matrix, unbiased_variance};
