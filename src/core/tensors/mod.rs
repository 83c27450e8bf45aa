//! 텐서 모듈 - 파라미터, 그래디언트, 패딩 유틸리티

pub mod param_types;
pub mod gradient_types;
pub mod padding;


pub use param_types::{ParamId, Parameter};
pub use gradient_types::{Gradient, SparseGradient};
pub use padding::pad_axis_with_zeros;
