//! # GaLore InRank 핵심 모듈
//!
//! 저차원 그래디언트 프로젝션과 온라인 rank 성장을 결합한 AdamW 옵티마이저의 구성 요소들

pub mod error;
pub mod tensors;
pub mod math;
pub mod projection;
pub mod optimizers;

// 주요 타입들 재수출
pub use error::{OptimError, Result};
pub use tensors::*;
pub use projection::*;
pub use optimizers::*;
