//! 저차원 그래디언트 프로젝션 (GaLore)

pub mod projector;
pub mod svd_projector;

// 테스트 모듈
#[cfg(test)]
mod __tests__;

pub use projector::{GradientProjector, ProjectionSide, ProjectionType};
pub use svd_projector::{orthogonal_basis, OrthogonalBasis, SvdProjector};
