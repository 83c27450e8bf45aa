//! SVD 기반 GaLore 프로젝터
//!
//! 그래디언트 G 를 SVD 로 분해해 상위 r 개 특이벡터로 직교 기저를 만든다.
//!
//! ```text
//! 오른쪽: B = Vᵀ[:r, :]   project: G · Bᵀ   project_back: L · B
//! 왼쪽  : A = U[:, :r]    project: Aᵀ · G   project_back: A · L
//! ```
//!
//! 기저는 `update_proj_gap` 스텝마다 다시 계산하고, 그 사이에는 이전 기저를 재사용한다.

use std::cmp::Ordering;

use ndarray::{Array2, ArrayView2};

use super::projector::{GradientProjector, ProjectionSide, ProjectionType};
use crate::core::error::{OptimError, Result};
use crate::core::math::spectrum::{to_f64_matrix, SVD_MAX_ITERATIONS};
use crate::core::optimizers::config::ProjectionConfig;

/// 직교 기저
#[derive(Debug, Clone)]
pub enum OrthogonalBasis {
    /// U 의 상위 r 열 (m x r)
    Left(Array2<f32>),
    /// Vᵀ 의 상위 r 행 (r x n)
    Right(Array2<f32>),
}

impl OrthogonalBasis {
    pub fn side(&self) -> ProjectionSide {
        match self {
            OrthogonalBasis::Left(_) => ProjectionSide::Left,
            OrthogonalBasis::Right(_) => ProjectionSide::Right,
        }
    }

    /// 실제로 유지된 방향 수
    pub fn rank(&self) -> usize {
        match self {
            OrthogonalBasis::Left(a) => a.ncols(),
            OrthogonalBasis::Right(b) => b.nrows(),
        }
    }
}

/// GaLore 프로젝터
#[derive(Debug, Clone)]
pub struct SvdProjector {
    rank: usize,
    update_proj_gap: u64,
    scale: f32,
    proj_type: ProjectionType,
    basis: Option<OrthogonalBasis>,
}

impl SvdProjector {
    pub fn basis(&self) -> Option<&OrthogonalBasis> {
        self.basis.as_ref()
    }

    pub fn proj_type(&self) -> ProjectionType {
        self.proj_type
    }

    fn needs_refresh(&self, step: u64, side: ProjectionSide) -> bool {
        match &self.basis {
            None => true,
            Some(basis) => basis.side() != side || step % self.update_proj_gap == 0,
        }
    }
}

/// 그래디언트의 상위 `rank` 개 특이벡터로 직교 기저 생성 (f64 로 분해)
pub fn orthogonal_basis(grad: ArrayView2<f32>, rank: usize, side: ProjectionSide) -> Result<OrthogonalBasis> {
    let (rows, cols) = grad.dim();
    let want_u = side == ProjectionSide::Left;
    let svd = to_f64_matrix(grad)
        .try_svd(want_u, !want_u, f64::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or(OptimError::DecompositionFailed { rows, cols })?;

    // 특이값 내림차순 인덱스
    let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&a, &b| {
        svd.singular_values[b]
            .partial_cmp(&svd.singular_values[a])
            .unwrap_or(Ordering::Equal)
    });
    let r = rank.min(order.len());

    match side {
        ProjectionSide::Left => {
            let u = svd.u.as_ref().ok_or(OptimError::DecompositionFailed { rows, cols })?;
            let a = Array2::from_shape_fn((rows, r), |(i, j)| u[(i, order[j])] as f32);
            Ok(OrthogonalBasis::Left(a))
        }
        ProjectionSide::Right => {
            let v_t = svd.v_t.as_ref().ok_or(OptimError::DecompositionFailed { rows, cols })?;
            let b = Array2::from_shape_fn((r, cols), |(j, c)| v_t[(order[j], c)] as f32);
            Ok(OrthogonalBasis::Right(b))
        }
    }
}

impl GradientProjector for SvdProjector {
    fn new(rank: usize, config: &ProjectionConfig) -> Self {
        Self {
            rank,
            update_proj_gap: config.update_proj_gap.max(1),
            scale: config.scale,
            proj_type: config.proj_type,
            basis: None,
        }
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn project(&mut self, grad: ArrayView2<f32>, step: u64) -> Result<Array2<f32>> {
        let (rows, cols) = grad.dim();
        let side = self.proj_type.side_for(rows, cols);
        if self.needs_refresh(step, side) {
            self.basis = Some(orthogonal_basis(grad, self.rank, side)?);
        }

        match self.basis.as_ref().ok_or(OptimError::ProjectorNotReady)? {
            OrthogonalBasis::Right(b) => {
                if b.ncols() != cols {
                    return Err(OptimError::ShapeMismatch {
                        expected: vec![rows, b.ncols()],
                        actual: vec![rows, cols],
                    });
                }
                Ok(grad.dot(&b.t()))
            }
            OrthogonalBasis::Left(a) => {
                if a.nrows() != rows {
                    return Err(OptimError::ShapeMismatch {
                        expected: vec![a.nrows(), cols],
                        actual: vec![rows, cols],
                    });
                }
                Ok(a.t().dot(&grad))
            }
        }
    }

    fn project_back(&self, low_rank: ArrayView2<f32>) -> Result<Array2<f32>> {
        let (rows, cols) = low_rank.dim();
        let full = match self.basis.as_ref().ok_or(OptimError::ProjectorNotReady)? {
            OrthogonalBasis::Right(b) => {
                if cols != b.nrows() {
                    return Err(OptimError::ShapeMismatch {
                        expected: vec![rows, b.nrows()],
                        actual: vec![rows, cols],
                    });
                }
                low_rank.dot(b)
            }
            OrthogonalBasis::Left(a) => {
                if rows != a.ncols() {
                    return Err(OptimError::ShapeMismatch {
                        expected: vec![a.ncols(), cols],
                        actual: vec![rows, cols],
                    });
                }
                a.dot(&low_rank)
            }
        };
        Ok(full * self.scale)
    }
}
