//! 1차/2차 모멘트 버퍼 관리
//!
//! 파라미터별 상태 머신: `Uninitialized` → (첫 스텝) → `Tracking`.
//! rank 가 커지면 버퍼를 다시 만들지 않고 rank 축 끝에 0을 덧붙여
//! 누적된 통계를 보존한다. 버퍼는 절대 줄어들지 않는다.

use ndarray::{ArrayD, Axis, IxDyn};

use crate::core::error::{OptimError, Result};
use crate::core::tensors::pad_axis_with_zeros;

/// 파라미터별 모멘트 상태
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MomentState {
    /// 아직 한 번도 업데이트되지 않음
    #[default]
    Uninitialized,
    /// 지수 이동 평균 추적 중
    Tracking {
        /// 그래디언트의 지수 이동 평균 (m)
        exp_avg: ArrayD<f32>,
        /// 그래디언트 제곱의 지수 이동 평균 (v)
        exp_avg_sq: ArrayD<f32>,
    },
}

/// 2차원 버퍼에서 rank 축: 더 짧은 축 (같으면 1)
pub fn rank_axis(rows: usize, cols: usize) -> usize {
    if rows < cols {
        0
    } else {
        1
    }
}

impl MomentState {
    pub fn is_tracking(&self) -> bool {
        matches!(self, MomentState::Tracking { .. })
    }

    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            MomentState::Uninitialized => None,
            MomentState::Tracking { exp_avg, .. } => Some(exp_avg.shape()),
        }
    }

    pub fn exp_avg(&self) -> Option<&ArrayD<f32>> {
        match self {
            MomentState::Uninitialized => None,
            MomentState::Tracking { exp_avg, .. } => Some(exp_avg),
        }
    }

    pub fn exp_avg_sq(&self) -> Option<&ArrayD<f32>> {
        match self {
            MomentState::Uninitialized => None,
            MomentState::Tracking { exp_avg_sq, .. } => Some(exp_avg_sq),
        }
    }

    /// 버퍼를 그래디언트 형태와 rank 에 맞춘다.
    ///
    /// - `Uninitialized`: `grad_shape` 형태의 0 버퍼 할당
    /// - `Tracking` + `Some(rank)`: rank 축이 `rank` 보다 짧으면 0 패딩
    /// - `Tracking` + `None`: 변경 없음 (프로젝션 없는 파라미터)
    pub fn reconcile(&mut self, grad_shape: &[usize], rank: Option<usize>) -> Result<()> {
        match self {
            MomentState::Uninitialized => {
                *self = MomentState::Tracking {
                    exp_avg: ArrayD::zeros(IxDyn(grad_shape)),
                    exp_avg_sq: ArrayD::zeros(IxDyn(grad_shape)),
                };
                Ok(())
            }
            MomentState::Tracking { exp_avg, exp_avg_sq } => {
                let Some(rank) = rank else {
                    return Ok(());
                };
                if exp_avg.ndim() != 2 {
                    return Err(OptimError::InvalidGradientShape {
                        shape: exp_avg.shape().to_vec(),
                    });
                }

                let axis = rank_axis(exp_avg.shape()[0], exp_avg.shape()[1]);
                if rank > exp_avg.len_of(Axis(axis)) {
                    let padded_avg = pad_axis_with_zeros(exp_avg, axis, rank)?;
                    let padded_avg_sq = pad_axis_with_zeros(exp_avg_sq, axis, rank)?;
                    log::debug!(
                        "moment buffers padded along axis {}: {:?} -> {:?}",
                        axis,
                        exp_avg.shape(),
                        padded_avg.shape()
                    );
                    *exp_avg = padded_avg;
                    *exp_avg_sq = padded_avg_sq;
                }
                Ok(())
            }
        }
    }
}
