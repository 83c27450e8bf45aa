//! InRank rank 추정기
//!
//! 그래디언트 앞쪽 `rank + buffer` 행의 특이값 스펙트럼을 계산하고,
//! 설명 비율이 임계값에 도달할 때까지 rank 를 1씩 늘린다.
//! rank 는 절대 줄어들지 않는다.

use ndarray::{s, ArrayViewD, Ix2};

use crate::core::error::{OptimError, Result};
use crate::core::math::spectrum::{explained_ratio, singular_values};

/// rank 추정 결과
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankEstimate {
    pub rank: usize,
    /// 선택된 rank 에서 실제로 달성한 설명 비율
    pub explained_ratio: f64,
}

/// 현재 rank 에서 시작해 설명 비율이 `threshold` 이상이 되는 가장 작은 rank 를 찾는다.
///
/// 그래디언트 행이 `current_rank + buffer_margin` 보다 적으면 가능한 행까지만 사용한다.
/// `current_rank` 가 특이값 개수를 넘으면 아무것도 버리지 않으므로 그대로 유지된다.
pub fn estimate_rank(
    gradient: ArrayViewD<f32>,
    current_rank: usize,
    buffer_margin: usize,
    threshold: f32,
) -> Result<RankEstimate> {
    let shape = gradient.shape().to_vec();
    let matrix = gradient
        .into_dimensionality::<Ix2>()
        .map_err(|_| OptimError::InvalidGradientShape { shape: shape.clone() })?;

    let (rows, cols) = matrix.dim();
    if rows == 0 || cols == 0 {
        return Err(OptimError::InvalidGradientShape { shape });
    }
    if current_rank == 0 {
        return Err(OptimError::Configuration(
            "Rank estimation requires a current rank >= 1".to_string(),
        ));
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(OptimError::NonFiniteGradient { shape });
    }

    let leading_rows = current_rank.saturating_add(buffer_margin).min(rows);
    let spectrum = singular_values(matrix.slice(s![..leading_rows, ..]))?;
    let available = spectrum.len();
    let threshold = threshold as f64;

    let mut best_ratio = f64::NEG_INFINITY;
    let mut candidate = current_rank;
    loop {
        let ratio = explained_ratio(candidate, &spectrum);
        if ratio >= threshold {
            return Ok(RankEstimate {
                rank: candidate,
                explained_ratio: ratio,
            });
        }
        if ratio > best_ratio {
            best_ratio = ratio;
        }
        if candidate >= available {
            break;
        }
        candidate += 1;
    }

    Err(OptimError::RankGrowthNonConvergence {
        start_rank: current_rank,
        available,
        best_ratio,
        threshold,
    })
}

/// 프로젝션 그룹 내 위치별 rank 와 설명 비율
#[derive(Debug, Clone, PartialEq)]
pub struct RankTable {
    ranks: Vec<usize>,
    explained_ratios: Vec<f64>,
}

impl RankTable {
    /// 위치별 시작 rank 로 생성
    pub fn from_ranks(ranks: Vec<usize>) -> Self {
        let explained_ratios = vec![0.0; ranks.len()];
        Self {
            ranks,
            explained_ratios,
        }
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    pub fn rank(&self, index: usize) -> Option<usize> {
        self.ranks.get(index).copied()
    }

    pub fn explained_ratio(&self, index: usize) -> Option<f64> {
        self.explained_ratios.get(index).copied()
    }

    pub fn ranks(&self) -> &[usize] {
        &self.ranks
    }

    pub fn explained_ratios(&self) -> &[f64] {
        &self.explained_ratios
    }

    /// 추정 결과 기록. rank 가 커졌으면 true.
    ///
    /// 더 작은 rank 는 무시한다 (단조 증가).
    pub fn record(&mut self, index: usize, estimate: &RankEstimate) -> bool {
        let (Some(rank), Some(ratio)) = (self.ranks.get_mut(index), self.explained_ratios.get_mut(index)) else {
            return false;
        };
        *ratio = estimate.explained_ratio;
        if estimate.rank > *rank {
            *rank = estimate.rank;
            true
        } else {
            false
        }
    }
}
