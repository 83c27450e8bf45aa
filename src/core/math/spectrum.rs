//! 특이값 스펙트럼과 설명 비율
//!
//! 그래디언트 행렬의 특이값을 f64 정밀도로 계산하고, 앞쪽 k개 특이값이
//! 전체 스펙트럼 분산을 얼마나 설명하는지 측정한다.
//!
//! ```text
//! ratio(k) = 1 - var(s - s_k) / var(s)
//! s_k : 인덱스 k 이후를 0으로 만든 s
//! var : 표본 분산 (n - 1)
//! ```

use std::cmp::Ordering;

use nalgebra::DMatrix;
use ndarray::ArrayView2;

use crate::core::error::{OptimError, Result};

/// SVD 반복 상한 (0이면 nalgebra 가 무한 반복함)
pub const SVD_MAX_ITERATIONS: usize = 10_000;

/// f32 뷰를 f64 nalgebra 행렬로 업캐스트
pub fn to_f64_matrix(view: ArrayView2<f32>) -> DMatrix<f64> {
    DMatrix::from_fn(view.nrows(), view.ncols(), |i, j| view[[i, j]] as f64)
}

/// 내림차순 특이값
pub fn singular_values(view: ArrayView2<f32>) -> Result<Vec<f64>> {
    let (rows, cols) = view.dim();
    let svd = to_f64_matrix(view)
        .try_svd(false, false, f64::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or(OptimError::DecompositionFailed { rows, cols })?;

    let mut values: Vec<f64> = svd.singular_values.iter().copied().collect();
    values.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    Ok(values)
}

/// 표본 분산 (n - 1 로 나눔). 원소가 2개 미만이면 0.
pub fn unbiased_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    sum_sq / (n - 1) as f64
}

/// 앞쪽 `k` 개 특이값의 설명 비율
///
/// 전체 분산이 0인 퇴화 스펙트럼에서는 버려지는 꼬리의 분산이 0이면 1.0,
/// 아니면 0.0 을 돌려준다.
pub fn explained_ratio(k: usize, singular_values: &[f64]) -> f64 {
    if k >= singular_values.len() {
        return 1.0;
    }

    let tail: Vec<f64> = singular_values
        .iter()
        .enumerate()
        .map(|(i, &s)| if i < k { 0.0 } else { s })
        .collect();

    let total = unbiased_variance(singular_values);
    let residual = unbiased_variance(&tail);

    if total == 0.0 {
        return if residual == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - residual / total
}
