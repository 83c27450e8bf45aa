//! 축 방향 0 패딩

use ndarray::{concatenate, ArrayD, Axis, IxDyn};

use crate::core::error::{OptimError, Result};

/// `axis` 끝에 0을 덧붙여 길이를 `target` 으로 늘린다.
///
/// 기존 원소는 원래 오프셋을 유지한다. 이미 `target` 이상이면 복사본을 그대로 돌려준다.
pub fn pad_axis_with_zeros(tensor: &ArrayD<f32>, axis: usize, target: usize) -> Result<ArrayD<f32>> {
    if axis >= tensor.ndim() {
        return Err(OptimError::InvalidGradientShape {
            shape: tensor.shape().to_vec(),
        });
    }

    let current = tensor.len_of(Axis(axis));
    if target <= current {
        return Ok(tensor.clone());
    }

    let mut pad_shape = tensor.shape().to_vec();
    pad_shape[axis] = target - current;
    let zeros = ArrayD::<f32>::zeros(IxDyn(&pad_shape));

    concatenate(Axis(axis), &[tensor.view(), zeros.view()]).map_err(|_| {
        OptimError::ShapeMismatch {
            expected: pad_shape,
            actual: tensor.shape().to_vec(),
        }
    })
}
