//! 파라미터 핸들과 파라미터 텐서

use std::fmt;

use ndarray::ArrayD;

use super::gradient_types::Gradient;

/// 옵티마이저 안에서 파라미터를 가리키는 안정적인 핸들
///
/// (그룹 인덱스, 그룹 내 위치) 쌍이며, 옵티마이저 수명 동안 바뀌지 않는다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId {
    pub group: usize,
    pub index: usize,
}

impl ParamId {
    pub fn new(group: usize, index: usize) -> Self {
        Self { group, index }
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group{}/param{}", self.group, self.index)
    }
}

/// 학습 가능한 파라미터
///
/// 값과, 상위 단계(역전파)가 채워 넣는 그래디언트를 함께 보관한다.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub value: ArrayD<f32>,
    pub grad: Option<Gradient>,
}

impl Parameter {
    pub fn new(value: ArrayD<f32>) -> Self {
        Self { value, grad: None }
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    pub fn set_grad(&mut self, grad: Gradient) {
        self.grad = Some(grad);
    }

    /// 그래디언트 제거 (다음 스텝에서 건너뜀)
    pub fn zero_grad(&mut self) {
        self.grad = None;
    }
}

impl From<ArrayD<f32>> for Parameter {
    fn from(value: ArrayD<f32>) -> Self {
        Self::new(value)
    }
}
