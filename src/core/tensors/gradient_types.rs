//! 그래디언트 표현 - 밀집 / 희소

use ndarray::ArrayD;

/// 좌표 형식(COO) 희소 그래디언트
#[derive(Debug, Clone, PartialEq)]
pub struct SparseGradient {
    pub shape: Vec<usize>,
    /// 각 값의 다차원 인덱스
    pub indices: Vec<Vec<usize>>,
    pub values: Vec<f32>,
}

impl SparseGradient {
    pub fn new(shape: Vec<usize>, indices: Vec<Vec<usize>>, values: Vec<f32>) -> Self {
        Self { shape, indices, values }
    }
}

/// 파라미터 그래디언트
#[derive(Debug, Clone, PartialEq)]
pub enum Gradient {
    Dense(ArrayD<f32>),
    Sparse(SparseGradient),
}

impl Gradient {
    pub fn is_sparse(&self) -> bool {
        matches!(self, Gradient::Sparse(_))
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Gradient::Dense(dense) => dense.shape(),
            Gradient::Sparse(sparse) => &sparse.shape,
        }
    }

    pub fn as_dense(&self) -> Option<&ArrayD<f32>> {
        match self {
            Gradient::Dense(dense) => Some(dense),
            Gradient::Sparse(_) => None,
        }
    }
}

impl From<ArrayD<f32>> for Gradient {
    fn from(dense: ArrayD<f32>) -> Self {
        Gradient::Dense(dense)
    }
}

impl From<SparseGradient> for Gradient {
    fn from(sparse: SparseGradient) -> Self {
        Gradient::Sparse(sparse)
    }
}
