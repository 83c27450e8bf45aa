//! 그래디언트 프로젝터 인터페이스

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::optimizers::config::ProjectionConfig;

/// 저차원 공간으로 보낼 쪽
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionSide {
    /// `Aᵀ · G` (행 방향 축소, 결과 r x n)
    Left,
    /// `G · Bᵀ` (열 방향 축소, 결과 m x r)
    Right,
}

/// 프로젝션 방향 선택 규칙
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionType {
    /// 행 >= 열 이면 오른쪽, 아니면 왼쪽 (짧은 축을 rank 로 줄임)
    #[default]
    Std,
    /// `Std` 의 반대
    ReverseStd,
    Left,
    Right,
}

impl ProjectionType {
    /// 그래디언트 형태에 따른 프로젝션 방향
    pub fn side_for(&self, rows: usize, cols: usize) -> ProjectionSide {
        match self {
            ProjectionType::Std if rows >= cols => ProjectionSide::Right,
            ProjectionType::Std => ProjectionSide::Left,
            ProjectionType::ReverseStd if rows >= cols => ProjectionSide::Left,
            ProjectionType::ReverseStd => ProjectionSide::Right,
            ProjectionType::Left => ProjectionSide::Left,
            ProjectionType::Right => ProjectionSide::Right,
        }
    }
}

/// 특정 rank 에 묶인 저차원 프로젝터
///
/// rank 가 바뀌면 옵티마이저가 새 인스턴스를 만든다. 내부적으로
/// `update_proj_gap` 주기마다 기저를 다시 계산하는 등 상태를 가질 수 있다.
pub trait GradientProjector {
    /// `rank` 와 프로젝션 설정으로 새 프로젝터 생성
    fn new(rank: usize, config: &ProjectionConfig) -> Self
    where
        Self: Sized;

    /// 묶인 rank
    fn rank(&self) -> usize;

    /// 전체 공간 그래디언트를 저차원 공간으로 투영
    fn project(&mut self, grad: ArrayView2<f32>, step: u64) -> Result<Array2<f32>>;

    /// 저차원 업데이트를 전체 파라미터 공간으로 역투영
    fn project_back(&self, low_rank: ArrayView2<f32>) -> Result<Array2<f32>>;
}
