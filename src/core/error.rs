//! 옵티마이저 오류 타입
//!
//! 구성 단계 오류와 스텝 단계 오류를 하나의 열거형으로 모은다.
//! 내부에서 잡거나 재시도하지 않고 모두 호출자에게 전파한다.

use thiserror::Error;

use crate::core::tensors::ParamId;

/// GaLore InRank 옵티마이저의 오류
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimError {
    /// 잘못된 하이퍼파라미터 또는 프로젝션 그룹 누락 (생성 시점)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 희소 그래디언트는 지원하지 않음
    #[error("Unsupported gradient for {param}: sparse gradients are not supported, use a dense gradient")]
    UnsupportedGradient {
        /// 희소 그래디언트를 가진 파라미터
        param: ParamId,
    },

    /// 2차원이 아니거나 빈 그래디언트
    #[error("Invalid gradient shape {shape:?}: expected a non-empty 2-D tensor")]
    InvalidGradientShape {
        /// 실제 형태
        shape: Vec<usize>,
    },

    /// 사용 가능한 특이값 안에서 임계값에 도달하지 못함
    #[error(
        "Rank growth did not converge: starting at rank {start_rank}, {available} singular values \
         reached at most ratio {best_ratio} (threshold {threshold})"
    )]
    RankGrowthNonConvergence {
        /// 탐색을 시작한 rank
        start_rank: usize,
        /// 사용 가능한 특이값 개수
        available: usize,
        /// 탐색 중 가장 높은 설명 비율
        best_ratio: f64,
        /// 요구된 임계값
        threshold: f64,
    },

    /// NaN / Inf 가 포함된 그래디언트
    #[error("Non-finite values in gradient of shape {shape:?}")]
    NonFiniteGradient {
        /// 그래디언트 형태
        shape: Vec<usize>,
    },

    /// SVD 수렴 실패
    #[error("Singular value decomposition failed for a {rows}x{cols} matrix")]
    DecompositionFailed {
        /// 행 수
        rows: usize,
        /// 열 수
        cols: usize,
    },

    /// 텐서 형태 불일치
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// 기대한 형태
        expected: Vec<usize>,
        /// 실제 형태
        actual: Vec<usize>,
    },

    /// 옵티마이저가 모르는 파라미터 핸들
    #[error("Unknown parameter {0}")]
    UnknownParameter(ParamId),

    /// 직교 기저가 계산되기 전에 역투영을 요청함
    #[error("Projector has no orthogonal basis yet: project() must run before project_back()")]
    ProjectorNotReady,

    /// 설정 파일 읽기/파싱 실패
    #[error("Config file error: {0}")]
    ConfigFile(String),
}

/// 옵티마이저 결과 타입
pub type Result<T> = std::result::Result<T, OptimError>;
