//! GaLore InRank 라이브러리
//!
//! 그래디언트를 저차원 부분공간으로 투영해 AdamW 모멘트를 작은 크기로 유지하고,
//! 특이값 스펙트럼의 설명 비율을 보며 학습 중에 투영 rank 를 키워 나간다.
//!
//! ```no_run
//! use galore_inrank::{GaLoreAdamW, InRankConfig, OptimizerConfig, ParamGroup, ParamId, Parameter};
//! use ndarray::{ArrayD, IxDyn};
//!
//! let weight = Parameter::new(ArrayD::zeros(IxDyn(&[64, 32])));
//! let groups = vec![ParamGroup::projection(
//!     "weights",
//!     vec![weight],
//!     OptimizerConfig::new().with_learning_rate(1e-3),
//!     InRankConfig::default(),
//! )];
//! let mut optimizer = GaLoreAdamW::new(groups)?;
//! optimizer.set_grad(ParamId::new(0, 0), ArrayD::<f32>::ones(IxDyn(&[64, 32])))?;
//! optimizer.step()?;
//! # Ok::<(), galore_inrank::OptimError>(())
//! ```

pub mod core;

// 핵심 모듈들 재수출
pub use core::{
    // 오류
    OptimError, Result,
    // 텐서
    Gradient, ParamId, Parameter, SparseGradient,
    // 프로젝션
    GradientProjector, ProjectionType, SvdProjector,
    // 최적화기
    GaLoreAdamW, GaLoreSettings, GroupKind, InRankConfig, MomentState, OptimizerConfig,
    ParamGroup, ParamState, ProjectionConfig, RankEstimate, RankTable,
};

// 편의 타입 별칭
pub type InRankOptimizer = GaLoreAdamW<SvdProjector>;
