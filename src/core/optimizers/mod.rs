pub mod config;
pub mod rank_estimator;
pub mod moment_state;
pub mod adamw_inrank;

// 테스트 모듈
#[cfg(test)]
mod __tests__;

pub use config::{GaLoreSettings, InRankConfig, OptimizerConfig, ProjectionConfig};
pub use rank_estimator::{estimate_rank, RankEstimate, RankTable};
pub use moment_state::{rank_axis, MomentState};
pub use adamw_inrank::{
    apply_update, bias_corrected_step_size, GaLoreAdamW, GroupKind, ParamGroup, ParamState,
};
