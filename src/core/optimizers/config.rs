use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{OptimError, Result};
use crate::core::projection::ProjectionType;

/// AdamW 하이퍼파라미터 (그룹 단위)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// 학습률 (> 0)
    pub learning_rate: f32,
    /// 베타1 파라미터 (1차 모멘트 지수 감소율)
    pub beta1: f32,
    /// 베타2 파라미터 (2차 모멘트 지수 감소율)
    pub beta2: f32,
    /// 엡실론 (수치 안정성을 위한 작은 값)
    pub epsilon: f32,
    /// 분리된 가중치 감소
    pub weight_decay: f32,
    /// 편향 보정 사용 여부
    pub correct_bias: bool,
}

/// GaLore 프로젝터 구성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// 직교 기저 재계산 주기 (스텝)
    pub update_proj_gap: u64,
    /// 역투영 스케일
    pub scale: f32,
    pub proj_type: ProjectionType,
}

/// rank 성장(InRank) 구성 - 프로젝션 그룹 전용
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InRankConfig {
    pub projection: ProjectionConfig,
    /// 특이값 계산에 rank 외에 더 포함할 행 수
    pub rank_buffer: usize,
    /// 설명 비율 임계값, (0, 1)
    pub explained_ratio_threshold: f32,
    /// 모든 파라미터의 시작 rank
    pub initial_rank: usize,
}

/// 설정 파일 전체
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GaLoreSettings {
    pub optimizer: OptimizerConfig,
    pub inrank: InRankConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-6,
            weight_decay: 0.0,
            correct_bias: true,
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            update_proj_gap: 200,
            scale: 1.0,
            proj_type: ProjectionType::Std,
        }
    }
}

impl Default for InRankConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionConfig::default(),
            rank_buffer: 100,
            explained_ratio_threshold: 0.9,
            initial_rank: 2,
        }
    }
}

fn config_error(message: String) -> OptimError {
    OptimError::Configuration(message)
}

impl OptimizerConfig {
    /// 새 구성 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 학습률 설정
    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_betas(mut self, beta1: f32, beta2: f32) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// 가중치 감소 설정
    pub fn with_weight_decay(mut self, decay: f32) -> Self {
        self.weight_decay = decay;
        self
    }

    pub fn with_correct_bias(mut self, correct_bias: bool) -> Self {
        self.correct_bias = correct_bias;
        self
    }

    /// 하이퍼파라미터 범위 검사
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(config_error(format!(
                "Invalid learning rate: {} - should be > 0.0",
                self.learning_rate
            )));
        }
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(config_error(format!(
                    "Invalid {} parameter: {} - should be in [0.0, 1.0)",
                    name, beta
                )));
            }
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(config_error(format!(
                "Invalid epsilon value: {} - should be >= 0.0",
                self.epsilon
            )));
        }
        if !(self.weight_decay.is_finite() && self.weight_decay >= 0.0) {
            return Err(config_error(format!(
                "Invalid weight_decay value: {} - should be >= 0.0",
                self.weight_decay
            )));
        }
        Ok(())
    }
}

impl ProjectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_update_proj_gap(mut self, gap: u64) -> Self {
        self.update_proj_gap = gap;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_proj_type(mut self, proj_type: ProjectionType) -> Self {
        self.proj_type = proj_type;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.update_proj_gap == 0 {
            return Err(config_error(
                "Invalid update_proj_gap: 0 - should be >= 1".to_string(),
            ));
        }
        if !self.scale.is_finite() {
            return Err(config_error(format!(
                "Invalid projection scale: {} - should be finite",
                self.scale
            )));
        }
        Ok(())
    }
}

impl InRankConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 프로젝터 구성 설정
    pub fn with_projection(mut self, projection: ProjectionConfig) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_rank_buffer(mut self, rank_buffer: usize) -> Self {
        self.rank_buffer = rank_buffer;
        self
    }

    pub fn with_explained_ratio_threshold(mut self, threshold: f32) -> Self {
        self.explained_ratio_threshold = threshold;
        self
    }

    pub fn with_initial_rank(mut self, rank: usize) -> Self {
        self.initial_rank = rank;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.projection.validate()?;
        let threshold = self.explained_ratio_threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(config_error(format!(
                "Invalid explained_ratio_threshold: {} - should be in (0.0, 1.0)",
                threshold
            )));
        }
        if self.initial_rank == 0 {
            return Err(config_error(
                "Invalid initial_rank: 0 - should be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl GaLoreSettings {
    pub fn validate(&self) -> Result<()> {
        self.optimizer.validate()?;
        self.inrank.validate()
    }

    /// JSON 문자열에서 로드 (누락된 필드는 기본값)
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| OptimError::ConfigFile(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// JSON 파일에서 로드
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| OptimError::ConfigFile(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| OptimError::ConfigFile(e.to_string()))
    }
}
