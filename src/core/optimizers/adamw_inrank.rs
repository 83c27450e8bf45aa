//! GaLore AdamW + InRank 옵티마이저
//!
//! 파라미터마다 한 스텝에서 다음 순서로 실행된다.
//!
//! 1. rank 추정 (프로젝션 그룹만): 설명 비율이 임계값에 닿을 때까지 rank 증가
//! 2. 모멘트 버퍼 정렬: 새 rank 에 맞춰 0 패딩
//! 3. 투영된 공간에서 AdamW 업데이트 후 역투영, 분리된 가중치 감소
//!
//! ```text
//! m = β1·m + (1-β1)·g
//! v = β2·v + (1-β2)·g²
//! step_size = lr · sqrt(1-β2^t) / (1-β1^t)     (correct_bias)
//! p = p - step_size · P⁻¹(m / (sqrt(v) + ε))
//! p = p - lr·wd·p
//! ```
//!
//! 스텝 도중 오류가 나면 그대로 전파한다. 앞선 파라미터가 이미 갱신되었을 수 있으며
//! 롤백은 하지 않는다.

use std::collections::HashMap;

use ndarray::{ArrayD, Ix2, Zip};

use super::config::{InRankConfig, OptimizerConfig, ProjectionConfig};
use super::moment_state::MomentState;
use super::rank_estimator::{estimate_rank, RankTable};
use crate::core::error::{OptimError, Result};
use crate::core::projection::{GradientProjector, SvdProjector};
use crate::core::tensors::{Gradient, ParamId, Parameter};

/// 그룹 종류. 프로젝션 설정은 프로젝션 그룹에만 존재한다.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKind {
    Plain,
    Projection(InRankConfig),
}

/// 같은 하이퍼파라미터를 공유하는 파라미터 묶음
#[derive(Debug, Clone)]
pub struct ParamGroup {
    pub name: String,
    pub options: OptimizerConfig,
    pub kind: GroupKind,
    pub params: Vec<Parameter>,
}

impl ParamGroup {
    /// 일반 AdamW 그룹
    pub fn plain(name: impl Into<String>, params: Vec<Parameter>, options: OptimizerConfig) -> Self {
        Self {
            name: name.into(),
            options,
            kind: GroupKind::Plain,
            params,
        }
    }

    /// 저차원 프로젝션 + rank 성장 그룹
    pub fn projection(
        name: impl Into<String>,
        params: Vec<Parameter>,
        options: OptimizerConfig,
        inrank: InRankConfig,
    ) -> Self {
        Self {
            name: name.into(),
            options,
            kind: GroupKind::Projection(inrank),
            params,
        }
    }

    pub fn is_projection(&self) -> bool {
        matches!(self.kind, GroupKind::Projection(_))
    }

    pub fn inrank(&self) -> Option<&InRankConfig> {
        match &self.kind {
            GroupKind::Plain => None,
            GroupKind::Projection(inrank) => Some(inrank),
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// 파라미터별 옵티마이저 상태
#[derive(Debug, Clone)]
pub struct ParamState<P> {
    /// 방문한 스텝 수
    pub step: u64,
    pub moments: MomentState,
    /// 프로젝션 그룹 파라미터의 프로젝터 (rank 와 1:1)
    pub projector: Option<P>,
    rank_clamped: bool,
}

impl<P> Default for ParamState<P> {
    fn default() -> Self {
        Self {
            step: 0,
            moments: MomentState::Uninitialized,
            projector: None,
            rank_clamped: false,
        }
    }
}

/// 편향 보정이 적용된 스텝 크기
///
/// `correct_bias` 가 꺼져 있으면 학습률 그대로.
pub fn bias_corrected_step_size(options: &OptimizerConfig, t: u64) -> f32 {
    if !options.correct_bias {
        return options.learning_rate;
    }
    let t = t.min(i32::MAX as u64) as i32;
    let bias_correction1 = 1.0 - options.beta1.powi(t);
    let bias_correction2 = 1.0 - options.beta2.powi(t);
    options.learning_rate * bias_correction2.sqrt() / bias_correction1
}

/// 파라미터 하나에 대한 투영 AdamW 업데이트
///
/// `projection` 이 `Some((config, rank))` 이면 rank 에 묶인 프로젝터로 그래디언트를
/// 투영하고, rank 가 바뀌었거나 프로젝터가 없으면 새로 만든다.
pub fn apply_update<P: GradientProjector>(
    id: ParamId,
    param: &mut ArrayD<f32>,
    grad: &ArrayD<f32>,
    state: &mut ParamState<P>,
    options: &OptimizerConfig,
    projection: Option<(&ProjectionConfig, usize)>,
) -> Result<()> {
    if grad.shape() != param.shape() {
        return Err(OptimError::ShapeMismatch {
            expected: param.shape().to_vec(),
            actual: grad.shape().to_vec(),
        });
    }

    let (g, rank) = match projection {
        None => (grad.clone(), None),
        Some((config, rank)) => {
            let full = grad
                .view()
                .into_dimensionality::<Ix2>()
                .map_err(|_| OptimError::InvalidGradientShape {
                    shape: grad.shape().to_vec(),
                })?;

            let stale = state.projector.as_ref().map_or(true, |p| p.rank() != rank);
            if stale {
                state.projector = Some(P::new(rank, config));
            }
            let projector = state.projector.as_mut().ok_or(OptimError::ProjectorNotReady)?;
            let low_rank = projector.project(full, state.step)?;

            let (rows, cols) = full.dim();
            let effective = rank.min(rows.min(cols));
            if effective < rank && !state.rank_clamped {
                log::warn!(
                    "{}: rank {} exceeds gradient {}x{}, using {} directions",
                    id,
                    rank,
                    rows,
                    cols,
                    effective
                );
                state.rank_clamped = true;
            }
            (low_rank.into_dyn(), Some(effective))
        }
    };

    state.moments.reconcile(g.shape(), rank)?;
    let MomentState::Tracking { exp_avg, exp_avg_sq } = &mut state.moments else {
        return Err(OptimError::ShapeMismatch {
            expected: g.shape().to_vec(),
            actual: Vec::new(),
        });
    };
    if exp_avg.shape() != g.shape() {
        return Err(OptimError::ShapeMismatch {
            expected: exp_avg.shape().to_vec(),
            actual: g.shape().to_vec(),
        });
    }

    state.step += 1;
    let t = state.step;
    let (beta1, beta2, eps) = (options.beta1, options.beta2, options.epsilon);

    Zip::from(&mut *exp_avg)
        .and(&mut *exp_avg_sq)
        .and(&g)
        .par_for_each(|m, v, &g| {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
        });

    let step_size = bias_corrected_step_size(options, t);

    let mut normalized = ArrayD::<f32>::zeros(g.raw_dim());
    Zip::from(&mut normalized)
        .and(&*exp_avg)
        .and(&*exp_avg_sq)
        .par_for_each(|n, &m, &v| *n = m / (v.sqrt() + eps));

    let update = match (&state.projector, rank) {
        (Some(projector), Some(_)) => {
            let low_shape = normalized.shape().to_vec();
            let low_rank = normalized
                .into_dimensionality::<Ix2>()
                .map_err(|_| OptimError::InvalidGradientShape { shape: low_shape })?;
            projector.project_back(low_rank.view())?.into_dyn()
        }
        _ => normalized,
    };
    if update.shape() != param.shape() {
        return Err(OptimError::ShapeMismatch {
            expected: param.shape().to_vec(),
            actual: update.shape().to_vec(),
        });
    }

    param.scaled_add(-step_size, &update);

    if options.weight_decay > 0.0 {
        let decay = options.learning_rate * options.weight_decay;
        param.mapv_inplace(|p| p - decay * p);
    }

    log::trace!("{}: step {} applied with step size {:e}", id, t, step_size);
    Ok(())
}

/// 구성 오류 메시지에 그룹 이름을 붙인다
fn in_group(name: &str, error: OptimError) -> OptimError {
    match error {
        OptimError::Configuration(message) => {
            OptimError::Configuration(format!("group '{}': {}", name, message))
        }
        other => other,
    }
}

/// rank 표의 해당 위치를 갱신하고 이번 스텝에 사용할 rank 를 돌려준다.
fn grow_rank(
    table: &mut RankTable,
    id: ParamId,
    grad: &ArrayD<f32>,
    inrank: &InRankConfig,
) -> Result<usize> {
    let current = table.rank(id.index).ok_or(OptimError::UnknownParameter(id))?;
    let estimate = estimate_rank(
        grad.view(),
        current,
        inrank.rank_buffer,
        inrank.explained_ratio_threshold,
    )?;
    if table.record(id.index, &estimate) {
        log::debug!(
            "{}: rank {} -> {} (explained ratio {:.4})",
            id,
            current,
            estimate.rank,
            estimate.explained_ratio
        );
    }
    Ok(estimate.rank.max(current))
}

/// 행렬의 짧은 축을 넘지 않는 시작 rank (최소 1)
///
/// 2차원이 아니면 그대로 두고, 첫 스텝에서 형태 오류로 보고된다.
fn starting_rank(shape: &[usize], initial_rank: usize) -> usize {
    match shape {
        [rows, cols] => initial_rank.min(*rows).min(*cols).max(1),
        _ => initial_rank,
    }
}

/// GaLore AdamW (InRank) 옵티마이저
///
/// 파라미터와 파라미터별 상태, 프로젝션 그룹의 rank 표를 모두 소유한다.
pub struct GaLoreAdamW<P: GradientProjector = SvdProjector> {
    groups: Vec<ParamGroup>,
    state: HashMap<ParamId, ParamState<P>>,
    projection_group: usize,
    rank_table: RankTable,
}

impl GaLoreAdamW<SvdProjector> {
    /// SVD 프로젝터를 쓰는 옵티마이저 생성
    pub fn new(groups: Vec<ParamGroup>) -> Result<Self> {
        Self::from_groups(groups)
    }
}

impl<P: GradientProjector> GaLoreAdamW<P> {
    /// 그룹 구성을 검증하고 옵티마이저 생성
    ///
    /// 프로젝션 그룹은 정확히 하나여야 한다.
    pub fn from_groups(groups: Vec<ParamGroup>) -> Result<Self> {
        let mut projection_group = None;
        for (index, group) in groups.iter().enumerate() {
            group.options.validate().map_err(|e| in_group(&group.name, e))?;
            if !group.is_projection() {
                continue;
            }
            if let Some(inrank) = group.inrank() {
                inrank.validate().map_err(|e| in_group(&group.name, e))?;
            }
            if let Some(previous) = projection_group {
                return Err(OptimError::Configuration(format!(
                    "Only one projection group is supported, found groups {} and {}",
                    previous, index
                )));
            }
            projection_group = Some(index);
        }

        let projection_group = projection_group.ok_or_else(|| {
            OptimError::Configuration(
                "Did not provide a projection group when initializing optimizer".to_string(),
            )
        })?;

        let group = &groups[projection_group];
        let initial_rank = group.inrank().map_or(1, |inrank| inrank.initial_rank);
        let ranks = group
            .params
            .iter()
            .enumerate()
            .map(|(index, param)| {
                let rank = starting_rank(param.shape(), initial_rank);
                if rank < initial_rank {
                    log::warn!(
                        "{}: initial rank {} exceeds parameter shape {:?}, starting at {}",
                        ParamId::new(projection_group, index),
                        initial_rank,
                        param.shape(),
                        rank
                    );
                }
                rank
            })
            .collect();
        let rank_table = RankTable::from_ranks(ranks);

        log::debug!(
            "GaLoreAdamW: {} groups, projection group '{}' with {} params at rank {}",
            groups.len(),
            group.name,
            group.len(),
            initial_rank
        );

        Ok(Self {
            groups,
            state: HashMap::new(),
            projection_group,
            rank_table,
        })
    }

    /// 한 번의 최적화 스텝
    ///
    /// 그래디언트가 없는 파라미터는 건너뛴다.
    pub fn step(&mut self) -> Result<()> {
        for (group_index, group) in self.groups.iter_mut().enumerate() {
            for (index, param) in group.params.iter_mut().enumerate() {
                let id = ParamId::new(group_index, index);
                let Some(grad) = param.grad.as_ref() else {
                    continue;
                };
                let grad = grad
                    .as_dense()
                    .ok_or(OptimError::UnsupportedGradient { param: id })?;

                let projection = match &group.kind {
                    GroupKind::Plain => None,
                    GroupKind::Projection(inrank) => {
                        let rank = grow_rank(&mut self.rank_table, id, grad, inrank)?;
                        Some((&inrank.projection, rank))
                    }
                };

                let state = self.state.entry(id).or_default();
                apply_update(id, &mut param.value, grad, state, &group.options, projection)?;
            }
        }

        log::debug!(
            "ranks {:?}, explained ratios {:?}",
            self.rank_table.ranks(),
            self.rank_table.explained_ratios()
        );
        Ok(())
    }

    /// 평가 클로저를 먼저 한 번 호출한 뒤 스텝을 수행하고 그 값을 돌려준다.
    pub fn step_with_closure<L, F>(&mut self, closure: F) -> Result<L>
    where
        F: FnOnce() -> L,
    {
        let loss = closure();
        self.step()?;
        Ok(loss)
    }

    pub fn groups(&self) -> &[ParamGroup] {
        &self.groups
    }

    pub fn projection_group(&self) -> usize {
        self.projection_group
    }

    pub fn param(&self, id: ParamId) -> Option<&Parameter> {
        self.groups.get(id.group)?.params.get(id.index)
    }

    pub fn param_mut(&mut self, id: ParamId) -> Option<&mut Parameter> {
        self.groups.get_mut(id.group)?.params.get_mut(id.index)
    }

    /// 그래디언트 설정
    pub fn set_grad(&mut self, id: ParamId, grad: impl Into<Gradient>) -> Result<()> {
        let param = self.param_mut(id).ok_or(OptimError::UnknownParameter(id))?;
        param.set_grad(grad.into());
        Ok(())
    }

    /// 모든 그래디언트 제거
    pub fn zero_grad(&mut self) {
        for param in self.groups.iter_mut().flat_map(|group| group.params.iter_mut()) {
            param.zero_grad();
        }
    }

    pub fn state(&self, id: ParamId) -> Option<&ParamState<P>> {
        self.state.get(&id)
    }

    pub fn rank_table(&self) -> &RankTable {
        &self.rank_table
    }

    /// 프로젝션 그룹 파라미터별 현재 rank
    pub fn ranks(&self) -> &[usize] {
        self.rank_table.ranks()
    }

    /// 마지막으로 계산된 설명 비율
    pub fn explained_ratios(&self) -> &[f64] {
        self.rank_table.explained_ratios()
    }

    pub fn learning_rate(&self, group: usize) -> Option<f32> {
        self.groups.get(group).map(|g| g.options.learning_rate)
    }

    /// 학습률 변경 (외부 스케줄러용)
    pub fn set_learning_rate(&mut self, group: usize, lr: f32) -> Result<()> {
        let options = self
            .groups
            .get(group)
            .map(|g| g.options.clone().with_learning_rate(lr))
            .ok_or_else(|| OptimError::Configuration(format!("Unknown group index {}", group)))?;
        options.validate()?;
        self.groups[group].options = options;
        Ok(())
    }
}
