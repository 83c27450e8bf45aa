use crate::core::error::OptimError;
use crate::core::optimizers::{GaLoreSettings, InRankConfig, OptimizerConfig, ProjectionConfig};
use crate::core::projection::ProjectionType;

#[test]
fn 옵티마이저구성_기본값_테스트() {
    let config = OptimizerConfig::default();

    assert_eq!(config.learning_rate, 1e-3, "학습률 기본값");
    assert_eq!(config.beta1, 0.9, "beta1 기본값");
    assert_eq!(config.beta2, 0.999, "beta2 기본값");
    assert_eq!(config.epsilon, 1e-6, "epsilon 기본값");
    assert_eq!(config.weight_decay, 0.0, "가중치 감소 기본값");
    assert!(config.correct_bias, "편향 보정은 기본으로 켜짐");
    assert!(config.validate().is_ok());

    println!("✅ 옵티마이저 구성 기본값 테스트 통과");
}

#[test]
fn inrank구성_기본값_테스트() {
    let config = InRankConfig::default();

    assert_eq!(config.rank_buffer, 100);
    assert_eq!(config.explained_ratio_threshold, 0.9);
    assert_eq!(config.initial_rank, 2);
    assert_eq!(config.projection.update_proj_gap, 200);
    assert_eq!(config.projection.scale, 1.0);
    assert_eq!(config.projection.proj_type, ProjectionType::Std);
    assert!(config.validate().is_ok());
}

#[test]
fn 옵티마이저구성_체이닝_테스트() {
    let config = OptimizerConfig::new()
        .with_learning_rate(0.01)
        .with_betas(0.8, 0.99)
        .with_epsilon(1e-8)
        .with_weight_decay(0.1)
        .with_correct_bias(false);

    assert_eq!(config.learning_rate, 0.01);
    assert_eq!(config.beta1, 0.8);
    assert_eq!(config.beta2, 0.99);
    assert_eq!(config.epsilon, 1e-8);
    assert_eq!(config.weight_decay, 0.1);
    assert!(!config.correct_bias);
}

#[test]
fn 잘못된_하이퍼파라미터_거부_테스트() {
    let invalid = [
        OptimizerConfig::new().with_learning_rate(0.0),
        OptimizerConfig::new().with_learning_rate(-1e-3),
        OptimizerConfig::new().with_learning_rate(f32::NAN),
        OptimizerConfig::new().with_betas(1.0, 0.999),
        OptimizerConfig::new().with_betas(0.9, -0.1),
        OptimizerConfig::new().with_epsilon(-1e-8),
        OptimizerConfig::new().with_weight_decay(-0.01),
    ];

    for config in invalid {
        assert!(
            matches!(config.validate(), Err(OptimError::Configuration(_))),
            "거부되어야 함: {:?}",
            config
        );
    }
}

#[test]
fn 잘못된_inrank_설정_거부_테스트() {
    let invalid = [
        InRankConfig::new().with_explained_ratio_threshold(0.0),
        InRankConfig::new().with_explained_ratio_threshold(1.0),
        InRankConfig::new().with_initial_rank(0),
        InRankConfig::new().with_projection(ProjectionConfig::new().with_update_proj_gap(0)),
        InRankConfig::new().with_projection(ProjectionConfig::new().with_scale(f32::INFINITY)),
    ];

    for config in invalid {
        assert!(matches!(config.validate(), Err(OptimError::Configuration(_))));
    }
}

#[test]
fn json_일부필드_기본값_채움_테스트() {
    let json = r#"{
        "optimizer": { "learning_rate": 0.01, "weight_decay": 0.1 },
        "inrank": { "rank_buffer": 16, "projection": { "proj_type": "reverse_std" } }
    }"#;
    let settings = GaLoreSettings::from_json_str(json).unwrap();

    assert_eq!(settings.optimizer.learning_rate, 0.01);
    assert_eq!(settings.optimizer.weight_decay, 0.1);
    assert_eq!(settings.optimizer.beta1, 0.9, "누락된 필드는 기본값");
    assert_eq!(settings.inrank.rank_buffer, 16);
    assert_eq!(settings.inrank.initial_rank, 2);
    assert_eq!(settings.inrank.projection.proj_type, ProjectionType::ReverseStd);
    assert_eq!(settings.inrank.projection.update_proj_gap, 200);
}

#[test]
fn json_직렬화_왕복_테스트() {
    let settings = GaLoreSettings {
        optimizer: OptimizerConfig::new().with_learning_rate(0.05),
        inrank: InRankConfig::new().with_initial_rank(4),
    };
    let json = settings.to_json_string().unwrap();
    assert_eq!(GaLoreSettings::from_json_str(&json).unwrap(), settings);
}

#[test]
fn json_오류_구분_테스트() {
    assert!(matches!(
        GaLoreSettings::from_json_str("{ not json"),
        Err(OptimError::ConfigFile(_))
    ));
    assert!(matches!(
        GaLoreSettings::from_json_str(r#"{ "optimizer": { "learning_rate": -1.0 } }"#),
        Err(OptimError::Configuration(_))
    ));
}
