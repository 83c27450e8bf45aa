use crate::core::error::OptimError;
use crate::core::optimizers::config::ProjectionConfig;
use crate::core::projection::*;
use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};
use rand::{Rng, SeedableRng};

fn 랜덤_행렬(rows: usize, cols: usize, seed: u64) -> Array2<f32> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-1.0..1.0))
}

fn 설정(gap: u64, scale: f32, proj_type: ProjectionType) -> ProjectionConfig {
    ProjectionConfig::new()
        .with_update_proj_gap(gap)
        .with_scale(scale)
        .with_proj_type(proj_type)
}

#[test]
fn 프로젝션_방향_선택_테스트() {
    assert_eq!(ProjectionType::Std.side_for(8, 4), ProjectionSide::Right);
    assert_eq!(ProjectionType::Std.side_for(4, 4), ProjectionSide::Right);
    assert_eq!(ProjectionType::Std.side_for(2, 4), ProjectionSide::Left);
    assert_eq!(ProjectionType::ReverseStd.side_for(8, 4), ProjectionSide::Left);
    assert_eq!(ProjectionType::ReverseStd.side_for(2, 4), ProjectionSide::Right);
    assert_eq!(ProjectionType::Left.side_for(8, 4), ProjectionSide::Left);
    assert_eq!(ProjectionType::Right.side_for(2, 4), ProjectionSide::Right);
}

#[test]
fn 넓은_행렬_왼쪽_투영_형태_테스트() {
    let grad = 랜덤_행렬(4, 10, 7);
    let mut projector = SvdProjector::new(2, &설정(200, 1.0, ProjectionType::Std));
    assert_eq!(projector.proj_type(), ProjectionType::Std);
    assert!(projector.basis().is_none());

    let low = projector.project(grad.view(), 0).unwrap();
    assert_eq!(low.dim(), (2, 10), "왼쪽 투영은 행을 rank 로 줄임");
    assert_eq!(projector.basis().map(|b| b.side()), Some(ProjectionSide::Left));

    let back = projector.project_back(low.view()).unwrap();
    assert_eq!(back.dim(), (4, 10));
    assert_eq!(projector.rank(), 2);
}

#[test]
fn 긴_행렬_오른쪽_투영_형태_테스트() {
    let grad = 랜덤_행렬(12, 5, 11);
    let mut projector = SvdProjector::new(3, &설정(200, 1.0, ProjectionType::Std));

    let low = projector.project(grad.view(), 0).unwrap();
    assert_eq!(low.dim(), (12, 3), "오른쪽 투영은 열을 rank 로 줄임");
    assert_eq!(projector.project_back(low.view()).unwrap().dim(), (12, 5));
}

#[test]
fn 전체_rank_투영_복원_테스트() {
    let grad = 랜덤_행렬(3, 6, 3);
    let mut projector = SvdProjector::new(3, &설정(200, 1.0, ProjectionType::Std));

    let low = projector.project(grad.view(), 0).unwrap();
    let back = projector.project_back(low.view()).unwrap();

    // 전체 rank 기저는 행 공간 전체를 덮으므로 원본이 복원됨
    for (restored, original) in back.iter().zip(grad.iter()) {
        assert_abs_diff_eq!(restored, original, epsilon = 1e-4);
    }
}

#[test]
fn rank1_행렬_저차원_복원_테스트() {
    let grad = array![[1.0f32, 2.0, 3.0], [2.0, 4.0, 6.0], [3.0, 6.0, 9.0], [4.0, 8.0, 12.0]];
    let mut projector = SvdProjector::new(1, &설정(200, 1.0, ProjectionType::Std));

    let low = projector.project(grad.view(), 0).unwrap();
    let back = projector.project_back(low.view()).unwrap();

    for (restored, original) in back.iter().zip(grad.iter()) {
        assert_abs_diff_eq!(restored, original, epsilon = 1e-3);
    }
}

#[test]
fn 역투영_스케일_적용_테스트() {
    let grad = 랜덤_행렬(3, 6, 5);
    let mut unit = SvdProjector::new(2, &설정(200, 1.0, ProjectionType::Std));
    let mut scaled = SvdProjector::new(2, &설정(200, 0.25, ProjectionType::Std));

    let low_unit = unit.project(grad.view(), 0).unwrap();
    let low_scaled = scaled.project(grad.view(), 0).unwrap();
    let back_unit = unit.project_back(low_unit.view()).unwrap();
    let back_scaled = scaled.project_back(low_scaled.view()).unwrap();

    for (s, u) in back_scaled.iter().zip(back_unit.iter()) {
        assert_abs_diff_eq!(*s, 0.25 * u, epsilon = 1e-5);
    }
}

#[test]
fn 기저_갱신_주기_테스트() {
    let first = 랜덤_행렬(3, 8, 21);
    let second = 랜덤_행렬(3, 8, 99);
    let mut projector = SvdProjector::new(2, &설정(3, 1.0, ProjectionType::Std));

    projector.project(first.view(), 0).unwrap();
    let basis_0 = match projector.basis().unwrap() {
        OrthogonalBasis::Left(a) => a.clone(),
        OrthogonalBasis::Right(_) => panic!("넓은 행렬은 왼쪽 기저여야 함"),
    };

    // step 1, 2 는 주기 밖이므로 기저 유지
    projector.project(second.view(), 1).unwrap();
    projector.project(second.view(), 2).unwrap();
    match projector.basis().unwrap() {
        OrthogonalBasis::Left(a) => assert_eq!(a, &basis_0, "주기 전에는 기저가 유지되어야 함"),
        OrthogonalBasis::Right(_) => unreachable!(),
    }

    // step 3 에서 새 그래디언트 기준으로 다시 계산
    projector.project(second.view(), 3).unwrap();
    match projector.basis().unwrap() {
        OrthogonalBasis::Left(a) => assert_ne!(a, &basis_0, "주기마다 기저가 갱신되어야 함"),
        OrthogonalBasis::Right(_) => unreachable!(),
    }
}

#[test]
fn rank가_차원보다_크면_잘림_테스트() {
    let grad = 랜덤_행렬(2, 5, 8);
    let mut projector = SvdProjector::new(4, &설정(200, 1.0, ProjectionType::Std));

    let low = projector.project(grad.view(), 0).unwrap();
    assert_eq!(low.dim(), (2, 5), "유지 가능한 방향은 min(행, 열) 개");
    assert_eq!(projector.basis().unwrap().rank(), 2);
}

#[test]
fn 투영전_역투영_오류_테스트() {
    let projector = SvdProjector::new(2, &ProjectionConfig::default());
    let low = Array2::<f32>::zeros((2, 4));
    assert_eq!(projector.project_back(low.view()), Err(OptimError::ProjectorNotReady));
}

#[test]
fn 역투영_형태불일치_오류_테스트() {
    let grad = 랜덤_행렬(3, 6, 1);
    let mut projector = SvdProjector::new(2, &설정(200, 1.0, ProjectionType::Std));
    projector.project(grad.view(), 0).unwrap();

    let wrong = Array2::<f32>::zeros((3, 6));
    assert!(matches!(
        projector.project_back(wrong.view()),
        Err(OptimError::ShapeMismatch { .. })
    ));
}
