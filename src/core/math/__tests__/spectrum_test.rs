use crate::core::math::spectrum::*;
use approx::assert_relative_eq;
use ndarray::array;

#[test]
fn 특이값_내림차순_테스트() {
    let matrix = array![[1.0f32, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 2.0]];
    let values = singular_values(matrix.view()).unwrap();

    assert_eq!(values.len(), 3);
    assert_relative_eq!(values[0], 3.0, epsilon = 1e-9);
    assert_relative_eq!(values[1], 2.0, epsilon = 1e-9);
    assert_relative_eq!(values[2], 1.0, epsilon = 1e-9);
}

#[test]
fn 넓은_행렬_특이값_개수_테스트() {
    let matrix = array![[1.0f32, 2.0, 3.0, 4.0], [2.0, 4.0, 6.0, 8.0]];
    let values = singular_values(matrix.view()).unwrap();

    assert_eq!(values.len(), 2, "min(행, 열) 개의 특이값");
    assert!(values[0] > 0.0);
    assert!(values[1].abs() < 1e-6, "rank 1 행렬의 두 번째 특이값은 0");
}

#[test]
fn 표본분산_테스트() {
    assert_relative_eq!(unbiased_variance(&[1.0, 2.0, 3.0, 4.0]), 5.0 / 3.0, epsilon = 1e-12);
    assert_eq!(unbiased_variance(&[7.0]), 0.0);
    assert_eq!(unbiased_variance(&[]), 0.0);
}

#[test]
fn 설명비율_계산_테스트() {
    let s = [4.0, 2.0, 1.0, 0.5];

    // k = 2: 꼬리 = [0, 0, 1, 0.5]
    let tail = [0.0, 0.0, 1.0, 0.5];
    let expected = 1.0 - unbiased_variance(&tail) / unbiased_variance(&s);
    assert_relative_eq!(explained_ratio(2, &s), expected, epsilon = 1e-12);

    assert_eq!(explained_ratio(4, &s), 1.0, "전부 유지하면 1.0");
    assert_eq!(explained_ratio(10, &s), 1.0, "길이를 넘는 k 도 1.0");
}

#[test]
fn 설명비율_퇴화스펙트럼_테스트() {
    let equal = [2.0, 2.0, 2.0];
    assert_eq!(explained_ratio(1, &equal), 0.0, "꼬리에 분산이 남으면 0.0");
    assert_eq!(explained_ratio(3, &equal), 1.0);

    let zeros = [0.0, 0.0];
    assert_eq!(explained_ratio(1, &zeros), 1.0, "영 스펙트럼은 완전히 설명됨");
}
