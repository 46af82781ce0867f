use nalgebra::DMatrix;
use num_rational::BigRational;
use nurbskit_geometry::nurbs::operations::{degree_increase, knot_insert, matrix_transformation};
use nurbskit_geometry::nurbs::{func2func, spline2spline};
use nurbskit_math::matrix::to_f64;
use nurbskit_math::Scalar;

fn integers(values: &[i64]) -> Vec<BigRational> {
    values.iter().map(|v| BigRational::from_integer((*v).into())).collect()
}

fn floats(values: &[i64]) -> Vec<f64> {
    values.iter().map(|v| *v as f64).collect()
}

fn max_diff(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
    (a - b).abs().max()
}

#[test]
fn test_exact_projection_matches_float() {
    let old = [0, 0, 0, 1, 2, 3, 3, 3];
    let new = [0, 0, 0, 2, 3, 3, 3];
    let (exact, exact_error) = spline2spline(&integers(&old), &integers(&new)).unwrap();
    let (float, float_error) = spline2spline(&floats(&old), &floats(&new)).unwrap();
    assert!(max_diff(&to_f64(&exact), &float) < 1e-9);
    assert!(max_diff(&to_f64(&exact_error), &float_error) < 1e-9);
}

#[test]
fn test_exact_weighted_projection_matches_float() {
    let old = [0, 0, 1, 2, 2];
    let new = [0, 0, 0, 2, 2, 2];
    let oldweights = [3, 3, 3];
    let newweights = [3, 3, 3];
    let (exact, _) = func2func(
        &integers(&old),
        &integers(&oldweights),
        &integers(&new),
        &integers(&newweights),
    )
    .unwrap();
    let (float, _) = func2func(&floats(&old), &floats(&oldweights), &floats(&new), &floats(&newweights)).unwrap();
    assert!(max_diff(&to_f64(&exact), &float) < 1e-9);
}

#[test]
fn test_exact_insertion_stays_exact() {
    let vector = integers(&[0, 0, 0, 3, 3, 3]);
    let node = BigRational::from_ratio(1, 3);
    let matrix = knot_insert(&vector, &[node]).unwrap();
    assert_eq!(matrix[(1, 0)], BigRational::from_ratio(8, 9));
    assert_eq!(matrix[(1, 1)], BigRational::from_ratio(1, 9));
    assert_eq!(matrix[(2, 1)], BigRational::from_ratio(8, 9));
    assert_eq!(matrix[(2, 2)], BigRational::from_ratio(1, 9));
    assert_eq!(matrix[(3, 2)], BigRational::from_ratio(1, 1));
}

#[test]
fn test_exact_elevation_matches_float() {
    let vector = [0, 0, 0, 1, 2, 2, 2];
    let exact = degree_increase(&integers(&vector), 2).unwrap();
    let float = degree_increase(&floats(&vector), 2).unwrap();
    assert!(max_diff(&to_f64(&exact), &float) < 1e-9);

    let target = [0, 0, 0, 0, 1, 1, 2, 2, 2, 2];
    let exact = matrix_transformation(&integers(&vector), &integers(&target)).unwrap();
    let float = matrix_transformation(&floats(&vector), &floats(&target)).unwrap();
    assert!(max_diff(&to_f64(&exact), &float) < 1e-9);
}
