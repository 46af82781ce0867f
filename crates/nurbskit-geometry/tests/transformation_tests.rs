use nalgebra::DMatrix;
use nurbskit_geometry::nurbs::knot::{increase_degree, insert_knots};
use nurbskit_geometry::nurbs::operations::{degree_decrease, degree_increase, knot_insert, knot_remove};
use nurbskit_geometry::nurbs::spline2spline;

fn max_diff(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
    (a - b).abs().max()
}

#[test]
fn test_knot_insert_without_nodes() {
    let vector = [0.0, 0.0, 0.0, 0.2, 0.7, 1.0, 1.0, 1.0];
    assert_eq!(knot_insert(&vector, &[]).unwrap(), DMatrix::identity(5, 5));
}

#[test]
fn test_insertion_is_order_independent() {
    let vector = [0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
    let forward = knot_insert(&vector, &[0.2, 0.7]).unwrap();
    let backward = knot_insert(&vector, &[0.7, 0.2]).unwrap();
    assert!(max_diff(&forward, &backward) < 1e-12);
}

#[test]
fn test_removal_inverts_insertion() {
    let vector = [0.0, 0.0, 0.0, 0.0, 0.4, 0.6, 1.0, 1.0, 1.0, 1.0];
    for node in [0.1, 0.4, 0.5, 0.9] {
        let insert = knot_insert(&vector, &[node]).unwrap();
        let bigger = insert_knots(&vector, &[node]).unwrap();
        let remove = knot_remove(&bigger, &[node]).unwrap();
        assert!(max_diff(&(remove * insert), &DMatrix::identity(6, 6)) < 1e-9);
    }
}

#[test]
fn test_degree_round_trip_on_control_points() {
    let vector = [0.0, 0.0, 0.0, 0.25, 0.5, 0.5, 1.0, 1.0, 1.0];
    let points = DMatrix::from_row_slice(6, 2, &[0.0, 0.0, 1.0, 2.0, 2.0, -1.0, 3.0, 0.5, 4.0, 4.0, 5.0, 0.0]);
    let up = degree_increase(&vector, 1).unwrap();
    let elevated = increase_degree(&vector, 1).unwrap();
    let down = degree_decrease(&elevated, 1).unwrap();
    let restored = down * (up * &points);
    assert!(max_diff(&restored, &points) < 1e-9);
}

#[test]
fn test_projection_onto_refined_space_is_exact() {
    let old = [0.0, 0.0, 1.0, 1.0];
    let new = [0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
    let (transform, error) = spline2spline(&old, &new).unwrap();
    let line = DMatrix::from_column_slice(2, 1, &[1.0, 3.0]);
    let residual = line.transpose() * &error * &line;
    assert!(residual[(0, 0)].abs() < 1e-12);
    let projected = transform * line;
    approx::assert_abs_diff_eq!(projected[(0, 0)], 1.0, epsilon = 1e-12);
    approx::assert_abs_diff_eq!(projected[(3, 0)], 3.0, epsilon = 1e-12);
}
