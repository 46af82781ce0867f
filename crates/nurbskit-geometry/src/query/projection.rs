//! Projection of a point onto a curve.

use nurbskit_core::{Result, Tolerance};
use nurbskit_math::Point3;

use super::Roots;
use crate::curve::{CurveJet, SplineCurve};

const SEEDS_PER_PIECE: usize = 5;

/// Newton iteration on `f(u) = C'(u) . (C(u) - P)`.
///
/// Returns the boundary as soon as a step leaves the domain, and `None`
/// when the iteration stalls or exhausts its iterations.
fn newton_point_on_curve(
    point: Point3,
    jet: &CurveJet,
    seed: f64,
    tolerance: &Tolerance,
) -> Result<Option<f64>> {
    let (lower, upper) = jet.domain();
    let mut param = seed;
    for _ in 0..tolerance.projection_iterations() {
        let [value, first, second] = jet.eval(param)?;
        let diff = value - point;
        let residual = first.dot(diff);
        if residual.abs() < tolerance.stationary {
            return Ok(Some(param));
        }
        let slope = second.dot(diff) + first.length_squared();
        if slope == 0.0 {
            log::trace!("point projection: flat residual at u = {}", param);
            return Ok(None);
        }
        let step = residual / slope;
        param -= step;
        if param < lower {
            return Ok(Some(lower));
        }
        if param > upper {
            return Ok(Some(upper));
        }
        if step.abs() < tolerance.projection_step {
            return Ok(Some(param));
        }
    }
    log::trace!("point projection: no convergence from seed {}", seed);
    Ok(None)
}

/// Converged parameters on one Bezier piece with their distance to `point`.
fn project_on_piece(point: Point3, jet: &CurveJet, tolerance: &Tolerance) -> Result<Vec<(f64, f64)>> {
    let (lower, upper) = jet.domain();
    let mut found = Vec::new();
    for i in 0..SEEDS_PER_PIECE {
        let seed = lower + (upper - lower) * i as f64 / (SEEDS_PER_PIECE - 1) as f64;
        if let Some(param) = newton_point_on_curve(point, jet, seed, tolerance)? {
            let [value, _, _] = jet.eval(param)?;
            found.push((param, value.distance(point)));
        }
    }
    Ok(found)
}

/// Distinct parameters closest to the point, sorted ascending.
fn closest(mut candidates: Vec<(f64, f64)>, tolerance: &Tolerance) -> Roots<f64> {
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
    candidates.dedup_by(|next, kept| (next.0 - kept.0).abs() < tolerance.pair_merge);
    let minimal = candidates
        .iter()
        .map(|(_, distance)| *distance)
        .fold(f64::INFINITY, f64::min);
    Roots::from_vec(
        candidates
            .into_iter()
            .filter(|(_, distance)| distance - minimal <= tolerance.projection_distance)
            .map(|(param, _)| param)
            .collect(),
    )
}

/// Parameters of the points of a single Bezier curve closest to `point`.
pub fn point_on_bezier(point: Point3, bezier: &SplineCurve, tolerance: &Tolerance) -> Result<Roots<f64>> {
    let jet = bezier.jet()?;
    Ok(closest(project_on_piece(point, &jet, tolerance)?, tolerance))
}

/// Parameters of the points of `curve` closest to `point`, sorted ascending.
///
/// Several parameters are returned when the point is equidistant from
/// several places, like the centre of a circular arc.
pub fn point_on_curve(point: Point3, curve: &SplineCurve, tolerance: &Tolerance) -> Result<Roots<f64>> {
    let pieces = curve.split(None)?;
    let mut candidates = Vec::new();
    for piece in &pieces {
        candidates.extend(project_on_piece(point, &piece.jet()?, tolerance)?);
    }
    log::debug!(
        "point_on_curve: {} candidates over {} Bezier pieces",
        candidates.len(),
        pieces.len()
    );
    Ok(closest(candidates, tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nurbs::KnotVector;
    use nurbskit_math::dvec3;

    fn segment() -> SplineCurve {
        SplineCurve::new(
            KnotVector::bezier(1),
            vec![dvec3(0.0, 0.0, 0.0), dvec3(2.0, 0.0, 0.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_project_on_segment() {
        let tolerance = Tolerance::default();
        let roots = point_on_curve(dvec3(0.5, 1.0, 0.0), &segment(), &tolerance).unwrap();
        assert_eq!(roots.len(), 1);
        assert!((roots.as_slice()[0] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_project_beyond_end() {
        let tolerance = Tolerance::default();
        let roots = point_on_curve(dvec3(3.0, 1.0, 0.0), &segment(), &tolerance).unwrap();
        assert_eq!(roots, Roots::Found(vec![1.0]));
    }

    #[test]
    fn test_project_on_bezier_piece() {
        let tolerance = Tolerance::default();
        let parabola = SplineCurve::new(
            KnotVector::bezier(2),
            vec![dvec3(-1.0, 1.0, 0.0), dvec3(0.0, -1.0, 0.0), dvec3(1.0, 1.0, 0.0)],
        )
        .unwrap();
        let roots = point_on_bezier(dvec3(0.0, -3.0, 0.0), &parabola, &tolerance).unwrap();
        assert_eq!(roots.len(), 1);
        assert!((roots.as_slice()[0] - 0.5).abs() < 1e-6);
    }
}
