//! Intersection of two curves.
//!
//! Only isolated intersection points are found. Overlapping curves, whose
//! distance vanishes on a whole interval, give a singular Newton system and
//! are reported as [`Roots::NotFound`].

use nurbskit_core::{Result, Tolerance};
use nurbskit_math::Aabb3;

use super::Roots;
use crate::curve::{CurveJet, SplineCurve};

/// Candidate `(t, u)` parameter pair with the distance between both points.
type Candidate = ((f64, f64), f64);

/// Newton iteration minimising `|Ca(t) - Cb(u)|^2 / 2`.
///
/// Both components are clamped to their piece after every step. Returns
/// `None` on a singular Hessian or when the iterations run out.
fn newton_bcurve_and_bcurve(
    jeta: &CurveJet,
    jetb: &CurveJet,
    seed: (f64, f64),
    tolerance: &Tolerance,
) -> Result<Option<(f64, f64)>> {
    let (lowera, uppera) = jeta.domain();
    let (lowerb, upperb) = jetb.domain();
    let (mut t, mut u) = seed;
    for _ in 0..tolerance.max_iterations {
        let [pointa, firsta, seconda] = jeta.eval(t)?;
        let [pointb, firstb, secondb] = jetb.eval(u)?;
        let diff = pointa - pointb;
        let grad = (firsta.dot(diff), -firstb.dot(diff));
        let htt = seconda.dot(diff) + firsta.length_squared();
        let huu = -secondb.dot(diff) + firstb.length_squared();
        let htu = -firsta.dot(firstb);
        let det = htt * huu - htu * htu;
        if det.abs() < tolerance.singular {
            log::trace!("curve intersection: singular Hessian at ({}, {})", t, u);
            return Ok(None);
        }
        let dt = (huu * grad.0 - htu * grad.1) / det;
        let du = (htt * grad.1 - htu * grad.0) / det;
        t = (t - dt).clamp(lowera, uppera);
        u = (u - du).clamp(lowerb, upperb);
        if dt.hypot(du) < tolerance.intersection_step {
            return Ok(Some((t, u)));
        }
    }
    log::trace!("curve intersection: no convergence from {:?}", seed);
    Ok(None)
}

/// Converged pairs on two Bezier pieces, seeded from the corners of the
/// parameter domain.
fn intersect_pieces(jeta: &CurveJet, jetb: &CurveJet, tolerance: &Tolerance) -> Result<Vec<Candidate>> {
    let (lowera, uppera) = jeta.domain();
    let (lowerb, upperb) = jetb.domain();
    let seeds = [
        (lowera, lowerb),
        (lowera, upperb),
        (uppera, lowerb),
        (uppera, upperb),
    ];
    let mut found = Vec::new();
    for seed in seeds {
        if let Some((t, u)) = newton_bcurve_and_bcurve(jeta, jetb, seed, tolerance)? {
            let [pointa, _, _] = jeta.eval(t)?;
            let [pointb, _, _] = jetb.eval(u)?;
            found.push(((t, u), pointa.distance(pointb)));
        }
    }
    Ok(found)
}

fn merge<T>(items: Vec<T>, radius: f64, pair: impl Fn(&T) -> (f64, f64)) -> Vec<T> {
    let mut kept: Vec<T> = Vec::new();
    for item in items {
        let (t, u) = pair(&item);
        if kept.iter().all(|other| {
            let (kt, ku) = pair(other);
            (t - kt).hypot(u - ku) >= radius
        }) {
            kept.push(item);
        }
    }
    kept
}

/// Merge duplicated pairs that lie within `radius` of an earlier one.
pub fn filter_pairs(pairs: &[(f64, f64)], radius: f64) -> Vec<(f64, f64)> {
    merge(pairs.to_vec(), radius, |pair| *pair)
}

/// Pairs whose points touch, restricted to those at the minimal distance.
fn touching(mut candidates: Vec<Candidate>, tolerance: &Tolerance) -> Roots<(f64, f64)> {
    candidates.sort_by(|a, b| a.0 .0.total_cmp(&b.0 .0).then(a.0 .1.total_cmp(&b.0 .1)));
    let kept = merge(candidates, tolerance.pair_merge, |(pair, _)| *pair);
    let minimal = kept
        .iter()
        .map(|(_, distance)| *distance)
        .fold(f64::INFINITY, f64::min);
    if minimal > tolerance.touch {
        return Roots::NotFound;
    }
    Roots::from_vec(
        kept.into_iter()
            .filter(|(_, distance)| distance - minimal <= tolerance.touch)
            .map(|(pair, _)| pair)
            .collect(),
    )
}

/// Intersection pairs `(t, u)` of two Bezier curves.
pub fn bcurve_and_bcurve(
    beziera: &SplineCurve,
    bezierb: &SplineCurve,
    tolerance: &Tolerance,
) -> Result<Roots<(f64, f64)>> {
    let candidates = intersect_pieces(&beziera.jet()?, &bezierb.jet()?, tolerance)?;
    Ok(touching(candidates, tolerance))
}

fn pieces_with_boxes(curve: &SplineCurve, margin: f64) -> Result<Vec<(CurveJet, Aabb3)>> {
    let mut pieces = Vec::new();
    for piece in curve.split(None)? {
        if let Some(bounds) = Aabb3::from_points(piece.ctrlpoints()) {
            pieces.push((piece.jet()?, bounds.expand(margin)));
        }
    }
    Ok(pieces)
}

/// Intersection pairs `(t, u)` with `curvea(t) == curveb(u)`, sorted by `t`.
pub fn curve_and_curve(
    curvea: &SplineCurve,
    curveb: &SplineCurve,
    tolerance: &Tolerance,
) -> Result<Roots<(f64, f64)>> {
    let piecesa = pieces_with_boxes(curvea, tolerance.touch)?;
    let piecesb = pieces_with_boxes(curveb, tolerance.touch)?;
    let mut candidates = Vec::new();
    let mut skipped = 0;
    for (jeta, boxa) in &piecesa {
        for (jetb, boxb) in &piecesb {
            if !boxa.intersects(boxb) {
                skipped += 1;
                continue;
            }
            candidates.extend(intersect_pieces(jeta, jetb, tolerance)?);
        }
    }
    log::debug!(
        "curve_and_curve: {} x {} pieces, {} pairs skipped by bounding boxes",
        piecesa.len(),
        piecesb.len(),
        skipped
    );
    Ok(touching(candidates, tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nurbs::KnotVector;
    use nurbskit_math::dvec3;

    fn line(start: (f64, f64), end: (f64, f64)) -> SplineCurve {
        SplineCurve::new(
            KnotVector::bezier(1),
            vec![dvec3(start.0, start.1, 0.0), dvec3(end.0, end.1, 0.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_crossing_segments() {
        let tolerance = Tolerance::default();
        let a = line((0.0, 0.0), (1.0, 1.0));
        let b = line((0.0, 1.0), (1.0, 0.0));
        let roots = bcurve_and_bcurve(&a, &b, &tolerance).unwrap();
        assert_eq!(roots.len(), 1);
        let (t, u) = roots.as_slice()[0];
        assert!((t - 0.5).abs() < 1e-9 && (u - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_segments() {
        let tolerance = Tolerance::default();
        let a = line((0.0, 0.0), (1.0, 0.0));
        let b = line((0.0, 1.0), (1.0, 2.0));
        assert_eq!(curve_and_curve(&a, &b, &tolerance).unwrap(), Roots::NotFound);
    }

    #[test]
    fn test_parallel_segments_are_singular() {
        let tolerance = Tolerance::default();
        let a = line((0.0, 0.0), (1.0, 0.0));
        let b = line((0.0, 0.0), (2.0, 0.0));
        assert_eq!(bcurve_and_bcurve(&a, &b, &tolerance).unwrap(), Roots::NotFound);
    }

    #[test]
    fn test_filter_pairs() {
        let pairs = [(0.5, 0.5), (0.5 + 1e-12, 0.5), (0.2, 0.3)];
        assert_eq!(filter_pairs(&pairs, 1e-9), vec![(0.5, 0.5), (0.2, 0.3)]);
    }
}
