//! Sum and product of splines defined on the same domain.

use nalgebra::DMatrix;
use nurbskit_core::{NurbsError, Result};
use nurbskit_math::Scalar;

use super::eval::eval_spline_nodes;
use super::knot::{find_degree, find_knots, increase_degree, unite_vectors};
use super::least_square::uniform_nodes;
use super::operations::matrix_transformation;

fn check_same_domain<T: Scalar>(vectora: &[T], vectorb: &[T]) -> Result<()> {
    let same_start = vectora[0] == vectorb[0];
    let same_end = vectora[vectora.len() - 1] == vectorb[vectorb.len() - 1];
    if same_start && same_end {
        Ok(())
    } else {
        Err(NurbsError::InvalidOperation(
            "splines are defined on different domains".into(),
        ))
    }
}

fn count<T: Scalar>(vector: &[T], value: &T) -> usize {
    vector.iter().filter(|knot| *knot == value).count()
}

/// Knot vector carrying the product of two splines.
///
/// The product has degree `p + q`. At an interior knot where the factors
/// are `C^{p-m_a}` and `C^{q-m_b}`, the product is `C^k` with
/// `k = min(p - m_a, q - m_b)`, which needs multiplicity `p + q - k`.
pub fn knotvector_mul<T: Scalar>(vectora: &[T], vectorb: &[T]) -> Result<Vec<T>> {
    let dega = find_degree(vectora)?;
    let degb = find_degree(vectorb)?;
    check_same_domain(vectora, vectorb)?;
    let degc = dega + degb;

    let mut allknots = find_knots(vectora)?;
    allknots.extend(find_knots(vectorb)?);
    allknots.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    allknots.dedup();

    let last = allknots.len() - 1;
    let mut product = Vec::new();
    for (i, knot) in allknots.iter().enumerate() {
        let mult = if i == 0 || i == last {
            degc + 1
        } else {
            let conta = dega as isize - count(vectora, knot) as isize;
            let contb = degb as isize - count(vectorb, knot) as isize;
            let continuity = conta.min(contb).max(-1);
            (degc as isize - continuity) as usize
        };
        product.extend(std::iter::repeat(knot.clone()).take(mult));
    }
    Ok(product)
}

/// Knot vector and matrices `(vector, Ma, Mb)` so that the sum of two
/// splines has control points `Ma * Pa + Mb * Pb` on `vector`.
#[allow(clippy::type_complexity)]
pub fn add_spline_curve<T: Scalar>(
    vectora: &[T],
    vectorb: &[T],
) -> Result<(Vec<T>, DMatrix<T>, DMatrix<T>)> {
    let dega = find_degree(vectora)?;
    let degb = find_degree(vectorb)?;
    check_same_domain(vectora, vectorb)?;
    let degree = dega.max(degb);
    let elevateda = increase_degree(vectora, degree - dega)?;
    let elevatedb = increase_degree(vectorb, degree - degb)?;
    let vector = unite_vectors(&elevateda, &elevatedb)?;
    let matrixa = matrix_transformation(vectora, &vector)?;
    let matrixb = matrix_transformation(vectorb, &vector)?;
    Ok((vector, matrixa, matrixb))
}

/// Same as [`add_spline_curve`] with the second matrix negated.
#[allow(clippy::type_complexity)]
pub fn sub_spline_curve<T: Scalar>(
    vectora: &[T],
    vectorb: &[T],
) -> Result<(Vec<T>, DMatrix<T>, DMatrix<T>)> {
    let (vector, matrixa, matrixb) = add_spline_curve(vectora, vectorb)?;
    Ok((vector, matrixa, -matrixb))
}

/// Knot vector and tensor of the product of two splines.
///
/// `tensor[i][(j, k)]` is the weight of `A_i B_k` in control point `C_j`:
/// `C_j = sum_{i,k} A_i tensor[i][(j, k)] B_k`.
pub fn mul_spline_curve<T: Scalar>(
    vectora: &[T],
    vectorb: &[T],
) -> Result<(Vec<T>, Vec<DMatrix<T>>)> {
    let dega = find_degree(vectora)?;
    let degb = find_degree(vectorb)?;
    let vectorc = knotvector_mul(vectora, vectorb)?;
    let degc = dega + degb;

    let knots = find_knots(&vectorc)?;
    let nodes: Vec<T> = knots
        .windows(2)
        .flat_map(|pair| uniform_nodes(2 * (degc + 1), &pair[0], &pair[1]))
        .collect();

    let avals = eval_spline_nodes(vectora, &nodes, dega)?;
    let bvals = eval_spline_nodes(vectorb, &nodes, degb)?;
    let cvals = eval_spline_nodes(&vectorc, &nodes, degc)?;
    let lsq = T::solve(&(&cvals * cvals.transpose()), &cvals)?;

    let tensor = (0..avals.nrows())
        .map(|i| {
            let mut scaled = lsq.clone();
            for (n, mut column) in scaled.column_iter_mut().enumerate() {
                let factor = avals[(i, n)].clone();
                for value in column.iter_mut() {
                    *value *= factor.clone();
                }
            }
            scaled * bvals.transpose()
        })
        .collect();
    log::debug!(
        "mul_spline_curve: degree {} x degree {} on {} intervals",
        dega,
        degb,
        knots.len() - 1
    );
    Ok((vectorc, tensor))
}

fn check_bezier<T: Scalar>(vector: &[T]) -> Result<()> {
    let degree = find_degree(vector)?;
    if vector.len() != 2 * (degree + 1) {
        return Err(NurbsError::InvalidOperation(format!(
            "vector of {} knots is not a degree {} Bezier vector",
            vector.len(),
            degree
        )));
    }
    Ok(())
}

/// [`add_spline_curve`] restricted to two Bezier curves.
#[allow(clippy::type_complexity)]
pub fn add_nonrat_bezier<T: Scalar>(
    vectora: &[T],
    vectorb: &[T],
) -> Result<(Vec<T>, DMatrix<T>, DMatrix<T>)> {
    check_bezier(vectora)?;
    check_bezier(vectorb)?;
    add_spline_curve(vectora, vectorb)
}

/// [`mul_spline_curve`] restricted to two Bezier curves.
pub fn mult_nonrat_bezier<T: Scalar>(
    vectora: &[T],
    vectorb: &[T],
) -> Result<(Vec<T>, Vec<DMatrix<T>>)> {
    check_bezier(vectora)?;
    check_bezier(vectorb)?;
    mul_spline_curve(vectora, vectorb)
}

/// Contract a product tensor with the control values of both factors.
pub fn apply_product<T: Scalar>(tensor: &[DMatrix<T>], valuesa: &[T], valuesb: &[T]) -> Vec<T> {
    let columnb = DMatrix::from_column_slice(valuesb.len(), 1, valuesb);
    let mut result = DMatrix::<T>::zeros(tensor.first().map_or(0, |m| m.nrows()), 1);
    for (slice, value) in tensor.iter().zip(valuesa) {
        let mut term = slice * &columnb;
        for entry in term.iter_mut() {
            *entry *= value.clone();
        }
        result += term;
    }
    result.iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nurbskit_math::BigRational;

    fn frac(numer: i64, denom: i64) -> BigRational {
        BigRational::from_ratio(numer, denom)
    }

    #[test]
    fn test_knotvector_mul() {
        let a = [0.0, 0.0, 0.5, 1.0, 1.0];
        let b = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let c = knotvector_mul(&a, &b).unwrap();
        assert_eq!(c, vec![0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.5, 1.0, 1.0, 1.0, 1.0]);

        let a = [0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        let c = knotvector_mul(&a, &a).unwrap();
        assert_eq!(c.iter().filter(|k| **k == 0.5).count(), 3);
    }

    #[test]
    fn test_add_different_degrees() {
        let a = [0.0, 0.0, 1.0, 1.0];
        let b = [0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        let (vector, ma, mb) = add_spline_curve(&a, &b).unwrap();
        assert_eq!(vector, b.to_vec());
        assert_eq!(ma.shape(), (4, 2));
        assert_eq!(mb, DMatrix::identity(4, 4));
        let (_, _, negb) = sub_spline_curve(&a, &b).unwrap();
        assert_eq!(negb, -DMatrix::<f64>::identity(4, 4));
    }

    #[test]
    fn test_product_of_lines() {
        // (1 - u) * u = u - u^2 has Bezier values [0, 1/2, 0].
        let vector = vec![frac(0, 1), frac(0, 1), frac(1, 1), frac(1, 1)];
        let (vectorc, tensor) = mul_spline_curve(&vector, &vector).unwrap();
        assert_eq!(vectorc.len(), 6);
        let product = apply_product(&tensor, &[frac(1, 1), frac(0, 1)], &[frac(0, 1), frac(1, 1)]);
        assert_eq!(product, vec![frac(0, 1), frac(1, 2), frac(0, 1)]);
    }

    #[test]
    fn test_bezier_specialisations() {
        let line = [0.0, 0.0, 1.0, 1.0];
        let quad = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let (vector, ma, _) = add_nonrat_bezier(&line, &quad).unwrap();
        assert_eq!(vector, quad.to_vec());
        assert_eq!(ma.shape(), (3, 2));
        let (vector, tensor) = mult_nonrat_bezier(&line, &quad).unwrap();
        assert_eq!(vector.len(), 8);
        assert_eq!(tensor.len(), 2);
        assert!(add_nonrat_bezier(&[0.0, 0.0, 0.5, 1.0, 1.0], &quad).is_err());
    }

    #[test]
    fn test_product_with_interior_knot() {
        let a = [0.0, 0.0, 0.5, 1.0, 1.0];
        let b = [0.0, 0.0, 1.0, 1.0];
        let (vectorc, tensor) = mul_spline_curve(&a, &b).unwrap();
        let valuesa = [1.0, 2.0, 0.0];
        let valuesb = [1.0, 3.0];
        let product = apply_product(&tensor, &valuesa, &valuesb);
        let nodes = [0.1, 0.4, 0.6, 0.9];
        let ea = eval_spline_nodes(&a, &nodes, 1).unwrap();
        let eb = eval_spline_nodes(&b, &nodes, 1).unwrap();
        let ec = eval_spline_nodes(&vectorc, &nodes, 2).unwrap();
        for j in 0..nodes.len() {
            let fa: f64 = (0..3).map(|i| ea[(i, j)] * valuesa[i]).sum();
            let fb: f64 = (0..2).map(|i| eb[(i, j)] * valuesb[i]).sum();
            let fc: f64 = (0..product.len()).map(|i| ec[(i, j)] * product[i]).sum();
            assert!((fa * fb - fc).abs() < 1e-9, "node {}: {} != {}", nodes[j], fa * fb, fc);
        }
    }
}
