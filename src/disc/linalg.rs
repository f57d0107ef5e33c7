use faer::linalg::solvers::DenseSolveCore;
use faer_ext::IntoFaer;
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{Result, StabError};

pub fn inverse(a: ArrayView2<f64>, context: &'static str) -> Result<Array2<f64>> {
    let (nrows, ncols) = a.dim();
    if nrows != ncols {
        return Err(StabError::LinearAlgebra {
            context,
            reason: format!("matrix is {nrows}x{ncols}, not square"),
        });
    }
    let inv = a.into_faer().partial_piv_lu().inverse();
    let inv = Array2::from_shape_fn((nrows, ncols), |(i, j)| inv[(i, j)]);
    if inv.iter().any(|v| !v.is_finite()) {
        return Err(StabError::LinearAlgebra {
            context,
            reason: "matrix is singular".to_string(),
        });
    }
    Ok(inv)
}

pub fn pseudo_inverse(a: ArrayView2<f64>, context: &'static str) -> Result<Array2<f64>> {
    let (nrows, ncols) = a.dim();
    let m = DMatrix::from_fn(nrows, ncols, |i, j| a[[i, j]]);
    let pinv = m
        .pseudo_inverse(1.0e-14)
        .map_err(|reason| StabError::LinearAlgebra {
            context,
            reason: reason.to_string(),
        })?;
    Ok(Array2::from_shape_fn((ncols, nrows), |(i, j)| pinv[(i, j)]))
}

/// Eigenpairs of a symmetric matrix, sorted by ascending eigenvalue.
pub fn symmetric_eigen(a: ArrayView2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let eig = SymmetricEigen::new(DMatrix::from_fn(n, n, |i, j| a[[i, j]]));
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eig.eigenvalues[i].total_cmp(&eig.eigenvalues[j]));
    let values = Array1::from_iter(order.iter().map(|&k| eig.eigenvalues[k]));
    let vectors = Array2::from_shape_fn((n, n), |(i, j)| eig.eigenvectors[(i, order[j])]);
    (values, vectors)
}

/// Right inverse of an averaging operator `p` (rows are averages over pieces
/// with measures `w`) that reproduces the total integral.
///
/// With more pieces than unknowns the result is the `w`-weighted least-squares
/// left inverse, otherwise the minimum `mass`-norm right inverse. Either way
/// `p * r * p == p`, and because constants lie in the range of `r` the
/// integral `1^T mass r u` equals `w . u` for every `u`.
pub fn conservative_inverse(
    p: ArrayView2<f64>,
    w: ArrayView1<f64>,
    mass: ArrayView2<f64>,
    context: &'static str,
) -> Result<Array2<f64>> {
    let (npieces, nmodes) = p.dim();
    if npieces >= nmodes {
        let pt_w = Array2::from_shape_fn((nmodes, npieces), |(i, k)| p[[k, i]] * w[k]);
        let normal = pt_w.dot(&p);
        Ok(inverse(normal.view(), context)?.dot(&pt_w))
    } else {
        let inv_mass = inverse(mass, context)?;
        let minv_pt = inv_mass.dot(&p.t());
        let schur = p.dot(&minv_pt);
        Ok(minv_pt.dot(&inverse(schur.view(), context)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_inverse_and_singular() {
        let a = array![[4.0, 7.0], [2.0, 6.0]];
        let inv = inverse(a.view(), "test").unwrap();
        let id = a.dot(&inv);
        assert_relative_eq!(id[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(id[[0, 1]], 0.0, epsilon = 1e-12);
        assert_relative_eq!(id[[1, 1]], 1.0, epsilon = 1e-12);

        let singular = array![[1.0, 2.0], [2.0, 4.0]];
        assert!(inverse(singular.view(), "test").is_err());
    }

    #[test]
    fn test_pseudo_inverse_tall() {
        let a = array![[1.0, 1.0], [2.0, 1.0], [3.0, 1.0]];
        let pinv = pseudo_inverse(a.view(), "test").unwrap();
        assert_eq!(pinv.dim(), (2, 3));
        let id = pinv.dot(&a);
        assert_relative_eq!(id[[0, 0]], 1.0, epsilon = 1e-10);
        assert_relative_eq!(id[[1, 0]], 0.0, epsilon = 1e-10);
        assert_relative_eq!(id[[1, 1]], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_symmetric_eigen_sorted() {
        let a = array![[2.0, 1.0], [1.0, 2.0]];
        let (values, vectors) = symmetric_eigen(a.view());
        assert_relative_eq!(values[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(values[1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(vectors[[0, 1]].abs(), 0.5_f64.sqrt(), epsilon = 1e-12);
    }
}
