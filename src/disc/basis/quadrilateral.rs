use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::disc::basis::Basis;
use crate::error::Result;

/// Tensor Legendre basis on the square [-1, 1]^2 with Gauss-Lobatto nodes.
pub struct QuadrilateralBasis;

impl QuadrilateralBasis {
    fn ortho_basis_ij(r: ArrayView1<f64>, s: ArrayView1<f64>, i: usize, j: usize) -> Array1<f64> {
        let p_i_r = Self::jacobi_polynomial(r, 0.0, 0.0, i);
        let p_j_s = Self::jacobi_polynomial(s, 0.0, 0.0, j);
        &p_i_r * &p_j_s
    }
}

impl Basis for QuadrilateralBasis {
    fn mode_indices(n: usize) -> Vec<[usize; 3]> {
        let mut modes = Vec::with_capacity((n + 1).pow(2));
        for i in 0..n + 1 {
            for j in 0..n + 1 {
                modes.push([i, j, 0]);
            }
        }
        modes
    }
    fn nodes(n: usize) -> Result<Array2<f64>> {
        let zeta = Self::jacobi_gauss_lobatto(0.0, 0.0, n);
        let n_pts_1d = n + 1;
        let mut nodes = Array2::<f64>::zeros((n_pts_1d * n_pts_1d, 2));
        let mut sk = 0;
        for i in 0..n_pts_1d {
            for j in 0..n_pts_1d {
                nodes[[sk, 0]] = zeta[j];
                nodes[[sk, 1]] = zeta[i];
                sk += 1;
            }
        }
        Ok(nodes)
    }
    fn vandermonde(n: usize, points: ArrayView2<f64>) -> Array2<f64> {
        let modes = Self::mode_indices(n);
        let mut v = Array2::zeros((points.nrows(), modes.len()));
        for (sk, mode) in modes.iter().enumerate() {
            v.column_mut(sk).assign(&Self::ortho_basis_ij(
                points.column(0),
                points.column(1),
                mode[0],
                mode[1],
            ));
        }
        v
    }
}
