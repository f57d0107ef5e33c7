use ndarray::{Array2, ArrayView2};

use crate::disc::basis::Basis;
use crate::error::Result;

/// Tensor Legendre basis on the cube [-1, 1]^3 with Gauss-Lobatto nodes.
pub struct HexahedronBasis;

impl Basis for HexahedronBasis {
    fn mode_indices(n: usize) -> Vec<[usize; 3]> {
        let mut modes = Vec::with_capacity((n + 1).pow(3));
        for i in 0..n + 1 {
            for j in 0..n + 1 {
                for k in 0..n + 1 {
                    modes.push([i, j, k]);
                }
            }
        }
        modes
    }
    fn nodes(n: usize) -> Result<Array2<f64>> {
        let zeta = Self::jacobi_gauss_lobatto(0.0, 0.0, n);
        let n_pts_1d = n + 1;
        let mut nodes = Array2::<f64>::zeros((n_pts_1d.pow(3), 3));
        let mut sk = 0;
        for k in 0..n_pts_1d {
            for j in 0..n_pts_1d {
                for i in 0..n_pts_1d {
                    nodes[[sk, 0]] = zeta[i];
                    nodes[[sk, 1]] = zeta[j];
                    nodes[[sk, 2]] = zeta[k];
                    sk += 1;
                }
            }
        }
        Ok(nodes)
    }
    fn vandermonde(n: usize, points: ArrayView2<f64>) -> Array2<f64> {
        let p_r: Vec<_> = (0..n + 1)
            .map(|i| Self::jacobi_polynomial(points.column(0), 0.0, 0.0, i))
            .collect();
        let p_s: Vec<_> = (0..n + 1)
            .map(|j| Self::jacobi_polynomial(points.column(1), 0.0, 0.0, j))
            .collect();
        let p_t: Vec<_> = (0..n + 1)
            .map(|k| Self::jacobi_polynomial(points.column(2), 0.0, 0.0, k))
            .collect();
        let modes = Self::mode_indices(n);
        let mut v = Array2::zeros((points.nrows(), modes.len()));
        for (sk, &[i, j, k]) in modes.iter().enumerate() {
            v.column_mut(sk).assign(&(&p_r[i] * &p_s[j] * &p_t[k]));
        }
        v
    }
}
