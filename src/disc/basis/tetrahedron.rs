use ndarray::{Array1, Array2, ArrayView1, ArrayView2, array};

use crate::disc::basis::Basis;
use crate::error::Result;

/// Orthonormal simplex basis on the tetrahedron with vertices (-1,-1,-1),
/// (1,-1,-1), (-1,1,-1), (-1,-1,1). Nodes are equispaced.
pub struct TetrahedronBasis;

impl TetrahedronBasis {
    fn rst_to_abc(
        r: ArrayView1<f64>,
        s: ArrayView1<f64>,
        t: ArrayView1<f64>,
    ) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
        let np = r.len();
        let mut a = Array1::<f64>::zeros(np);
        let mut b = Array1::<f64>::zeros(np);
        for i in 0..np {
            a[i] = if (s[i] + t[i]).abs() > 1.0e-12 {
                2.0 * (1.0 + r[i]) / (-s[i] - t[i]) - 1.0
            } else {
                -1.0
            };
            b[i] = if (1.0 - t[i]).abs() > 1.0e-12 {
                2.0 * (1.0 + s[i]) / (1.0 - t[i]) - 1.0
            } else {
                -1.0
            };
        }
        (a, b, t.to_owned())
    }
    fn simplex3d_polynomial(
        a: ArrayView1<f64>,
        b: ArrayView1<f64>,
        c: ArrayView1<f64>,
        i: usize,
        j: usize,
        k: usize,
    ) -> Array1<f64> {
        let h1 = Self::jacobi_polynomial(a, 0.0, 0.0, i);
        let h2 = Self::jacobi_polynomial(b, 2.0 * i as f64 + 1.0, 0.0, j);
        let h3 = Self::jacobi_polynomial(c, 2.0 * (i + j) as f64 + 2.0, 0.0, k);
        2.0 * 2.0_f64.sqrt()
            * &h1
            * &h2
            * (1.0 - &b).powi(i as i32)
            * &h3
            * (1.0 - &c).powi((i + j) as i32)
    }
}

impl Basis for TetrahedronBasis {
    fn mode_indices(n: usize) -> Vec<[usize; 3]> {
        let mut modes = Vec::with_capacity((n + 1) * (n + 2) * (n + 3) / 6);
        for i in 0..n + 1 {
            for j in 0..n + 1 - i {
                for k in 0..n + 1 - i - j {
                    modes.push([i, j, k]);
                }
            }
        }
        modes
    }
    fn nodes(n: usize) -> Result<Array2<f64>> {
        if n == 0 {
            return Ok(array![[-0.5, -0.5, -0.5]]);
        }
        let np = (n + 1) * (n + 2) * (n + 3) / 6;
        let mut nodes = Array2::<f64>::zeros((np, 3));
        let mut sk = 0;
        for i in 0..n + 1 {
            for m in 0..n + 1 - i {
                for q in 0..n + 1 - i - m {
                    nodes[[sk, 0]] = -1.0 + 2.0 * q as f64 / n as f64;
                    nodes[[sk, 1]] = -1.0 + 2.0 * m as f64 / n as f64;
                    nodes[[sk, 2]] = -1.0 + 2.0 * i as f64 / n as f64;
                    sk += 1;
                }
            }
        }
        Ok(nodes)
    }
    fn vandermonde(n: usize, points: ArrayView2<f64>) -> Array2<f64> {
        let (a, b, c) = Self::rst_to_abc(points.column(0), points.column(1), points.column(2));
        let modes = Self::mode_indices(n);
        let mut v = Array2::<f64>::zeros((points.nrows(), modes.len()));
        for (sk, &[i, j, k]) in modes.iter().enumerate() {
            v.column_mut(sk).assign(&Self::simplex3d_polynomial(
                a.view(),
                b.view(),
                c.view(),
                i,
                j,
                k,
            ));
        }
        v
    }
}
