use std::f64::consts::PI;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, array};

use crate::disc::{basis::Basis, linalg};
use crate::error::Result;

/// Dubiner basis on the triangle (-1,-1), (1,-1), (-1,1).
pub struct TriangleBasis;

impl TriangleBasis {
    fn rs_to_ab(r: ArrayView1<f64>, s: ArrayView1<f64>) -> (Array1<f64>, Array1<f64>) {
        let a = r
            .iter()
            .zip(s.iter())
            .map(|(&r_val, &s_val)| {
                if (1.0 - s_val).abs() > 1.0e-12 {
                    2.0 * (1.0 + r_val) / (1.0 - s_val) - 1.0
                } else {
                    -1.0
                }
            })
            .collect::<Array1<f64>>();
        (a, s.to_owned())
    }
    fn dubiner_basis(a: ArrayView1<f64>, b: ArrayView1<f64>, i: usize, j: usize) -> Array1<f64> {
        2.0_f64.sqrt()
            * Self::jacobi_polynomial(a, 0.0, 0.0, i)
            * Self::jacobi_polynomial(b, 2.0 * i as f64 + 1.0, 0.0, j)
            * (1.0 - &b).powi(i as i32)
    }
    fn warp_factor(n: usize, r: ArrayView1<f64>) -> Result<Array1<f64>> {
        let lglr = Self::jacobi_gauss_lobatto(0.0, 0.0, n);
        let req = Array1::linspace(-1.0, 1.0, n + 1);
        let veq = Self::vandermonde1d(n, req.view());
        let mut pmat = Array2::<f64>::zeros((n + 1, r.len()));
        for i in 0..n + 1 {
            pmat.row_mut(i)
                .assign(&Self::jacobi_polynomial(r, 0.0, 0.0, i));
        }
        let lmat = linalg::inverse(veq.t(), "warp factor")?.dot(&pmat);
        let warp = lmat.t().dot(&(&lglr - &req));
        let zerof = r.mapv(|x| if x.abs() < 1.0 - 1.0e-10 { 1.0 } else { 0.0 });
        let sf = 1.0 - (&zerof * &r).mapv(|x| x.powi(2));
        Ok(&warp / &sf + &warp * &(zerof - 1.0))
    }
    fn xy_to_rs(x: ArrayView1<f64>, y: ArrayView1<f64>) -> (Array1<f64>, Array1<f64>) {
        let l1 = (3.0_f64.sqrt() * &y + 1.0) / 3.0;
        let l2 = (-3.0 * &x - 3.0_f64.sqrt() * &y + 2.0) / 6.0;
        let l3 = (3.0 * &x - 3.0_f64.sqrt() * &y + 2.0) / 6.0;
        let r = -&l2 + &l3 - &l1;
        let s = -&l2 - &l3 + &l1;
        (r, s)
    }
    /// Warp-and-blend nodes on the equilateral triangle. Node `(i, j)` is
    /// numbered row by row, `i` counting up in `s` and `j` along `r`.
    fn nodes2d(n: usize) -> Result<(Array1<f64>, Array1<f64>)> {
        if n == 0 {
            return Ok((array![0.0], array![0.0]));
        }
        let alpopt = [
            0.0000, 0.0000, 1.4152, 0.1001, 0.2751, 0.9800, 1.0999, 1.2832, 1.3648, 1.4773, 1.4959,
            1.5743, 1.5770, 1.6223, 1.6258,
        ];
        let alpha = if n < 15 { alpopt[n] } else { 5.0 / 3.0 };
        let np = (n + 1) * (n + 2) / 2;

        let mut l1 = Array1::<f64>::zeros(np);
        let mut l2 = Array1::<f64>::zeros(np);
        let mut l3 = Array1::<f64>::zeros(np);
        let mut sk = 0;
        for i in 0..n + 1 {
            for j in 0..n + 1 - i {
                l1[sk] = i as f64 / n as f64;
                l3[sk] = j as f64 / n as f64;
                l2[sk] = 1.0 - l1[sk] - l3[sk];
                sk += 1;
            }
        }
        let x = -&l2 + &l3;
        let y = (-&l2 - &l3 + 2.0 * &l1) / 3.0_f64.sqrt();

        let blend1 = 4.0 * &l2 * &l3;
        let blend2 = 4.0 * &l1 * &l3;
        let blend3 = 4.0 * &l1 * &l2;
        let warpf1 = Self::warp_factor(n, (&l3 - &l2).view())?;
        let warpf2 = Self::warp_factor(n, (&l1 - &l3).view())?;
        let warpf3 = Self::warp_factor(n, (&l2 - &l1).view())?;
        let warp1 = blend1 * warpf1 * (1.0 + (alpha * l1).powi(2));
        let warp2 = blend2 * warpf2 * (1.0 + (alpha * l2).powi(2));
        let warp3 = blend3 * warpf3 * (1.0 + (alpha * l3).powi(2));

        let x = x + &warp1 + (2.0 * PI / 3.0).cos() * &warp2 + (4.0 * PI / 3.0).cos() * &warp3;
        let y = y + (2.0 * PI / 3.0).sin() * &warp2 + (4.0 * PI / 3.0).sin() * &warp3;
        Ok((x, y))
    }
    /// Warp-and-blend nodes mapped to the reference triangle.
    pub fn warp_blend_nodes(n: usize) -> Result<Array2<f64>> {
        let (x, y) = Self::nodes2d(n)?;
        let (r, s) = Self::xy_to_rs(x.view(), y.view());
        Ok(Array2::from_shape_fn((r.len(), 2), |(i, d)| {
            if d == 0 { r[i] } else { s[i] }
        }))
    }
    /// Equispaced nodes in the same row-by-row numbering as [`Self::warp_blend_nodes`].
    pub fn equispaced_nodes(n: usize) -> Array2<f64> {
        if n == 0 {
            return array![[-1.0 / 3.0, -1.0 / 3.0]];
        }
        let mut nodes = Array2::<f64>::zeros(((n + 1) * (n + 2) / 2, 2));
        let mut sk = 0;
        for i in 0..n + 1 {
            for j in 0..n + 1 - i {
                nodes[[sk, 0]] = -1.0 + 2.0 * j as f64 / n as f64;
                nodes[[sk, 1]] = -1.0 + 2.0 * i as f64 / n as f64;
                sk += 1;
            }
        }
        nodes
    }
    /// Collapsed-coordinate Gauss rule exact for polynomials of total degree
    /// `order`. Returns points (rows `r, s`) and weights summing to 2.
    pub fn cubature(order: usize) -> (Array2<f64>, Array1<f64>) {
        let nq = order / 2 + 1;
        let (qa, wa) = Self::jacobi_gauss_quadrature(0.0, 0.0, nq - 1);
        let (qb, wb) = Self::jacobi_gauss_quadrature(1.0, 0.0, nq - 1);
        let mut points = Array2::<f64>::zeros((nq * nq, 2));
        let mut weights = Array1::<f64>::zeros(nq * nq);
        for (ib, (&b, &w_b)) in qb.iter().zip(wb.iter()).enumerate() {
            for (ia, (&a, &w_a)) in qa.iter().zip(wa.iter()).enumerate() {
                let k = ib * nq + ia;
                points[[k, 0]] = 0.5 * (1.0 + a) * (1.0 - b) - 1.0;
                points[[k, 1]] = b;
                weights[k] = 0.5 * w_a * w_b;
            }
        }
        (points, weights)
    }
}

impl Basis for TriangleBasis {
    fn mode_indices(n: usize) -> Vec<[usize; 3]> {
        let mut modes = Vec::with_capacity((n + 1) * (n + 2) / 2);
        for i in 0..n + 1 {
            for j in 0..n + 1 - i {
                modes.push([i, j, 0]);
            }
        }
        modes
    }
    fn nodes(n: usize) -> Result<Array2<f64>> {
        Self::warp_blend_nodes(n)
    }
    fn vandermonde(n: usize, points: ArrayView2<f64>) -> Array2<f64> {
        let (a, b) = Self::rs_to_ab(points.column(0), points.column(1));
        let modes = Self::mode_indices(n);
        let mut v = Array2::<f64>::zeros((points.nrows(), modes.len()));
        for (sk, mode) in modes.iter().enumerate() {
            v.column_mut(sk)
                .assign(&Self::dubiner_basis(a.view(), b.view(), mode[0], mode[1]));
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cubature_integrates_monomials() {
        let (points, weights) = TriangleBasis::cubature(6);
        assert_relative_eq!(weights.sum(), 2.0, epsilon = 1e-12);
        // integral of (1 + r)^2 over the reference triangle is 4/3
        let integral: f64 = points
            .rows()
            .into_iter()
            .zip(weights.iter())
            .map(|(p, w)| w * (1.0 + p[0]).powi(2))
            .sum();
        assert_relative_eq!(integral, 4.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_warp_blend_vertices_and_ordering() {
        let nodes = TriangleBasis::warp_blend_nodes(3).unwrap();
        let equi = TriangleBasis::equispaced_nodes(3);
        assert_eq!(nodes.dim(), equi.dim());
        // first row runs along s = -1, last node is the top vertex
        assert_relative_eq!(nodes[[0, 0]], -1.0, epsilon = 1e-12);
        assert_relative_eq!(nodes[[0, 1]], -1.0, epsilon = 1e-12);
        assert_relative_eq!(nodes[[3, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(nodes[[9, 1]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(equi[[9, 1]], 1.0, epsilon = 1e-12);
    }
}
