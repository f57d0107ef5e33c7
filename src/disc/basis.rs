use std::fmt;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, array, s};
use statrs::function::gamma::gamma;

use crate::disc::linalg;
use crate::error::Result;

pub mod hexahedron;
pub mod quadrilateral;
pub mod tetrahedron;
pub mod triangle;

use hexahedron::HexahedronBasis;
use quadrilateral::QuadrilateralBasis;
use tetrahedron::TetrahedronBasis;
use triangle::TriangleBasis;

/// Orthonormal modal basis plus nodal set of one reference element.
///
/// `mode_indices` fixes the canonical order of the modal coefficients: the
/// column order of `vandermonde` and the enumeration walked by the mode
/// mappers are the same list.
pub trait Basis {
    fn mode_indices(n: usize) -> Vec<[usize; 3]>;
    /// Reference node coordinates, one row per node.
    fn nodes(n: usize) -> Result<Array2<f64>>;
    fn vandermonde(n: usize, points: ArrayView2<f64>) -> Array2<f64>;

    fn vandermonde1d(n: usize, r: ArrayView1<f64>) -> Array2<f64> {
        let mut v = Array2::<f64>::zeros((r.len(), n + 1));
        for j in 0..n + 1 {
            v.column_mut(j)
                .assign(&Self::jacobi_polynomial(r, 0.0, 0.0, j));
        }
        v
    }
    /// Gauss-Jacobi points and weights, `n + 1` of them.
    fn jacobi_gauss_quadrature(alpha: f64, beta: f64, n: usize) -> (Array1<f64>, Array1<f64>) {
        if n == 0 {
            let x0 = (beta - alpha) / (alpha + beta + 2.0);
            let w0 = 2.0_f64.powf(alpha + beta + 1.0) * gamma(alpha + 1.0) * gamma(beta + 1.0)
                / gamma(alpha + beta + 2.0);
            return (array![x0], array![w0]);
        }
        let dim = n + 1;
        let mut j = Array2::<f64>::zeros((dim, dim));
        let h1 = Array1::from_iter((0..dim).map(|k| 2.0 * k as f64 + alpha + beta));
        for k in 0..dim {
            j[[k, k]] = -(alpha.powi(2) - beta.powi(2)) / (h1[k] * (h1[k] + 2.0));
        }
        if (alpha + beta).abs() < 10.0 * f64::EPSILON {
            j[[0, 0]] = 0.0;
        }
        for k in 0..dim - 1 {
            let l = k as f64 + 1.0;
            let numerator = l * (l + alpha + beta) * (l + alpha) * (l + beta);
            let denominator = (h1[k] + 1.0) * (h1[k] + 3.0);
            let off_diag = (2.0 / (h1[k] + 2.0)) * (numerator / denominator).sqrt();
            j[[k, k + 1]] = off_diag;
            j[[k + 1, k]] = off_diag;
        }
        let (points, vectors) = linalg::symmetric_eigen(j.view());
        let mu_0 = 2.0_f64.powf(alpha + beta + 1.0) * gamma(alpha + 1.0) * gamma(beta + 1.0)
            / gamma(alpha + beta + 2.0);
        let weights = vectors.row(0).mapv(|v| v.powi(2) * mu_0);
        (points, weights)
    }
    /// Gauss-Lobatto-Jacobi points, `n + 1` of them; a single midpoint for `n = 0`.
    fn jacobi_gauss_lobatto(alpha: f64, beta: f64, n: usize) -> Array1<f64> {
        match n {
            0 => array![0.0],
            1 => array![-1.0, 1.0],
            n => {
                let (interior, _) = Self::jacobi_gauss_quadrature(alpha + 1.0, beta + 1.0, n - 2);
                let mut x = Array1::<f64>::zeros(n + 1);
                x[0] = -1.0;
                x[n] = 1.0;
                x.slice_mut(s![1..n]).assign(&interior);
                x
            }
        }
    }
    /// Orthonormal Jacobi polynomial `P_n^(alpha, beta)` evaluated at `x`.
    fn jacobi_polynomial(x: ArrayView1<f64>, alpha: f64, beta: f64, n: usize) -> Array1<f64> {
        let gamma0 = 2.0_f64.powf(alpha + beta + 1.0) / (alpha + beta + 1.0)
            * gamma(alpha + 1.0)
            * gamma(beta + 1.0)
            / gamma(alpha + beta + 1.0);
        let p0 = Array1::from_elem(x.len(), 1.0 / gamma0.sqrt());
        if n == 0 {
            return p0;
        }
        let gamma1 = (alpha + 1.0) * (beta + 1.0) / (alpha + beta + 3.0) * gamma0;
        let mut p1 = ((alpha + beta + 2.0) * 0.5 * &x + (alpha - beta) * 0.5) / gamma1.sqrt();
        let mut p_prev = p0;
        let mut a_old = 2.0 / (2.0 + alpha + beta)
            * ((alpha + 1.0) * (beta + 1.0) / (alpha + beta + 3.0)).sqrt();
        for i in 1..n {
            let i_f = i as f64;
            let h1 = 2.0 * i_f + alpha + beta;
            let a_new = 2.0 / (h1 + 2.0)
                * ((i_f + 1.0) * (i_f + 1.0 + alpha + beta) * (i_f + 1.0 + alpha)
                    * (i_f + 1.0 + beta)
                    / (h1 + 1.0)
                    / (h1 + 3.0))
                    .sqrt();
            let b_new = -(alpha.powi(2) - beta.powi(2)) / h1 / (h1 + 2.0);
            let p_next = (-a_old * &p_prev + (&x - b_new) * &p1) / a_new;
            p_prev = std::mem::replace(&mut p1, p_next);
            a_old = a_new;
        }
        p1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Hexahedron,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Triangle => "triangle",
            Self::Quadrilateral => "quadrilateral",
            Self::Tetrahedron => "tetrahedron",
            Self::Hexahedron => "hexahedron",
        };
        write!(f, "{name}")
    }
}

impl ElementType {
    pub fn dim(self) -> usize {
        match self {
            Self::Triangle | Self::Quadrilateral => 2,
            Self::Tetrahedron | Self::Hexahedron => 3,
        }
    }
    pub fn is_simplex(self) -> bool {
        matches!(self, Self::Triangle | Self::Tetrahedron)
    }
    pub fn nverts(self) -> usize {
        match self {
            Self::Triangle => 3,
            Self::Quadrilateral | Self::Tetrahedron => 4,
            Self::Hexahedron => 8,
        }
    }
    pub fn nfaces(self) -> usize {
        match self {
            Self::Triangle => 3,
            Self::Quadrilateral | Self::Tetrahedron => 4,
            Self::Hexahedron => 6,
        }
    }
    pub fn np(self, n: usize) -> usize {
        match self {
            Self::Triangle => (n + 1) * (n + 2) / 2,
            Self::Quadrilateral => (n + 1).pow(2),
            Self::Tetrahedron => (n + 1) * (n + 2) * (n + 3) / 6,
            Self::Hexahedron => (n + 1).pow(3),
        }
    }
    pub fn nfp(self, n: usize) -> usize {
        match self {
            Self::Triangle | Self::Quadrilateral => n + 1,
            Self::Tetrahedron => (n + 1) * (n + 2) / 2,
            Self::Hexahedron => (n + 1).pow(2),
        }
    }
    /// Polynomial order bucket of one mode: total order on simplices, largest
    /// directional order on tensor-product elements.
    pub fn mode_order(self, mode: [usize; 3]) -> usize {
        if self.is_simplex() {
            mode[0] + mode[1] + mode[2]
        } else {
            mode[0].max(mode[1]).max(mode[2])
        }
    }
    pub fn ref_vertices(self) -> Vec<[f64; 3]> {
        match self {
            Self::Triangle => vec![[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [-1.0, 1.0, 0.0]],
            Self::Quadrilateral => vec![
                [-1.0, -1.0, 0.0],
                [1.0, -1.0, 0.0],
                [1.0, 1.0, 0.0],
                [-1.0, 1.0, 0.0],
            ],
            Self::Tetrahedron => vec![
                [-1.0, -1.0, -1.0],
                [1.0, -1.0, -1.0],
                [-1.0, 1.0, -1.0],
                [-1.0, -1.0, 1.0],
            ],
            Self::Hexahedron => vec![
                [-1.0, -1.0, -1.0],
                [1.0, -1.0, -1.0],
                [1.0, 1.0, -1.0],
                [-1.0, 1.0, -1.0],
                [-1.0, -1.0, 1.0],
                [1.0, -1.0, 1.0],
                [1.0, 1.0, 1.0],
                [-1.0, 1.0, 1.0],
            ],
        }
    }
    /// Local vertices of each face. 2D faces run counter-clockwise around the
    /// element.
    pub fn face_vertices(self) -> Vec<Vec<usize>> {
        match self {
            Self::Triangle => vec![vec![0, 1], vec![1, 2], vec![2, 0]],
            Self::Quadrilateral => vec![vec![0, 1], vec![1, 2], vec![2, 3], vec![3, 0]],
            Self::Tetrahedron => vec![
                vec![0, 1, 2],
                vec![0, 1, 3],
                vec![1, 2, 3],
                vec![0, 2, 3],
            ],
            Self::Hexahedron => vec![
                vec![0, 1, 2, 3],
                vec![0, 1, 5, 4],
                vec![1, 2, 6, 5],
                vec![2, 3, 7, 6],
                vec![3, 0, 4, 7],
                vec![4, 5, 6, 7],
            ],
        }
    }
    /// Linear (multilinear for tensor elements) vertex shape functions.
    pub fn vertex_shape_functions(self, r: [f64; 3]) -> Vec<f64> {
        match self {
            Self::Triangle => vec![-0.5 * (r[0] + r[1]), 0.5 * (1.0 + r[0]), 0.5 * (1.0 + r[1])],
            Self::Tetrahedron => vec![
                -0.5 * (1.0 + r[0] + r[1] + r[2]),
                0.5 * (1.0 + r[0]),
                0.5 * (1.0 + r[1]),
                0.5 * (1.0 + r[2]),
            ],
            Self::Quadrilateral | Self::Hexahedron => {
                let dim = self.dim();
                self.ref_vertices()
                    .iter()
                    .map(|v| (0..dim).map(|d| 0.5 * (1.0 + v[d] * r[d])).product())
                    .collect()
            }
        }
    }
    pub fn mode_indices(self, n: usize) -> Vec<[usize; 3]> {
        match self {
            Self::Triangle => TriangleBasis::mode_indices(n),
            Self::Quadrilateral => QuadrilateralBasis::mode_indices(n),
            Self::Tetrahedron => TetrahedronBasis::mode_indices(n),
            Self::Hexahedron => HexahedronBasis::mode_indices(n),
        }
    }
    pub fn nodes(self, n: usize) -> Result<Array2<f64>> {
        match self {
            Self::Triangle => TriangleBasis::nodes(n),
            Self::Quadrilateral => QuadrilateralBasis::nodes(n),
            Self::Tetrahedron => TetrahedronBasis::nodes(n),
            Self::Hexahedron => HexahedronBasis::nodes(n),
        }
    }
    pub fn vandermonde(self, n: usize, points: ArrayView2<f64>) -> Array2<f64> {
        match self {
            Self::Triangle => TriangleBasis::vandermonde(n, points),
            Self::Quadrilateral => QuadrilateralBasis::vandermonde(n, points),
            Self::Tetrahedron => TetrahedronBasis::vandermonde(n, points),
            Self::Hexahedron => HexahedronBasis::vandermonde(n, points),
        }
    }
}

/// Nodal reference element of a given type and degree.
#[derive(Clone, Debug)]
pub struct ReferenceElement {
    pub element_type: ElementType,
    pub n: usize,
    pub np: usize,
    /// Node coordinates, one row per node and one column per dimension.
    pub nodes: Array2<f64>,
    pub modes: Vec<[usize; 3]>,
    pub vandermonde: Array2<f64>,
    pub inv_vandermonde: Array2<f64>,
    pub mass: Array2<f64>,
    /// Nodes on each face; for 2D elements ordered along the face direction.
    pub face_nodes: Vec<Vec<usize>>,
    /// Node sitting on each reference vertex (node 0 when `n == 0`).
    pub vertex_nodes: Vec<usize>,
}

impl ReferenceElement {
    pub fn new(element_type: ElementType, n: usize) -> Result<Self> {
        let nodes = element_type.nodes(n)?;
        let vandermonde = element_type.vandermonde(n, nodes.view());
        let inv_vandermonde = linalg::inverse(vandermonde.view(), "inverse vandermonde")?;
        let mass = linalg::inverse(vandermonde.dot(&vandermonde.t()).view(), "mass matrix")?;
        let face_nodes = Self::find_face_nodes(element_type, nodes.view());
        let vertex_nodes = Self::find_vertex_nodes(element_type, nodes.view());
        Ok(Self {
            element_type,
            n,
            np: nodes.nrows(),
            nodes,
            modes: element_type.mode_indices(n),
            vandermonde,
            inv_vandermonde,
            mass,
            face_nodes,
            vertex_nodes,
        })
    }
    pub fn dim(&self) -> usize {
        self.element_type.dim()
    }
    pub fn node(&self, i: usize) -> [f64; 3] {
        let mut x = [0.0; 3];
        for d in 0..self.dim() {
            x[d] = self.nodes[[i, d]];
        }
        x
    }
    fn find_face_nodes(element_type: ElementType, nodes: ArrayView2<f64>) -> Vec<Vec<usize>> {
        let node_tol = 1.0e-10;
        let verts = element_type.ref_vertices();
        let dim = element_type.dim();
        let point = |i: usize| -> [f64; 3] {
            let mut x = [0.0; 3];
            for d in 0..dim {
                x[d] = nodes[[i, d]];
            }
            x
        };
        element_type
            .face_vertices()
            .iter()
            .map(|fv| {
                let a = verts[fv[0]];
                let b = verts[fv[1]];
                let normal = if dim == 2 {
                    [b[1] - a[1], a[0] - b[0], 0.0]
                } else {
                    let c = verts[fv[2]];
                    cross(sub(b, a), sub(c, a))
                };
                let mut on_face: Vec<usize> = (0..nodes.nrows())
                    .filter(|&i| dot(normal, sub(point(i), a)).abs() < node_tol)
                    .collect();
                if dim == 2 {
                    on_face.sort_by(|&i, &j| {
                        norm(sub(point(i), a)).total_cmp(&norm(sub(point(j), a)))
                    });
                }
                on_face
            })
            .collect()
    }
    fn find_vertex_nodes(element_type: ElementType, nodes: ArrayView2<f64>) -> Vec<usize> {
        let dim = element_type.dim();
        element_type
            .ref_vertices()
            .iter()
            .map(|v| {
                (0..nodes.nrows())
                    .find(|&i| (0..dim).all(|d| (nodes[[i, d]] - v[d]).abs() < 1.0e-10))
                    .unwrap_or(0)
            })
            .collect()
    }
}

pub(crate) fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}
pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
pub(crate) fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}
pub(crate) fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_jacobi_orthonormal() {
        let (x, w) = TriangleBasis::jacobi_gauss_quadrature(0.0, 0.0, 6);
        for m in 0..5 {
            for k in 0..5 {
                let pm = TriangleBasis::jacobi_polynomial(x.view(), 0.0, 0.0, m);
                let pk = TriangleBasis::jacobi_polynomial(x.view(), 0.0, 0.0, k);
                let ip = (&pm * &pk * &w).sum();
                let expected = if m == k { 1.0 } else { 0.0 };
                assert_relative_eq!(ip, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_gauss_jacobi_weight_sum() {
        let (_, w) = TriangleBasis::jacobi_gauss_quadrature(1.0, 0.0, 4);
        assert_relative_eq!(w.sum(), 2.0, epsilon = 1e-12);
        let (x, _) = TriangleBasis::jacobi_gauss_quadrature(0.0, 0.0, 0);
        assert_relative_eq!(x[0], 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_gauss_jacobi_skewed_weight_moments() {
        // integral of (1 - x) x and (1 + x) x over [-1, 1]
        let (x, w) = TriangleBasis::jacobi_gauss_quadrature(1.0, 0.0, 2);
        assert_relative_eq!((&x * &w).sum(), -2.0 / 3.0, epsilon = 1e-12);
        let (x, w) = TriangleBasis::jacobi_gauss_quadrature(0.0, 1.0, 2);
        assert_relative_eq!((&x * &w).sum(), 2.0 / 3.0, epsilon = 1e-12);
        // (1 - x)^2 weight, exact up to degree 2n + 1 = 5
        let (x, w) = TriangleBasis::jacobi_gauss_quadrature(2.0, 0.0, 2);
        let integral: f64 = x.iter().zip(w.iter()).map(|(x, w)| w * x.powi(4)).sum();
        assert_relative_eq!(integral, 2.0 / 5.0 + 2.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_node_counts_and_mass() {
        for element_type in [
            ElementType::Triangle,
            ElementType::Quadrilateral,
            ElementType::Tetrahedron,
            ElementType::Hexahedron,
        ] {
            for n in 0..4 {
                let reference = ReferenceElement::new(element_type, n).unwrap();
                assert_eq!(reference.np, element_type.np(n));
                assert_eq!(reference.modes.len(), element_type.np(n));
                let measure = reference.mass.sum();
                let expected = match element_type {
                    ElementType::Triangle => 2.0,
                    ElementType::Quadrilateral => 4.0,
                    ElementType::Tetrahedron => 4.0 / 3.0,
                    ElementType::Hexahedron => 8.0,
                };
                assert_relative_eq!(measure, expected, epsilon = 1e-10);
                if n > 0 {
                    for face in &reference.face_nodes {
                        assert_eq!(face.len(), element_type.nfp(n));
                    }
                }
            }
        }
    }

    #[test]
    fn test_vertex_shape_partition_of_unity() {
        for element_type in [ElementType::Quadrilateral, ElementType::Tetrahedron] {
            let phi = element_type.vertex_shape_functions([0.1, -0.3, -0.2]);
            assert_relative_eq!(phi.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
        }
    }
}
