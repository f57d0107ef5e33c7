use ndarray::{Array1, Array2, ArrayView1};

use super::minor_grid::{MinorGrid, face_parameter};
use crate::disc::{
    basis::{Basis, ElementType, ReferenceElement, triangle::TriangleBasis},
    linalg,
};
use crate::error::Result;

pub struct SubcellOperators {
    /// Nodal values to subcell averages, `(nsubcells, np)`.
    pub pm: Array2<f64>,
    /// Subcell averages to nodal values, `(np, nsubcells)`.
    pub rm: Array2<f64>,
    /// Face trace to subface averages per DG face, `(ns, nfp)`.
    pub pfm: Vec<Array2<f64>>,
    /// Subface averages to face trace per DG face, `(nfp, ns)`.
    pub rfm: Vec<Array2<f64>>,
    /// Lift of subface fluxes to the volume, `(np, 3 ns)`; column `f * ns + k`
    /// holds subface `k` of DG face `f`.
    pub slift: Array2<f64>,
}

impl SubcellOperators {
    pub fn new(reference: &ReferenceElement, grid: &MinorGrid) -> Result<Self> {
        let pm = Self::volume_projection(reference, grid);
        let rm = linalg::conservative_inverse(
            pm.view(),
            grid.areas.view(),
            reference.mass.view(),
            "subcell reconstruction",
        )?;

        let mut pfm = Vec::with_capacity(3);
        let mut rfm = Vec::with_capacity(3);
        for dg_face in 0..3 {
            let (p, lengths, mass1d) = Self::face_projection(reference, grid, dg_face)?;
            rfm.push(linalg::conservative_inverse(
                p.view(),
                lengths.view(),
                mass1d.view(),
                "subcell face reconstruction",
            )?);
            pfm.push(p);
        }

        let ns = grid.ns;
        let mut e = Array2::<f64>::zeros((reference.np, 3 * ns));
        for (dg_face, p) in pfm.iter().enumerate() {
            for k in 0..ns {
                let (t0, t1) = grid.slot_interval(dg_face, k);
                for (i, &node) in reference.face_nodes[dg_face].iter().enumerate() {
                    e[[node, dg_face * ns + k]] = p[[k, i]] * (t1 - t0);
                }
            }
        }
        let inv_mass = linalg::inverse(reference.mass.view(), "subcell lift")?;
        let slift = inv_mass.dot(&e);
        log::debug!(
            "subcell operators: PM {:?}, RM {:?}, SLIFT {:?}",
            pm.dim(),
            rm.dim(),
            slift.dim()
        );
        Ok(Self {
            pm,
            rm,
            pfm,
            rfm,
            slift,
        })
    }

    /// Averages of every nodal basis function over every subcell.
    fn volume_projection(reference: &ReferenceElement, grid: &MinorGrid) -> Array2<f64> {
        let (points, weights) = TriangleBasis::cubature(reference.n.max(1));
        let mut pm = Array2::<f64>::zeros((grid.nsubcells, reference.np));
        for k in 0..grid.nsubcells {
            let corners: Vec<[f64; 3]> = (0..3).map(|v| grid.vertex(k, v)).collect();
            let mapped = Array2::from_shape_fn((points.nrows(), 2), |(q, d)| {
                ElementType::Triangle
                    .vertex_shape_functions([points[[q, 0]], points[[q, 1]], 0.0])
                    .iter()
                    .zip(corners.iter())
                    .map(|(phi, x)| phi * x[d])
                    .sum()
            });
            let lagrange = TriangleBasis::vandermonde(reference.n, mapped.view())
                .dot(&reference.inv_vandermonde);
            // cubature weights sum to the reference area 2
            pm.row_mut(k).assign(&(weights.dot(&lagrange) / 2.0));
        }
        pm
    }

    /// Subface averages of the 1D face Lagrange basis, the subface lengths in
    /// face parameter units, and the 1D mass matrix of the face nodes.
    fn face_projection(
        reference: &ReferenceElement,
        grid: &MinorGrid,
        dg_face: usize,
    ) -> Result<(Array2<f64>, Array1<f64>, Array2<f64>)> {
        let n = reference.n;
        let t_nodes = Array1::from_iter(
            reference.face_nodes[dg_face]
                .iter()
                .map(|&i| face_parameter(dg_face, reference.node(i))),
        );
        let v1d = TriangleBasis::vandermonde1d(n, t_nodes.view());
        let inv_v1d = linalg::inverse(v1d.view(), "face vandermonde")?;
        let mass1d = linalg::inverse(v1d.dot(&v1d.t()).view(), "face mass matrix")?;

        let (gauss, gauss_w) = TriangleBasis::jacobi_gauss_quadrature(0.0, 0.0, n);
        let mut p = Array2::<f64>::zeros((grid.ns, n + 1));
        let mut lengths = Array1::<f64>::zeros(grid.ns);
        for k in 0..grid.ns {
            let (t0, t1) = grid.slot_interval(dg_face, k);
            let t = gauss.mapv(|x| t0 + 0.5 * (1.0 + x) * (t1 - t0));
            let lagrange = TriangleBasis::vandermonde1d(n, t.view()).dot(&inv_v1d);
            p.row_mut(k).assign(&(gauss_w.dot(&lagrange) / 2.0));
            lengths[k] = t1 - t0;
        }
        Ok((p, lengths, mass1d))
    }

    /// Volume contribution of subface values `flux` laid out like the
    /// columns of `slift`.
    pub fn lift(&self, flux: ArrayView1<f64>) -> Array1<f64> {
        self.slift.dot(&flux)
    }

    /// Face trace on DG face `dg_face` from subface averages given in slot order.
    pub fn reconstruct_trace(&self, dg_face: usize, averages: ArrayView1<f64>) -> Array1<f64> {
        self.rfm[dg_face].dot(&averages)
    }

    pub fn project_trace(&self, dg_face: usize, trace: ArrayView1<f64>) -> Array1<f64> {
        self.pfm[dg_face].dot(&trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stab::settings::SubcellDistribution;
    use approx::assert_relative_eq;

    fn operators(n: usize, ns: usize) -> (ReferenceElement, MinorGrid, SubcellOperators) {
        let reference = ReferenceElement::new(ElementType::Triangle, n).unwrap();
        let grid = MinorGrid::new(ns, SubcellDistribution::Equispaced).unwrap();
        let ops = SubcellOperators::new(&reference, &grid).unwrap();
        (reference, grid, ops)
    }

    #[test]
    fn test_projection_of_polynomials() {
        let (reference, grid, ops) = operators(3, 4);
        for k in 0..grid.nsubcells {
            assert_relative_eq!(ops.pm.row(k).sum(), 1.0, epsilon = 1e-12);
        }
        // averages of r are the subcell centroids
        let r = reference.nodes.column(0).to_owned();
        let averages = ops.pm.dot(&r);
        for k in 0..grid.nsubcells {
            let centroid: f64 = (0..3).map(|v| grid.vertex(k, v)[0]).sum::<f64>() / 3.0;
            assert_relative_eq!(averages[k], centroid, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_round_trips() {
        for (n, ns) in [(2, 2), (3, 3), (3, 5), (4, 4)] {
            let (reference, grid, ops) = operators(n, ns);
            let pm_rm_pm = ops.pm.dot(&ops.rm).dot(&ops.pm);
            for (a, b) in pm_rm_pm.iter().zip(ops.pm.iter()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-10);
            }
            // reconstruction keeps the integral of any set of averages
            let u = Array1::from_iter((0..grid.nsubcells).map(|k| (k as f64).sin() + 2.0));
            let integral = reference.mass.dot(&ops.rm.dot(&u)).sum();
            assert_relative_eq!(integral, grid.areas.dot(&u), epsilon = 1e-10);
            // and constants
            let ones = ops.rm.dot(&Array1::ones(grid.nsubcells));
            assert!(ones.iter().all(|v| (v - 1.0).abs() < 1e-10));
        }
    }

    #[test]
    fn test_face_reconstruction_of_constants() {
        let (_, grid, ops) = operators(3, 4);
        for dg_face in 0..3 {
            let trace = ops.reconstruct_trace(dg_face, Array1::from_elem(grid.ns, 2.5).view());
            assert!(trace.iter().all(|v| (v - 2.5).abs() < 1e-10));
            let averages = ops.project_trace(dg_face, trace.view());
            assert!(averages.iter().all(|v| (v - 2.5).abs() < 1e-10));
        }
    }

    #[test]
    fn test_lift_column_sums() {
        let (reference, grid, ops) = operators(3, 3);
        let mass_lift = reference.mass.dot(&ops.slift);
        for dg_face in 0..3 {
            for k in 0..grid.ns {
                let (t0, t1) = grid.slot_interval(dg_face, k);
                assert_relative_eq!(
                    mass_lift.column(dg_face * grid.ns + k).sum(),
                    t1 - t0,
                    epsilon = 1e-10
                );
            }
        }
        let lifted = ops.lift(Array1::ones(3 * grid.ns).view());
        assert_relative_eq!(reference.mass.dot(&lifted).sum(), 6.0, epsilon = 1e-10);
    }
}
