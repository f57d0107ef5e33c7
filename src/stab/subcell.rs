use ndarray::{Array1, Array3, ArrayView3, ArrayViewMut3, s};

use super::Stabilizer;
use crate::disc::{basis::ElementType, mesh::Mesh};
use crate::error::{Result, StabError};
use crate::stab::{detector::Detection, settings::SubcellDistribution, types::CellMode};

pub mod connect;
pub mod flux;
pub mod minor_grid;
pub mod operators;

use connect::{SubcellConnectivity, SubcellGeometry, SubcellLink};
use flux::SubcellFlux;
use minor_grid::MinorGrid;
use operators::SubcellOperators;

pub struct Subcell {
    pub grid: MinorGrid,
    pub operators: SubcellOperators,
    pub geometry: SubcellGeometry,
    pub connectivity: SubcellConnectivity,
    flux: Box<dyn SubcellFlux>,
    /// Subcell averages, `(ntotal, s_nfields, nsubcells)`.
    sq: Array3<f64>,
    /// Subface averages of the DG traces, `(ntotal, s_nfields, 3 ns)`.
    sface: Array3<f64>,
    /// Face traces reconstructed from finite-volume neighbors,
    /// `(nelements, s_nfields, 3 nfp)`; zero on other faces.
    face_trace: Array3<f64>,
    /// Finite-volume update of the subcell averages, `(nelements, s_nfields, nsubcells)`.
    rhs_fv: Array3<f64>,
}

impl Subcell {
    pub fn new(
        mesh: &Mesh,
        s_nfields: usize,
        ns: usize,
        distribution: SubcellDistribution,
        tolerance: f64,
        flux: Box<dyn SubcellFlux>,
    ) -> Result<Self> {
        if mesh.element_type != ElementType::Triangle {
            return Err(StabError::unsupported("subcell", mesh.element_type));
        }
        let n = mesh.n();
        if n == 0 {
            return Err(StabError::Unsupported {
                stab: "subcell",
                context: "piecewise-constant elements".to_string(),
            });
        }
        if ns < n {
            return Err(StabError::invalid_setting(
                "SUBCELL NUMBER",
                ns,
                format!("Subcell number can not be less than N = {n}"),
            ));
        }
        let grid = MinorGrid::new(ns, distribution)?;
        let operators = SubcellOperators::new(&mesh.reference, &grid)?;
        let geometry = SubcellGeometry::new(mesh, &grid);
        let connectivity = SubcellConnectivity::new(mesh, &grid, &geometry, tolerance)?;
        let nsub = grid.nsubcells;
        let nfp = mesh.element_type.nfp(n);
        log::info!(
            "subcell: {nsub} subcells per element ({distribution:?}), {} elements",
            mesh.nelements
        );
        Ok(Self {
            grid,
            operators,
            geometry,
            connectivity,
            flux,
            sq: Array3::zeros((mesh.ntotal(), s_nfields, nsub)),
            sface: Array3::zeros((mesh.ntotal(), s_nfields, 3 * ns)),
            face_trace: Array3::zeros((mesh.nelements, s_nfields, 3 * nfp)),
            rhs_fv: Array3::zeros((mesh.nelements, s_nfields, nsub)),
        })
    }
    pub fn ns(&self) -> usize {
        self.grid.ns
    }
    pub fn nsubcells(&self) -> usize {
        self.grid.nsubcells
    }
    pub fn sq(&self) -> ArrayView3<'_, f64> {
        self.sq.view()
    }
    pub fn sface(&self) -> ArrayView3<'_, f64> {
        self.sface.view()
    }
    pub fn face_trace(&self) -> ArrayView3<'_, f64> {
        self.face_trace.view()
    }
    pub fn rhs_fv(&self) -> ArrayView3<'_, f64> {
        self.rhs_fv.view()
    }

    fn project_fv(&mut self, mesh: &Mesh, q: ArrayView3<f64>) {
        for e in 0..mesh.nelements {
            for fld in 0..self.sq.shape()[1] {
                let averages: Array1<f64> = self.operators.pm.dot(&q.slice(s![e, fld, ..]));
                self.sq.slice_mut(s![e, fld, ..]).assign(&averages);
            }
        }
    }
    fn project_dg(&mut self, mesh: &Mesh, q: ArrayView3<f64>) {
        let ns = self.grid.ns;
        for e in 0..mesh.nelements {
            for fld in 0..self.sface.shape()[1] {
                for (f, face_nodes) in mesh.reference.face_nodes.iter().enumerate() {
                    let trace = Array1::from_iter(face_nodes.iter().map(|&i| q[[e, fld, i]]));
                    let averages = self.operators.project_trace(f, trace.view());
                    self.sface
                        .slice_mut(s![e, fld, f * ns..(f + 1) * ns])
                        .assign(&averages);
                }
            }
        }
    }
    /// Traces of DG elements on faces shared with finite-volume neighbors.
    fn reconstruct_face(&mut self, mesh: &Mesh, detection: &Detection) {
        let s_nfields = self.face_trace.shape()[1];
        let nfp = mesh.element_type.nfp(mesh.n());
        self.face_trace.fill(0.0);
        for e in 0..mesh.nelements {
            for fld in 0..s_nfields {
                if detection.mode(e, fld, s_nfields) != CellMode::DgFv {
                    continue;
                }
                for f in 0..mesh.nfaces() {
                    let e_p = mesh.e_to_e[[e, f]];
                    if mesh.is_boundary_face(e, f)
                        || detection.mode(e_p, fld, s_nfields) != CellMode::Fv
                    {
                        continue;
                    }
                    let averages = Array1::from_iter(self.grid.face_subcells[f].iter().map(
                        |&(k, lf)| match self.connectivity.links[[e, k, lf]] {
                            SubcellLink::Element { elem, subcell, .. } => {
                                self.sq[[elem, fld, subcell]]
                            }
                            _ => self.sq[[e, fld, k]],
                        },
                    ));
                    let trace = self.operators.reconstruct_trace(f, averages.view());
                    self.face_trace
                        .slice_mut(s![e, fld, f * nfp..(f + 1) * nfp])
                        .assign(&trace);
                }
            }
        }
    }
    fn subcell_compute(&mut self, mesh: &Mesh, detection: &Detection) {
        let s_nfields = self.rhs_fv.shape()[1];
        let ns = self.grid.ns;
        self.rhs_fv.fill(0.0);
        for e in 0..mesh.nelements {
            for fld in 0..s_nfields {
                if detection.mode(e, fld, s_nfields) != CellMode::Fv {
                    continue;
                }
                for k in 0..self.grid.nsubcells {
                    let u_m = self.sq[[e, fld, k]];
                    let mut surface = 0.0;
                    for lf in 0..3 {
                        let face = self.geometry.faces[[e, k, lf]];
                        let flux = match self.connectivity.links[[e, k, lf]] {
                            SubcellLink::Interior { subcell, .. } => self.flux.flux(
                                u_m,
                                self.sq[[e, fld, subcell]],
                                face.normal,
                                face.center,
                            ),
                            SubcellLink::Element {
                                elem,
                                subcell,
                                dg_face,
                                slot,
                                ..
                            } => {
                                let u_p = if detection.mode(elem, fld, s_nfields) == CellMode::Fv {
                                    self.sq[[elem, fld, subcell]]
                                } else {
                                    self.sface[[elem, fld, dg_face * ns + slot]]
                                };
                                self.flux.flux(u_m, u_p, face.normal, face.center)
                            }
                            SubcellLink::Boundary => {
                                self.flux.boundary_flux(u_m, face.normal, face.center)
                            }
                        };
                        surface += face.length * flux;
                    }
                    self.rhs_fv[[e, fld, k]] = -surface / self.geometry.areas[[e, k]];
                }
            }
        }
    }
    fn reconstruct_dg(&self, mesh: &Mesh, detection: &Detection, mut rhs: ArrayViewMut3<f64>) {
        let s_nfields = self.rhs_fv.shape()[1];
        for e in 0..mesh.nelements {
            for fld in 0..s_nfields {
                if detection.mode(e, fld, s_nfields) == CellMode::Fv {
                    let nodal: Array1<f64> =
                        self.operators.rm.dot(&self.rhs_fv.slice(s![e, fld, ..]));
                    rhs.slice_mut(s![e, fld, ..]).assign(&nodal);
                }
            }
        }
    }
}

fn exchange_start(mesh: &Mesh, buf: &mut Array3<f64>) {
    let nentries = buf.shape()[1] * buf.shape()[2];
    if let Some(slice) = buf.as_slice_mut() {
        mesh.halo.exchange_start(slice, nentries);
    }
}

fn exchange_finish(mesh: &Mesh, buf: &mut Array3<f64>) {
    let nentries = buf.shape()[1] * buf.shape()[2];
    if let Some(slice) = buf.as_slice_mut() {
        mesh.halo.exchange_finish(slice, nentries);
    }
}

impl Stabilizer for Subcell {
    fn name(&self) -> &'static str {
        "subcell"
    }
    fn apply(
        &mut self,
        mesh: &Mesh,
        detection: &Detection,
        q: ArrayViewMut3<f64>,
        rhs: ArrayViewMut3<f64>,
        _time: f64,
    ) -> Result<()> {
        let q = q.view();
        self.project_fv(mesh, q);
        exchange_start(mesh, &mut self.sq);
        // trace projection overlaps the average exchange
        self.project_dg(mesh, q);
        exchange_finish(mesh, &mut self.sq);
        exchange_start(mesh, &mut self.sface);
        exchange_finish(mesh, &mut self.sface);

        self.reconstruct_face(mesh, detection);
        self.subcell_compute(mesh, detection);
        self.reconstruct_dg(mesh, detection, rhs);
        Ok(())
    }
    fn subcell(&self) -> Option<&Subcell> {
        Some(self)
    }
}
