use ndarray::{Array2, Array3, s};

use super::minor_grid::MinorGrid;
use crate::disc::{geometric::Geometric2D, mesh::Mesh};
use crate::error::{Result, StabError};

#[derive(Clone, Copy, Debug, Default)]
pub struct SubcellFace {
    /// Outward unit normal.
    pub normal: [f64; 2],
    pub length: f64,
    pub center: [f64; 2],
}

/// Physical areas and face records of every subcell of every element.
pub struct SubcellGeometry {
    /// Shape `(nelements, nsubcells)`.
    pub areas: Array2<f64>,
    /// Shape `(nelements, nsubcells, 3)`.
    pub faces: Array3<SubcellFace>,
}

impl Geometric2D for SubcellGeometry {}

impl SubcellGeometry {
    pub fn new(mesh: &Mesh, grid: &MinorGrid) -> Self {
        let mut areas = Array2::<f64>::zeros((mesh.nelements, grid.nsubcells));
        let mut faces = Array3::from_elem((mesh.nelements, grid.nsubcells, 3), SubcellFace::default());
        for e in 0..mesh.nelements {
            for k in 0..grid.nsubcells {
                let x: Vec<[f64; 3]> = (0..3)
                    .map(|v| mesh.map_to_physical(e, grid.vertex(k, v)))
                    .collect();
                let xs: Vec<f64> = x.iter().map(|p| p[0]).collect();
                let ys: Vec<f64> = x.iter().map(|p| p[1]).collect();
                areas[[e, k]] = Self::compute_signed_area(&xs, &ys);
                for f in 0..3 {
                    let (a, b) = (x[f], x[(f + 1) % 3]);
                    faces[[e, k, f]] = SubcellFace {
                        // counter-clockwise vertices give an outward right-hand normal
                        normal: Self::compute_normal(a[0], a[1], b[0], b[1]),
                        length: Self::compute_edge_length(a[0], a[1], b[0], b[1]),
                        center: [0.5 * (a[0] + b[0]), 0.5 * (a[1] + b[1])],
                    };
                }
            }
        }
        Self { areas, faces }
    }
}

/// What lies across one subcell face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubcellLink {
    /// Another subcell of the same element.
    Interior { subcell: usize, face: usize },
    /// A subcell of the face-neighboring DG element, which sees the shared
    /// face as `dg_face` and the subface as `slot`.
    Element {
        elem: usize,
        subcell: usize,
        face: usize,
        dg_face: usize,
        slot: usize,
    },
    /// Physical boundary.
    Boundary,
}

/// Global subcell connectivity. Subcell `k` of element `e` has global index
/// `e * nsubcells + k`; boundary faces point back to themselves in the maps.
pub struct SubcellConnectivity {
    /// Shape `(nelements, nsubcells, 3)`.
    pub links: Array3<SubcellLink>,
    /// Global neighbor subcell of each `(global subcell, face)`.
    pub emap_p: Array2<usize>,
    /// Neighbor local face of each `(global subcell, face)`.
    pub fmap_p: Array2<usize>,
}

impl SubcellConnectivity {
    pub fn new(
        mesh: &Mesh,
        grid: &MinorGrid,
        geometry: &SubcellGeometry,
        tolerance: f64,
    ) -> Result<Self> {
        let nsub = grid.nsubcells;
        let centers = Self::face_centers(mesh, geometry, nsub);
        let mut links = Array3::from_elem((mesh.nelements, nsub, 3), SubcellLink::Boundary);
        let mut emap_p = Array2::<usize>::zeros((mesh.nelements * nsub, 3));
        let mut fmap_p = Array2::<usize>::zeros((mesh.nelements * nsub, 3));
        for e in 0..mesh.nelements {
            for k in 0..nsub {
                for f in 0..3 {
                    let id = e * nsub + k;
                    let link = match grid.on_face[[k, f]] {
                        None => SubcellLink::Interior {
                            subcell: grid.e_to_e[[k, f]],
                            face: grid.e_to_f[[k, f]],
                        },
                        Some((dg_face, _)) if mesh.is_boundary_face(e, dg_face) => {
                            SubcellLink::Boundary
                        }
                        Some((dg_face, _)) => {
                            Self::find_best_match(mesh, grid, geometry, &centers, tolerance, e, k, f, dg_face)?
                        }
                    };
                    let (nb, nb_face) = match link {
                        SubcellLink::Interior { subcell, face } => (e * nsub + subcell, face),
                        SubcellLink::Element {
                            elem, subcell, face, ..
                        } => (elem * nsub + subcell, face),
                        SubcellLink::Boundary => (id, f),
                    };
                    emap_p[[id, f]] = nb;
                    fmap_p[[id, f]] = nb_face;
                    links[[e, k, f]] = link;
                }
            }
        }
        log::debug!("subcell connectivity: {} subcells matched", mesh.nelements * nsub);
        Ok(Self {
            links,
            emap_p,
            fmap_p,
        })
    }

    /// Subcell face centers of local and halo elements, shape
    /// `(ntotal, nsubcells * 3, 2)`.
    fn face_centers(mesh: &Mesh, geometry: &SubcellGeometry, nsub: usize) -> Array3<f64> {
        let mut centers = Array3::<f64>::zeros((mesh.ntotal(), nsub * 3, 2));
        for ((e, kf, d), center) in centers.indexed_iter_mut() {
            if e < mesh.nelements {
                *center = geometry.faces[[e, kf / 3, kf % 3]].center[d];
            }
        }
        if let Some(buf) = centers.as_slice_mut() {
            mesh.halo.exchange(buf, nsub * 3 * 2);
        }
        centers
    }

    /// Nearest subcell face, by physical face center, on the neighbor's side of
    /// DG face `dg_face` of element `e`.
    #[allow(clippy::too_many_arguments)]
    fn find_best_match(
        mesh: &Mesh,
        grid: &MinorGrid,
        geometry: &SubcellGeometry,
        centers: &Array3<f64>,
        tolerance: f64,
        e: usize,
        k: usize,
        f: usize,
        dg_face: usize,
    ) -> Result<SubcellLink> {
        let e_p = mesh.e_to_e[[e, dg_face]];
        let dg_face_p = mesh.e_to_f[[e, dg_face]];
        let own = geometry.faces[[e, k, f]];
        let mut best = (f64::INFINITY, 0);
        for (slot, &(k_p, f_p)) in grid.face_subcells[dg_face_p].iter().enumerate() {
            let other = centers.slice(s![e_p, k_p * 3 + f_p, ..]);
            let distance =
                ((own.center[0] - other[0]).powi(2) + (own.center[1] - other[1]).powi(2)).sqrt();
            if distance < best.0 {
                best = (distance, slot);
            }
        }
        let (distance, slot) = best;
        if distance > tolerance * own.length {
            return Err(StabError::SubcellMatch {
                elem: e,
                subcell: k,
                face: f,
                neighbor: e_p,
                distance,
                tolerance: tolerance * own.length,
            });
        }
        let (subcell, face) = grid.face_subcells[dg_face_p][slot];
        Ok(SubcellLink::Element {
            elem: e_p,
            subcell,
            face,
            dg_face: dg_face_p,
            slot,
        })
    }
}
