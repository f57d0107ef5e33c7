use hashbrown::HashMap;
use ndarray::{Array1, Array2};

use crate::disc::{
    basis::triangle::TriangleBasis,
    geometric::Geometric2D,
};
use crate::error::{Result, StabError};
use crate::stab::settings::SubcellDistribution;

pub struct MinorGrid {
    pub ns: usize,
    pub nsubcells: usize,
    /// Reference coordinates of the grid vertices, one row per vertex.
    pub vertices: Array2<f64>,
    /// Row and column `(i, j)` of every vertex; `s` grows with `i`, `r` with `j`.
    pub grid_index: Vec<(usize, usize)>,
    /// Counter-clockwise vertices; face `f` joins local vertices `f` and `f + 1`.
    pub e_to_v: Array2<usize>,
    /// Neighbor subcell across each face; faces on the element boundary map to themselves.
    pub e_to_e: Array2<usize>,
    pub e_to_f: Array2<usize>,
    /// `(dg_face, slot)` of subcell faces on the element boundary.
    pub on_face: Array2<Option<(usize, usize)>>,
    /// Subcell and local face occupying each slot of each DG face.
    pub face_subcells: Vec<Vec<(usize, usize)>>,
    /// Reference areas, summing to 2.
    pub areas: Array1<f64>,
}

impl Geometric2D for MinorGrid {}

impl MinorGrid {
    pub fn new(ns: usize, distribution: SubcellDistribution) -> Result<Self> {
        if ns == 0 {
            return Err(StabError::invalid_setting(
                "SUBCELL NUMBER",
                ns,
                "the minor grid needs at least one subdivision",
            ));
        }
        let vertices = match distribution {
            SubcellDistribution::Equispaced => TriangleBasis::equispaced_nodes(ns),
            SubcellDistribution::WarpBlend => TriangleBasis::warp_blend_nodes(ns)?,
        };
        let mut grid_index = Vec::with_capacity(vertices.nrows());
        for i in 0..ns + 1 {
            for j in 0..ns + 1 - i {
                grid_index.push((i, j));
            }
        }
        let id = |i: usize, j: usize| i * (ns + 1) - i * i.saturating_sub(1) / 2 + j;

        let nsubcells = ns * ns;
        let mut e_to_v = Array2::<usize>::zeros((nsubcells, 3));
        let mut sk = 0;
        for i in 0..ns {
            for j in 0..ns - i {
                let up = [id(i, j), id(i, j + 1), id(i + 1, j)];
                for (v, &vid) in up.iter().enumerate() {
                    e_to_v[[sk, v]] = vid;
                }
                sk += 1;
                if j + 1 < ns - i {
                    let down = [id(i, j + 1), id(i + 1, j + 1), id(i + 1, j)];
                    for (v, &vid) in down.iter().enumerate() {
                        e_to_v[[sk, v]] = vid;
                    }
                    sk += 1;
                }
            }
        }

        let (e_to_e, e_to_f) = Self::connect(&e_to_v);

        let mut on_face = Array2::from_elem((nsubcells, 3), None);
        let mut face_subcells = vec![vec![(0, 0); ns]; 3];
        for k in 0..nsubcells {
            for f in 0..3 {
                if e_to_e[[k, f]] != k {
                    continue;
                }
                let (i1, j1) = grid_index[e_to_v[[k, f]]];
                let (i2, j2) = grid_index[e_to_v[[k, (f + 1) % 3]]];
                let location = if i1 == 0 && i2 == 0 {
                    (0, j1.min(j2))
                } else if i1 + j1 == ns && i2 + j2 == ns {
                    (1, i1.min(i2))
                } else if j1 == 0 && j2 == 0 {
                    (2, ns - i1.max(i2))
                } else {
                    return Err(StabError::InvalidMesh(format!(
                        "minor grid face {f} of subcell {k} is unmatched but not on the boundary"
                    )));
                };
                on_face[[k, f]] = Some(location);
                face_subcells[location.0][location.1] = (k, f);
            }
        }

        let areas = Array1::from_iter((0..nsubcells).map(|k| {
            let x: Vec<f64> = (0..3).map(|v| vertices[[e_to_v[[k, v]], 0]]).collect();
            let y: Vec<f64> = (0..3).map(|v| vertices[[e_to_v[[k, v]], 1]]).collect();
            Self::compute_signed_area(&x, &y)
        }));
        if let Some(k) = areas.iter().position(|&a| a <= 0.0) {
            return Err(StabError::InvalidMesh(format!(
                "minor grid subcell {k} has non-positive area"
            )));
        }
        log::debug!("minor grid: {nsubcells} subcells, {:?} vertices", distribution);

        Ok(Self {
            ns,
            nsubcells,
            vertices,
            grid_index,
            e_to_v,
            e_to_e,
            e_to_f,
            on_face,
            face_subcells,
            areas,
        })
    }
    fn connect(e_to_v: &Array2<usize>) -> (Array2<usize>, Array2<usize>) {
        let nsubcells = e_to_v.nrows();
        let mut e_to_e = Array2::<usize>::zeros((nsubcells, 3));
        let mut e_to_f = Array2::<usize>::zeros((nsubcells, 3));
        let mut edges: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
        for k in 0..nsubcells {
            for f in 0..3 {
                e_to_e[[k, f]] = k;
                e_to_f[[k, f]] = f;
                let (a, b) = (e_to_v[[k, f]], e_to_v[[k, (f + 1) % 3]]);
                let key = (a.min(b), a.max(b));
                if let Some((k_p, f_p)) = edges.remove(&key) {
                    e_to_e[[k, f]] = k_p;
                    e_to_f[[k, f]] = f_p;
                    e_to_e[[k_p, f_p]] = k;
                    e_to_f[[k_p, f_p]] = f;
                } else {
                    edges.insert(key, (k, f));
                }
            }
        }
        (e_to_e, e_to_f)
    }
    /// Reference coordinates of local vertex `v` of subcell `k`.
    pub fn vertex(&self, k: usize, v: usize) -> [f64; 3] {
        let id = self.e_to_v[[k, v % 3]];
        [self.vertices[[id, 0]], self.vertices[[id, 1]], 0.0]
    }
    /// Parameter interval `[t0, t1]` in `[-1, 1]` covered by `slot` along
    /// DG face `dg_face`, measured from the face's first vertex.
    pub fn slot_interval(&self, dg_face: usize, slot: usize) -> (f64, f64) {
        let (k, f) = self.face_subcells[dg_face][slot];
        let t0 = face_parameter(dg_face, self.vertex(k, f));
        let t1 = face_parameter(dg_face, self.vertex(k, f + 1));
        (t0.min(t1), t0.max(t1))
    }
}

/// Position of a reference point along a triangle face, `-1` at the face's
/// first vertex and `1` at its second.
pub fn face_parameter(dg_face: usize, x: [f64; 3]) -> f64 {
    match dg_face {
        0 => x[0],
        1 => x[1],
        _ => -x[1],
    }
}
