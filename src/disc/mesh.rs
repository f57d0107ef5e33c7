use hashbrown::HashMap;
use ndarray::{Array2, Array3};

use crate::disc::{
    basis::{ElementType, ReferenceElement, dot, sub},
    geometric::{Geometric2D, Geometric3D},
};
use crate::error::{Result, StabError};

pub mod generators;
pub mod halo;

use halo::{HaloExchange, SerialHalo};

/// Affine geometric factors of one element.
#[derive(Clone, Copy, Debug)]
pub struct VolumeGeometry {
    /// Ratio of physical to reference measure.
    pub j: f64,
    pub measure: f64,
    pub centroid: [f64; 3],
}

/// Geometric factors of one element face.
#[derive(Clone, Copy, Debug)]
pub struct FaceGeometry {
    /// Outward unit normal.
    pub normal: [f64; 3],
    pub sj: f64,
    pub inv_j: f64,
    pub measure: f64,
    pub center: [f64; 3],
}

/// Unstructured mesh of one element type with nodal reference element.
pub struct Mesh {
    pub element_type: ElementType,
    pub reference: ReferenceElement,
    pub nelements: usize,
    pub vertices: Vec<[f64; 3]>,
    /// Element to global vertex id; the ids double as gather-scatter ids.
    pub e_to_v: Array2<usize>,
    /// Face neighbor element; boundary faces point back to the element itself.
    pub e_to_e: Array2<usize>,
    pub e_to_f: Array2<usize>,
    /// Physical node coordinates, shape `(nelements, np, 3)`.
    pub nodes: Array3<f64>,
    pub vgeo: Vec<VolumeGeometry>,
    /// Face geometry, shape `(nelements, nfaces)`.
    pub sgeo: Array2<FaceGeometry>,
    pub halo: Box<dyn HaloExchange>,
}

impl Geometric2D for Mesh {}
impl Geometric3D for Mesh {}

impl Mesh {
    pub fn new(
        element_type: ElementType,
        n: usize,
        vertices: Vec<[f64; 3]>,
        e_to_v: Array2<usize>,
    ) -> Result<Self> {
        let nverts = element_type.nverts();
        if e_to_v.ncols() != nverts {
            return Err(StabError::InvalidMesh(format!(
                "{element_type} elements need {nverts} vertices, got {}",
                e_to_v.ncols()
            )));
        }
        if let Some(&bad) = e_to_v.iter().find(|&&v| v >= vertices.len()) {
            return Err(StabError::InvalidMesh(format!(
                "vertex id {bad} out of range ({} vertices)",
                vertices.len()
            )));
        }
        let reference = ReferenceElement::new(element_type, n)?;
        let nelements = e_to_v.nrows();
        let (e_to_e, e_to_f) = Self::connect(element_type, &e_to_v);

        let mut vgeo = Vec::with_capacity(nelements);
        let mut sgeo = Vec::with_capacity(nelements * element_type.nfaces());
        for e in 0..nelements {
            let verts: Vec<[f64; 3]> = e_to_v.row(e).iter().map(|&v| vertices[v]).collect();
            let volume = Self::compute_volume_geometry(element_type, e, &verts)?;
            for fv in element_type.face_vertices() {
                let fverts: Vec<[f64; 3]> = fv.iter().map(|&v| verts[v]).collect();
                sgeo.push(Self::compute_face_geometry(element_type, &volume, &fverts));
            }
            vgeo.push(volume);
        }
        let sgeo = Array2::from_shape_vec((nelements, element_type.nfaces()), sgeo)
            .map_err(|e| StabError::InvalidMesh(e.to_string()))?;

        let np = reference.np;
        let mut nodes = Array3::<f64>::zeros((nelements, np, 3));
        for e in 0..nelements {
            for i in 0..np {
                let phi = element_type.vertex_shape_functions(reference.node(i));
                for (v, &p) in phi.iter().enumerate() {
                    let x = vertices[e_to_v[[e, v]]];
                    for d in 0..3 {
                        nodes[[e, i, d]] += p * x[d];
                    }
                }
            }
        }
        log::debug!(
            "mesh: {nelements} {element_type} elements, {} vertices, N = {n}",
            vertices.len()
        );

        Ok(Self {
            element_type,
            reference,
            nelements,
            vertices,
            e_to_v,
            e_to_e,
            e_to_f,
            nodes,
            vgeo,
            sgeo,
            halo: Box::new(SerialHalo),
        })
    }
    pub fn n(&self) -> usize {
        self.reference.n
    }
    pub fn np(&self) -> usize {
        self.reference.np
    }
    pub fn dim(&self) -> usize {
        self.element_type.dim()
    }
    pub fn nverts(&self) -> usize {
        self.element_type.nverts()
    }
    pub fn nfaces(&self) -> usize {
        self.element_type.nfaces()
    }
    pub fn nhalo(&self) -> usize {
        self.halo.nhalo()
    }
    /// Local plus halo elements.
    pub fn ntotal(&self) -> usize {
        self.nelements + self.nhalo()
    }
    pub fn element_vertices(&self, e: usize) -> Vec<[f64; 3]> {
        self.e_to_v.row(e).iter().map(|&v| self.vertices[v]).collect()
    }
    pub fn is_boundary_face(&self, e: usize, f: usize) -> bool {
        self.e_to_e[[e, f]] == e && self.e_to_f[[e, f]] == f
    }
    /// Smallest face-based size of an element: `2 J / sJ` on simplices and
    /// measure over face measure on tensor-product elements.
    pub fn characteristic_length(&self, e: usize) -> f64 {
        let volume = &self.vgeo[e];
        (0..self.nfaces())
            .map(|f| {
                let face = &self.sgeo[[e, f]];
                if self.element_type.is_simplex() {
                    2.0 / (face.sj * face.inv_j)
                } else {
                    volume.measure / face.measure
                }
            })
            .fold(f64::INFINITY, f64::min)
    }
    /// Physical coordinates of a reference point inside element `e`.
    pub fn map_to_physical(&self, e: usize, r: [f64; 3]) -> [f64; 3] {
        let phi = self.element_type.vertex_shape_functions(r);
        let mut x = [0.0; 3];
        for (v, p) in phi.iter().enumerate() {
            let xv = self.vertices[self.e_to_v[[e, v]]];
            for d in 0..3 {
                x[d] += p * xv[d];
            }
        }
        x
    }
    fn connect(element_type: ElementType, e_to_v: &Array2<usize>) -> (Array2<usize>, Array2<usize>) {
        let nelements = e_to_v.nrows();
        let nfaces = element_type.nfaces();
        let mut e_to_e = Array2::<usize>::zeros((nelements, nfaces));
        let mut e_to_f = Array2::<usize>::zeros((nelements, nfaces));
        let mut faces: HashMap<Vec<usize>, (usize, usize)> = HashMap::new();
        for e in 0..nelements {
            for (f, fv) in element_type.face_vertices().iter().enumerate() {
                e_to_e[[e, f]] = e;
                e_to_f[[e, f]] = f;
                let mut key: Vec<usize> = fv.iter().map(|&v| e_to_v[[e, v]]).collect();
                key.sort_unstable();
                if let Some((e_p, f_p)) = faces.remove(&key) {
                    e_to_e[[e, f]] = e_p;
                    e_to_f[[e, f]] = f_p;
                    e_to_e[[e_p, f_p]] = e;
                    e_to_f[[e_p, f_p]] = f;
                } else {
                    faces.insert(key, (e, f));
                }
            }
        }
        (e_to_e, e_to_f)
    }
    fn compute_volume_geometry(
        element_type: ElementType,
        e: usize,
        verts: &[[f64; 3]],
    ) -> Result<VolumeGeometry> {
        let (signed, ref_measure) = match element_type {
            ElementType::Triangle | ElementType::Quadrilateral => {
                let x: Vec<f64> = verts.iter().map(|v| v[0]).collect();
                let y: Vec<f64> = verts.iter().map(|v| v[1]).collect();
                let ref_measure = if element_type == ElementType::Triangle { 2.0 } else { 4.0 };
                (Self::compute_signed_area(&x, &y), ref_measure)
            }
            ElementType::Tetrahedron => (
                Self::compute_signed_tet_volume(verts[0], verts[1], verts[2], verts[3]),
                4.0 / 3.0,
            ),
            ElementType::Hexahedron => (Self::compute_signed_hex_volume(verts), 8.0),
        };
        if signed <= 0.0 {
            return Err(StabError::InvalidMesh(format!(
                "element {e} has non-positive measure {signed:e}"
            )));
        }
        let mut centroid = [0.0; 3];
        for v in verts {
            for d in 0..3 {
                centroid[d] += v[d] / verts.len() as f64;
            }
        }
        Ok(VolumeGeometry {
            j: signed / ref_measure,
            measure: signed,
            centroid,
        })
    }
    fn compute_face_geometry(
        element_type: ElementType,
        volume: &VolumeGeometry,
        fverts: &[[f64; 3]],
    ) -> FaceGeometry {
        let mut center = [0.0; 3];
        for v in fverts {
            for d in 0..3 {
                center[d] += v[d] / fverts.len() as f64;
            }
        }
        let (mut normal, measure, ref_measure) = if element_type.dim() == 2 {
            let [x0, y0, _] = fverts[0];
            let [x1, y1, _] = fverts[1];
            let n = Self::compute_normal(x0, y0, x1, y1);
            ([n[0], n[1], 0.0], Self::compute_edge_length(x0, y0, x1, y1), 2.0)
        } else {
            let an = Self::compute_face_area_normal(fverts);
            let area = Self::compute_face_area(fverts);
            let ref_measure = if fverts.len() == 3 { 2.0 } else { 4.0 };
            ([an[0] / area, an[1] / area, an[2] / area], area, ref_measure)
        };
        if dot(normal, sub(center, volume.centroid)) < 0.0 {
            normal = [-normal[0], -normal[1], -normal[2]];
        }
        FaceGeometry {
            normal,
            sj: measure / ref_measure,
            inv_j: 1.0 / volume.j,
            measure,
            center,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn two_triangles() -> Mesh {
        let vertices = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        Mesh::new(ElementType::Triangle, 2, vertices, array![[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    #[test]
    fn test_two_triangle_connectivity() {
        let mesh = two_triangles();
        // the diagonal 0-2 is face 2 of element 0 and face 0 of element 1
        assert_eq!(mesh.e_to_e[[0, 2]], 1);
        assert_eq!(mesh.e_to_f[[0, 2]], 0);
        assert_eq!(mesh.e_to_e[[1, 0]], 0);
        assert_eq!(mesh.e_to_f[[1, 0]], 2);
        assert!(mesh.is_boundary_face(0, 0));
        assert!(!mesh.is_boundary_face(0, 2));
    }

    #[test]
    fn test_geometric_factors() {
        let mesh = two_triangles();
        assert_relative_eq!(mesh.vgeo[0].measure, 0.5, epsilon = 1e-14);
        assert_relative_eq!(mesh.vgeo[0].j, 0.25, epsilon = 1e-14);
        let bottom = mesh.sgeo[[0, 0]];
        assert_relative_eq!(bottom.normal[1], -1.0, epsilon = 1e-14);
        assert_relative_eq!(bottom.sj, 0.5, epsilon = 1e-14);
        let diagonal = mesh.sgeo[[0, 2]];
        assert_relative_eq!(diagonal.normal[0], -0.5_f64.sqrt(), epsilon = 1e-14);
        // shortest altitude of the right triangle with unit legs
        assert_relative_eq!(mesh.characteristic_length(0), 0.5_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_inverted_element_rejected() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let result = Mesh::new(ElementType::Triangle, 1, vertices, array![[0, 2, 1]]);
        assert!(matches!(result, Err(StabError::InvalidMesh(_))));
    }

    #[test]
    fn test_physical_nodes_on_vertices() {
        let mesh = two_triangles();
        let vertex_node = mesh.reference.vertex_nodes[1];
        assert_relative_eq!(mesh.nodes[[1, vertex_node, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.nodes[[1, vertex_node, 1]], 1.0, epsilon = 1e-12);
    }
}
