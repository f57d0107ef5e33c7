use ndarray::Array2;

use crate::disc::{basis::ElementType, geometric::Geometric3D, mesh::Mesh};
use crate::error::{Result, StabError};

/// Corners of a hexahedral cell in reference vertex order, as `(i, j, k)` offsets.
const HEX_CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];
/// Six tetrahedra around the 0-6 diagonal of a hexahedral cell.
const HEX_TO_TETS: [[usize; 4]; 6] = [
    [0, 1, 2, 6],
    [0, 2, 3, 6],
    [0, 3, 7, 6],
    [0, 7, 4, 6],
    [0, 4, 5, 6],
    [0, 5, 1, 6],
];

impl Mesh {
    /// `nx` by `ny` rectangle of quadrilaterals, or of triangles with two per cell.
    pub fn rectangle(
        element_type: ElementType,
        n: usize,
        (nx, ny): (usize, usize),
        (x0, x1): (f64, f64),
        (y0, y1): (f64, f64),
    ) -> Result<Self> {
        let id = |i: usize, j: usize| j * (nx + 1) + i;
        let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..ny + 1 {
            for i in 0..nx + 1 {
                vertices.push([
                    x0 + (x1 - x0) * i as f64 / nx as f64,
                    y0 + (y1 - y0) * j as f64 / ny as f64,
                    0.0,
                ]);
            }
        }
        let mut e_to_v = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                let (v00, v10, v11, v01) = (id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1));
                match element_type {
                    ElementType::Triangle => {
                        e_to_v.extend([v00, v10, v11]);
                        e_to_v.extend([v00, v11, v01]);
                    }
                    ElementType::Quadrilateral => e_to_v.extend([v00, v10, v11, v01]),
                    _ => {
                        return Err(StabError::InvalidMesh(format!(
                            "rectangle meshes hold 2D elements, not {element_type}"
                        )));
                    }
                }
            }
        }
        let nverts = element_type.nverts();
        let e_to_v = Array2::from_shape_vec((e_to_v.len() / nverts, nverts), e_to_v)
            .map_err(|e| StabError::InvalidMesh(e.to_string()))?;
        Self::new(element_type, n, vertices, e_to_v)
    }

    /// `nx` by `ny` by `nz` box of hexahedra, or of tetrahedra with six per cell.
    pub fn cuboid(
        element_type: ElementType,
        n: usize,
        (nx, ny, nz): (usize, usize, usize),
        lower: [f64; 3],
        upper: [f64; 3],
    ) -> Result<Self> {
        let id = |i: usize, j: usize, k: usize| (k * (ny + 1) + j) * (nx + 1) + i;
        let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
        for k in 0..nz + 1 {
            for j in 0..ny + 1 {
                for i in 0..nx + 1 {
                    vertices.push([
                        lower[0] + (upper[0] - lower[0]) * i as f64 / nx as f64,
                        lower[1] + (upper[1] - lower[1]) * j as f64 / ny as f64,
                        lower[2] + (upper[2] - lower[2]) * k as f64 / nz as f64,
                    ]);
                }
            }
        }
        let mut e_to_v = Vec::new();
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let cell: Vec<usize> = HEX_CORNERS
                        .iter()
                        .map(|c| id(i + c[0], j + c[1], k + c[2]))
                        .collect();
                    match element_type {
                        ElementType::Hexahedron => e_to_v.extend(cell),
                        ElementType::Tetrahedron => {
                            for tet in HEX_TO_TETS {
                                let mut t = tet.map(|v| cell[v]);
                                let volume = Self::compute_signed_tet_volume(
                                    vertices[t[0]],
                                    vertices[t[1]],
                                    vertices[t[2]],
                                    vertices[t[3]],
                                );
                                if volume < 0.0 {
                                    t.swap(1, 2);
                                }
                                e_to_v.extend(t);
                            }
                        }
                        _ => {
                            return Err(StabError::InvalidMesh(format!(
                                "cuboid meshes hold 3D elements, not {element_type}"
                            )));
                        }
                    }
                }
            }
        }
        let nverts = element_type.nverts();
        let e_to_v = Array2::from_shape_vec((e_to_v.len() / nverts, nverts), e_to_v)
            .map_err(|e| StabError::InvalidMesh(e.to_string()))?;
        Self::new(element_type, n, vertices, e_to_v)
    }
}
