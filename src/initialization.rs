use ndarray::Array3;

use crate::disc::mesh::Mesh;
use crate::error::{Result, StabError};
use crate::io::param_parser::DemoParams;

/// Uniform mesh of the unit square or unit cube from the demo parameters.
pub fn initialize_mesh(params: &DemoParams) -> Result<Mesh> {
    let element_type = params.element_type()?;
    let n = params.polynomial_degree;
    match (element_type.dim(), params.divisions.as_slice()) {
        (2, &[nx, ny]) => Mesh::rectangle(element_type, n, (nx, ny), (0.0, 1.0), (0.0, 1.0)),
        (3, &[nx, ny, nz]) => Mesh::cuboid(element_type, n, (nx, ny, nz), [0.0; 3], [1.0; 3]),
        (dim, divisions) => Err(StabError::invalid_setting(
            "ELEMENTS PER DIRECTION",
            format!("{divisions:?}"),
            format!("{element_type} meshes need {dim} entries"),
        )),
    }
}

/// Fields of shape `(ntotal, nfields, np)` jumping from 2 to 1 across the
/// plane `x = shock_position`, with a smooth y variation in field 1.
pub fn initialize_solution(mesh: &Mesh, nfields: usize, shock_position: f64) -> Array3<f64> {
    Array3::from_shape_fn((mesh.ntotal(), nfields, mesh.np()), |(e, fld, i)| {
        let x = mesh.nodes[[e, i, 0]];
        let y = mesh.nodes[[e, i, 1]];
        let base = if x < shock_position { 2.0 } else { 1.0 };
        if fld == 1 {
            base + 0.1 * (std::f64::consts::PI * y).sin()
        } else {
            base
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disc::basis::ElementType;

    fn params(element_type: &str, divisions: &str) -> DemoParams {
        serde_json::from_str(&format!(
            r#"{{"ELEMENT TYPE": "{element_type}", "POLYNOMIAL DEGREE": 2, "ELEMENTS PER DIRECTION": {divisions}}}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_initialize_mesh() {
        let mesh = initialize_mesh(&params("TRIANGLE", "[2, 3]")).unwrap();
        assert_eq!(mesh.element_type, ElementType::Triangle);
        assert_eq!(mesh.nelements, 12);
        let mesh = initialize_mesh(&params("TETRAHEDRON", "[1, 1, 1]")).unwrap();
        assert_eq!(mesh.nelements, 6);
        assert!(initialize_mesh(&params("HEXAHEDRON", "[2, 2]")).is_err());
    }

    #[test]
    fn test_initial_jump() {
        let mesh = initialize_mesh(&params("QUADRILATERAL", "[4, 4]")).unwrap();
        let q = initialize_solution(&mesh, 2, 0.5);
        for e in 0..mesh.nelements {
            for i in 0..mesh.np() {
                let expected = if mesh.nodes[[e, i, 0]] < 0.5 { 2.0 } else { 1.0 };
                assert_eq!(q[[e, 0, i]], expected);
            }
        }
    }
}
