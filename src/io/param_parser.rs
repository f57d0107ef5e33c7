use std::fs;

use serde::Deserialize;

use crate::disc::basis::ElementType;
use crate::error::{Result, StabError};
use crate::stab::settings::StabSettings;

/// Demo run parameters: the mesh to build, the initial jump and the
/// stabilization settings, all read from one JSON file.
#[derive(Clone, Debug, Deserialize)]
pub struct DemoParams {
    #[serde(rename = "ELEMENT TYPE")]
    pub element_type: String,
    #[serde(rename = "POLYNOMIAL DEGREE")]
    pub polynomial_degree: usize,
    /// Elements per direction; two entries for 2D meshes, three for 3D.
    #[serde(rename = "ELEMENTS PER DIRECTION")]
    pub divisions: Vec<usize>,
    /// x coordinate of the initial discontinuity.
    #[serde(rename = "SHOCK POSITION", default = "default_shock_position")]
    pub shock_position: f64,
    #[serde(rename = "TIME", default)]
    pub time: f64,
    #[serde(flatten)]
    pub stab: StabSettings,
}

fn default_shock_position() -> f64 {
    0.5
}

impl DemoParams {
    pub fn parse(file_path: &str) -> Result<Self> {
        let file_content = fs::read_to_string(file_path)?;
        Ok(serde_json::from_str(&file_content)?)
    }
    pub fn element_type(&self) -> Result<ElementType> {
        match self.element_type.to_uppercase().as_str() {
            "TRIANGLE" | "TRIANGLES" => Ok(ElementType::Triangle),
            "QUADRILATERAL" | "QUADRILATERALS" => Ok(ElementType::Quadrilateral),
            "TETRAHEDRON" | "TETRAHEDRA" => Ok(ElementType::Tetrahedron),
            "HEXAHEDRON" | "HEXAHEDRA" => Ok(ElementType::Hexahedron),
            _ => Err(StabError::invalid_setting(
                "ELEMENT TYPE",
                &self.element_type,
                "expected TRIANGLE, QUADRILATERAL, TETRAHEDRON or HEXAHEDRON",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_demo_params() {
        let params: DemoParams = serde_json::from_str(
            r#"{
                "ELEMENT TYPE": "Triangle",
                "POLYNOMIAL DEGREE": 3,
                "ELEMENTS PER DIRECTION": [8, 8],
                "STAB TYPE": 4,
                "SUBCELL NUMBER": 5
            }"#,
        )
        .unwrap();
        assert_eq!(params.element_type().unwrap(), ElementType::Triangle);
        assert_eq!(params.divisions, vec![8, 8]);
        assert_eq!(params.shock_position, 0.5);
        assert_eq!(params.stab.stab_type, 4);
        assert_eq!(params.stab.subcell_number, Some(5));
        assert_eq!(params.stab.detector_type, 1);
    }

    #[test]
    fn test_unknown_element_type() {
        let params: DemoParams = serde_json::from_str(
            r#"{"ELEMENT TYPE": "PRISM", "POLYNOMIAL DEGREE": 2, "ELEMENTS PER DIRECTION": [2, 2]}"#,
        )
        .unwrap();
        assert!(matches!(
            params.element_type(),
            Err(StabError::InvalidSetting { .. })
        ));
    }
}
