use thiserror::Error;

use crate::disc::basis::ElementType;

#[derive(Error, Debug)]
pub enum StabError {
    /// A setting carries a value outside its enumeration.
    #[error("unknown value for {key}: {value}")]
    UnknownSetting { key: &'static str, value: i64 },

    /// A setting is recognised but its value is not usable.
    #[error("invalid value for {key} ({value}): {reason}")]
    InvalidSetting {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} stabilization is not implemented")]
    Unimplemented(&'static str),

    #[error("{stab} stabilization is not supported for {context}")]
    Unsupported { stab: &'static str, context: String },

    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// A subcell face on an element boundary found no partner on the neighbor.
    #[error(
        "no matching subcell face for element {elem} subcell {subcell} face {face} on neighbor {neighbor} (closest {distance:e}, tolerance {tolerance:e})"
    )]
    SubcellMatch {
        elem: usize,
        subcell: usize,
        face: usize,
        neighbor: usize,
        distance: f64,
        tolerance: f64,
    },

    #[error("linear algebra failure in {context}: {reason}")]
    LinearAlgebra {
        context: &'static str,
        reason: String,
    },

    #[error("failed to write {path}: {reason}")]
    Output { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl StabError {
    pub fn unsupported(stab: &'static str, element_type: ElementType) -> Self {
        Self::Unsupported {
            stab,
            context: format!("{element_type} elements"),
        }
    }
    pub fn invalid_setting(
        key: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidSetting {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StabError>;
