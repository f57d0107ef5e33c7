use crate::error::{Result, StabError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverType {
    /// Level-set / Hamilton-Jacobi solver.
    Hjs,
    /// Compressible Navier-Stokes.
    Cns,
    /// Incompressible Navier-Stokes.
    Ins,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectorType {
    Klockner,
    Persson,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StabType {
    Filter,
    Limiter,
    ArtDiff,
    Subcell,
}

impl TryFrom<i64> for SolverType {
    type Error = StabError;
    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(Self::Hjs),
            2 => Ok(Self::Cns),
            3 => Ok(Self::Ins),
            _ => Err(StabError::UnknownSetting {
                key: "STABILIZATION SOLVER TYPE",
                value,
            }),
        }
    }
}

impl TryFrom<i64> for DetectorType {
    type Error = StabError;
    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(Self::Klockner),
            2 => Ok(Self::Persson),
            _ => Err(StabError::UnknownSetting {
                key: "DETECTOR TYPE",
                value,
            }),
        }
    }
}

impl TryFrom<i64> for StabType {
    type Error = StabError;
    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(Self::Filter),
            2 => Ok(Self::Limiter),
            3 => Ok(Self::ArtDiff),
            4 => Ok(Self::Subcell),
            _ => Err(StabError::UnknownSetting {
                key: "STAB TYPE",
                value,
            }),
        }
    }
}

impl SolverType {
    /// Number of detected fields and of stabilized solution fields.
    pub fn field_counts(self, dim: usize) -> (usize, usize) {
        match self {
            Self::Hjs => (2, 2),
            Self::Cns => (1, dim + 2),
            Self::Ins => (1, dim),
        }
    }
}

/// Branch an element field takes in the subcell scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellMode {
    Dg,
    /// Troubled: advanced on the minor grid.
    Fv,
    /// Smooth element with a troubled face neighbor.
    DgFv,
}

impl CellMode {
    pub fn flag(self) -> i32 {
        match self {
            Self::Dg => 0,
            Self::Fv => 1,
            Self::DgFv => 2,
        }
    }
    pub fn from_flag(flag: i32) -> Self {
        match flag {
            1 => Self::Fv,
            2 => Self::DgFv,
            _ => Self::Dg,
        }
    }
}
