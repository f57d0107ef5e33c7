use std::fs;

use serde::Deserialize;

use crate::error::{Result, StabError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum SubcellDistribution {
    #[serde(rename = "EQUISPACED")]
    Equispaced,
    #[serde(rename = "WARPBLEND")]
    WarpBlend,
}

/// Stabilization settings, keyed the way they appear in the setup file.
#[derive(Clone, Debug, Deserialize)]
pub struct StabSettings {
    #[serde(rename = "STABILIZATION SOLVER TYPE", default = "default_one")]
    pub solver_type: i64,
    #[serde(rename = "DETECTOR TYPE", default = "default_one")]
    pub detector_type: i64,
    #[serde(rename = "STAB TYPE", default = "default_one")]
    pub stab_type: i64,
    #[serde(rename = "FILTER CUTOFF", default = "default_cutoff")]
    pub filter_cutoff: usize,
    #[serde(rename = "FILTER ORDER", default = "default_filter_order")]
    pub filter_order: usize,
    /// Minor-grid subdivisions per element edge; the polynomial degree when absent.
    #[serde(rename = "SUBCELL NUMBER", default)]
    pub subcell_number: Option<usize>,
    #[serde(rename = "SUBCELL DISTRIBUTION", default = "default_distribution")]
    pub subcell_distribution: SubcellDistribution,
    /// Face-center matching tolerance relative to the subcell face length.
    #[serde(rename = "SUBCELL MATCH TOLERANCE", default = "default_match_tolerance")]
    pub subcell_match_tolerance: f64,
    #[serde(rename = "STAB OUTPUT TO FILE", default = "default_true")]
    pub output_to_file: bool,
    #[serde(rename = "ARTDIFF SCALE", default = "default_artdiff_scale")]
    pub artdiff_scale: f64,
    /// Uniform viscosity is applied up to this time; zero disables it.
    // TODO: confirm with the CNS solver owners whether the warm-up belongs in production runs.
    #[serde(rename = "ARTDIFF WARMUP TIME", default)]
    pub artdiff_warmup_time: f64,
    #[serde(rename = "PERSSON KAPPA", default = "default_persson_kappa")]
    pub persson_kappa: f64,
}

fn default_one() -> i64 {
    1
}
fn default_cutoff() -> usize {
    1
}
fn default_filter_order() -> usize {
    2
}
fn default_distribution() -> SubcellDistribution {
    SubcellDistribution::Equispaced
}
fn default_match_tolerance() -> f64 {
    1.0e-8
}
fn default_true() -> bool {
    true
}
fn default_artdiff_scale() -> f64 {
    1.0
}
fn default_persson_kappa() -> f64 {
    1.0
}

impl Default for StabSettings {
    fn default() -> Self {
        Self {
            solver_type: default_one(),
            detector_type: default_one(),
            stab_type: default_one(),
            filter_cutoff: default_cutoff(),
            filter_order: default_filter_order(),
            subcell_number: None,
            subcell_distribution: default_distribution(),
            subcell_match_tolerance: default_match_tolerance(),
            output_to_file: default_true(),
            artdiff_scale: default_artdiff_scale(),
            artdiff_warmup_time: 0.0,
            persson_kappa: default_persson_kappa(),
        }
    }
}

impl StabSettings {
    pub fn parse(file_path: &str) -> Result<Self> {
        let file_content = fs::read_to_string(file_path)?;
        Ok(serde_json::from_str(&file_content)?)
    }
    /// Rejects values the detectors and stabilizers cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.persson_kappa.is_finite() && self.persson_kappa > 0.0) {
            return Err(StabError::invalid_setting(
                "PERSSON KAPPA",
                self.persson_kappa,
                "ramp half-width must be positive",
            ));
        }
        if !(self.artdiff_scale.is_finite() && self.artdiff_scale >= 0.0) {
            return Err(StabError::invalid_setting(
                "ARTDIFF SCALE",
                self.artdiff_scale,
                "viscosity scale must be non-negative",
            ));
        }
        if !(self.subcell_match_tolerance.is_finite() && self.subcell_match_tolerance > 0.0) {
            return Err(StabError::invalid_setting(
                "SUBCELL MATCH TOLERANCE",
                self.subcell_match_tolerance,
                "tolerance must be positive",
            ));
        }
        Ok(())
    }
    pub fn report(&self) {
        log::info!("STABILIZATION SOLVER TYPE: {}", self.solver_type);
        log::info!("DETECTOR TYPE: {}", self.detector_type);
        log::info!("STAB TYPE: {}", self.stab_type);
        log::info!("FILTER CUTOFF: {}", self.filter_cutoff);
        log::info!("FILTER ORDER: {}", self.filter_order);
        match self.subcell_number {
            Some(number) => log::info!("SUBCELL NUMBER: {number}"),
            None => log::info!("SUBCELL NUMBER: polynomial degree"),
        }
        log::info!("SUBCELL DISTRIBUTION: {:?}", self.subcell_distribution);
        log::info!("STAB OUTPUT TO FILE: {}", self.output_to_file);
        log::info!("ARTDIFF SCALE: {}", self.artdiff_scale);
        log::info!("ARTDIFF WARMUP TIME: {}", self.artdiff_warmup_time);
        log::info!("PERSSON KAPPA: {}", self.persson_kappa);
    }
}
