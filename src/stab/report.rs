use std::fs;
use std::path::PathBuf;

use ndarray::s;
use ndarray_stats::QuantileExt;

use super::Stab;
use super::types::StabType;
use crate::error::Result;
use crate::io::{
    write_to_csv::{DetectionRecord, append_detection_history},
    write_to_vtu::{output_dir, plot_elements, plot_fields},
};

/// Serial runs write as rank 0.
const RANK: usize = 0;

impl Stab<'_> {
    /// Number of troubled (FV) entries over the local elements.
    pub fn element_count(&self) -> usize {
        self.detection.troubled_count(self.mesh.nelements)
    }

    /// Largest activation and viscosity over the local elements; zero where
    /// no value is available.
    fn extrema(&self) -> (f64, f64) {
        let nelements = self.mesh.nelements;
        let max_activation = *self
            .detection
            .activation
            .slice(s![..nelements, ..])
            .max_skipnan();
        let max_visc = self
            .visc()
            .map(|visc| *visc.slice(s![..nelements, .., ..]).max_skipnan())
            .unwrap_or(0.0);
        let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };
        (finite_or_zero(max_activation), finite_or_zero(max_visc))
    }

    /// Writes reports under `dir` instead of the timestamped run directory.
    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) {
        self.output_dir = Some(dir.into());
    }

    /// Logs the detection count. With output to file enabled, also appends it
    /// to the history file and writes the element flags (and viscosity).
    pub fn report(&mut self, time: f64, tstep: usize) -> Result<()> {
        let detected = self.element_count();
        log::info!("{time:5.2} ({tstep}), {detected} (time, timestep, # of detected elements)");
        if !self.settings.output_to_file {
            return Ok(());
        }

        let dir = match &self.output_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                dir.clone()
            }
            None => PathBuf::from(output_dir()?),
        };
        let (max_activation, max_visc) = self.extrema();
        append_detection_history(
            dir.join("detection_history.csv"),
            &DetectionRecord {
                time,
                tstep,
                detected,
                max_activation,
                max_visc,
            },
        )?;

        let file_name = dir.join(format!("detector_{RANK:04}_{:04}.vtu", self.frame));
        plot_elements(self.mesh, self.detection.e_list.view(), &file_name.to_string_lossy())?;
        if self.stab_type == StabType::ArtDiff {
            if let Some(visc) = self.visc() {
                let file_name = dir.join(format!("visc_{RANK:04}_{:04}.vtu", self.frame));
                plot_fields(self.mesh, visc, "Viscosity", &file_name.to_string_lossy())?;
            }
        }
        log::debug!("stabilization frame {} written to {}", self.frame, dir.display());
        self.frame += 1;
        Ok(())
    }
}
