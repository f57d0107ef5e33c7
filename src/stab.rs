use std::path::PathBuf;

use ndarray::{Array2, ArrayView3, ArrayViewMut3};

use crate::disc::mesh::Mesh;
use crate::error::{Result, StabError};

pub mod artdiff;
pub mod detector;
pub mod filter;
pub mod mode_info;
pub mod report;
pub mod settings;
pub mod subcell;
pub mod types;

use artdiff::ArtificialDiffusion;
use detector::{Detection, Detector, Klockner, Persson};
use filter::ExponentialFilter;
use settings::StabSettings;
use subcell::{Subcell, flux::SubcellFlux};
use types::{DetectorType, SolverType, StabType};

pub trait Stabilizer {
    fn name(&self) -> &'static str;
    /// Stabilizes `q` in place or writes its contribution into `rhs`.
    fn apply(
        &mut self,
        mesh: &Mesh,
        detection: &Detection,
        q: ArrayViewMut3<f64>,
        rhs: ArrayViewMut3<f64>,
        time: f64,
    ) -> Result<()>;
    /// Nodal artificial viscosity, `(ntotal, d_nfields, np)`.
    fn visc(&self) -> Option<ArrayView3<'_, f64>> {
        None
    }
    fn subcell(&self) -> Option<&Subcell> {
        None
    }
}

/// Detector, detection buffers and stabilizer for one mesh partition.
pub struct Stab<'a> {
    pub mesh: &'a Mesh,
    pub settings: StabSettings,
    pub solver_type: SolverType,
    pub detector_type: DetectorType,
    pub stab_type: StabType,
    /// Detected fields.
    pub d_nfields: usize,
    /// Stabilized solution fields.
    pub s_nfields: usize,
    detector: Box<dyn Detector>,
    detection: Detection,
    stabilizer: Box<dyn Stabilizer>,
    frame: usize,
    /// Report directory; the timestamped run directory when unset.
    output_dir: Option<PathBuf>,
}

impl<'a> Stab<'a> {
    pub fn setup(mesh: &'a Mesh, settings: StabSettings) -> Result<Self> {
        Self::build(mesh, settings, None)
    }
    /// Setup with the two-point flux the subcell stabilizer advances with.
    pub fn setup_with_flux(
        mesh: &'a Mesh,
        settings: StabSettings,
        flux: Box<dyn SubcellFlux>,
    ) -> Result<Self> {
        Self::build(mesh, settings, Some(flux))
    }

    fn build(
        mesh: &'a Mesh,
        settings: StabSettings,
        flux: Option<Box<dyn SubcellFlux>>,
    ) -> Result<Self> {
        settings.validate()?;
        let solver_type = SolverType::try_from(settings.solver_type)?;
        let detector_type = DetectorType::try_from(settings.detector_type)?;
        let stab_type = StabType::try_from(settings.stab_type)?;
        let (d_nfields, s_nfields) = solver_type.field_counts(mesh.dim());
        log::info!("Solver Type: {solver_type:?}");
        log::info!("Detector Type: {detector_type:?}");
        log::info!("Stabilization Type: {stab_type:?}");

        let detector: Box<dyn Detector> = match detector_type {
            DetectorType::Klockner => Box::new(Klockner::new(&mesh.reference)?),
            DetectorType::Persson => {
                Box::new(Persson::new(&mesh.reference, settings.persson_kappa))
            }
        };
        let field_map = match solver_type {
            SolverType::Hjs => (0..d_nfields).collect(),
            SolverType::Cns | SolverType::Ins => vec![0],
        };
        let detection = Detection::new(mesh.ntotal(), field_map);

        let stabilizer: Box<dyn Stabilizer> = match stab_type {
            StabType::Filter => Box::new(ExponentialFilter::new(
                &mesh.reference,
                settings.filter_cutoff,
                settings.filter_order,
            )?),
            StabType::Limiter => return Err(StabError::Unimplemented("limiter")),
            StabType::ArtDiff => Box::new(ArtificialDiffusion::new(
                mesh,
                d_nfields,
                settings.artdiff_scale,
                settings.artdiff_warmup_time,
            )?),
            StabType::Subcell => {
                if solver_type != SolverType::Hjs {
                    return Err(StabError::Unsupported {
                        stab: "subcell",
                        context: format!("{solver_type:?} solver"),
                    });
                }
                let flux = flux.ok_or_else(|| {
                    StabError::invalid_setting(
                        "STAB TYPE",
                        settings.stab_type,
                        "subcell stabilization needs a subcell flux",
                    )
                })?;
                Box::new(Subcell::new(
                    mesh,
                    s_nfields,
                    settings.subcell_number.unwrap_or(mesh.n()),
                    settings.subcell_distribution,
                    settings.subcell_match_tolerance,
                    flux,
                )?)
            }
        };
        log::info!(
            "stabilization ready: {} detector, {} stabilizer",
            detector.name(),
            stabilizer.name()
        );

        Ok(Self {
            mesh,
            settings,
            solver_type,
            detector_type,
            stab_type,
            d_nfields,
            s_nfields,
            detector,
            detection,
            stabilizer,
            frame: 0,
            output_dir: None,
        })
    }

    /// Runs the detector over the local elements. Subcell stabilization also
    /// marks the face neighbors of troubled elements.
    pub fn detect_apply(&mut self, q: ArrayView3<f64>, _time: f64) {
        self.detection.fill(self.detector.as_ref(), self.mesh, q);
        if self.stab_type == StabType::Subcell {
            self.detection.mark_neighbors(self.mesh);
        }
    }

    pub fn stab_apply(
        &mut self,
        q: ArrayViewMut3<f64>,
        rhs: ArrayViewMut3<f64>,
        time: f64,
    ) -> Result<()> {
        self.stabilizer
            .apply(self.mesh, &self.detection, q, rhs, time)
    }

    /// Detection followed by stabilization.
    pub fn apply(
        &mut self,
        q: ArrayViewMut3<f64>,
        rhs: ArrayViewMut3<f64>,
        time: f64,
    ) -> Result<()> {
        self.detect_apply(q.view(), time);
        self.stab_apply(q, rhs, time)
    }

    pub fn detection(&self) -> &Detection {
        &self.detection
    }
    pub fn e_list(&self) -> &Array2<i32> {
        &self.detection.e_list
    }
    pub fn visc_activation(&self) -> &Array2<f64> {
        &self.detection.activation
    }
    pub fn visc(&self) -> Option<ArrayView3<'_, f64>> {
        self.stabilizer.visc()
    }
    pub fn subcell(&self) -> Option<&Subcell> {
        self.stabilizer.subcell()
    }
}
