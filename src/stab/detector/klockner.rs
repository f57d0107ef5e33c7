use ndarray::{Array1, Array2, ArrayView1};

use super::{Detector, Indicator, smooth_ramp};
use crate::disc::basis::ReferenceElement;
use crate::error::Result;
use crate::stab::mode_info;

const DECAY_TOL: f64 = 1.0e-10;

/// Modal-decay detector: fits the decay rate of the skyline modal amplitudes
/// and flags elements decaying slower than `b^-1`.
pub struct Klockner {
    n: usize,
    inv_v: Array2<f64>,
    mode_map: Vec<usize>,
    buckets: Vec<usize>,
    lsf: Array1<f64>,
    bld: Array1<f64>,
}

impl Klockner {
    pub fn new(reference: &ReferenceElement) -> Result<Self> {
        let n = reference.n;
        let lsf = mode_info::least_squares_fit(n)?;
        let bld = mode_info::baseline_decay(n);
        log::debug!("klockner: N = {n}, lsf = {lsf}, bld = {bld}");
        Ok(Self {
            n,
            inv_v: reference.inv_vandermonde.clone(),
            mode_map: mode_info::mode_info_klockner(reference.element_type, n),
            buckets: mode_info::mode_buckets(reference.element_type, n),
            lsf,
            bld,
        })
    }
    /// Fitted decay exponent `s` of the modal amplitudes, `None` when the
    /// field is identically zero.
    pub fn decay_exponent(&self, q: ArrayView1<f64>) -> Option<f64> {
        let modal = self.inv_v.dot(&q);
        let mut energy = Array1::<f64>::zeros(self.n + 1);
        for &mode in &self.mode_map {
            energy[self.buckets[mode]] += modal[mode].powi(2);
        }
        let total = energy.sum();
        if total <= 0.0 {
            return None;
        }
        // baseline keeps a just-resolved signal at decay N
        let mut amplitude: Vec<f64> = (1..self.n + 1)
            .map(|b| (energy[b] + total * self.bld[b]).sqrt())
            .collect();
        for b in (0..amplitude.len().saturating_sub(1)).rev() {
            amplitude[b] = amplitude[b].max(amplitude[b + 1]);
        }
        let slope: f64 = amplitude
            .iter()
            .zip(self.lsf.iter())
            .map(|(a, w)| w * a.log10())
            .sum();
        Some(-slope)
    }
    fn activation(&self, s: f64) -> f64 {
        let s_max = (self.n as f64).min(3.0);
        if s <= 1.0 + DECAY_TOL {
            1.0
        } else if s >= s_max - DECAY_TOL {
            0.0
        } else {
            smooth_ramp(1.0 - 2.0 * (s - 1.0) / (s_max - 1.0))
        }
    }
}

impl Detector for Klockner {
    fn name(&self) -> &'static str {
        "klockner"
    }
    fn indicator(&self, q: ArrayView1<f64>) -> Indicator {
        if self.n < 2 {
            return Indicator::SMOOTH;
        }
        match self.decay_exponent(q) {
            Some(s) => Indicator {
                troubled: s < 1.0,
                activation: self.activation(s),
            },
            None => Indicator::SMOOTH,
        }
    }
}
