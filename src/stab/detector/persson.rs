use ndarray::{Array2, ArrayView1};

use super::{Detector, Indicator, smooth_ramp};
use crate::disc::basis::ReferenceElement;
use crate::stab::mode_info;

/// Relative energy of the top modal shell measured in the mass norm.
pub struct Persson {
    n: usize,
    project_nm1: Array2<f64>,
    mass: Array2<f64>,
    s0: f64,
    kappa: f64,
}

impl Persson {
    pub fn new(reference: &ReferenceElement, kappa: f64) -> Self {
        let n = reference.n;
        let trunc = mode_info::mode_info_persson(reference.element_type, n);
        let mut truncated_v = reference.vandermonde.clone();
        for (mut column, &keep) in truncated_v.columns_mut().into_iter().zip(trunc.iter()) {
            if keep == 0 {
                column.fill(0.0);
            }
        }
        let project_nm1 = truncated_v.dot(&reference.inv_vandermonde);
        let s0 = if n > 0 { -4.0 * (n as f64).log10() } else { 0.0 };
        log::debug!("persson: N = {n}, s0 = {s0}, kappa = {kappa}");
        Self {
            n,
            project_nm1,
            mass: reference.mass.clone(),
            s0,
            kappa,
        }
    }
    /// `log10` of the high-mode to total energy ratio; `None` for a zero field.
    pub fn smoothness(&self, q: ArrayView1<f64>) -> Option<f64> {
        let total = q.dot(&self.mass.dot(&q));
        if total <= 0.0 {
            return None;
        }
        let d = &q - &self.project_nm1.dot(&q);
        let high = d.dot(&self.mass.dot(&d)).max(0.0);
        Some((high / total).log10())
    }
}

impl Detector for Persson {
    fn name(&self) -> &'static str {
        "persson"
    }
    fn indicator(&self, q: ArrayView1<f64>) -> Indicator {
        if self.n == 0 {
            return Indicator::SMOOTH;
        }
        let Some(s) = self.smoothness(q) else {
            return Indicator::SMOOTH;
        };
        let activation = if s < self.s0 - self.kappa {
            0.0
        } else if s > self.s0 + self.kappa {
            1.0
        } else {
            smooth_ramp((s - self.s0) / self.kappa)
        };
        Indicator {
            troubled: s > self.s0,
            activation,
        }
    }
}
