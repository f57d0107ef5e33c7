use ndarray::{Array1, Array2, ArrayViewMut3, s};

use super::Stabilizer;
use crate::disc::basis::ReferenceElement;
use crate::disc::mesh::Mesh;
use crate::error::{Result, StabError};
use crate::stab::detector::Detection;

/// Exponential modal filter `V diag(sigma) V^-1` applied to troubled elements.
pub struct ExponentialFilter {
    filter_m: Array2<f64>,
}

impl ExponentialFilter {
    pub fn new(reference: &ReferenceElement, cutoff: usize, order: usize) -> Result<Self> {
        if order == 0 || order % 2 != 0 {
            return Err(StabError::invalid_setting(
                "FILTER ORDER",
                order,
                "filter order must be even and positive",
            ));
        }
        let n = reference.n;
        if cutoff >= n {
            log::warn!("filter cutoff {cutoff} is not below N = {n}, the filter is the identity");
            return Ok(Self {
                filter_m: Array2::eye(reference.np),
            });
        }
        let alpha = -f64::EPSILON.ln();
        let damping = |eta: usize| -> f64 {
            if eta < cutoff {
                1.0
            } else {
                let x = (eta - cutoff) as f64 / (n - cutoff) as f64;
                (-alpha * x.powi(order as i32)).exp()
            }
        };
        let element_type = reference.element_type;
        let sigma = Array1::from_iter(reference.modes.iter().map(|mode| {
            if element_type.is_simplex() {
                damping(element_type.mode_order(*mode))
            } else {
                mode[..element_type.dim()].iter().map(|&m| damping(m)).product()
            }
        }));
        let scaled_v = &reference.vandermonde * &sigma;
        let filter_m = scaled_v.dot(&reference.inv_vandermonde);
        log::debug!("filter: N = {n}, cutoff = {cutoff}, order = {order}");
        Ok(Self { filter_m })
    }
    pub fn matrix(&self) -> &Array2<f64> {
        &self.filter_m
    }
}

impl Stabilizer for ExponentialFilter {
    fn name(&self) -> &'static str {
        "filter"
    }
    fn apply(
        &mut self,
        mesh: &Mesh,
        detection: &Detection,
        mut q: ArrayViewMut3<f64>,
        _rhs: ArrayViewMut3<f64>,
        _time: f64,
    ) -> Result<()> {
        let s_nfields = q.shape()[1];
        for e in 0..mesh.nelements {
            for fld in 0..s_nfields {
                if detection.is_troubled(e, fld, s_nfields) {
                    let filtered: Array1<f64> = self.filter_m.dot(&q.slice(s![e, fld, ..]));
                    q.slice_mut(s![e, fld, ..]).assign(&filtered);
                }
            }
        }
        Ok(())
    }
}
