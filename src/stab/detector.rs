use ndarray::{Array2, ArrayView1, ArrayView3};

use crate::disc::mesh::Mesh;
use crate::stab::types::CellMode;

pub mod klockner;
pub mod persson;

pub use klockner::Klockner;
pub use persson::Persson;

/// Smoothness verdict for one element field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Indicator {
    pub troubled: bool,
    /// Continuous activation in [0, 1].
    pub activation: f64,
}

impl Indicator {
    pub const SMOOTH: Self = Self {
        troubled: false,
        activation: 0.0,
    };
}

pub trait Detector {
    fn name(&self) -> &'static str;
    /// Classifies the nodal values of one field on one element.
    fn indicator(&self, q: ArrayView1<f64>) -> Indicator;
}

/// Most recent detector output, rows are local then halo elements.
#[derive(Clone, Debug)]
pub struct Detection {
    pub d_nfields: usize,
    /// Solution field read for each detected field.
    pub field_map: Vec<usize>,
    /// Flag per (element, field); takes [`CellMode`] flags when neighbors are marked.
    pub e_list: Array2<i32>,
    pub activation: Array2<f64>,
}

impl Detection {
    pub fn new(ntotal: usize, field_map: Vec<usize>) -> Self {
        let d_nfields = field_map.len();
        Self {
            d_nfields,
            field_map,
            e_list: Array2::zeros((ntotal, d_nfields)),
            activation: Array2::zeros((ntotal, d_nfields)),
        }
    }
    /// Detected field governing solution field `fld` out of `s_nfields`.
    fn detected_field(&self, fld: usize, s_nfields: usize) -> Option<usize> {
        (self.d_nfields == s_nfields).then_some(fld)
    }
    /// Whether solution field `fld` of element `e` is troubled. With fewer
    /// detected than stabilized fields any detected field flags them all.
    pub fn is_troubled(&self, e: usize, fld: usize, s_nfields: usize) -> bool {
        self.mode(e, fld, s_nfields) == CellMode::Fv
    }
    pub fn mode(&self, e: usize, fld: usize, s_nfields: usize) -> CellMode {
        match self.detected_field(fld, s_nfields) {
            Some(d) => CellMode::from_flag(self.e_list[[e, d]]),
            None => self
                .e_list
                .row(e)
                .iter()
                .map(|&flag| CellMode::from_flag(flag))
                .max_by_key(|mode| match mode {
                    CellMode::Dg => 0,
                    CellMode::DgFv => 1,
                    CellMode::Fv => 2,
                })
                .unwrap_or(CellMode::Dg),
        }
    }

    /// Runs `detector` on every local element and detected field.
    pub fn fill(&mut self, detector: &dyn Detector, mesh: &Mesh, q: ArrayView3<f64>) {
        self.e_list.fill(0);
        self.activation.fill(0.0);
        for e in 0..mesh.nelements {
            for (d, &fld) in self.field_map.iter().enumerate() {
                let indicator = detector.indicator(q.slice(ndarray::s![e, fld, ..]));
                self.e_list[[e, d]] = i32::from(indicator.troubled);
                self.activation[[e, d]] = indicator.activation;
            }
        }
    }

    /// Marks smooth elements with a troubled face neighbor as [`CellMode::DgFv`].
    ///
    /// Flags travel through the halo as floats and come back as integers.
    pub fn mark_neighbors(&mut self, mesh: &Mesh) {
        let mut ef_list: Vec<f64> = self.e_list.iter().map(|&flag| flag as f64).collect();
        mesh.halo.exchange(&mut ef_list, self.d_nfields);
        let fv = CellMode::Fv.flag() as f64;
        for e in 0..mesh.nelements {
            for d in 0..self.d_nfields {
                let own = ef_list[e * self.d_nfields + d];
                let mode = if own == fv {
                    CellMode::Fv
                } else if (0..mesh.nfaces()).any(|f| {
                    let e_p = mesh.e_to_e[[e, f]];
                    e_p != e && ef_list[e_p * self.d_nfields + d] == fv
                }) {
                    CellMode::DgFv
                } else {
                    CellMode::Dg
                };
                self.e_list[[e, d]] = mode.flag();
            }
        }
        for e in mesh.nelements..mesh.ntotal() {
            for d in 0..self.d_nfields {
                self.e_list[[e, d]] = ef_list[e * self.d_nfields + d] as i32;
            }
        }
    }

    /// Number of troubled (element, field) entries among local elements.
    pub fn troubled_count(&self, nelements: usize) -> usize {
        self.e_list
            .rows()
            .into_iter()
            .take(nelements)
            .flat_map(|row| row.into_iter().copied().collect::<Vec<_>>())
            .filter(|&flag| flag == CellMode::Fv.flag())
            .count()
    }
}

/// Sine ramp from 0 at `x = -1` to 1 at `x = 1`, clamped outside.
pub(crate) fn smooth_ramp(x: f64) -> f64 {
    if x <= -1.0 {
        0.0
    } else if x >= 1.0 {
        1.0
    } else {
        0.5 * (1.0 + (0.5 * std::f64::consts::PI * x).sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disc::basis::ElementType;

    struct Threshold;
    impl Detector for Threshold {
        fn name(&self) -> &'static str {
            "threshold"
        }
        fn indicator(&self, q: ArrayView1<f64>) -> Indicator {
            if q.iter().any(|&v| v > 1.0) {
                Indicator {
                    troubled: true,
                    activation: 1.0,
                }
            } else {
                Indicator::SMOOTH
            }
        }
    }

    #[test]
    fn test_neighbor_marking_on_strip() {
        let mesh =
            Mesh::rectangle(ElementType::Triangle, 1, (3, 1), (0.0, 3.0), (0.0, 1.0)).unwrap();
        let mut q = ndarray::Array3::<f64>::zeros((mesh.ntotal(), 2, mesh.np()));
        q[[2, 0, 0]] = 5.0;
        let mut detection = Detection::new(mesh.ntotal(), vec![0, 1]);
        detection.fill(&Threshold, &mesh, q.view());
        assert_eq!(detection.troubled_count(mesh.nelements), 1);

        detection.mark_neighbors(&mesh);
        assert_eq!(detection.mode(2, 0, 2), CellMode::Fv);
        for f in 0..3 {
            let e_p = mesh.e_to_e[[2, f]];
            if e_p != 2 {
                assert_eq!(detection.mode(e_p, 0, 2), CellMode::DgFv);
            }
        }
        // lower triangles of the outer cells share no edge with element 2
        assert_eq!(detection.mode(0, 0, 2), CellMode::Dg);
        assert_eq!(detection.mode(4, 0, 2), CellMode::Dg);
        assert_eq!(detection.mode(2, 1, 2), CellMode::Dg);
        assert_eq!(detection.troubled_count(mesh.nelements), 1);
    }

    #[test]
    fn test_neighbor_marking_across_partitions() {
        use crate::disc::mesh::halo::two_rank;

        let [c0, c1] = two_rank::channels();
        let results = std::thread::scope(|scope| {
            let ranks = [(0, c0), (1, c1)].map(|(rank, ends)| {
                scope.spawn(move || {
                    let mesh = two_rank::triangle_strip(1, rank, ends);
                    let (own_e, _) = two_rank::interface(&mesh);
                    let mut q = ndarray::Array3::<f64>::zeros((mesh.ntotal(), 1, mesh.np()));
                    if rank == 0 {
                        q[[own_e, 0, 0]] = 5.0;
                    }
                    let mut detection = Detection::new(mesh.ntotal(), vec![0]);
                    detection.fill(&Threshold, &mesh, q.view());
                    detection.mark_neighbors(&mesh);
                    let modes: Vec<CellMode> =
                        (0..mesh.nelements).map(|e| detection.mode(e, 0, 1)).collect();
                    (own_e, modes, detection.e_list[[mesh.nelements, 0]])
                })
            });
            ranks.map(|handle| handle.join().unwrap())
        });

        let (own_e, modes, halo_flag) = &results[0];
        assert_eq!(modes[*own_e], CellMode::Fv);
        // halo rows carry the peer's detection flags
        assert_eq!(*halo_flag, CellMode::Dg.flag());
        let (own_e, modes, halo_flag) = &results[1];
        assert_eq!(*halo_flag, CellMode::Fv.flag());
        for (e, &mode) in modes.iter().enumerate() {
            let expected = if e == *own_e { CellMode::DgFv } else { CellMode::Dg };
            assert_eq!(mode, expected);
        }
    }

    #[test]
    fn test_ramp_limits() {
        assert_eq!(smooth_ramp(-2.0), 0.0);
        assert_eq!(smooth_ramp(0.0), 0.5);
        assert_eq!(smooth_ramp(3.0), 1.0);
    }
}
