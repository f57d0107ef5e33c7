use ndarray::{Array1, Array2, Array3, ArrayView3, ArrayViewMut3};
use ndarray_stats::QuantileExt;

use super::Stabilizer;
use crate::disc::{
    mesh::Mesh,
    ogs::{GatherScatter, GsOp},
};
use crate::error::Result;
use crate::stab::detector::Detection;

/// Continuous artificial viscosity built from the detector activation.
pub struct ArtificialDiffusion {
    alpha: f64,
    warmup_time: f64,
    /// `h_e / N` per local element.
    visc_scale: Array1<f64>,
    /// Vertex shape functions at the nodes, shape `(np, nverts)`.
    project_visc: Array2<f64>,
    ogs: GatherScatter,
    /// Reciprocal vertex multiplicity, one entry per (element, vertex).
    weight: Vec<f64>,
    /// Laid out `(element, vertex, field)`.
    vertex_visc: Vec<f64>,
    /// Nodal viscosity, shape `(ntotal, d_nfields, np)`.
    visc: Array3<f64>,
}

impl ArtificialDiffusion {
    pub fn new(mesh: &Mesh, d_nfields: usize, alpha: f64, warmup_time: f64) -> Result<Self> {
        let n = mesh.n().max(1) as f64;
        let visc_scale =
            Array1::from_iter((0..mesh.nelements).map(|e| mesh.characteristic_length(e) / n));
        let project_visc = Self::vertex_projection(mesh);

        let global_ids: Vec<i64> = mesh.e_to_v.iter().map(|&v| v as i64).collect();
        let ogs = GatherScatter::setup(&global_ids, false);
        let mut weight = vec![1.0; global_ids.len()];
        ogs.gather_scatter(&mut weight, 1, GsOp::Add);
        weight.iter_mut().for_each(|w| *w = 1.0 / *w);

        log::info!(
            "artificial diffusion: alpha = {alpha}, scale in [{:e}, {:e}]",
            visc_scale.min_skipnan(),
            visc_scale.max_skipnan()
        );
        if warmup_time > 0.0 {
            log::warn!("artificial diffusion uses uniform viscosity up to t = {warmup_time}");
        }
        Ok(Self {
            alpha,
            warmup_time,
            visc_scale,
            project_visc,
            ogs,
            weight,
            vertex_visc: vec![0.0; global_ids.len() * d_nfields],
            visc: Array3::zeros((mesh.ntotal(), d_nfields, mesh.np())),
        })
    }
    /// Linear (multilinear on tensor elements) vertex interpolation at the
    /// nodes. Entries are clipped at zero so round-off in the node
    /// coordinates never turns a vertex weight negative.
    fn vertex_projection(mesh: &Mesh) -> Array2<f64> {
        let element_type = mesh.element_type;
        let mut projection = Array2::<f64>::zeros((mesh.np(), mesh.nverts()));
        for i in 0..mesh.np() {
            let phi = element_type.vertex_shape_functions(mesh.reference.node(i));
            for (v, p) in phi.into_iter().enumerate() {
                projection[[i, v]] = p.max(0.0);
            }
        }
        projection
    }
    pub fn visc_scale(&self) -> &Array1<f64> {
        &self.visc_scale
    }
    pub fn vertex_visc(&self) -> &[f64] {
        &self.vertex_visc
    }

    fn compute_viscosity(&mut self, mesh: &Mesh, detection: &Detection) {
        let nverts = mesh.nverts();
        let d_nfields = detection.d_nfields;
        for e in 0..mesh.nelements {
            for v in 0..nverts {
                for d in 0..d_nfields {
                    self.vertex_visc[(e * nverts + v) * d_nfields + d] =
                        self.alpha * detection.activation[[e, d]] * self.visc_scale[e];
                }
            }
        }
    }
    fn average_vertices(&mut self, d_nfields: usize) {
        self.ogs
            .gather_scatter(&mut self.vertex_visc, d_nfields, GsOp::Add);
        for (entry, w) in self.weight.iter().enumerate() {
            for d in 0..d_nfields {
                self.vertex_visc[entry * d_nfields + d] *= w;
            }
        }
    }
    fn project_viscosity(&mut self, mesh: &Mesh, d_nfields: usize) {
        let nverts = mesh.nverts();
        for e in 0..mesh.nelements {
            for d in 0..d_nfields {
                for i in 0..mesh.np() {
                    let visc: f64 = (0..nverts)
                        .map(|v| {
                            self.project_visc[[i, v]]
                                * self.vertex_visc[(e * nverts + v) * d_nfields + d]
                        })
                        .sum();
                    self.visc[[e, d, i]] = visc.max(0.0);
                }
            }
        }
    }
}

impl Stabilizer for ArtificialDiffusion {
    fn name(&self) -> &'static str {
        "artificial diffusion"
    }
    fn apply(
        &mut self,
        mesh: &Mesh,
        detection: &Detection,
        _q: ArrayViewMut3<f64>,
        _rhs: ArrayViewMut3<f64>,
        time: f64,
    ) -> Result<()> {
        if self.warmup_time > 0.0 && time <= self.warmup_time {
            let uniform = *self.visc_scale.min_skipnan();
            self.visc.fill(uniform);
            return Ok(());
        }
        let d_nfields = detection.d_nfields;
        self.compute_viscosity(mesh, detection);
        self.average_vertices(d_nfields);
        self.project_viscosity(mesh, d_nfields);
        Ok(())
    }
    fn visc(&self) -> Option<ArrayView3<'_, f64>> {
        Some(self.visc.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disc::basis::ElementType;
    use approx::assert_relative_eq;

    fn run(mesh: &Mesh, activation: &[f64], warmup: f64, time: f64) -> ArtificialDiffusion {
        let mut artdiff = ArtificialDiffusion::new(mesh, 1, 2.0, warmup).unwrap();
        let mut detection = Detection::new(mesh.ntotal(), vec![0]);
        for (e, &a) in activation.iter().enumerate() {
            detection.activation[[e, 0]] = a;
        }
        let mut q = Array3::<f64>::zeros((mesh.ntotal(), 1, mesh.np()));
        let mut rhs = q.clone();
        artdiff
            .apply(mesh, &detection, q.view_mut(), rhs.view_mut(), time)
            .unwrap();
        artdiff
    }

    #[test]
    fn test_shared_vertices_averaged() {
        let mesh =
            Mesh::rectangle(ElementType::Triangle, 2, (1, 1), (0.0, 1.0), (0.0, 1.0)).unwrap();
        let artdiff = run(&mesh, &[1.0, 0.0], 0.0, 1.0);
        let scale = artdiff.visc_scale()[0];
        assert_relative_eq!(scale, 0.5_f64.sqrt() / 2.0, epsilon = 1e-12);
        let visc = artdiff.visc().unwrap();
        let vertex_nodes = &mesh.reference.vertex_nodes;
        // element 0 is [v00, v10, v11]; v10 belongs to it alone
        assert_relative_eq!(visc[[0, 0, vertex_nodes[0]]], 0.5 * 2.0 * scale, epsilon = 1e-12);
        assert_relative_eq!(visc[[0, 0, vertex_nodes[1]]], 2.0 * scale, epsilon = 1e-12);
        assert_relative_eq!(visc[[0, 0, vertex_nodes[2]]], 0.5 * 2.0 * scale, epsilon = 1e-12);
        // element 1 is [v00, v11, v01]
        assert_relative_eq!(visc[[1, 0, vertex_nodes[2]]], 0.0, epsilon = 1e-14);
        assert!(visc.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_viscosity_non_negative_next_to_smooth_elements() {
        for element_type in [ElementType::Triangle, ElementType::Quadrilateral] {
            for n in 1..6 {
                let mesh =
                    Mesh::rectangle(element_type, n, (3, 1), (0.0, 3.0), (0.0, 1.0)).unwrap();
                let mut activation = vec![0.0; mesh.nelements];
                activation[0] = 1.0;
                let artdiff = run(&mesh, &activation, 0.0, 1.0);
                let visc = artdiff.visc().unwrap();
                assert!(visc.iter().all(|&v| v >= 0.0));
                // the last element shares no vertex with the first
                let last = mesh.nelements - 1;
                assert!(visc.slice(ndarray::s![last, 0, ..]).iter().all(|&v| v == 0.0));
            }
        }
    }

    #[test]
    fn test_smooth_region_has_no_viscosity() {
        let mesh =
            Mesh::rectangle(ElementType::Quadrilateral, 3, (3, 2), (0.0, 3.0), (0.0, 2.0)).unwrap();
        let artdiff = run(&mesh, &[0.0; 6], 0.0, 1.0);
        assert!(artdiff.visc().unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_projection_reproduces_vertex_values() {
        let mesh = Mesh::cuboid(
            ElementType::Hexahedron,
            2,
            (1, 1, 1),
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
        )
        .unwrap();
        let projection = ArtificialDiffusion::vertex_projection(&mesh);
        for (v, &node) in mesh.reference.vertex_nodes.iter().enumerate() {
            for w in 0..mesh.nverts() {
                let expected = if v == w { 1.0 } else { 0.0 };
                assert_relative_eq!(projection[[node, w]], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_warmup_is_uniform() {
        let mesh =
            Mesh::rectangle(ElementType::Triangle, 1, (2, 1), (0.0, 2.0), (0.0, 1.0)).unwrap();
        let artdiff = run(&mesh, &[0.0, 1.0, 0.0, 0.0], 0.5, 0.1);
        let expected = *artdiff.visc_scale().min_skipnan();
        assert!(artdiff.visc().unwrap().iter().all(|&v| (v - expected).abs() < 1e-14));
    }
}
