use crate::disc::basis::{cross, dot, norm, sub};

pub trait Geometric2D {
    fn compute_normal(x0: f64, y0: f64, x1: f64, y1: f64) -> [f64; 2] {
        // normalized normal vector
        let normal = [y1 - y0, x0 - x1];
        let normal_magnitude = (normal[0].powi(2) + normal[1].powi(2)).sqrt();
        [normal[0] / normal_magnitude, normal[1] / normal_magnitude]
    }
    fn compute_edge_length(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
        ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt()
    }
    /// Signed area of a polygon with counter-clockwise vertices.
    fn compute_signed_area(x: &[f64], y: &[f64]) -> f64 {
        let n = x.len();
        0.5 * (0..n)
            .map(|i| x[i] * y[(i + 1) % n] - x[(i + 1) % n] * y[i])
            .sum::<f64>()
    }
}

pub trait Geometric3D {
    fn compute_signed_tet_volume(a: [f64; 3], b: [f64; 3], c: [f64; 3], d: [f64; 3]) -> f64 {
        dot(cross(sub(b, a), sub(c, a)), sub(d, a)) / 6.0
    }
    /// Signed volume of a hexahedron, split into six tetrahedra around the
    /// diagonal from vertex 0 to vertex 6.
    fn compute_signed_hex_volume(v: &[[f64; 3]]) -> f64 {
        [[1, 2], [2, 3], [3, 7], [7, 4], [4, 5], [5, 1]]
            .iter()
            .map(|&[b, c]| Self::compute_signed_tet_volume(v[0], v[b], v[c], v[6]))
            .sum()
    }
    /// Area-weighted normal of a planar triangle or quadrilateral face.
    fn compute_face_area_normal(v: &[[f64; 3]]) -> [f64; 3] {
        let an = if v.len() == 3 {
            cross(sub(v[1], v[0]), sub(v[2], v[0]))
        } else {
            cross(sub(v[2], v[0]), sub(v[3], v[1]))
        };
        [0.5 * an[0], 0.5 * an[1], 0.5 * an[2]]
    }
    fn compute_face_area(v: &[[f64; 3]]) -> f64 {
        norm(Self::compute_face_area_normal(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Probe;
    impl Geometric2D for Probe {}
    impl Geometric3D for Probe {}

    #[test]
    fn test_unit_shapes() {
        let area = Probe::compute_signed_area(&[0.0, 1.0, 1.0, 0.0], &[0.0, 0.0, 1.0, 1.0]);
        assert_relative_eq!(area, 1.0, epsilon = 1e-14);
        let normal = Probe::compute_normal(0.0, 0.0, 1.0, 0.0);
        assert_relative_eq!(normal[1], -1.0, epsilon = 1e-14);

        let cube: Vec<[f64; 3]> = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        assert_relative_eq!(Probe::compute_signed_hex_volume(&cube), 1.0, epsilon = 1e-14);
        assert_relative_eq!(
            Probe::compute_face_area(&cube[0..4]),
            1.0,
            epsilon = 1e-14
        );
    }
}
