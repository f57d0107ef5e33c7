use ndarray::{Array1, Array2};

use crate::disc::{basis::ElementType, linalg};
use crate::error::Result;

/// Bucket (polynomial order) of every mode in canonical basis order.
pub fn mode_buckets(element_type: ElementType, n: usize) -> Vec<usize> {
    element_type
        .mode_indices(n)
        .into_iter()
        .map(|mode| element_type.mode_order(mode))
        .collect()
}

/// Permutation of the modes sorted by bucket, lowest order first.
///
/// The first pass assigns a bucket to every mode, the second re-walks the
/// canonical enumeration once per bucket so modes inside a bucket keep their
/// basis order.
pub fn mode_info_klockner(element_type: ElementType, n: usize) -> Vec<usize> {
    let buckets = mode_buckets(element_type, n);
    let mut mode_map = Vec::with_capacity(buckets.len());
    for id in 0..n + 1 {
        for (sk, &bucket) in buckets.iter().enumerate() {
            if bucket == id {
                mode_map.push(sk);
            }
        }
    }
    mode_map
}

/// 1 for every mode below the top order, 0 for the top shell.
pub fn mode_info_persson(element_type: ElementType, n: usize) -> Vec<u8> {
    mode_buckets(element_type, n)
        .into_iter()
        .map(|bucket| u8::from(bucket < n))
        .collect()
}

/// Slope row of the least-squares fit of `log10(a_b) = slope * log10(b) + c`
/// over buckets `b = 1..=n`.
pub fn least_squares_fit(n: usize) -> Result<Array1<f64>> {
    if n == 0 {
        return Ok(Array1::zeros(0));
    }
    let design = Array2::from_shape_fn((n, 2), |(k, col)| {
        if col == 0 { ((k + 1) as f64).log10() } else { 1.0 }
    });
    let pinv = linalg::pseudo_inverse(design.view(), "klockner least-squares fit")?;
    Ok(pinv.row(0).to_owned())
}

/// Squared modal amplitudes of a normalized, just-resolved `n^-N` decay.
pub fn baseline_decay(n: usize) -> Array1<f64> {
    let mut bld = Array1::<f64>::zeros(n + 1);
    if n == 0 {
        return bld;
    }
    let bsum = 1.0
        / (1..n + 1)
            .map(|j| 1.0 / (j as f64).powi(2 * n as i32))
            .sum::<f64>()
            .sqrt();
    for k in 1..n + 1 {
        bld[k] = (bsum / (k as f64).powi(n as i32)).powi(2);
    }
    bld
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ALL_TYPES: [ElementType; 4] = [
        ElementType::Triangle,
        ElementType::Quadrilateral,
        ElementType::Tetrahedron,
        ElementType::Hexahedron,
    ];

    #[test]
    fn test_mode_map_is_bucket_sorted_permutation() {
        for element_type in ALL_TYPES {
            for n in 0..5 {
                let np = element_type.np(n);
                let mode_map = mode_info_klockner(element_type, n);
                let mut seen = mode_map.clone();
                seen.sort_unstable();
                assert_eq!(seen, (0..np).collect::<Vec<_>>());

                let buckets = mode_buckets(element_type, n);
                let mut sizes = vec![0usize; n + 1];
                for &b in &buckets {
                    sizes[b] += 1;
                }
                assert!(sizes.iter().all(|&size| size > 0));
                if element_type.is_simplex() {
                    assert!(sizes.windows(2).all(|w| w[0] < w[1]));
                }
                let sorted: Vec<usize> = mode_map.iter().map(|&m| buckets[m]).collect();
                assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
            }
        }
        assert_eq!(mode_info_klockner(ElementType::Triangle, 0), vec![0]);
    }

    #[test]
    fn test_persson_truncates_top_shell() {
        for n in 1..7 {
            let trunc = mode_info_persson(ElementType::Triangle, n);
            let cut = trunc.iter().filter(|&&t| t == 0).count();
            let np = ElementType::Triangle.np(n);
            let np_lower = ElementType::Triangle.np(n - 1);
            assert_eq!(cut, np - np_lower);
        }
    }

    #[test]
    fn test_baseline_decay_monotone() {
        for n in 1..8 {
            let bld = baseline_decay(n);
            assert_eq!(bld[0], 0.0);
            assert!((1..n).all(|k| bld[k + 1] < bld[k]));
            assert_relative_eq!(bld.sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_fit_recovers_power_law() {
        let n = 4;
        let lsf = least_squares_fit(n).unwrap();
        let slope: f64 = (0..n)
            .map(|k| lsf[k] * (3.0 * ((k + 1) as f64).powf(-2.5)).log10())
            .sum();
        assert_relative_eq!(slope, -2.5, epsilon = 1e-10);
    }
}
