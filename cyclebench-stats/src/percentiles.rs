//! Percentile Extraction
//!
//! Percentiles are read straight out of a sorted sample at index
//! `floor(n * q)`; there is no interpolation between ranks. For `n = 128`
//! this gives p75 = 96, p90 = 115, p99 = 126.

/// Standard percentiles reported for every benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Percentiles {
    /// 75th percentile
    pub p75: i64,
    /// 90th percentile
    pub p90: i64,
    /// 99th percentile
    pub p99: i64,
}

/// Index of quantile `q` (in `0.0..=1.0`) in a sorted sample of length `n`.
///
/// Clamped to the last element so `q = 1.0` is still a valid index.
/// Returns 0 for an empty sample.
pub fn percentile_index(n: usize, q: f64) -> usize {
    if n == 0 {
        return 0;
    }
    ((n as f64 * q).floor() as usize).min(n - 1)
}

/// Value at quantile `q` of an already sorted sample.
///
/// # Examples
///
/// ```ignore
/// # use cyclebench_stats::percentile_at;
/// let sorted: Vec<i64> = (0..128).collect();
/// assert_eq!(percentile_at(&sorted, 0.90), Some(115));
/// ```
pub fn percentile_at(sorted: &[i64], q: f64) -> Option<i64> {
    if sorted.is_empty() {
        return None;
    }
    Some(sorted[percentile_index(sorted.len(), q)])
}

/// Compute all reported percentiles of an already sorted sample
pub fn compute_percentiles(sorted: &[i64]) -> Option<Percentiles> {
    Some(Percentiles {
        p75: percentile_at(sorted, 0.75)?,
        p90: percentile_at(sorted, 0.90)?,
        p99: percentile_at(sorted, 0.99)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_for_default_run_count() {
        assert_eq!(percentile_index(128, 0.75), 96);
        assert_eq!(percentile_index(128, 0.90), 115);
        assert_eq!(percentile_index(128, 0.99), 126);
    }

    #[test]
    fn test_index_is_floored() {
        assert_eq!(percentile_index(10, 0.75), 7);
        assert_eq!(percentile_index(10, 0.99), 9);
        assert_eq!(percentile_index(3, 0.90), 2);
    }

    #[test]
    fn test_single_sample() {
        assert_eq!(percentile_index(1, 0.99), 0);
        assert_eq!(percentile_at(&[42], 0.75), Some(42));
    }

    #[test]
    fn test_full_quantile_is_clamped() {
        assert_eq!(percentile_index(5, 1.0), 4);
    }

    #[test]
    fn test_empty_samples() {
        assert_eq!(percentile_index(0, 0.5), 0);
        assert_eq!(percentile_at(&[], 0.5), None);
        assert!(compute_percentiles(&[]).is_none());
    }

    #[test]
    fn test_compute_all_percentiles() {
        let sorted: Vec<i64> = (1..=100).collect();
        let p = compute_percentiles(&sorted).unwrap();
        assert_eq!(p.p75, 76);
        assert_eq!(p.p90, 91);
        assert_eq!(p.p99, 100);
    }
}
