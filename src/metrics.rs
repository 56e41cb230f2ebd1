//! Quantiles of an empirical latency distribution.

/// Sorted latency samples read as `N - 1` equal-probability segments.
#[derive(Debug, Clone, Copy)]
pub struct LatencyDistribution<'a> {
    sorted: &'a [f64],
}

impl<'a> LatencyDistribution<'a> {
    /// Wrap samples that are already sorted ascending.
    pub fn new(sorted: &'a [f64]) -> Self {
        Self { sorted }
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Latency at cumulative probability `y`, linearly interpolated between
    /// neighbouring samples. `None` when there are no samples.
    pub fn quantile(&self, y: f64) -> Option<f64> {
        let last = *self.sorted.last()?;
        let seg_count = self.sorted.len() - 1;
        if seg_count == 0 {
            return Some(last);
        }
        let scaled = (y * seg_count as f64).trunc();
        if scaled < 0.0 {
            return Some(self.sorted[0]);
        }
        if scaled >= seg_count as f64 {
            return Some(last);
        }
        let i = scaled as usize;
        let x0 = self.sorted[i];
        let x1 = self.sorted[i + 1];
        let y0 = i as f64 / seg_count as f64;
        let y1 = (i + 1) as f64 / seg_count as f64;
        let t = (y - y0) / (y1 - y0);
        // `y * seg_count` can land one ulp below a segment boundary.
        let result = if t >= 1.0 { x1 } else { x0 + (x1 - x0) * t };
        if result < 0.0 {
            tracing::warn!(x0, x1, y0, y1, seg_count, result, "negative interpolated latency");
        }
        Some(result)
    }

    /// Latency at percentile `p` (0-100).
    pub fn percentile(&self, p: f64) -> Option<f64> {
        self.quantile(p / 100.0)
    }

    /// Exceedance curve sampled at `points + 1` evenly spaced probabilities:
    /// `(latency, 1 - y)` pairs, ordered by increasing latency.
    pub fn exceedance(&self, points: usize) -> Vec<(f64, f64)> {
        if self.is_empty() || points == 0 {
            return Vec::new();
        }
        (0..=points)
            .filter_map(|i| {
                let y = i as f64 / points as f64;
                self.quantile(y).map(|x| (x, 1.0 - y))
            })
            .collect()
    }
}

/// Sort latency samples ascending, dropping NaNs.
pub fn sorted_samples(samples: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = samples.into_iter().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::capture_logs;
    use proptest::prelude::*;

    #[test]
    fn median_of_five_lands_on_sample() {
        let s = [1.0, 2.0, 3.0, 4.0, 5.0];
        let d = LatencyDistribution::new(&s);
        assert_eq!(d.quantile(0.5), Some(3.0));
    }

    #[test]
    fn interpolates_inside_segment() {
        let s = [0.0, 10.0, 20.0];
        let d = LatencyDistribution::new(&s);
        assert_eq!(d.quantile(0.25), Some(5.0));
        assert_eq!(d.quantile(0.75), Some(15.0));
    }

    #[test]
    fn endpoints_clamp() {
        let s = [2.0, 4.0, 8.0];
        let d = LatencyDistribution::new(&s);
        assert_eq!(d.quantile(0.0), Some(2.0));
        assert_eq!(d.quantile(1.0), Some(8.0));
        assert_eq!(d.quantile(1.5), Some(8.0));
        assert_eq!(d.quantile(-0.5), Some(2.0));
    }

    #[test]
    fn single_and_empty_distributions() {
        let one = [0.25];
        assert_eq!(LatencyDistribution::new(&one).quantile(0.9), Some(0.25));
        assert_eq!(LatencyDistribution::new(&[]).quantile(0.5), None);
        assert!(LatencyDistribution::new(&[]).exceedance(10).is_empty());
    }

    #[test]
    fn single_sample_ignores_non_finite_probability() {
        let one = [0.25];
        let d = LatencyDistribution::new(&one);
        assert_eq!(d.quantile(f64::NAN), Some(0.25));
        assert_eq!(d.quantile(f64::INFINITY), Some(0.25));
    }

    #[test]
    fn segment_boundaries_are_bit_exact() {
        for n in 2..200usize {
            let s: Vec<f64> = (0..n).map(|i| 1.7 * i as f64 + 0.3).collect();
            let d = LatencyDistribution::new(&s);
            for (k, want) in s.iter().enumerate() {
                let y = k as f64 / (n - 1) as f64;
                assert_eq!(d.quantile(y), Some(*want), "n={n} k={k}");
            }
        }
    }

    #[test]
    fn negative_interpolation_is_reported() {
        let s = [-2.0, -1.0];
        let d = LatencyDistribution::new(&s);
        let (got, logs) = capture_logs(|| d.quantile(0.5));
        assert_eq!(got, Some(-1.5));
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("negative interpolated latency"), "{logs}");
        assert!(logs.contains("result=-1.5"), "{logs}");
        assert!(logs.contains("x0=-2.0"), "{logs}");
    }

    #[test]
    fn percentile_scales_input() {
        let s = [1.0, 2.0, 3.0, 4.0, 5.0];
        let d = LatencyDistribution::new(&s);
        assert_eq!(d.percentile(50.0), d.quantile(0.5));
        assert_eq!(d.percentile(100.0), Some(5.0));
    }

    #[test]
    fn exceedance_spans_unit_interval() {
        let s = [0.001, 0.002, 0.010];
        let curve = LatencyDistribution::new(&s).exceedance(2000);
        assert_eq!(curve.len(), 2001);
        assert_eq!(curve[0], (0.001, 1.0));
        assert_eq!(curve[2000], (0.010, 0.0));
    }

    #[test]
    fn sorted_samples_orders_and_drops_nan() {
        let v = sorted_samples([3.0, f64::NAN, 1.0, 2.0]);
        assert_eq!(v, vec![1.0, 2.0, 3.0]);
    }

    fn sorted_vec() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(0.0f64..10.0, 2..50).prop_map(sorted_samples)
    }

    proptest! {
        #[test]
        fn monotone_in_probability(s in sorted_vec(), a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let d = LatencyDistribution::new(&s);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(d.quantile(lo).unwrap() <= d.quantile(hi).unwrap() + 1e-12);
        }

        #[test]
        fn segment_boundaries_hit_samples(s in sorted_vec(), k in 0usize..50) {
            let k = k % s.len();
            let d = LatencyDistribution::new(&s);
            let y = k as f64 / (s.len() - 1) as f64;
            prop_assert_eq!(d.quantile(y), Some(s[k]));
        }

        #[test]
        fn bounded_by_extremes(s in sorted_vec(), y in 0.0f64..=1.0) {
            let d = LatencyDistribution::new(&s);
            let v = d.quantile(y).unwrap();
            prop_assert!(v >= s[0] - 1e-12 && v <= s[s.len() - 1] + 1e-12);
        }
    }
}
