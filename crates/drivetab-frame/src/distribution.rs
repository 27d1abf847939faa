//! Distribution estimates for one numeric column: histogram bins, a
//! Gaussian kernel density curve and box-plot statistics.

use serde::{Deserialize, Serialize};

/// Upper bound on histogram bins; a tiny IQR with a wide range would
/// otherwise produce millions of slivers.
pub const MAX_BINS: usize = 500;

/// Number of points the density curve is evaluated at.
pub const KDE_POINTS: usize = 200;

/// Linear-interpolated quantile of `sorted` (ascending, finite) at `q` in `[0, 1]`.
///
/// Returns `None` for an empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let h = last as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(last);
    let frac = h - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Finite values sorted ascending.
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Arithmetic mean, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (`n - 1` denominator), `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

// ============================================================================
// Histogram
// ============================================================================

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin edges; one more than the number of bins.
    pub edges: Vec<f64>,
    /// Values per bin. The last bin includes its right edge.
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` using the "auto" rule.
    ///
    /// The bin width is the smaller of the Sturges and Freedman-Diaconis
    /// widths, or Sturges alone when the interquartile range is zero. When
    /// all values are equal the single bin spans `value ± 0.5`. Returns
    /// `None` when there are no finite values.
    pub fn auto(values: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(values);
        let (&min, &max) = (sorted.first()?, sorted.last()?);
        let n = sorted.len() as f64;

        let (first, last) = if min == max {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };

        let ptp = max - min;
        let sturges = ptp / (n.log2() + 1.0);
        let iqr = quantile(&sorted, 0.75)? - quantile(&sorted, 0.25)?;
        let fd = 2.0 * iqr * n.powf(-1.0 / 3.0);
        let width = if fd > 0.0 { fd.min(sturges) } else { sturges };

        let bins = if width > 0.0 {
            (((last - first) / width).ceil() as usize).clamp(1, MAX_BINS)
        } else {
            1
        };
        Some(Self::with_bins(&sorted, first, last, bins))
    }

    fn with_bins(sorted: &[f64], first: f64, last: f64, bins: usize) -> Self {
        let step = (last - first) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| first + step * i as f64).collect();
        let mut counts = vec![0usize; bins];
        for &v in sorted {
            let idx = (((v - first) / step).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Self { edges, counts }
    }

    /// Number of bins.
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Width of each bin.
    pub fn bin_width(&self) -> f64 {
        match (self.edges.first(), self.edges.last()) {
            (Some(a), Some(b)) if !self.counts.is_empty() => (b - a) / self.counts.len() as f64,
            _ => 0.0,
        }
    }

    /// Tallest bin.
    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

// ============================================================================
// Kde
// ============================================================================

/// Gaussian kernel density estimate sampled on a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kde {
    /// Kernel bandwidth.
    pub bandwidth: f64,
    /// `(x, y)` points, `x` ascending.
    pub points: Vec<(f64, f64)>,
}

impl Kde {
    /// Estimate with Scott's bandwidth, `std * n^(-1/5)`.
    ///
    /// The curve covers `[min, max]` with [`KDE_POINTS`] points. Densities are
    /// multiplied by `scale`; pass `n * bin_width` to overlay it on a
    /// histogram of counts. Returns `None` for fewer than two values or zero
    /// variance.
    pub fn scott(values: &[f64], scale: f64) -> Option<Self> {
        let data = sorted_finite(values);
        let std = sample_std(&data)?;
        if std <= 0.0 {
            return None;
        }
        let n = data.len() as f64;
        let bandwidth = std * n.powf(-0.2);
        let (min, max) = (*data.first()?, *data.last()?);
        let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

        let step = (max - min) / (KDE_POINTS - 1) as f64;
        let points = (0..KDE_POINTS)
            .map(|i| {
                let x = min + step * i as f64;
                let density: f64 = data
                    .iter()
                    .map(|xi| {
                        let u = (x - xi) / bandwidth;
                        (-0.5 * u * u).exp()
                    })
                    .sum::<f64>()
                    * norm;
                (x, density * scale)
            })
            .collect();

        Some(Self { bandwidth, points })
    }

    /// Highest `y` on the curve.
    pub fn max_y(&self) -> f64 {
        self.points.iter().map(|p| p.1).fold(0.0, f64::max)
    }
}

// ============================================================================
// BoxStats
// ============================================================================

/// Five-number summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    /// First quartile.
    pub q1: f64,
    /// Median.
    pub median: f64,
    /// Third quartile.
    pub q3: f64,
    /// Lowest value not below `q1 - 1.5 * IQR`.
    pub whisker_low: f64,
    /// Highest value not above `q3 + 1.5 * IQR`.
    pub whisker_high: f64,
    /// Values outside the whiskers, ascending.
    pub fliers: Vec<f64>,
}

impl BoxStats {
    /// Compute from unsorted values; `None` when there are no finite values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(values);
        let q1 = quantile(&sorted, 0.25)?;
        let median = quantile(&sorted, 0.5)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        let fences = low_fence..=high_fence;
        let whisker_low = sorted
            .iter()
            .copied()
            .find(|v| fences.contains(v))
            .unwrap_or(q1)
            .min(q1);
        let whisker_high = sorted
            .iter()
            .copied()
            .rfind(|v| fences.contains(v))
            .unwrap_or(q3)
            .max(q3);
        let fliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < low_fence || *v > high_fence)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            fliers,
        })
    }

    /// Smallest value drawn, whisker or flier.
    pub fn lowest(&self) -> f64 {
        self.fliers.first().copied().unwrap_or(self.whisker_low).min(self.whisker_low)
    }

    /// Largest value drawn, whisker or flier.
    pub fn highest(&self) -> f64 {
        self.fliers.last().copied().unwrap_or(self.whisker_high).max(self.whisker_high)
    }
}
