//! Reporting utilities: per-run statistics and formatted terminal output.

pub mod format;

pub use format::*;

/// Min / max / mean of a numeric series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub n: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Summary statistics over the finite values of `values` (`None` if there are none).
pub fn series_stats(values: &[f64]) -> Option<SeriesStats> {
    let mut n = 0usize;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &v in values.iter().filter(|v| v.is_finite()) {
        n += 1;
        min = min.min(v);
        max = max.max(v);
        sum += v;
    }
    (n > 0).then(|| SeriesStats {
        n,
        min,
        max,
        mean: sum / n as f64,
    })
}
