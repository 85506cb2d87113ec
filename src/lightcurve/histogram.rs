//! Histograms over a scalar sequence.
//!
//! - `histogram`: fixed bin count over `[min, max]`
//! - `lightcurve_hist`: fixed bin width starting at `min`, for arrival times
//!
//! Both use half-open bins `[lo, hi)` except the last, which is closed so the
//! maximum value is always counted.

use tracing::debug;

use crate::domain::{Histogram, LightCurveHist};
use crate::error::{Result, TimingError};

/// `bin_count` equal-width bins spanning `[min(values), max(values)]`.
///
/// The last edge is exactly `max`. If every value is identical the range is
/// degenerate and all values land in the last bin.
pub fn histogram(values: &[f64], bin_count: usize) -> Result<Histogram> {
    if bin_count == 0 {
        return Err(TimingError::invalid("histogram bin count must be > 0"));
    }
    let (min, max) = finite_range(values)?;
    let span = finite_span(min, max)?;
    let width = span / bin_count as f64;

    let mut edges: Vec<f64> = (0..=bin_count).map(|i| min + i as f64 * width).collect();
    edges[bin_count] = max;

    let mut counts = vec![0u64; bin_count];
    let mut dropped = 0usize;
    for &x in values {
        let idx = if x == max {
            bin_count - 1
        } else {
            let scaled = (bin_count as f64 * (x - min) / span).floor();
            if scaled < 0.0 || scaled >= bin_count as f64 {
                dropped += 1;
                continue;
            }
            scaled as usize
        };
        counts[idx] += 1;
    }

    if dropped > 0 {
        debug!(dropped, "values fell outside the histogram range");
    }
    Ok(Histogram { edges, counts })
}

/// Light curve with a fixed bin width.
///
/// Edges are `min + k * binsize` for every `k` with
/// `min + k * binsize < max + binsize`, so the last bin always reaches `max`.
/// Returns the left edge of each bin and either the counts or, with `rate`,
/// counts per unit time.
pub fn lightcurve_hist(data: &[f64], binsize: f64, rate: bool) -> Result<LightCurveHist> {
    if !(binsize.is_finite() && binsize > 0.0) {
        return Err(TimingError::invalid(format!(
            "light-curve bin size must be finite and > 0, got {binsize}"
        )));
    }
    let (min, max) = finite_range(data)?;
    finite_span(min, max + binsize)?;

    let n_edges = ((max + binsize - min) / binsize).ceil() as usize;
    let n_bins = n_edges.saturating_sub(1).max(1);
    let edges: Vec<f64> = (0..=n_bins).map(|k| min + k as f64 * binsize).collect();
    let last_edge = edges[n_bins];

    let mut counts = vec![0u64; n_bins];
    for &x in data {
        if let Some(idx) = bin_index(&edges, x, binsize, last_edge) {
            counts[idx] += 1;
        }
    }

    let value = counts
        .iter()
        .map(|&c| if rate { c as f64 / binsize } else { c as f64 })
        .collect();

    debug!(bins = n_bins, binsize, rate, events = data.len(), "light curve binned");
    Ok(LightCurveHist {
        time: edges[..n_bins].to_vec(),
        value,
        binsize,
        rate,
    })
}

/// Locate `x` among uniformly spaced `edges`, nudging the arithmetic guess
/// against the stored edges so round-off never moves a value across a boundary.
fn bin_index(edges: &[f64], x: f64, binsize: f64, last_edge: f64) -> Option<usize> {
    let n_bins = edges.len() - 1;
    if x < edges[0] || x > last_edge {
        return None;
    }
    let mut idx = (((x - edges[0]) / binsize).floor() as usize).min(n_bins - 1);
    if idx > 0 && x < edges[idx] {
        idx -= 1;
    }
    if idx + 1 < n_bins && x >= edges[idx + 1] {
        idx += 1;
    }
    Some(idx)
}

fn finite_range(values: &[f64]) -> Result<(f64, f64)> {
    if values.is_empty() {
        return Err(TimingError::invalid("cannot bin an empty sequence"));
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        if !v.is_finite() {
            return Err(TimingError::invalid(format!("cannot bin non-finite value {v}")));
        }
        min = min.min(v);
        max = max.max(v);
    }
    Ok((min, max))
}

/// `hi - lo`, rejected when it overflows `f64`.
fn finite_span(lo: f64, hi: f64) -> Result<f64> {
    let span = hi - lo;
    if !span.is_finite() {
        return Err(TimingError::invalid(format!(
            "value range [{lo}, {hi}] is too wide to bin"
        )));
    }
    Ok(span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_counts_every_value_and_pins_last_edge() {
        let values: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.7311).sin() * 3.3 + 0.1).collect();
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let h = histogram(&values, 37).unwrap();
        assert_eq!(h.counts.len(), 37);
        assert_eq!(h.edges.len(), 38);
        assert_eq!(h.total(), values.len() as u64);
        assert_eq!(*h.edges.last().unwrap(), max);
    }

    #[test]
    fn histogram_last_bin_is_closed() {
        let h = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 4).unwrap();
        assert_eq!(h.edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(h.counts, vec![1, 1, 1, 2]);
    }

    #[test]
    fn histogram_degenerate_range() {
        let h = histogram(&[5.0, 5.0, 5.0], 3).unwrap();
        assert_eq!(h.counts, vec![0, 0, 3]);
        assert_eq!(h.edges, vec![5.0; 4]);
    }

    #[test]
    fn histogram_rejects_bad_input() {
        assert!(histogram(&[], 3).is_err());
        assert!(histogram(&[1.0], 0).is_err());
        assert!(histogram(&[1.0, f64::NAN], 2).is_err());
    }

    #[test]
    fn lightcurve_integer_grid() {
        // Edges 0..=10 -> 10 bins; the value 10 falls in the closed last bin.
        let data: Vec<f64> = (0..=10).map(f64::from).collect();
        let lc = lightcurve_hist(&data, 1.0, false).unwrap();
        assert_eq!(lc.time, (0..10).map(f64::from).collect::<Vec<_>>());
        let mut expected = vec![1.0; 10];
        expected[9] = 2.0;
        assert_eq!(lc.value, expected);
    }

    #[test]
    fn lightcurve_rate_divides_by_binsize() {
        let data = [0.0, 0.1, 0.2, 1.5, 3.9];
        let counts = lightcurve_hist(&data, 2.0, false).unwrap();
        let rate = lightcurve_hist(&data, 2.0, true).unwrap();
        assert_eq!(counts.time, vec![0.0, 2.0]);
        assert_eq!(counts.value, vec![4.0, 1.0]);
        assert_eq!(rate.value, vec![2.0, 0.5]);
        assert!(rate.rate && !counts.rate);
    }

    #[test]
    fn lightcurve_partial_last_bin() {
        let data = [0.0, 10.5];
        let lc = lightcurve_hist(&data, 1.0, false).unwrap();
        assert_eq!(lc.time.len(), 11);
        assert_eq!(lc.value.iter().sum::<f64>(), 2.0);
        assert_eq!(lc.value[10], 1.0);
    }

    #[test]
    fn lightcurve_single_time() {
        let lc = lightcurve_hist(&[3.0, 3.0], 0.5, true).unwrap();
        assert_eq!(lc.time, vec![3.0]);
        assert_eq!(lc.value, vec![4.0]);
    }

    #[test]
    fn lightcurve_rejects_bad_binsize() {
        assert!(lightcurve_hist(&[1.0, 2.0], 0.0, true).is_err());
        assert!(lightcurve_hist(&[1.0, 2.0], -1.0, true).is_err());
        assert!(lightcurve_hist(&[], 1.0, true).is_err());
    }

    #[test]
    fn overflowing_range_is_rejected() {
        assert!(matches!(
            histogram(&[-1e308, 1e308], 4),
            Err(TimingError::InvalidParameter(_))
        ));
        assert!(matches!(
            lightcurve_hist(&[-1e308, 1e308], 1.0, false),
            Err(TimingError::InvalidParameter(_))
        ));
    }
}
