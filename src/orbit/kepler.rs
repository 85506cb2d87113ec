//! Grid-search solver for Kepler's equation `M = E - e sin E`.
//!
//! For each event we bracket the eccentric anomaly in `[M - e, M + e)` (always
//! valid since `|E - M| = e |sin E| <= e`) and scan it on a fixed step grid,
//! keeping the sample with the smallest residual `|E - e sin E - M|`.
//!
//! Accuracy notes:
//! - the answer is only as good as `step` (default 1e-3 rad); there is no
//!   refinement and no convergence check, so "not converged" is never reported
//! - cost is `ceil(2e / step)` residual evaluations per event
//! - the search is deterministic: ties go to the first (smallest) sample
//!
//! Events are independent, so the batch is evaluated in parallel and gathered
//! back in input order.

use std::f64::consts::TAU;

use rayon::prelude::*;
use tracing::debug;

use crate::error::{Result, TimingError};

/// Default grid step (radians).
pub const DEFAULT_KEPLER_STEP: f64 = 1e-3;

/// Mean anomaly `2π (t - epoch) / period`.
pub fn mean_anomaly(t: f64, period: f64, epoch: f64) -> f64 {
    TAU * (t - epoch) / period
}

/// Eccentric anomaly for every event time.
///
/// `eccentricity == 0` returns the mean anomaly exactly (no search).
pub fn solve(times: &[f64], period: f64, eccentricity: f64, epoch: f64, step: f64) -> Result<Vec<f64>> {
    if times.is_empty() {
        return Err(TimingError::invalid("event stream is empty"));
    }
    if !(period.is_finite() && period > 0.0) {
        return Err(TimingError::invalid(format!(
            "orbital period must be finite and > 0, got {period}"
        )));
    }
    if !(eccentricity.is_finite() && (0.0..1.0).contains(&eccentricity)) {
        return Err(TimingError::invalid(format!(
            "eccentricity must be in [0, 1), got {eccentricity}"
        )));
    }

    if eccentricity == 0.0 {
        return Ok(times.iter().map(|&t| mean_anomaly(t, period, epoch)).collect());
    }

    if !(step.is_finite() && step > 0.0) {
        return Err(TimingError::invalid(format!(
            "Kepler grid step must be finite and > 0, got {step}"
        )));
    }

    debug!(
        events = times.len(),
        eccentricity,
        step,
        samples_per_event = grid_len(eccentricity, step),
        "solving Kepler equation by grid search"
    );

    Ok(times
        .par_iter()
        .map(|&t| solve_eccentric_anomaly(mean_anomaly(t, period, epoch), eccentricity, step))
        .collect())
}

/// Solve one event: best grid sample of `E` in `[m - e, m + e)`.
///
/// Pure and allocation-free; callers are expected to have validated `e` and `step`.
pub fn solve_eccentric_anomaly(m: f64, e: f64, step: f64) -> f64 {
    if e == 0.0 {
        return m;
    }

    let e_min = m - e;
    let n = grid_len(e, step);

    let mut best_e = e_min;
    let mut best_residual = f64::INFINITY;
    for k in 0..n {
        let ecc_anomaly = e_min + k as f64 * step;
        let residual = (ecc_anomaly - e * ecc_anomaly.sin() - m).abs();
        if residual < best_residual {
            best_residual = residual;
            best_e = ecc_anomaly;
        }
    }
    best_e
}

/// Number of samples in `[m - e, m + e)` on a `step` grid (half-open, like a range).
fn grid_len(e: f64, step: f64) -> usize {
    ((2.0 * e / step).ceil() as usize).max(1)
}
