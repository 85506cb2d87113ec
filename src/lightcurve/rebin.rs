//! Piecewise (grppha-style) rebinning of a binned light curve.
//!
//! A request is a list of `BinSpec { start, end, step }` segments. Each segment
//! groups `[start, end)` in runs of `step` samples and emits, per group:
//!
//! - time: midpoint of the first and last timestamp of the group
//! - counts: arithmetic mean of the group
//! - error (if present): `sqrt(Σ err²) / step`
//!
//! The error always divides by the nominal `step`, even for a short final group.
//! Segment outputs are concatenated in request order.

use tracing::debug;

use crate::domain::types::check_len;
use crate::domain::{BinSpec, LightCurve};
use crate::error::{Result, TimingError};

impl LightCurve {
    /// Rebin according to `specs`; see the module docs.
    pub fn rebin(&self, specs: &[BinSpec]) -> Result<LightCurve> {
        rebin(&self.time, &self.counts, self.errors.as_deref(), specs)
    }
}

/// Rebin parallel `time` / `counts` / `errors` sequences.
///
/// All specs are validated before any output is produced.
pub fn rebin(time: &[f64], counts: &[f64], errors: Option<&[f64]>, specs: &[BinSpec]) -> Result<LightCurve> {
    check_len("counts", time.len(), counts.len())?;
    if let Some(errors) = errors {
        check_len("errors", time.len(), errors.len())?;
    }
    if specs.is_empty() {
        return Err(TimingError::invalid("rebin needs at least one bin spec"));
    }
    for spec in specs {
        spec.validate()?;
        if spec.end > time.len() {
            return Err(TimingError::invalid(format!(
                "bin spec {}:{}:{} runs past the end of the light curve ({} samples)",
                spec.start,
                spec.end,
                spec.step,
                time.len()
            )));
        }
    }

    let capacity: usize = specs.iter().map(|s| (s.end - s.start).div_ceil(s.step)).sum();
    let mut new_time = Vec::with_capacity(capacity);
    let mut new_counts = Vec::with_capacity(capacity);
    let mut new_errors = errors.map(|_| Vec::with_capacity(capacity));

    for spec in specs {
        for lo in (spec.start..spec.end).step_by(spec.step) {
            let hi = (lo + spec.step).min(spec.end);

            new_time.push(0.5 * (time[lo] + time[hi - 1]));
            new_counts.push(mean(&counts[lo..hi]));

            if let (Some(errors), Some(out)) = (errors, new_errors.as_mut()) {
                let sum_sq: f64 = errors[lo..hi].iter().map(|e| e * e).sum();
                out.push(sum_sq.sqrt() / spec.step as f64);
            }
        }
    }

    debug!(
        input = time.len(),
        output = new_time.len(),
        segments = specs.len(),
        "light curve rebinned"
    );
    Ok(LightCurve {
        time: new_time,
        counts: new_counts,
        errors: new_errors,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
