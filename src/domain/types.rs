//! Shared domain types.
//!
//! Everything here is a plain value: streams, masks and parameter bundles are
//! built once and never edited in place. Derived results (filtered streams,
//! corrected times, histograms) are always new values.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimingError};

/// Photon arrival times plus optional per-event attributes.
///
/// Invariant: every attribute that is present has the same length as `times`,
/// and index `i` refers to the same photon in every sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStream {
    times: Vec<f64>,
    channel: Option<Vec<i64>>,
    pulse_width: Option<Vec<f64>>,
}

impl EventStream {
    /// Wrap a time series with no attributes.
    ///
    /// Times are expected in ascending order by the filters, but the type does
    /// not enforce it.
    pub fn new(times: Vec<f64>) -> Self {
        Self {
            times,
            channel: None,
            pulse_width: None,
        }
    }

    /// Attach the channel (PI) column.
    pub fn with_channel(mut self, channel: Vec<i64>) -> Result<Self> {
        check_len("channel", self.times.len(), channel.len())?;
        self.channel = Some(channel);
        Ok(self)
    }

    /// Attach the pulse-width column.
    pub fn with_pulse_width(mut self, pulse_width: Vec<f64>) -> Result<Self> {
        check_len("pulse_width", self.times.len(), pulse_width.len())?;
        self.pulse_width = Some(pulse_width);
        Ok(self)
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn channel(&self) -> Option<&[i64]> {
        self.channel.as_deref()
    }

    pub fn pulse_width(&self) -> Option<&[f64]> {
        self.pulse_width.as_deref()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Earliest arrival time, or `None` for an empty stream.
    pub fn start_time(&self) -> Option<f64> {
        self.times.iter().copied().reduce(f64::min)
    }

    /// Latest arrival time, or `None` for an empty stream.
    pub fn stop_time(&self) -> Option<f64> {
        self.times.iter().copied().reduce(f64::max)
    }

    /// `true` when times never decrease.
    pub fn is_time_ordered(&self) -> bool {
        self.times.windows(2).all(|w| w[0] <= w[1])
    }

    /// Keep only the events selected by `mask`, carrying every attribute along.
    pub fn select(&self, mask: &SelectionMask) -> Result<EventStream> {
        check_len("selection mask", self.times.len(), mask.len())?;
        let keep = mask.as_slice();

        let times = pick(&self.times, keep);
        let channel = self.channel.as_ref().map(|c| pick(c, keep));
        let pulse_width = self.pulse_width.as_ref().map(|p| pick(p, keep));

        Ok(EventStream {
            times,
            channel,
            pulse_width,
        })
    }

    /// Replace the time column, keeping attributes (e.g. after orbit correction).
    pub fn with_times(&self, times: Vec<f64>) -> Result<EventStream> {
        check_len("times", self.times.len(), times.len())?;
        Ok(EventStream {
            times,
            channel: self.channel.clone(),
            pulse_width: self.pulse_width.clone(),
        })
    }
}

fn pick<T: Copy>(values: &[T], keep: &[bool]) -> Vec<T> {
    values
        .iter()
        .zip(keep)
        .filter_map(|(&v, &k)| if k { Some(v) } else { None })
        .collect()
}

pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(TimingError::LengthMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

/// Per-event "keep this event" flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionMask(Vec<bool>);

impl SelectionMask {
    /// All-true mask (no constraint).
    pub fn all(len: usize) -> Self {
        SelectionMask(vec![true; len])
    }

    pub fn from_vec(keep: Vec<bool>) -> Self {
        SelectionMask(keep)
    }

    /// Logical AND with another mask of the same length.
    pub fn and(&self, other: &SelectionMask) -> Result<SelectionMask> {
        check_len("selection mask", self.len(), other.len())?;
        Ok(SelectionMask(
            self.0.iter().zip(&other.0).map(|(&a, &b)| a && b).collect(),
        ))
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of events kept.
    pub fn kept(&self) -> usize {
        self.0.iter().filter(|&&k| k).count()
    }

    /// Number of events excluded.
    pub fn excluded(&self) -> usize {
        self.len() - self.kept()
    }
}

/// Keplerian orbit of the emitting source.
///
/// `epoch` is interpreted per model:
/// - BT: epoch of periastron passage
/// - Deeter: epoch of ascending-node passage
/// - Doppler: epoch at which the mean longitude is π/2
///
/// All times are in seconds, in the same time system as the events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalParameters {
    /// Orbital period (s).
    pub period: f64,
    /// Projected semi-major axis (light-seconds).
    pub axsini: f64,
    pub eccentricity: f64,
    /// Longitude of periastron (radians).
    pub omega: f64,
    pub epoch: f64,
    /// Combined gravitational-redshift / time-dilation coefficient (BT only).
    ///
    /// Accepted but currently ignored: the BT correction forces it to zero.
    #[serde(default)]
    pub gamma: f64,
}

impl OrbitalParameters {
    /// Build and validate an orbit with `gamma = 0`.
    pub fn new(period: f64, axsini: f64, eccentricity: f64, omega: f64, epoch: f64) -> Result<Self> {
        let params = Self {
            period,
            axsini,
            eccentricity,
            omega,
            epoch,
            gamma: 0.0,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn with_gamma(mut self, gamma: f64) -> Result<Self> {
        self.gamma = gamma;
        self.validate()?;
        Ok(self)
    }

    /// Check the domain of every field.
    ///
    /// Values that come in through serde bypass `new`, so the corrections call
    /// this again before use.
    pub fn validate(&self) -> Result<()> {
        if !(self.period.is_finite() && self.period > 0.0) {
            return Err(TimingError::invalid(format!(
                "orbital period must be finite and > 0, got {}",
                self.period
            )));
        }
        if !(self.eccentricity.is_finite() && (0.0..1.0).contains(&self.eccentricity)) {
            return Err(TimingError::invalid(format!(
                "eccentricity must be in [0, 1), got {}",
                self.eccentricity
            )));
        }
        let others = [
            ("axsini", self.axsini),
            ("omega", self.omega),
            ("epoch", self.epoch),
            ("gamma", self.gamma),
        ];
        for (name, value) in others {
            if !value.is_finite() {
                return Err(TimingError::invalid(format!("{name} must be finite, got {value}")));
            }
        }
        Ok(())
    }
}

/// Spin-frequency polynomial `f(t) = f0 + f1 (t - t0) + f2 (t - t0)^2 / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinModel {
    pub f0: f64,
    #[serde(default)]
    pub f1: f64,
    #[serde(default)]
    pub f2: f64,
}

/// One contiguous rebinning segment, in source-array index units.
///
/// `[start, end)` is split into consecutive groups of `step` samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinSpec {
    pub start: usize,
    pub end: usize,
    pub step: usize,
}

impl BinSpec {
    pub fn new(start: usize, end: usize, step: usize) -> Result<Self> {
        let spec = Self { start, end, step };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if self.step == 0 {
            return Err(TimingError::invalid("bin spec step must be > 0"));
        }
        if self.end <= self.start {
            return Err(TimingError::invalid(format!(
                "bin spec end ({}) must be greater than start ({})",
                self.end, self.start
            )));
        }
        Ok(())
    }
}

/// Parses `start:end:step` (grppha-style).
impl FromStr for BinSpec {
    type Err = TimingError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let [start, end, step] = parts.as_slice() else {
            return Err(TimingError::invalid(format!(
                "bin spec '{s}' must look like start:end:step"
            )));
        };
        let parse = |field: &str, name: &str| {
            field.parse::<usize>().map_err(|e| {
                TimingError::invalid(format!("bin spec '{s}': bad {name} '{field}': {e}"))
            })
        };
        BinSpec::new(parse(*start, "start")?, parse(*end, "end")?, parse(*step, "step")?)
    }
}

/// Uniform-bin histogram: `edges.len() == counts.len() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl Histogram {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Midpoint of every bin.
    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }
}

/// Binned light curve from raw arrival times (left bin edges + counts or rate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightCurveHist {
    pub time: Vec<f64>,
    pub value: Vec<f64>,
    pub binsize: f64,
    pub rate: bool,
}

/// An already-binned light curve, the input and output of rebinning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightCurve {
    pub time: Vec<f64>,
    pub counts: Vec<f64>,
    pub errors: Option<Vec<f64>>,
}

impl LightCurve {
    pub fn new(time: Vec<f64>, counts: Vec<f64>, errors: Option<Vec<f64>>) -> Result<Self> {
        check_len("counts", time.len(), counts.len())?;
        if let Some(errors) = &errors {
            check_len("errors", time.len(), errors.len())?;
        }
        Ok(Self {
            time,
            counts,
            errors,
        })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

impl From<LightCurveHist> for LightCurve {
    fn from(hist: LightCurveHist) -> Self {
        LightCurve {
            time: hist.time,
            counts: hist.value,
            errors: None,
        }
    }
}
