//! Synthetic event lists for exercising the pipeline without real data.
//!
//! Arrivals are a homogeneous Poisson process (exponential waiting times).
//! On top of that we can inject detector bursts ("glitches") of closely
//! spaced events with saturated pulse widths, and delay every photon through
//! a Deeter-model orbit so `xt orbit --model deeter` has something to undo.
//!
//! The same `SimConfig` (seed included) always yields the same stream.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Exp, Normal};
use tracing::{debug, info};

use crate::domain::{EventStream, OrbitalParameters};
use crate::error::AppError;
use crate::orbit::deeter_delay;

/// Highest PI channel drawn for source photons.
const MAX_CHANNEL: i64 = 255;

/// Typical pulse width of a real photon (and its spread).
const PULSE_WIDTH_MEAN: f64 = 60.0;
const PULSE_WIDTH_SIGMA: f64 = 6.0;

/// Glitch events sit well above the photon pulse-width distribution.
const GLITCH_PULSE_WIDTH: f64 = 200.0;

/// Upper bound on `rate * duration` for one simulated list.
const MAX_EXPECTED_EVENTS: f64 = 5.0e7;

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub seed: u64,
    /// Mean count rate (events / s).
    pub rate: f64,
    pub start: f64,
    pub duration: f64,
    pub with_channel: bool,
    pub with_pulse_width: bool,
    /// Number of injected bursts.
    pub glitches: usize,
    /// Events per burst.
    pub glitch_size: usize,
    /// Spacing between events inside a burst (s).
    pub glitch_spacing: f64,
    /// Delay arrivals through this orbit (Deeter model).
    pub orbit: Option<OrbitalParameters>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            rate: 100.0,
            start: 0.0,
            duration: 100.0,
            with_channel: true,
            with_pulse_width: true,
            glitches: 0,
            glitch_size: 20,
            glitch_spacing: 1e-5,
            orbit: None,
        }
    }
}

impl SimConfig {
    fn validate(&self) -> Result<(), AppError> {
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(AppError::new(2, "Simulation rate must be > 0."));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(AppError::new(2, "Simulation duration must be > 0."));
        }
        if !self.start.is_finite() {
            return Err(AppError::new(2, "Simulation start time must be finite."));
        }
        if !(self.start + self.duration > self.start) {
            return Err(AppError::new(
                2,
                format!(
                    "Simulation duration {} is below the time resolution at start {}.",
                    self.duration, self.start
                ),
            ));
        }
        let expected = self.rate * self.duration;
        if expected > MAX_EXPECTED_EVENTS {
            return Err(AppError::new(
                2,
                format!("Simulation would draw ~{expected:.3e} events (limit {MAX_EXPECTED_EVENTS:.0e})."),
            ));
        }
        if self.glitches > 0 && (self.glitch_size < 2 || !(self.glitch_spacing.is_finite() && self.glitch_spacing > 0.0)) {
            return Err(AppError::new(
                2,
                "Glitch bursts need at least 2 events and a positive spacing.",
            ));
        }
        if let Some(orbit) = &self.orbit {
            orbit.validate()?;
        }
        Ok(())
    }
}

/// Generate a time-ordered event stream.
pub fn simulate(config: &SimConfig) -> Result<EventStream, AppError> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let waiting = Exp::new(config.rate)
        .map_err(|e| AppError::new(2, format!("Arrival distribution error: {e}")))?;
    let pulse = Normal::new(PULSE_WIDTH_MEAN, PULSE_WIDTH_SIGMA)
        .map_err(|e| AppError::new(2, format!("Pulse-width distribution error: {e}")))?;

    let stop = config.start + config.duration;

    // (time, channel, pulse width)
    let mut events: Vec<(f64, i64, f64)> = Vec::with_capacity((config.rate * config.duration).ceil() as usize);
    let mut t = config.start + waiting.sample(&mut rng);
    while t < stop {
        let channel = rng.gen_range(0..=MAX_CHANNEL);
        let width = pulse.sample(&mut rng).max(0.0);
        events.push((t, channel, width));
        t += waiting.sample(&mut rng);
    }
    let photons = events.len();

    for _ in 0..config.glitches {
        let onset = rng.gen_range(config.start..stop);
        for k in 0..config.glitch_size {
            let channel = rng.gen_range(0..=MAX_CHANNEL);
            events.push((onset + k as f64 * config.glitch_spacing, channel, GLITCH_PULSE_WIDTH));
        }
    }

    events.sort_by(|a, b| a.0.total_cmp(&b.0));
    debug!(photons, glitch_events = events.len() - photons, "events drawn");

    let mut times: Vec<f64> = events.iter().map(|e| e.0).collect();
    let mut stream = EventStream::new(times.clone());

    if let Some(orbit) = &config.orbit {
        if !stream.is_empty() {
            // Emission times were drawn; arrivals are delayed by the orbit.
            let delay = deeter_delay(&stream, orbit)?;
            for (t, d) in times.iter_mut().zip(&delay) {
                *t += d;
            }
            stream = EventStream::new(times);
        }
    }

    if config.with_channel {
        stream = stream.with_channel(events.iter().map(|e| e.1).collect())?;
    }
    if config.with_pulse_width {
        stream = stream.with_pulse_width(events.iter().map(|e| e.2).collect())?;
    }

    info!(
        events = stream.len(),
        seed = config.seed,
        orbit = config.orbit.is_some(),
        "synthetic event list generated"
    );
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glitch::{GlitchCriteria, Range, TimeGap, filter};

    #[test]
    fn same_seed_same_stream() {
        let config = SimConfig {
            glitches: 2,
            ..SimConfig::default()
        };
        let a = simulate(&config).unwrap();
        let b = simulate(&config).unwrap();
        assert_eq!(a, b);

        let c = simulate(&SimConfig { seed: 7, ..config }).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn events_are_ordered_and_inside_the_window() {
        let config = SimConfig {
            start: 1000.0,
            duration: 50.0,
            ..SimConfig::default()
        };
        let stream = simulate(&config).unwrap();
        assert!(stream.is_time_ordered());
        assert!(stream.start_time().unwrap() >= 1000.0);
        assert!(stream.stop_time().unwrap() < 1050.0);

        // 5000 expected; Poisson spread is ~70.
        let n = stream.len() as f64;
        assert!((n - 5000.0).abs() < 500.0, "{n}");
    }

    #[test]
    fn injected_glitches_are_caught_by_the_filter() {
        let config = SimConfig {
            rate: 5.0,
            glitches: 3,
            glitch_size: 10,
            ..SimConfig::default()
        };
        let stream = simulate(&config).unwrap();
        let widths = stream.pulse_width().unwrap();
        let saturated = widths.iter().filter(|&&w| w == GLITCH_PULSE_WIDTH).count();
        assert_eq!(saturated, 30);

        let criteria = GlitchCriteria {
            time_gap: Some(TimeGap {
                min_interval: 1e-3,
                group_size: 5,
            }),
            ..GlitchCriteria::default()
        };
        let mask = filter(&stream, &criteria).unwrap();
        assert!(mask.excluded() >= 30);

        let by_width = GlitchCriteria {
            pulse_width_range: Some(Range::new(0.0, 150.0)),
            ..GlitchCriteria::default()
        };
        assert_eq!(filter(&stream, &by_width).unwrap().excluded(), 30);
    }

    #[test]
    fn optional_columns_can_be_left_out() {
        let config = SimConfig {
            with_channel: false,
            with_pulse_width: false,
            ..SimConfig::default()
        };
        let stream = simulate(&config).unwrap();
        assert!(stream.channel().is_none());
        assert!(stream.pulse_width().is_none());
    }

    #[test]
    fn orbit_delay_is_removed_by_deeter_correction() {
        let orbit = OrbitalParameters::new(40.0, 0.01, 0.0, 0.3, 5.0).unwrap();
        let plain = simulate(&SimConfig::default()).unwrap();
        let delayed = simulate(&SimConfig {
            orbit: Some(orbit),
            ..SimConfig::default()
        })
        .unwrap();
        assert_eq!(plain.len(), delayed.len());

        let recovered = crate::orbit::orbit_cor_deeter(&delayed, &orbit).unwrap();
        for (r, t) in recovered.iter().zip(plain.times()) {
            // First-order inversion; residual scales like x * 2πx/P.
            assert!((r - t).abs() < 1e-4, "{r} vs {t}");
        }
    }

    #[test]
    fn duration_lost_to_rounding_is_an_error() {
        let err = simulate(&SimConfig {
            start: 1e17,
            duration: 1.0,
            glitches: 1,
            ..SimConfig::default()
        })
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn bad_config_is_rejected() {
        assert!(simulate(&SimConfig { rate: 0.0, ..SimConfig::default() }).is_err());
        assert!(simulate(&SimConfig { duration: -1.0, ..SimConfig::default() }).is_err());
        assert!(simulate(&SimConfig { rate: 1e19, duration: 1.0, ..SimConfig::default() }).is_err());
        assert!(
            simulate(&SimConfig {
                glitches: 1,
                glitch_size: 1,
                ..SimConfig::default()
            })
            .is_err()
        );
    }
}
