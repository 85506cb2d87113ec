//! Command-line parsing for the `xt` photon-timing tool.
//!
//! Argument parsing and command dispatch stay separate from the numerical
//! code: everything here converts flags into domain types and nothing more.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::BinSpec;
use crate::glitch::{GlitchCriteria, Range, TimeGap};
use crate::orbit::DelayModel;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "xt", version, about = "X-ray photon timing: screening, orbit correction, light curves")]
pub struct Cli {
    /// Log verbosity (error, warn, info, debug, trace). Defaults to `XT_LOG_LEVEL` or `warn`.
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<tracing::Level>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Screen glitches / out-of-window events and write the kept events.
    Filter(FilterArgs),
    /// Convert arrival times to emission times through a binary orbit.
    Orbit(OrbitArgs),
    /// Remove the orbital Doppler shift from a spin-frequency model.
    Doppler(DopplerArgs),
    /// Bin events into a light curve, optionally rebinning it.
    Lc(LcArgs),
    /// Equal-width histogram of arrival times.
    Hist(HistArgs),
    /// Filter -> (orbit correction) -> light curve in one go.
    Pipeline(PipelineArgs),
    /// Generate a synthetic event table.
    Simulate(SimulateArgs),
}

/// Event-screening flags shared by `filter` and `pipeline`.
#[derive(Debug, Args, Clone, Default)]
pub struct ScreenArgs {
    /// Burst window (s): `--evtnum` + 1 events within this interval are a glitch.
    #[arg(long, requires = "evtnum")]
    pub timedel: Option<f64>,

    /// Events per burst beyond the first.
    #[arg(long, requires = "timedel")]
    pub evtnum: Option<usize>,

    /// Inclusive channel window.
    #[arg(long, num_args = 2, value_names = ["LO", "HI"])]
    pub chan: Option<Vec<i64>>,

    /// Inclusive pulse-width window.
    #[arg(long = "pulse-width", num_args = 2, value_names = ["LO", "HI"])]
    pub pulse_width: Option<Vec<f64>>,
}

impl ScreenArgs {
    pub fn criteria(&self) -> GlitchCriteria {
        let time_gap = match (self.timedel, self.evtnum) {
            (Some(min_interval), Some(group_size)) => Some(TimeGap {
                min_interval,
                group_size,
            }),
            _ => None,
        };
        GlitchCriteria {
            time_gap,
            channel_range: self.chan.as_deref().and_then(window),
            pulse_width_range: self.pulse_width.as_deref().and_then(window),
        }
    }
}

fn window<T: PartialOrd + Copy>(values: &[T]) -> Option<Range<T>> {
    match values {
        [low, high] => Some(Range::new(*low, *high)),
        _ => None,
    }
}

/// Orbit selection shared by `orbit` and `pipeline`.
#[derive(Debug, Args, Clone)]
pub struct OrbitFileArgs {
    /// Orbit ephemeris JSON (`period`, `axsini`, `eccentricity`, `omega`, `epoch`[, `gamma`]).
    #[arg(long, value_name = "JSON")]
    pub orbit: Option<PathBuf>,

    /// Delay model.
    #[arg(long, value_enum, default_value_t = DelayModel::Bt)]
    pub model: DelayModel,

    /// Eccentric-anomaly grid step (radians). Defaults to `XT_KEPLER_STEP` or 1e-3.
    #[arg(long)]
    pub kepler_step: Option<f64>,
}

#[derive(Debug, Parser, Clone)]
pub struct FilterArgs {
    /// Event table (CSV).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the kept events.
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub screen: ScreenArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct OrbitArgs {
    #[arg(short, long)]
    pub input: PathBuf,

    /// Corrected event table.
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub orbit: OrbitFileArgs,

    /// Also export the per-event delay (`time,delay`).
    #[arg(long, value_name = "CSV")]
    pub delays: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct DopplerArgs {
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(long, value_name = "JSON")]
    pub orbit: PathBuf,

    /// Spin frequency (Hz) at the first event.
    #[arg(long)]
    pub f0: f64,

    /// First derivative (Hz/s).
    #[arg(long, default_value_t = 0.0)]
    pub f1: f64,

    /// Second derivative (Hz/s^2).
    #[arg(long, default_value_t = 0.0)]
    pub f2: f64,

    /// Intrinsic frequency per event (`time,frequency`).
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Light-curve binning flags shared by `lc` and `pipeline`.
#[derive(Debug, Args, Clone)]
pub struct BinningArgs {
    /// Bin width (s).
    #[arg(long)]
    pub binsize: f64,

    /// Report raw counts instead of count rate.
    #[arg(long)]
    pub no_rate: bool,

    /// Rebin segments `start:end:step` (index units), applied in order.
    #[arg(long, num_args = 1.., value_name = "START:END:STEP")]
    pub rebin: Vec<BinSpec>,
}

#[derive(Debug, Parser, Clone)]
pub struct LcArgs {
    #[arg(short, long)]
    pub input: PathBuf,

    /// Light curve CSV.
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub binning: BinningArgs,

    /// Also export the un-rebinned light curve as JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct HistArgs {
    #[arg(short, long)]
    pub input: PathBuf,

    /// Number of equal-width bins.
    #[arg(long, default_value_t = 100)]
    pub bins: usize,

    /// Export the histogram as JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct PipelineArgs {
    #[arg(short, long)]
    pub input: PathBuf,

    /// Light curve CSV.
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub screen: ScreenArgs,

    #[command(flatten)]
    pub orbit: OrbitFileArgs,

    #[command(flatten)]
    pub binning: BinningArgs,

    /// Also write the screened (and corrected) events.
    #[arg(long, value_name = "CSV")]
    pub events_out: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct SimulateArgs {
    #[arg(short, long)]
    pub output: PathBuf,

    /// Mean count rate (events/s).
    #[arg(long, default_value_t = 100.0)]
    pub rate: f64,

    /// Observation start time (s).
    #[arg(long, default_value_t = 0.0)]
    pub start: f64,

    /// Observation length (s).
    #[arg(long, default_value_t = 100.0)]
    pub duration: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of injected glitch bursts.
    #[arg(long, default_value_t = 0)]
    pub glitches: usize,

    /// Events per glitch burst.
    #[arg(long, default_value_t = 20)]
    pub glitch_size: usize,

    /// Spacing inside a glitch burst (s).
    #[arg(long, default_value_t = 1e-5)]
    pub glitch_spacing: f64,

    /// Delay arrivals through this orbit (Deeter model).
    #[arg(long, value_name = "JSON")]
    pub orbit: Option<PathBuf>,

    /// Omit the channel / pulse-width columns.
    #[arg(long)]
    pub time_only: bool,
}
