//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves `.env` defaults
//! - installs the log subscriber
//! - loads event tables and orbit files
//! - runs the requested stage(s) and prints reports
//! - writes outputs

use std::path::Path;

use clap::Parser;
use tracing::debug;

use crate::cli::{
    BinningArgs, Command, DopplerArgs, FilterArgs, HistArgs, LcArgs, OrbitArgs, OrbitFileArgs, PipelineArgs,
    SimulateArgs,
};
use crate::config::{EnvDefaults, read_orbit_json};
use crate::domain::{LightCurve, SpinModel};
use crate::error::AppError;
use crate::io::{CsvEventTable, EventSink, EventSource};
use crate::orbit::BinaryTarget;

pub mod pipeline;

use pipeline::{BinningStage, OrbitStage, PipelineConfig};

/// Entry point for the `xt` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    let defaults = EnvDefaults::from_env()?;

    let level = cli
        .log_level
        .or(defaults.log_level)
        .unwrap_or(tracing::Level::WARN);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    debug!(?defaults, "configuration resolved");

    match cli.command {
        Command::Filter(args) => handle_filter(args),
        Command::Orbit(args) => handle_orbit(args, &defaults),
        Command::Doppler(args) => handle_doppler(args),
        Command::Lc(args) => handle_lc(args),
        Command::Hist(args) => handle_hist(args),
        Command::Pipeline(args) => handle_pipeline(args, &defaults),
        Command::Simulate(args) => handle_simulate(args),
    }
}

fn handle_filter(args: FilterArgs) -> Result<(), AppError> {
    let table = CsvEventTable;
    let stream = table.read_columns(&args.input)?;
    let criteria = args.screen.criteria();

    let (mask, kept) = pipeline::screen(&stream, &criteria)?;
    print!("{}", crate::report::format_filter_summary(&stream, &criteria, &mask));

    table.write_filtered(&args.output, &kept)
}

fn handle_orbit(args: OrbitArgs, defaults: &EnvDefaults) -> Result<(), AppError> {
    let stage = orbit_stage(&args.orbit, defaults)?
        .ok_or_else(|| AppError::new(2, "`xt orbit` needs --orbit <JSON>."))?;

    let table = CsvEventTable;
    let stream = table.read_columns(&args.input)?;
    let arrival = stream.times().to_vec();

    let correction = pipeline::correct(stream, &stage)?;
    print!("{}", crate::report::format_delay_summary(stage.model, &correction.delays));

    if let Some(path) = &args.delays {
        crate::io::write_series_csv(path, &arrival, "delay", &correction.delays)?;
    }
    table.write_filtered(&args.output, &correction.events)
}

fn handle_doppler(args: DopplerArgs) -> Result<(), AppError> {
    let orbit = read_orbit_json(&args.orbit)?;
    let stream = CsvEventTable.read_columns(&args.input)?;
    let spin = SpinModel {
        f0: args.f0,
        f1: args.f1,
        f2: args.f2,
    };

    let target = BinaryTarget::new(stream, Some(orbit));
    let frequency = target.intrinsic_frequency(&spin)?;
    print!("{}", crate::report::format_frequency_summary(&frequency));

    crate::io::write_series_csv(&args.output, target.events.times(), "frequency", &frequency)
}

fn handle_lc(args: LcArgs) -> Result<(), AppError> {
    let stream = CsvEventTable.read_columns(&args.input)?;
    let stage = binning_stage(&args.binning);

    let (lc, rebinned) = pipeline::bin(stream.times(), &stage)?;
    print!("{}", crate::report::format_lightcurve_summary(&lc, rebinned.as_ref()));

    if let Some(path) = &args.json {
        crate::io::write_lightcurve_json(path, Some(&args.input), &lc)?;
    }
    write_lightcurve(&args.output, lc, rebinned)
}

fn handle_hist(args: HistArgs) -> Result<(), AppError> {
    let stream = CsvEventTable.read_columns(&args.input)?;
    let hist = crate::lightcurve::histogram(stream.times(), args.bins)?;
    print!("{}", crate::report::format_histogram_summary(&hist));

    if let Some(path) = &args.json {
        crate::io::write_histogram_json(path, Some(&args.input), &hist)?;
    }
    Ok(())
}

fn handle_pipeline(args: PipelineArgs, defaults: &EnvDefaults) -> Result<(), AppError> {
    let config = PipelineConfig {
        criteria: args.screen.criteria(),
        orbit: orbit_stage(&args.orbit, defaults)?,
        binning: binning_stage(&args.binning),
    };

    let out = pipeline::run_pipeline(&CsvEventTable, &args.input, &config)?;

    print!(
        "{}",
        crate::report::format_filter_summary(&out.input, &config.criteria, &out.mask)
    );
    if let (Some(stage), Some(delays)) = (&config.orbit, &out.delays) {
        print!("{}", crate::report::format_delay_summary(stage.model, delays));
    }
    print!(
        "{}",
        crate::report::format_lightcurve_summary(&out.lightcurve, out.rebinned.as_ref())
    );

    if let Some(path) = &args.events_out {
        CsvEventTable.write_filtered(path, &out.events)?;
    }
    write_lightcurve(&args.output, out.lightcurve, out.rebinned)
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let orbit = match &args.orbit {
        Some(path) => Some(read_orbit_json(path)?),
        None => None,
    };
    let config = crate::sim::SimConfig {
        seed: args.seed,
        rate: args.rate,
        start: args.start,
        duration: args.duration,
        with_channel: !args.time_only,
        with_pulse_width: !args.time_only,
        glitches: args.glitches,
        glitch_size: args.glitch_size,
        glitch_spacing: args.glitch_spacing,
        orbit,
    };
    let stream = crate::sim::simulate(&config)?;
    println!("Simulated {} events (seed {}).", stream.len(), config.seed);

    CsvEventTable.write_filtered(&args.output, &stream)
}

/// Resolve orbit flags into a stage; `None` when no orbit file was given.
fn orbit_stage(args: &OrbitFileArgs, defaults: &EnvDefaults) -> Result<Option<OrbitStage>, AppError> {
    let Some(path) = &args.orbit else {
        return Ok(None);
    };
    let kepler_step = args.kepler_step.unwrap_or(defaults.kepler_step);
    if !(kepler_step.is_finite() && kepler_step > 0.0) {
        return Err(AppError::new(2, format!("--kepler-step must be > 0, got {kepler_step}.")));
    }
    Ok(Some(OrbitStage {
        params: read_orbit_json(path)?,
        model: args.model,
        kepler_step,
    }))
}

fn binning_stage(args: &BinningArgs) -> BinningStage {
    BinningStage {
        binsize: args.binsize,
        rate: !args.no_rate,
        rebin: args.rebin.clone(),
    }
}

/// Write the rebinned curve if there is one, the plain binned curve otherwise.
fn write_lightcurve(
    path: &Path,
    lc: crate::domain::LightCurveHist,
    rebinned: Option<LightCurve>,
) -> Result<(), AppError> {
    let curve = rebinned.unwrap_or_else(|| LightCurve::from(lc));
    crate::io::write_lightcurve_csv(path, &curve)
}
