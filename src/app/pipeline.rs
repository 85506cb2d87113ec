//! Shared screening -> correction -> binning workflow.
//!
//! `xt pipeline` runs all of it; `xt filter`, `xt orbit` and `xt lc` reuse
//! the individual stages. Front-ends only deal with I/O and printing.

use std::path::Path;

use tracing::info;

use crate::domain::{BinSpec, EventStream, LightCurve, LightCurveHist, OrbitalParameters, SelectionMask};
use crate::error::{AppError, Result};
use crate::glitch::{self, GlitchCriteria};
use crate::io::EventSource;
use crate::lightcurve::lightcurve_hist;
use crate::orbit::{BinaryTarget, DelayModel, OrbitCorrection};

/// Orbit to correct through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitStage {
    pub params: OrbitalParameters,
    pub model: DelayModel,
    pub kepler_step: f64,
}

/// Light-curve binning settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BinningStage {
    pub binsize: f64,
    pub rate: bool,
    pub rebin: Vec<BinSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub criteria: GlitchCriteria,
    pub orbit: Option<OrbitStage>,
    pub binning: BinningStage,
}

/// Everything a pipeline run computed.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub input: EventStream,
    pub mask: SelectionMask,
    /// Kept events (emission times if an orbit was applied).
    pub events: EventStream,
    pub delays: Option<Vec<f64>>,
    pub lightcurve: LightCurveHist,
    pub rebinned: Option<LightCurve>,
}

/// Screen `stream` and keep the selected events.
pub fn screen(stream: &EventStream, criteria: &GlitchCriteria) -> Result<(SelectionMask, EventStream)> {
    let mask = glitch::filter(stream, criteria)?;
    let kept = stream.select(&mask)?;
    Ok((mask, kept))
}

pub fn correct(stream: EventStream, stage: &OrbitStage) -> Result<OrbitCorrection> {
    BinaryTarget::new(stream, Some(stage.params)).correct(stage.model, stage.kepler_step)
}

/// Bin event times and apply any requested rebinning.
pub fn bin(times: &[f64], stage: &BinningStage) -> Result<(LightCurveHist, Option<LightCurve>)> {
    let lc = lightcurve_hist(times, stage.binsize, stage.rate)?;
    let rebinned = if stage.rebin.is_empty() {
        None
    } else {
        Some(LightCurve::from(lc.clone()).rebin(&stage.rebin)?)
    };
    Ok((lc, rebinned))
}

/// Run the whole workflow on an in-memory stream.
pub fn run_pipeline_with_events(input: EventStream, config: &PipelineConfig) -> Result<PipelineOutput> {
    let (mask, kept) = screen(&input, &config.criteria)?;
    info!(kept = mask.kept(), excluded = mask.excluded(), "events screened");

    let (events, delays) = match &config.orbit {
        Some(stage) => {
            let correction = correct(kept, stage)?;
            info!(model = stage.model.display_name(), "orbit correction applied");
            (correction.events, Some(correction.delays))
        }
        None => (kept, None),
    };

    let (lightcurve, rebinned) = bin(events.times(), &config.binning)?;
    info!(bins = lightcurve.time.len(), "light curve built");

    Ok(PipelineOutput {
        input,
        mask,
        events,
        delays,
        lightcurve,
        rebinned,
    })
}

/// Load `path` through `source`, then run the workflow.
pub fn run_pipeline<S: EventSource>(
    source: &S,
    path: &Path,
    config: &PipelineConfig,
) -> std::result::Result<PipelineOutput, AppError> {
    let stream = source.read_columns(path)?;
    Ok(run_pipeline_with_events(stream, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimingError;
    use crate::glitch::TimeGap;

    fn config() -> PipelineConfig {
        PipelineConfig {
            criteria: GlitchCriteria {
                time_gap: Some(TimeGap {
                    min_interval: 0.01,
                    group_size: 2,
                }),
                ..GlitchCriteria::default()
            },
            orbit: None,
            binning: BinningStage {
                binsize: 1.0,
                rate: false,
                rebin: Vec::new(),
            },
        }
    }

    #[test]
    fn burst_is_removed_before_binning() {
        let input = EventStream::new(vec![0.1, 0.5, 1.2, 1.201, 1.202, 1.203, 2.5, 3.7]);
        let out = run_pipeline_with_events(input, &config()).unwrap();

        assert_eq!(out.mask.excluded(), 4);
        assert_eq!(out.events.times(), &[0.1, 0.5, 2.5, 3.7]);
        assert_eq!(out.lightcurve.value.iter().sum::<f64>(), 4.0);
        assert!(out.delays.is_none());
        assert!(out.rebinned.is_none());
    }

    #[test]
    fn orbit_and_rebin_stages_are_applied() {
        let mut config = config();
        config.criteria = GlitchCriteria::default();
        config.orbit = Some(OrbitStage {
            params: OrbitalParameters::new(1000.0, 0.5, 0.0, 0.0, 0.0).unwrap(),
            model: DelayModel::Deeter,
            kepler_step: 1e-3,
        });
        config.binning.rebin = vec![BinSpec::new(0, 4, 2).unwrap()];

        let input = EventStream::new((0..40).map(|i| i as f64 * 0.1).collect());
        let out = run_pipeline_with_events(input.clone(), &config).unwrap();

        let delays = out.delays.unwrap();
        assert_eq!(delays.len(), 40);
        for ((em, t), d) in out.events.times().iter().zip(input.times()).zip(&delays) {
            assert_eq!(*em, t - d);
        }
        assert_eq!(out.rebinned.unwrap().len(), 2);
    }

    #[test]
    fn everything_screened_out_is_an_error() {
        let mut config = config();
        config.criteria.time_gap = Some(TimeGap {
            min_interval: 10.0,
            group_size: 1,
        });
        let err = run_pipeline_with_events(EventStream::new(vec![0.0, 0.1, 0.2]), &config).unwrap_err();
        assert!(matches!(err, TimingError::InvalidParameter(_)));
    }
}
