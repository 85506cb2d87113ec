//! Events from a source in a binary system.
//!
//! A binary target is just an event stream plus (optionally) the orbit it was
//! observed through. The storage and invariants are those of `EventStream`;
//! the orbit only unlocks the corrections below.

use crate::domain::{EventStream, OrbitalParameters, SpinModel};
use crate::error::{Result, TimingError};
use crate::orbit::correct;

/// Which arrival-time delay model to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DelayModel {
    /// Blandford & Teukolsky; epoch = periastron passage.
    Bt,
    /// Deeter; epoch = ascending-node passage.
    Deeter,
}

impl DelayModel {
    pub fn display_name(self) -> &'static str {
        match self {
            DelayModel::Bt => "BT",
            DelayModel::Deeter => "Deeter",
        }
    }

    /// Emission time for an event arriving at `t` with this model's `delay`.
    pub fn emission_time(self, t: f64, delay: f64) -> f64 {
        match self {
            DelayModel::Bt => t + delay,
            DelayModel::Deeter => t - delay,
        }
    }
}

/// Corrected events together with the delay that was removed from each.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCorrection {
    pub events: EventStream,
    pub delays: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct BinaryTarget {
    pub events: EventStream,
    pub orbit: Option<OrbitalParameters>,
}

impl BinaryTarget {
    pub fn new(events: EventStream, orbit: Option<OrbitalParameters>) -> Self {
        Self { events, orbit }
    }

    fn orbit(&self) -> Result<&OrbitalParameters> {
        self.orbit.as_ref().ok_or(TimingError::MissingAttribute {
            attribute: "orbital parameters",
        })
    }

    /// Emission times under `model`.
    pub fn emission_times(&self, model: DelayModel, kepler_step: f64) -> Result<Vec<f64>> {
        let orbit = self.orbit()?;
        match model {
            DelayModel::Bt => correct::orbit_cor_bt(&self.events, orbit, kepler_step),
            DelayModel::Deeter => correct::orbit_cor_deeter(&self.events, orbit),
        }
    }

    /// Orbital delay per event under `model` (sign convention of the model).
    pub fn delays(&self, model: DelayModel, kepler_step: f64) -> Result<Vec<f64>> {
        let orbit = self.orbit()?;
        match model {
            DelayModel::Bt => correct::bt_delay(&self.events, orbit, kepler_step),
            DelayModel::Deeter => correct::deeter_delay(&self.events, orbit),
        }
    }

    /// Emission-time stream: same attributes, corrected time column.
    pub fn corrected(&self, model: DelayModel, kepler_step: f64) -> Result<EventStream> {
        let times = self.emission_times(model, kepler_step)?;
        self.events.with_times(times)
    }

    /// Corrected stream plus per-event delays, solving the orbit once.
    pub fn correct(&self, model: DelayModel, kepler_step: f64) -> Result<OrbitCorrection> {
        let delays = self.delays(model, kepler_step)?;
        let times = self
            .events
            .times()
            .iter()
            .zip(&delays)
            .map(|(&t, &d)| model.emission_time(t, d))
            .collect();
        Ok(OrbitCorrection {
            events: self.events.with_times(times)?,
            delays,
        })
    }

    pub fn intrinsic_frequency(&self, spin: &SpinModel) -> Result<Vec<f64>> {
        correct::fre_doppler_cor(&self.events, spin, self.orbit()?)
    }
}
