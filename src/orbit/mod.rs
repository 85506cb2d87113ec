//! Binary-orbit timing corrections.
//!
//! Responsibilities:
//!
//! - solve Kepler's equation per event (parallel grid search)
//! - convert arrival times to emission times (BT / Deeter)
//! - remove orbital Doppler modulation from a spin-frequency model

pub mod binary;
pub mod correct;
pub mod kepler;

pub use binary::*;
pub use correct::*;
pub use kepler::{DEFAULT_KEPLER_STEP, mean_anomaly, solve_eccentric_anomaly};
