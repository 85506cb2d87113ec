//! Run configuration that does not come from CLI flags.
//!
//! - `.env` / process environment defaults (`XT_KEPLER_STEP`, `XT_LOG_LEVEL`)
//! - orbit ephemeris files (JSON)
//!
//! CLI flags always win over environment defaults.

use std::fs::File;
use std::path::Path;

use crate::domain::OrbitalParameters;
use crate::error::AppError;
use crate::orbit::DEFAULT_KEPLER_STEP;

const ENV_KEPLER_STEP: &str = "XT_KEPLER_STEP";
const ENV_LOG_LEVEL: &str = "XT_LOG_LEVEL";

/// Defaults resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvDefaults {
    pub kepler_step: f64,
    pub log_level: Option<tracing::Level>,
}

impl Default for EnvDefaults {
    fn default() -> Self {
        Self {
            kepler_step: DEFAULT_KEPLER_STEP,
            log_level: None,
        }
    }
}

impl EnvDefaults {
    /// Load `.env` (if present) and read the `XT_*` variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve defaults from an arbitrary key lookup (the environment, in practice).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut defaults = Self::default();

        if let Some(raw) = lookup(ENV_KEPLER_STEP) {
            let step: f64 = raw
                .trim()
                .parse()
                .map_err(|e| AppError::new(2, format!("Invalid {ENV_KEPLER_STEP}='{raw}': {e}")))?;
            if !(step.is_finite() && step > 0.0) {
                return Err(AppError::new(2, format!("{ENV_KEPLER_STEP} must be > 0, got {step}.")));
            }
            defaults.kepler_step = step;
        }

        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            let level = raw
                .trim()
                .parse::<tracing::Level>()
                .map_err(|e| AppError::new(2, format!("Invalid {ENV_LOG_LEVEL}='{raw}': {e}")))?;
            defaults.log_level = Some(level);
        }

        Ok(defaults)
    }
}

/// Read and validate an orbit ephemeris JSON file.
///
/// ```json
/// { "period": 1.2e6, "axsini": 110.0, "eccentricity": 0.34, "omega": 0.5, "epoch": 1.0e8 }
/// ```
///
/// `gamma` is optional (default 0).
pub fn read_orbit_json(path: &Path) -> Result<OrbitalParameters, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open orbit file '{}': {e}", path.display())))?;
    parse_orbit(file).map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))
}

pub fn parse_orbit<R: std::io::Read>(reader: R) -> Result<OrbitalParameters, AppError> {
    let params: OrbitalParameters =
        serde_json::from_reader(reader).map_err(|e| AppError::new(2, format!("Invalid orbit JSON: {e}")))?;
    params.validate()?;
    Ok(params)
}
