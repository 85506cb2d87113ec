//! Binary-orbit corrections of photon arrival times and spin frequency.
//!
//! Two delay models convert arrival times to emission times:
//!
//! - **BT** (Blandford & Teukolsky 1976): needs the eccentric anomaly, solved
//!   per event with the grid search in [`crate::orbit::kepler`].
//! - **Deeter** (Deeter et al. 1981): first order in `e`, closed form in the
//!   mean anomaly measured from the ascending node.
//!
//! Both keep the event order only when the delay changes more slowly than time
//! itself (`d(delay)/dt > -1`), which holds for physically sane orbits
//! (`2π x / P << 1`). This is not checked.
//!
//! The Doppler correction (Galloway 2005) removes the orbital modulation from
//! an observed spin-frequency polynomial.

use std::f64::consts::{FRAC_PI_2, TAU};

use tracing::{debug, warn};

use crate::domain::{EventStream, OrbitalParameters, SpinModel};
use crate::error::{Result, TimingError};
use crate::orbit::kepler;

/// Emission times under the BT model: `t + delay(t)`.
///
/// `params.epoch` is the periastron passage. `params.gamma` is forced to zero
/// whatever the caller supplies (kept for compatibility with existing
/// ephemerides; a non-zero value is logged).
pub fn orbit_cor_bt(stream: &EventStream, params: &OrbitalParameters, kepler_step: f64) -> Result<Vec<f64>> {
    let delay = bt_delay(stream, params, kepler_step)?;
    Ok(stream.times().iter().zip(&delay).map(|(&t, &d)| t + d).collect())
}

/// BT orbital delay for every event.
pub fn bt_delay(stream: &EventStream, params: &OrbitalParameters, kepler_step: f64) -> Result<Vec<f64>> {
    let times = non_empty_times(stream)?;
    params.validate()?;
    if params.gamma != 0.0 {
        // FIXME: confirm whether any ephemeris relies on a non-zero gamma before honoring it.
        warn!(gamma = params.gamma, "BT gamma coefficient is ignored (forced to 0)");
    }

    let OrbitalParameters {
        period: p,
        axsini: x,
        eccentricity: e,
        omega,
        epoch,
        ..
    } = *params;
    let gamma = 0.0;

    let ecc_anomaly = kepler::solve(times, p, e, epoch, kepler_step)?;

    let (sin_w, cos_w) = omega.sin_cos();
    let root = (1.0 - e * e).sqrt();
    let alpha = x * sin_w;
    let beta = x * cos_w * root;

    let delay: Vec<f64> = ecc_anomaly
        .iter()
        .map(|&big_e| {
            let (sin_e, cos_e) = big_e.sin_cos();
            let geometric = alpha * (cos_e - e) + (beta + gamma) * sin_e;
            let compression = 1.0 - (TAU / p) * (beta - alpha * sin_e) / (1.0 - e * cos_e);
            geometric * compression
        })
        .collect();

    log_delay_range("BT", &delay);
    Ok(delay)
}

/// Emission times under the Deeter model: `t - delay(t)`.
///
/// `params.epoch` is the ascending-node passage.
pub fn orbit_cor_deeter(stream: &EventStream, params: &OrbitalParameters) -> Result<Vec<f64>> {
    let delay = deeter_delay(stream, params)?;
    Ok(stream.times().iter().zip(&delay).map(|(&t, &d)| t - d).collect())
}

/// Deeter orbital delay `x [sin(M + ω) + (e/2) sin(2M + ω) - (3e/2) sin ω]`.
pub fn deeter_delay(stream: &EventStream, params: &OrbitalParameters) -> Result<Vec<f64>> {
    let times = non_empty_times(stream)?;
    params.validate()?;

    let OrbitalParameters {
        period,
        axsini: x,
        eccentricity: e,
        omega,
        epoch,
        ..
    } = *params;
    let constant = -1.5 * e * omega.sin();

    let delay: Vec<f64> = times
        .iter()
        .map(|&t| {
            let m = kepler::mean_anomaly(t, period, epoch);
            x * ((m + omega).sin() + 0.5 * e * (2.0 * m + omega).sin() + constant)
        })
        .collect();

    log_delay_range("Deeter", &delay);
    Ok(delay)
}

/// Intrinsic spin frequency at every event: `f_spin(t) - f_dopp(t)`.
///
/// The spin polynomial is referenced to the earliest event of *this* stream,
/// recomputed on every call. `params.epoch` is the time at which the mean
/// longitude equals π/2.
pub fn fre_doppler_cor(stream: &EventStream, spin: &SpinModel, params: &OrbitalParameters) -> Result<Vec<f64>> {
    let times = non_empty_times(stream)?;
    params.validate()?;
    if !(spin.f0.is_finite() && spin.f1.is_finite() && spin.f2.is_finite()) {
        return Err(TimingError::invalid("spin frequency terms must be finite"));
    }

    let t0 = times.iter().copied().fold(f64::INFINITY, f64::min);
    let f_dopp = doppler_frequency(times, spin.f0, params);

    Ok(times
        .iter()
        .zip(&f_dopp)
        .map(|(&t, &fd)| {
            let dt = t - t0;
            let f_spin = spin.f0 + spin.f1 * dt + 0.5 * spin.f2 * dt * dt;
            f_spin - fd
        })
        .collect())
}

/// Orbital Doppler shift of a spin frequency `f0`.
///
/// `(2π f0 x / P) [cos L + g sin 2L + h cos 2L]` with `L = 2π (t - T) / P + π/2`,
/// `g = e sin ω`, `h = e cos ω`.
pub fn doppler_frequency(times: &[f64], f0: f64, params: &OrbitalParameters) -> Vec<f64> {
    let p = params.period;
    let amplitude = TAU * f0 * params.axsini / p;
    let g = params.eccentricity * params.omega.sin();
    let h = params.eccentricity * params.omega.cos();

    times
        .iter()
        .map(|&t| {
            let l = TAU * (t - params.epoch) / p + FRAC_PI_2;
            amplitude * (l.cos() + g * (2.0 * l).sin() + h * (2.0 * l).cos())
        })
        .collect()
}

fn non_empty_times(stream: &EventStream) -> Result<&[f64]> {
    if stream.is_empty() {
        return Err(TimingError::invalid("event stream is empty"));
    }
    Ok(stream.times())
}

fn log_delay_range(model: &str, delay: &[f64]) {
    let min = delay.iter().copied().fold(f64::INFINITY, f64::min);
    let max = delay.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    debug!(model, events = delay.len(), min_delay = min, max_delay = max, "orbital delay");
}
