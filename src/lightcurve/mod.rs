//! Light-curve binning.
//!
//! - uniform histograms and fixed-width light curves (`histogram`)
//! - piecewise rebinning of binned curves (`rebin`)

pub mod histogram;
pub mod rebin;

pub use histogram::*;
pub use rebin::*;
