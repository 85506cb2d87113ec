//! `xray-timing` library crate.
//!
//! The binary (`xt`) is a thin wrapper around this library so that:
//!
//! - the timing algorithms are testable without spawning processes
//! - the numerical core (screening, orbit correction, binning) never touches files
//! - pipelines can be driven from other tools with in-memory event streams

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod glitch;
pub mod io;
pub mod lightcurve;
pub mod orbit;
pub mod report;
pub mod sim;
