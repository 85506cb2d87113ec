//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the event container (`EventStream`) and its filter output (`SelectionMask`)
//! - orbit and spin parameter bundles (`OrbitalParameters`, `SpinModel`)
//! - binning inputs/outputs (`BinSpec`, `Histogram`, `LightCurveHist`, `LightCurve`)

pub mod types;

pub use types::*;
