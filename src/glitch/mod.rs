//! Event screening.
//!
//! - detector burst ("glitch") removal by time separation
//! - channel and pulse-width acceptance windows

pub mod filter;

pub use filter::*;
