//! Input/output helpers.
//!
//! - event-table ingest/write-back and raw column decoding (`ingest`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
