//! Export derived series to CSV / JSON.
//!
//! CSV is meant to be easy to consume in spreadsheets or downstream scripts;
//! JSON wraps the same data with enough metadata to know how it was produced.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Histogram, LightCurve, LightCurveHist};
use crate::error::AppError;

/// One column of per-event values next to the original arrival time.
pub fn write_series_csv(path: &Path, time: &[f64], column: &str, values: &[f64]) -> Result<(), AppError> {
    if time.len() != values.len() {
        return Err(AppError::new(
            4,
            format!("Series length ({}) does not match time length ({}).", values.len(), time.len()),
        ));
    }
    let mut file = create(path)?;
    writeln!(file, "time,{column}").map_err(write_err)?;
    for (t, v) in time.iter().zip(values) {
        writeln!(file, "{t:.9},{v:.12}").map_err(write_err)?;
    }
    Ok(())
}

/// Binned light curve: `time,counts[,error]`.
pub fn write_lightcurve_csv(path: &Path, lc: &LightCurve) -> Result<(), AppError> {
    let mut file = create(path)?;
    match &lc.errors {
        Some(errors) => {
            writeln!(file, "time,counts,error").map_err(write_err)?;
            for ((t, c), e) in lc.time.iter().zip(&lc.counts).zip(errors) {
                writeln!(file, "{t:.9},{c:.10},{e:.10}").map_err(write_err)?;
            }
        }
        None => {
            writeln!(file, "time,counts").map_err(write_err)?;
            for (t, c) in lc.time.iter().zip(&lc.counts) {
                writeln!(file, "{t:.9},{c:.10}").map_err(write_err)?;
            }
        }
    }
    Ok(())
}

/// Metadata wrapper for JSON products.
#[derive(Debug, Serialize)]
pub struct Product<'a, T: Serialize> {
    pub tool: &'static str,
    pub generated_at: DateTime<Utc>,
    pub source: Option<String>,
    pub data: &'a T,
}

impl<'a, T: Serialize> Product<'a, T> {
    pub fn new(source: Option<&Path>, data: &'a T) -> Self {
        Self {
            tool: "xt",
            generated_at: Utc::now(),
            source: source.map(|p| p.display().to_string()),
            data,
        }
    }
}

pub fn write_histogram_json(path: &Path, source: Option<&Path>, hist: &Histogram) -> Result<(), AppError> {
    write_json(path, &Product::new(source, hist))
}

pub fn write_lightcurve_json(path: &Path, source: Option<&Path>, lc: &LightCurveHist) -> Result<(), AppError> {
    write_json(path, &Product::new(source, lc))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = create(path)?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON '{}': {e}", path.display())))
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path).map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))
}

fn write_err(e: std::io::Error) -> AppError {
    AppError::new(2, format!("Failed to write output: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lightcurve_csv_with_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lc.csv");
        let lc = LightCurve::new(vec![0.5, 1.5], vec![2.0, 3.0], Some(vec![0.1, 0.2])).unwrap();
        write_lightcurve_csv(&path, &lc).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "time,counts,error");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("1.500000000,3.0000000000,"));
    }

    #[test]
    fn series_length_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_series_csv(&dir.path().join("s.csv"), &[1.0, 2.0], "f", &[1.0]).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn histogram_json_carries_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.json");
        let hist = Histogram {
            edges: vec![0.0, 1.0, 2.0],
            counts: vec![3, 4],
        };
        write_histogram_json(&path, Some(Path::new("events.csv")), &hist).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["tool"], "xt");
        assert_eq!(value["source"], "events.csv");
        assert_eq!(value["data"]["counts"][1], 4);
        assert!(value["generated_at"].is_string());
    }
}
