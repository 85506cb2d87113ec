//! Event-table ingest and write-back.
//!
//! The numerical core never touches files. It talks to two narrow interfaces:
//!
//! - `EventSource::read_columns(path)`: produce an `EventStream`
//! - `EventSink::write_filtered(path, stream)`: persist a derived stream
//!
//! `CsvEventTable` implements both for a plain CSV table:
//!
//! ```text
//! time,channel,pulse_width
//! 181400000.000012,112,61.0
//! ```
//!
//! `time` is required; `channel` (alias `pi`) and `pulse_width` (alias `pw`) are
//! optional. Header names are matched case-insensitively. Any unparsable cell
//! is a hard error naming the line, since silently dropping photons would
//! corrupt every downstream light curve.
//!
//! Binary instrument files store columns big-endian; `decode_f64_column` turns
//! raw column bytes into native `f64` before anything else sees them.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::EventStream;
use crate::error::{AppError, TimingError};

/// Something that can load an event table.
pub trait EventSource {
    fn read_columns(&self, path: &Path) -> Result<EventStream, AppError>;
}

/// Something that can persist a (filtered or corrected) event table.
pub trait EventSink {
    fn write_filtered(&self, path: &Path, stream: &EventStream) -> Result<(), AppError>;
}

/// Byte order of a raw binary column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

/// Decode a raw column of 8-byte floats into native-order `f64`.
pub fn decode_f64_column(bytes: &[u8], order: ByteOrder) -> Result<Vec<f64>, TimingError> {
    if bytes.len() % 8 != 0 {
        return Err(TimingError::LengthMismatch {
            what: "f64 column bytes",
            expected: bytes.len() / 8 * 8 + 8,
            found: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            match order {
                ByteOrder::Big => f64::from_be_bytes(raw),
                ByteOrder::Little => f64::from_le_bytes(raw),
            }
        })
        .collect())
}

/// CSV implementation of both collaborator interfaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvEventTable;

impl EventSource for CsvEventTable {
    fn read_columns(&self, path: &Path) -> Result<EventStream, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::new(2, format!("Failed to open event table '{}': {e}", path.display())))?;
        let stream = read_events(file)
            .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))?;
        info!(
            path = %path.display(),
            events = stream.len(),
            channel = stream.channel().is_some(),
            pulse_width = stream.pulse_width().is_some(),
            "event table loaded"
        );
        Ok(stream)
    }
}

impl EventSink for CsvEventTable {
    fn write_filtered(&self, path: &Path, stream: &EventStream) -> Result<(), AppError> {
        let file = File::create(path)
            .map_err(|e| AppError::new(2, format!("Failed to create event table '{}': {e}", path.display())))?;
        write_events(file, stream)?;
        info!(path = %path.display(), events = stream.len(), "event table written");
        Ok(())
    }
}

/// Parse an event table from any reader.
pub fn read_events<R: std::io::Read>(reader: R) -> Result<EventStream, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let time_idx = column_index(&header_map, &["time", "t"])
        .ok_or_else(|| AppError::new(2, "Missing required column: `time`"))?;
    let channel_idx = column_index(&header_map, &["channel", "pi"]);
    let pw_idx = column_index(&header_map, &["pulse_width", "pw"]);

    let mut times = Vec::new();
    let mut channel = channel_idx.map(|_| Vec::new());
    let mut pulse_width = pw_idx.map(|_| Vec::new());

    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| AppError::new(2, format!("record {}: CSV parse error: {e}", idx + 1)))?;
        // Physical line (comments and the header included), for error messages.
        let line = record.position().map_or(idx + 2, |p| p.line() as usize);

        times.push(parse_cell::<f64>(&record, time_idx, "time", line)?);
        if let (Some(i), Some(out)) = (channel_idx, channel.as_mut()) {
            out.push(parse_cell::<i64>(&record, i, "channel", line)?);
        }
        if let (Some(i), Some(out)) = (pw_idx, pulse_width.as_mut()) {
            out.push(parse_cell::<f64>(&record, i, "pulse_width", line)?);
        }
    }

    if times.iter().any(|t| !t.is_finite()) {
        return Err(AppError::new(2, "Event table contains non-finite times."));
    }

    let mut stream = EventStream::new(times);
    if let Some(channel) = channel {
        stream = stream.with_channel(channel)?;
    }
    if let Some(pulse_width) = pulse_width {
        stream = stream.with_pulse_width(pulse_width)?;
    }
    debug!(events = stream.len(), ordered = stream.is_time_ordered(), "event table parsed");
    Ok(stream)
}

/// Write an event table (same schema as `read_events` accepts).
pub fn write_events<W: std::io::Write>(writer: W, stream: &EventStream) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["time"];
    if stream.channel().is_some() {
        header.push("channel");
    }
    if stream.pulse_width().is_some() {
        header.push("pulse_width");
    }
    wtr.write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write event table header: {e}")))?;

    for i in 0..stream.len() {
        let mut row = vec![format!("{:.9}", stream.times()[i])];
        if let Some(channel) = stream.channel() {
            row.push(channel[i].to_string());
        }
        if let Some(pw) = stream.pulse_width() {
            row.push(pw[i].to_string());
        }
        wtr.write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write event table row: {e}")))?;
    }
    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush event table: {e}")))?;
    Ok(())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase().replace([' ', '-'], "_")
}

fn column_index(header_map: &HashMap<String, usize>, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| header_map.get(*n).copied())
}

fn parse_cell<T>(record: &StringRecord, idx: usize, name: &str, line: usize) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::new(2, format!("line {line}: missing value for `{name}`")))?;
    raw.parse::<T>()
        .map_err(|e| AppError::new(2, format!("line {line}: invalid `{name}` value '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_optional_columns_case_insensitively() {
        let csv = "\u{feff}TIME, PI ,Pulse Width\n1.5,10,55.0\n2.5,300,71.5\n";
        let stream = read_events(csv.as_bytes()).unwrap();
        assert_eq!(stream.times(), &[1.5, 2.5]);
        assert_eq!(stream.channel().unwrap(), &[10, 300]);
        assert_eq!(stream.pulse_width().unwrap(), &[55.0, 71.5]);
    }

    #[test]
    fn time_only_table() {
        let stream = read_events("time\n# comment\n3.0\n4.0\n".as_bytes()).unwrap();
        assert_eq!(stream.times(), &[3.0, 4.0]);
        assert!(stream.channel().is_none());
        assert!(stream.pulse_width().is_none());
    }

    #[test]
    fn bad_cell_names_the_line() {
        let err = read_events("time,channel\n1.0,5\n2.0,abc\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("line 3"), "{err}");

        let err = read_events("channel\n5\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("time"));
    }

    #[test]
    fn write_then_read_keeps_columns() {
        let stream = EventStream::new(vec![0.25, 1.125])
            .with_channel(vec![3, 4])
            .unwrap();
        let mut buf = Vec::new();
        write_events(&mut buf, &stream).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("time,channel\n"));
        let back = read_events(text.as_bytes()).unwrap();
        assert_eq!(back, stream);
    }

    #[test]
    fn big_endian_column_is_swapped_to_native() {
        let values = [181_400_000.000_012_f64, -0.5, 3.25];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        assert_eq!(decode_f64_column(&bytes, ByteOrder::Big).unwrap(), values.to_vec());

        let le: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        assert_eq!(decode_f64_column(&le, ByteOrder::Little).unwrap(), values.to_vec());

        assert!(matches!(
            decode_f64_column(&bytes[..12], ByteOrder::Big),
            Err(TimingError::LengthMismatch { .. })
        ));
    }
}
