//! Formatted terminal output.
//!
//! Everything printed to stdout is built here, so command handlers only
//! decide *what* to report.

use crate::domain::{EventStream, Histogram, LightCurve, LightCurveHist, SelectionMask};
use crate::glitch::GlitchCriteria;
use crate::orbit::DelayModel;
use crate::report::series_stats;

/// Filter run: criteria applied and kept/excluded counts.
pub fn format_filter_summary(stream: &EventStream, criteria: &GlitchCriteria, mask: &SelectionMask) -> String {
    let mut out = String::new();
    out.push_str("=== xt - event screening ===\n");
    out.push_str(&format!("Events: n={}{}\n", stream.len(), fmt_span(stream)));

    out.push_str("Criteria:\n");
    if criteria.is_empty() {
        out.push_str("  (none)\n");
    }
    if let Some(gap) = criteria.time_gap {
        out.push_str(&format!(
            "  time gap  : {} events within {:.3e} s\n",
            gap.group_size + 1,
            gap.min_interval
        ));
    }
    if let Some(range) = criteria.channel_range {
        out.push_str(&format!("  channel   : [{}, {}]\n", range.low, range.high));
    }
    if let Some(range) = criteria.pulse_width_range {
        out.push_str(&format!("  pulse width: [{}, {}]\n", range.low, range.high));
    }

    let excluded_pct = if mask.is_empty() {
        0.0
    } else {
        100.0 * mask.excluded() as f64 / mask.len() as f64
    };
    out.push_str(&format!(
        "Kept: {} | Excluded: {} ({excluded_pct:.2}%)\n",
        mask.kept(),
        mask.excluded()
    ));
    out
}

/// Orbital correction: range of the applied delay.
pub fn format_delay_summary(model: DelayModel, delays: &[f64]) -> String {
    match series_stats(delays) {
        Some(s) => format!(
            "{} delay over {} events: min={:.6} s max={:.6} s mean={:.6} s\n",
            model.display_name(),
            s.n,
            s.min,
            s.max,
            s.mean
        ),
        None => format!("{} delay: no events\n", model.display_name()),
    }
}

/// Doppler-corrected spin frequency range.
pub fn format_frequency_summary(frequencies: &[f64]) -> String {
    match series_stats(frequencies) {
        Some(s) => format!(
            "Intrinsic frequency over {} events: min={:.9} Hz max={:.9} Hz\n",
            s.n, s.min, s.max
        ),
        None => "Intrinsic frequency: no events\n".to_string(),
    }
}

pub fn format_lightcurve_summary(lc: &LightCurveHist, rebinned: Option<&LightCurve>) -> String {
    let mut out = String::new();
    let unit = if lc.rate { "counts/s" } else { "counts" };
    out.push_str(&format!("Light curve: {} bins of {} s\n", lc.time.len(), lc.binsize));
    if let Some(s) = series_stats(&lc.value) {
        out.push_str(&format!(
            "  {unit}: min={:.4} max={:.4} mean={:.4}\n",
            s.min, s.max, s.mean
        ));
    }
    if let Some(rebinned) = rebinned {
        out.push_str(&format!("Rebinned: {} samples\n", rebinned.len()));
    }
    out
}

pub fn format_histogram_summary(hist: &Histogram) -> String {
    let mut out = String::new();
    let (Some(first), Some(last)) = (hist.edges.first(), hist.edges.last()) else {
        return "Histogram: empty\n".to_string();
    };
    out.push_str(&format!(
        "Histogram: {} bins over [{first}, {last}] | total={}\n",
        hist.counts.len(),
        hist.total()
    ));
    let peak = hist.counts.iter().copied().max().unwrap_or(0).max(1);
    for (center, count) in hist.centers().iter().zip(&hist.counts) {
        let bar = "#".repeat(((*count as f64 / peak as f64) * 40.0).round() as usize);
        out.push_str(&format!("{center:>14.6} {count:>8} {bar}\n"));
    }
    out
}

fn fmt_span(stream: &EventStream) -> String {
    match (stream.start_time(), stream.stop_time()) {
        (Some(start), Some(stop)) => format!(" | time=[{start:.6}, {stop:.6}] ({:.3} s)", stop - start),
        _ => String::new(),
    }
}
