//! Glitch and event-quality selection.
//!
//! Every criterion produces its own mask; the final mask is their logical AND,
//! so the result never depends on the order criteria are applied in.
//!
//! The time-gap criterion needs ascending times. On an unordered stream it
//! still runs (and never panics) but what it flags is not meaningful.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{EventStream, SelectionMask};
use crate::error::{Result, TimingError};

/// Burst detector: `group_size + 1` consecutive events spanning at most
/// `min_interval` seconds are a glitch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeGap {
    pub min_interval: f64,
    pub group_size: usize,
}

/// Inclusive `[low, high]` acceptance window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range<T> {
    pub low: T,
    pub high: T,
}

impl<T: PartialOrd + Copy> Range<T> {
    pub fn new(low: T, high: T) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Which criteria to apply. `None` means "no constraint".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GlitchCriteria {
    pub time_gap: Option<TimeGap>,
    pub channel_range: Option<Range<i64>>,
    pub pulse_width_range: Option<Range<f64>>,
}

impl GlitchCriteria {
    pub fn is_empty(&self) -> bool {
        self.time_gap.is_none() && self.channel_range.is_none() && self.pulse_width_range.is_none()
    }
}

/// Build the combined selection mask for `stream`.
///
/// Fails with `MissingAttribute` when a channel or pulse-width window is
/// requested for a stream that does not carry that column, and with
/// `InvalidParameter` on an empty stream.
pub fn filter(stream: &EventStream, criteria: &GlitchCriteria) -> Result<SelectionMask> {
    if stream.is_empty() {
        return Err(TimingError::invalid("event stream is empty"));
    }
    let n = stream.len();
    let mut mask = SelectionMask::all(n);

    if let Some(gap) = criteria.time_gap {
        if !stream.is_time_ordered() {
            warn!(events = n, "time-gap glitch filter applied to an unordered stream");
        }
        let gap_mask = time_gap_mask(stream.times(), gap)?;
        debug!(
            excluded = gap_mask.excluded(),
            min_interval = gap.min_interval,
            group_size = gap.group_size,
            "time-gap criterion"
        );
        mask = mask.and(&gap_mask)?;
    }

    if let Some(range) = criteria.channel_range {
        let channel = stream.channel().ok_or(TimingError::MissingAttribute {
            attribute: "channel",
        })?;
        let chan_mask = range_mask(channel, range);
        debug!(excluded = chan_mask.excluded(), low = range.low, high = range.high, "channel criterion");
        mask = mask.and(&chan_mask)?;
    }

    if let Some(range) = criteria.pulse_width_range {
        let pulse_width = stream.pulse_width().ok_or(TimingError::MissingAttribute {
            attribute: "pulse_width",
        })?;
        let pw_mask = range_mask(pulse_width, range);
        debug!(excluded = pw_mask.excluded(), low = range.low, high = range.high, "pulse-width criterion");
        mask = mask.and(&pw_mask)?;
    }

    debug!(events = n, kept = mask.kept(), "glitch filtering done");
    Ok(mask)
}

/// Flag every run of `group_size + 1` consecutive events whose first and last
/// arrival times are at most `min_interval` apart.
///
/// Single forward pass; overlapping runs simply re-exclude events, and an
/// excluded event never comes back.
pub fn time_gap_mask(times: &[f64], gap: TimeGap) -> Result<SelectionMask> {
    if gap.group_size == 0 {
        return Err(TimingError::invalid("glitch group size must be >= 1"));
    }
    if !(gap.min_interval.is_finite() && gap.min_interval >= 0.0) {
        return Err(TimingError::invalid(format!(
            "glitch minimum interval must be finite and >= 0, got {}",
            gap.min_interval
        )));
    }

    if times.is_empty() {
        return Err(TimingError::invalid("event stream is empty"));
    }

    let n = times.len();
    let mut keep = vec![true; n];
    let g = gap.group_size;
    if n <= g {
        return Ok(SelectionMask::from_vec(keep));
    }

    for i in 0..n - g {
        if times[i + g] - times[i] <= gap.min_interval {
            keep[i..=i + g].fill(false);
        }
    }
    Ok(SelectionMask::from_vec(keep))
}

fn range_mask<T: PartialOrd + Copy>(values: &[T], range: Range<T>) -> SelectionMask {
    SelectionMask::from_vec(values.iter().map(|&v| range.contains(v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stream_with_attrs() -> EventStream {
        EventStream::new(vec![0.0, 0.1, 0.2, 5.0, 9.0, 9.00001])
            .with_channel(vec![10, 300, 20, 30, 40, 50])
            .unwrap()
            .with_pulse_width(vec![55.0, 60.0, 80.0, 65.0, 54.0, 70.0])
            .unwrap()
    }

    #[test]
    fn time_gap_uses_first_to_last_separation() {
        let times = [0.0, 1.0, 2.0, 3.0, 10.0, 11.0, 12.0];

        // Every 3-event run spans 2 s (or more), so nothing is tighter than 1.5 s.
        let mask = time_gap_mask(&times, TimeGap { min_interval: 1.5, group_size: 2 }).unwrap();
        assert_eq!(mask.kept(), 7);

        // At 2 s the runs {0,1,2}, {1,2,3} and {4,5,6} trigger; their union is excluded.
        let mask = time_gap_mask(&times, TimeGap { min_interval: 2.0, group_size: 2 }).unwrap();
        assert_eq!(mask.as_slice(), &[false, false, false, false, false, false, false]);

        let times = [0.0, 1.0, 2.0, 3.0, 10.0, 11.5, 13.0];
        let mask = time_gap_mask(&times, TimeGap { min_interval: 2.0, group_size: 2 }).unwrap();
        assert_eq!(mask.as_slice(), &[false, false, false, false, true, true, true]);
    }

    #[test]
    fn time_gap_flags_detector_burst_only() {
        let times = [0.0, 1.0, 1.00001, 1.00002, 1.00003, 2.0, 3.0];
        let mask = time_gap_mask(&times, TimeGap { min_interval: 8e-5, group_size: 3 }).unwrap();
        assert_eq!(mask.as_slice(), &[true, false, false, false, false, true, true]);
    }

    #[test]
    fn time_gap_short_stream_keeps_everything() {
        let mask = time_gap_mask(&[0.0, 0.0], TimeGap { min_interval: 1.0, group_size: 2 }).unwrap();
        assert_eq!(mask.as_slice(), &[true, true]);
    }

    #[test]
    fn empty_stream_is_rejected() {
        assert!(matches!(
            time_gap_mask(&[], TimeGap { min_interval: 1.0, group_size: 2 }),
            Err(TimingError::InvalidParameter(_))
        ));
        assert!(matches!(
            filter(&EventStream::new(vec![]), &GlitchCriteria::default()),
            Err(TimingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn time_gap_rejects_degenerate_settings() {
        assert!(time_gap_mask(&[0.0], TimeGap { min_interval: 1.0, group_size: 0 }).is_err());
        assert!(time_gap_mask(&[0.0], TimeGap { min_interval: -1.0, group_size: 2 }).is_err());
        assert!(time_gap_mask(&[0.0], TimeGap { min_interval: f64::NAN, group_size: 2 }).is_err());
    }

    #[test]
    fn unordered_stream_does_not_panic() {
        let times = [5.0, 1.0, 3.0, 0.5, 0.5, 9.0];
        let mask = time_gap_mask(&times, TimeGap { min_interval: 0.1, group_size: 1 }).unwrap();
        assert_eq!(mask.len(), times.len());
    }

    #[test]
    fn channel_and_pulse_width_windows_are_inclusive() {
        let stream = stream_with_attrs();
        let criteria = GlitchCriteria {
            channel_range: Some(Range::new(0, 255)),
            pulse_width_range: Some(Range::new(54.0, 70.0)),
            ..GlitchCriteria::default()
        };
        let mask = filter(&stream, &criteria).unwrap();
        assert_eq!(mask.as_slice(), &[true, false, false, true, true, true]);
    }

    #[test]
    fn missing_attribute_is_reported() {
        let stream = EventStream::new(vec![0.0, 1.0]);
        let criteria = GlitchCriteria {
            channel_range: Some(Range::new(0, 255)),
            ..GlitchCriteria::default()
        };
        assert_eq!(
            filter(&stream, &criteria).unwrap_err(),
            TimingError::MissingAttribute { attribute: "channel" }
        );

        let criteria = GlitchCriteria {
            pulse_width_range: Some(Range::new(0.0, 1.0)),
            ..GlitchCriteria::default()
        };
        assert_eq!(
            filter(&stream, &criteria).unwrap_err(),
            TimingError::MissingAttribute { attribute: "pulse_width" }
        );
    }

    #[test]
    fn no_criteria_keeps_everything() {
        let stream = stream_with_attrs();
        let mask = filter(&stream, &GlitchCriteria::default()).unwrap();
        assert_eq!(mask, SelectionMask::all(stream.len()));
    }

    proptest! {
        #[test]
        fn prop_combined_mask_is_and_of_individual_masks(
            raw in proptest::collection::vec((0.0f64..1.0, 0i64..512, 0.0f64..120.0), 1..200),
            min_interval in 0.0f64..0.05,
            group_size in 1usize..5,
            chan_lo in 0i64..256,
            pw_lo in 0.0f64..60.0,
        ) {
            let mut times: Vec<f64> = Vec::with_capacity(raw.len());
            let mut acc = 0.0;
            for (dt, _, _) in &raw {
                acc += dt * 0.1;
                times.push(acc);
            }
            let stream = EventStream::new(times)
                .with_channel(raw.iter().map(|r| r.1).collect())
                .unwrap()
                .with_pulse_width(raw.iter().map(|r| r.2).collect())
                .unwrap();

            let gap = TimeGap { min_interval, group_size };
            let chan = Range::new(chan_lo, chan_lo + 200);
            let pw = Range::new(pw_lo, pw_lo + 40.0);

            let combined = filter(&stream, &GlitchCriteria {
                time_gap: Some(gap),
                channel_range: Some(chan),
                pulse_width_range: Some(pw),
            }).unwrap();

            let only_gap = filter(&stream, &GlitchCriteria { time_gap: Some(gap), ..GlitchCriteria::default() }).unwrap();
            let only_chan = filter(&stream, &GlitchCriteria { channel_range: Some(chan), ..GlitchCriteria::default() }).unwrap();
            let only_pw = filter(&stream, &GlitchCriteria { pulse_width_range: Some(pw), ..GlitchCriteria::default() }).unwrap();

            let expected = only_pw.and(&only_gap).unwrap().and(&only_chan).unwrap();
            prop_assert_eq!(combined.len(), stream.len());
            prop_assert_eq!(combined, expected);
        }
    }
}
