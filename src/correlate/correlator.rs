//! Nearest-sample attachment with a maximum time gap.
//!
//! For every event the sorted samples are scanned linearly for the smallest
//! `|sample.timestamp - event.timestamp|`. Ties go to the earlier sample. An
//! event farther than the cutoff from every sample is dropped.
//!
//! Cost is `O(samples * events)`. Intraday series run to a few thousand
//! samples and post feeds to a few dozen events, so there is no index.
//!
//! When several events land on the same sample, the one processed last wins.
//! Events are processed in the order given, which is fetch order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Event, PriceSample};

/// Default maximum gap between an event and its sample: 24 hours.
pub const DEFAULT_CUTOFF_SECS: u64 = 24 * 60 * 60;

/// Configuration for [`correlate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelatorConfig {
    /// Maximum allowed `|sample.timestamp - event.timestamp|`, inclusive.
    pub cutoff_seconds: u64,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            cutoff_seconds: DEFAULT_CUTOFF_SECS,
        }
    }
}

impl CorrelatorConfig {
    /// Creates a config with the given cutoff.
    #[must_use]
    pub const fn new(cutoff_seconds: u64) -> Self {
        Self { cutoff_seconds }
    }
}

/// A price sample with at most one attached event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentedSample {
    /// The underlying price point.
    #[serde(flatten)]
    pub sample: PriceSample,
    /// The nearest event, if one qualified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

/// Output of one correlation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    /// Samples in ascending timestamp order, each optionally decorated.
    pub samples: Vec<AugmentedSample>,
    /// Events that found a sample within the cutoff.
    pub attached: usize,
    /// Events with no sample within the cutoff.
    pub unmatched: usize,
    /// Events that were overwritten by a later event on the same sample.
    pub displaced: usize,
    /// Why the events could not be fetched, if they could not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts_error: Option<String>,
}

impl Correlation {
    /// Iterates over the samples that carry an event.
    pub fn annotated(&self) -> impl Iterator<Item = &AugmentedSample> {
        self.samples.iter().filter(|s| s.event.is_some())
    }
}

/// Returns the index of the sample nearest to `timestamp`, or `None` if the
/// nearest one is more than `cutoff` seconds away.
///
/// `sorted` must be in ascending timestamp order; equidistant candidates
/// resolve to the lower index.
///
/// # Examples
///
/// ```
/// use marketpulse::core::PriceSample;
/// use marketpulse::correlate::nearest_sample_index;
///
/// let samples = vec![PriceSample::flat(0, 1.0), PriceSample::flat(20, 1.0)];
/// assert_eq!(nearest_sample_index(&samples, 10, 100), Some(0));
/// assert_eq!(nearest_sample_index(&samples, 500, 100), None);
/// ```
#[must_use]
pub fn nearest_sample_index(sorted: &[PriceSample], timestamp: i64, cutoff: u64) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;

    for (index, sample) in sorted.iter().enumerate() {
        let diff = sample.timestamp.abs_diff(timestamp);
        if best.is_none_or(|(_, min)| diff < min) {
            best = Some((index, diff));
        }
    }

    best.filter(|&(_, min)| min <= cutoff).map(|(index, _)| index)
}

/// Attaches each event to its nearest sample within the cutoff.
///
/// Inputs are left untouched; samples are copied and sorted by timestamp
/// (stable on ties) before matching.
///
/// # Examples
///
/// ```
/// use marketpulse::core::{Event, PriceSample};
/// use marketpulse::correlate::{CorrelatorConfig, correlate};
///
/// let samples = vec![PriceSample::flat(100, 10.0), PriceSample::flat(0, 9.0)];
/// let events = vec![Event::new(90, "news")];
///
/// let result = correlate(&samples, &events, &CorrelatorConfig::default());
/// assert_eq!(result.samples[0].sample.timestamp, 0);
/// assert!(result.samples[1].event.is_some());
/// ```
#[must_use]
pub fn correlate(
    samples: &[PriceSample],
    events: &[Event],
    config: &CorrelatorConfig,
) -> Correlation {
    let mut sorted = samples.to_vec();
    sorted.sort_by_key(|s| s.timestamp);

    let mut slots: Vec<Option<Event>> = vec![None; sorted.len()];
    let mut result = Correlation::default();

    if !sorted.is_empty() {
        for event in events {
            let Some(index) = nearest_sample_index(&sorted, event.timestamp, config.cutoff_seconds)
            else {
                result.unmatched += 1;
                continue;
            };

            if let Some(previous) = slots[index].replace(event.clone()) {
                debug!(
                    sample = sorted[index].timestamp,
                    replaced = previous.timestamp,
                    by = event.timestamp,
                    "event displaced by a later one"
                );
                result.displaced += 1;
            } else {
                result.attached += 1;
            }
        }
    }

    result.samples = sorted
        .into_iter()
        .zip(slots)
        .map(|(sample, event)| AugmentedSample { sample, event })
        .collect();

    debug!(
        samples = result.samples.len(),
        attached = result.attached,
        unmatched = result.unmatched,
        displaced = result.displaced,
        "correlation complete"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(timestamps: &[i64]) -> Vec<PriceSample> {
        timestamps
            .iter()
            .map(|&t| PriceSample::flat(t, 100.0))
            .collect()
    }

    #[test]
    fn test_tie_goes_to_earlier_sample() {
        let samples = series(&[0, 20]);
        let result = correlate(&samples, &[Event::new(10, "tie")], &CorrelatorConfig::new(100));
        assert!(result.samples[0].event.is_some());
        assert!(result.samples[1].event.is_none());
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let samples = series(&[0]);
        let config = CorrelatorConfig::default();

        let at = correlate(&samples, &[Event::new(86_400, "at")], &config);
        assert_eq!(at.attached, 1);

        let past = correlate(&samples, &[Event::new(86_401, "past")], &config);
        assert_eq!(past.attached, 0);
        assert_eq!(past.unmatched, 1);
        assert!(past.samples[0].event.is_none());
    }

    #[test]
    fn test_empty_samples_yield_empty_output() {
        let result = correlate(&[], &[Event::new(1, "x")], &CorrelatorConfig::default());
        assert!(result.samples.is_empty());
        assert_eq!(result.attached, 0);
    }

    #[test]
    fn test_no_events_keeps_series() {
        let samples = series(&[30, 10, 20]);
        let result = correlate(&samples, &[], &CorrelatorConfig::default());
        let stamps: Vec<i64> = result.samples.iter().map(|s| s.sample.timestamp).collect();
        assert_eq!(stamps, vec![10, 20, 30]);
        assert_eq!(result.annotated().count(), 0);
    }

    #[test]
    fn test_last_event_wins_on_collision() {
        let samples = series(&[0, 1000]);
        let events = vec![Event::new(5, "first"), Event::new(-5, "second")];
        let result = correlate(&samples, &events, &CorrelatorConfig::default());

        assert_eq!(result.attached, 1);
        assert_eq!(result.displaced, 1);
        let attached = result.samples[0].event.as_ref().unwrap();
        assert_eq!(attached.content, "second");
    }

    #[test]
    fn test_inputs_not_mutated() {
        let samples = series(&[3, 1, 2]);
        let _ = correlate(&samples, &[Event::new(2, "e")], &CorrelatorConfig::default());
        assert_eq!(samples[0].timestamp, 3);
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let samples = series(&[i64::MIN, i64::MAX]);
        assert_eq!(nearest_sample_index(&samples, i64::MAX, 0), Some(1));
        assert_eq!(nearest_sample_index(&samples, 0, 10), None);
    }

    #[test]
    fn test_stable_sort_on_equal_timestamps() {
        let mut a = PriceSample::flat(5, 1.0);
        a.volume = 1;
        let mut b = PriceSample::flat(5, 2.0);
        b.volume = 2;
        let result = correlate(&[a, b], &[Event::new(5, "e")], &CorrelatorConfig::default());
        assert_eq!(result.samples[0].sample.volume, 1);
        assert!(result.samples[0].event.is_some());
    }
}
