//! Measurement samples and the rolling history window
//!
//! Samples arrive once per measurement interval from the source thread and
//! are appended here by the UI loop. The window is a ring buffer: it keeps a
//! little more than one screen of history and evicts the oldest entry on
//! overflow.

use std::collections::VecDeque;

use serde::{Deserialize, Deserializer};

use crate::error::MeterError;

/// Extra entries retained beyond the visible history
pub const HISTORY_SLACK: usize = 8;

/// One measurement tick
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Sample {
    /// Tick time in nanoseconds
    pub timestamp: u64,

    /// Momentary loudness (400ms) in LUFS
    #[serde(deserialize_with = "loudness")]
    pub momentary: f64,

    /// Short-term loudness (3s) in LUFS
    #[serde(alias = "short_term", deserialize_with = "loudness")]
    pub shortterm: f64,

    /// Integrated loudness in LUFS
    #[serde(alias = "integrated", deserialize_with = "loudness")]
    pub global: f64,

    /// Loudness range in LU
    #[serde(default)]
    pub range: f64,

    /// Sample peak, displayed as delivered
    #[serde(default = "silence", deserialize_with = "loudness")]
    pub sample_peak: f64,

    /// True peak, displayed as delivered
    #[serde(default = "silence", deserialize_with = "loudness")]
    pub true_peak: f64,
}

fn silence() -> f64 {
    f64::NEG_INFINITY
}

/// The analyser reports silence as -inf, which JSON carries as null
fn loudness<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NEG_INFINITY))
}

#[cfg(test)]
impl Sample {
    /// Create a sample with the same value for every loudness metric
    pub fn flat(timestamp: u64, lufs: f64) -> Self {
        Self {
            timestamp,
            momentary: lufs,
            shortterm: lufs,
            global: lufs,
            range: 0.0,
            sample_peak: silence(),
            true_peak: silence(),
        }
    }
}

/// Most slots reserved up front; larger windows grow on demand
const PREALLOCATED_SAMPLES: usize = 4096;

/// Bounded, time-ordered buffer of samples
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl HistoryWindow {
    /// Create a window retaining at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(PREALLOCATED_SAMPLES)),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when full
    ///
    /// Timestamps must strictly increase; a stale sample is rejected and the
    /// window is left untouched.
    pub fn append(&mut self, sample: Sample) -> Result<(), MeterError> {
        if let Some(last) = self.samples.back() {
            if sample.timestamp <= last.timestamp {
                return Err(MeterError::OutOfOrderSample {
                    timestamp: sample.timestamp,
                    latest: last.timestamp,
                });
            }
        }

        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        Ok(())
    }

    /// The most recently appended sample
    pub fn latest(&self) -> Result<&Sample, MeterError> {
        self.samples.back().ok_or(MeterError::EmptyWindow)
    }

    /// Iterate from the newest sample back to the oldest
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &Sample> + Clone {
        self.samples.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
