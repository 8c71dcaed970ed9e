use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::phase::EndurancePhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDuration {
    pub phase: EndurancePhase,
    pub weeks: u32,
}

/// Ordered phase sequence used for every plan length up to `max_weeks`
/// (`None` covers everything longer than the previous bucket).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationBucket {
    pub max_weeks: Option<u32>,
    pub phases: Vec<PhaseDuration>,
}

impl DurationBucket {
    fn new(max_weeks: Option<u32>, weeks: [u32; 6]) -> Self {
        Self {
            max_weeks,
            phases: EndurancePhase::ALL
                .into_iter()
                .zip(weeks)
                .map(|(phase, weeks)| PhaseDuration { phase, weeks })
                .collect(),
        }
    }

    pub fn total_weeks(&self) -> u32 {
        self.phases.iter().map(|entry| entry.weeks).sum()
    }

    /// Weeks scheduled before the final phase starts.
    pub fn weeks_before_final(&self) -> u32 {
        let last = self.phases.last().map(|entry| entry.weeks).unwrap_or(0);
        self.total_weeks() - last
    }

    pub fn covers(&self, total_weeks: u32) -> bool {
        self.max_weeks.map_or(true, |max| total_weeks <= max)
    }
}

/// Hand-tuned phase lengths per plan-length bucket. The numbers are data,
/// not a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseDurationTable {
    buckets: Vec<DurationBucket>,
}

impl Default for PhaseDurationTable {
    fn default() -> Self {
        Self {
            buckets: vec![
                DurationBucket::new(Some(8), [1, 1, 1, 1, 1, 1]),
                DurationBucket::new(Some(12), [3, 2, 2, 2, 2, 1]),
                DurationBucket::new(Some(16), [4, 3, 3, 2, 2, 2]),
                DurationBucket::new(None, [4, 4, 4, 3, 3, 2]),
            ],
        }
    }
}

impl PhaseDurationTable {
    pub fn new(buckets: Vec<DurationBucket>) -> Self {
        Self { buckets }
    }

    pub fn buckets(&self) -> &[DurationBucket] {
        &self.buckets
    }

    pub fn bucket_for(&self, total_weeks: u32) -> Option<&DurationBucket> {
        self.buckets.iter().find(|bucket| bucket.covers(total_weeks))
    }

    /// Structural checks: phases in macrocycle order with taper last, every
    /// phase at least one week, bucket bounds strictly increasing and only
    /// the final bucket open-ended.
    pub fn validate(&self) -> Result<()> {
        if self.buckets.is_empty() {
            return Err(ConfigError::InvalidBucket {
                index: 0,
                reason: "no buckets defined".into(),
            });
        }
        let mut previous_max: Option<u32> = None;
        for (index, bucket) in self.buckets.iter().enumerate() {
            let invalid = |reason: String| ConfigError::InvalidBucket { index, reason };
            if bucket.phases.is_empty() {
                return Err(invalid("bucket has no phases".into()));
            }
            for pair in bucket.phases.windows(2) {
                if pair[0].phase >= pair[1].phase {
                    return Err(invalid(format!(
                        "{} listed after {}; phases must follow the macrocycle order once each",
                        pair[1].phase, pair[0].phase
                    )));
                }
            }
            if let Some(entry) = bucket.phases.iter().find(|entry| entry.weeks == 0) {
                return Err(invalid(format!("{} has zero weeks", entry.phase)));
            }
            if bucket.phases.last().map(|entry| entry.phase) != Some(EndurancePhase::Taper) {
                return Err(invalid("sequence must end with taper".into()));
            }
            match (previous_max, bucket.max_weeks) {
                (Some(prev), Some(max)) if max <= prev => {
                    return Err(invalid(format!(
                        "max_weeks {max} does not exceed previous bucket ({prev})"
                    )));
                }
                (_, None) if index + 1 != self.buckets.len() => {
                    return Err(invalid("only the last bucket may be open-ended".into()));
                }
                _ => {}
            }
            previous_max = bucket.max_weeks;
        }
        Ok(())
    }

    /// A supported length must land in a bucket that fills it completely and
    /// still reaches the taper.
    pub fn validate_length(&self, weeks: u32) -> Result<()> {
        let unsupported = |reason: String| ConfigError::UnsupportedLength { weeks, reason };
        let bucket = self
            .bucket_for(weeks)
            .ok_or_else(|| unsupported("no bucket covers it".into()))?;
        if bucket.total_weeks() < weeks {
            return Err(unsupported(format!(
                "bucket only schedules {} weeks",
                bucket.total_weeks()
            )));
        }
        if bucket.weeks_before_final() >= weeks {
            return Err(unsupported("the taper would be cut off".into()));
        }
        Ok(())
    }
}
