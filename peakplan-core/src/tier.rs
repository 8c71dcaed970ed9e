use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::phase::EndurancePhase;

/// Athlete categories, declared from lowest to highest weekly volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Ayahuasca,
    Finisher,
    Compete,
    Podium,
}

/// Weekly riding-plus-lifting hours a tier is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursRange {
    pub min: u8,
    pub max: u8,
}

impl fmt::Display for HoursRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} h/week", self.min, self.max)
    }
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Ayahuasca, Tier::Finisher, Tier::Compete, Tier::Podium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Ayahuasca => "ayahuasca",
            Tier::Finisher => "finisher",
            Tier::Compete => "compete",
            Tier::Podium => "podium",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn hours_range(&self) -> HoursRange {
        match self {
            Tier::Ayahuasca => HoursRange { min: 3, max: 5 },
            Tier::Finisher => HoursRange { min: 6, max: 9 },
            Tier::Compete => HoursRange { min: 10, max: 13 },
            Tier::Podium => HoursRange { min: 14, max: 20 },
        }
    }

    pub fn is_lowest_volume(&self) -> bool {
        *self == Tier::ALL[0]
    }

    /// The two tiers at the top of the volume ordering.
    pub fn is_high_volume(&self) -> bool {
        matches!(self, Tier::Compete | Tier::Podium)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == needle)
            .ok_or_else(|| format!("unknown tier: {s}"))
    }
}

/// Weekly strength-session counts per (tier, endurance phase).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierFrequencyTable {
    counts: [[u8; 6]; 4],
}

impl Default for TierFrequencyTable {
    fn default() -> Self {
        Self {
            counts: [
                // base_1, base_2, build_1, build_2, peak, taper
                [3, 3, 2, 2, 2, 1],
                [2, 2, 2, 2, 1, 1],
                [2, 2, 2, 1, 1, 1],
                [2, 2, 1, 1, 1, 0],
            ],
        }
    }
}

impl TierFrequencyTable {
    /// Overrides the built-in rows with `tier -> phase -> count` entries. A
    /// tier that appears must list every phase.
    pub fn from_overrides(overrides: &BTreeMap<String, BTreeMap<String, u8>>) -> Result<Self> {
        let mut table = Self::default();
        for (tier_name, phases) in overrides {
            let tier: Tier = tier_name
                .parse()
                .map_err(|_| ConfigError::UnknownTier(tier_name.clone()))?;
            for key in phases.keys() {
                key.parse::<EndurancePhase>()?;
            }
            for phase in EndurancePhase::ALL {
                let count = phases
                    .get(phase.as_str())
                    .copied()
                    .ok_or(ConfigError::MissingFrequency { tier, phase })?;
                table.counts[tier.index()][phase.index()] = count;
            }
            debug!(target: "tables", tier = %tier, "frequency row overridden");
        }
        Ok(table)
    }

    pub fn frequency_for(&self, tier: Tier, phase: EndurancePhase) -> u8 {
        self.counts[tier.index()][phase.index()]
    }

    /// Checks the [0, 3] range and that no higher-volume tier lifts more
    /// often than a lower-volume one in the same phase.
    pub fn validate(&self) -> Result<()> {
        for tier in Tier::ALL {
            for phase in EndurancePhase::ALL {
                let count = self.frequency_for(tier, phase);
                if count > 3 {
                    return Err(ConfigError::FrequencyOutOfRange { tier, phase, count });
                }
            }
        }
        for pair in Tier::ALL.windows(2) {
            let (lower, higher) = (pair[0], pair[1]);
            for phase in EndurancePhase::ALL {
                let lower_count = self.frequency_for(lower, phase);
                let higher_count = self.frequency_for(higher, phase);
                if higher_count > lower_count {
                    return Err(ConfigError::NonMonotonicFrequency {
                        phase,
                        lower,
                        lower_count,
                        higher,
                        higher_count,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn max_for_phase(&self, phase: EndurancePhase) -> u8 {
        Tier::ALL
            .iter()
            .map(|tier| self.frequency_for(*tier, phase))
            .max()
            .unwrap_or(0)
    }
}
