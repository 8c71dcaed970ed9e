use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Blocks of the cycling macrocycle, in the order they are ridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EndurancePhase {
    #[serde(rename = "base_1")]
    Base1,
    #[serde(rename = "base_2")]
    Base2,
    #[serde(rename = "build_1")]
    Build1,
    #[serde(rename = "build_2")]
    Build2,
    #[serde(rename = "peak")]
    Peak,
    #[serde(rename = "taper")]
    Taper,
}

impl EndurancePhase {
    pub const ALL: [EndurancePhase; 6] = [
        EndurancePhase::Base1,
        EndurancePhase::Base2,
        EndurancePhase::Build1,
        EndurancePhase::Build2,
        EndurancePhase::Peak,
        EndurancePhase::Taper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EndurancePhase::Base1 => "base_1",
            EndurancePhase::Base2 => "base_2",
            EndurancePhase::Build1 => "build_1",
            EndurancePhase::Build2 => "build_2",
            EndurancePhase::Peak => "peak",
            EndurancePhase::Taper => "taper",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_build(&self) -> bool {
        matches!(self, EndurancePhase::Build1 | EndurancePhase::Build2)
    }
}

impl fmt::Display for EndurancePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndurancePhase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        EndurancePhase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownPhase(s.to_string()))
    }
}

/// Blocks of the resistance macrocycle. Always derived from an
/// [`EndurancePhase`] through a [`PhaseAlignmentTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthPhase {
    LearnToLift,
    LiftHeavy,
    LiftFast,
    DontLoseIt,
}

impl StrengthPhase {
    pub const ALL: [StrengthPhase; 4] = [
        StrengthPhase::LearnToLift,
        StrengthPhase::LiftHeavy,
        StrengthPhase::LiftFast,
        StrengthPhase::DontLoseIt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrengthPhase::LearnToLift => "learn_to_lift",
            StrengthPhase::LiftHeavy => "lift_heavy",
            StrengthPhase::LiftFast => "lift_fast",
            StrengthPhase::DontLoseIt => "dont_lose_it",
        }
    }
}

impl fmt::Display for StrengthPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrengthPhase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        StrengthPhase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownStrengthPhase(s.to_string()))
    }
}

/// Total mapping from endurance phase to strength phase, stored as a
/// fixed array indexed by [`EndurancePhase::index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseAlignmentTable {
    entries: [StrengthPhase; 6],
}

impl Default for PhaseAlignmentTable {
    fn default() -> Self {
        Self {
            entries: [
                StrengthPhase::LearnToLift,
                StrengthPhase::LiftHeavy,
                StrengthPhase::LiftHeavy,
                StrengthPhase::LiftFast,
                StrengthPhase::DontLoseIt,
                StrengthPhase::DontLoseIt,
            ],
        }
    }
}

impl PhaseAlignmentTable {
    /// Builds a table from `phase -> strength phase` names. Every endurance
    /// phase must be present.
    pub fn from_names(names: &BTreeMap<String, String>) -> Result<Self> {
        for key in names.keys() {
            key.parse::<EndurancePhase>()?;
        }
        let mut entries = [StrengthPhase::DontLoseIt; 6];
        for phase in EndurancePhase::ALL {
            let name = names
                .get(phase.as_str())
                .ok_or(ConfigError::MissingAlignment { phase })?;
            entries[phase.index()] = name.parse()?;
        }
        Ok(Self { entries })
    }

    pub fn strength_phase_for(&self, phase: EndurancePhase) -> StrengthPhase {
        self.entries[phase.index()]
    }

    pub fn validate(&self) -> Result<()> {
        let taper = self.strength_phase_for(EndurancePhase::Taper);
        if taper == StrengthPhase::LiftHeavy {
            return Err(ConfigError::TaperLiftHeavy(taper));
        }
        Ok(())
    }
}
