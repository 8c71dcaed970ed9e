use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::phase::{EndurancePhase, StrengthPhase};
use crate::template::{TemplateKind, TimeOfDay, Weekday};
use crate::tier::Tier;

/// Fatal problems with the static scheduling tables. Raised while the
/// tables are loaded, never while serving a request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io { source: io::Error, path: PathBuf },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        source: toml::de::Error,
        path: PathBuf,
    },
    #[error("failed to parse race catalog {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("unknown endurance phase: {0}")]
    UnknownPhase(String),
    #[error("unknown strength phase: {0}")]
    UnknownStrengthPhase(String),
    #[error("unknown tier in tables: {0}")]
    UnknownTier(String),
    #[error("alignment table has no entry for {phase}")]
    MissingAlignment { phase: EndurancePhase },
    #[error("frequency table has no entry for tier {tier}, phase {phase}")]
    MissingFrequency { tier: Tier, phase: EndurancePhase },
    #[error("frequency {count} for tier {tier}, phase {phase} is outside [0, 3]")]
    FrequencyOutOfRange {
        tier: Tier,
        phase: EndurancePhase,
        count: u8,
    },
    #[error(
        "frequency for {phase} must not grow with volume: {lower} has {lower_count}, {higher} has {higher_count}"
    )]
    NonMonotonicFrequency {
        phase: EndurancePhase,
        lower: Tier,
        lower_count: u8,
        higher: Tier,
        higher_count: u8,
    },
    #[error("taper aligns to {0}; tapering both tracks at once is not allowed")]
    TaperLiftHeavy(StrengthPhase),
    #[error("invalid phase-duration bucket #{index}: {reason}")]
    InvalidBucket { index: usize, reason: String },
    #[error("supported plan length {weeks} weeks: {reason}")]
    UnsupportedLength { weeks: u32, reason: String },
    #[error("{template} template places strength on {day} {slot}: {reason}")]
    TemplatePlacement {
        template: TemplateKind,
        day: Weekday,
        slot: TimeOfDay,
        reason: &'static str,
    },
    #[error(
        "{template} template offers {available} strength days but tier {tier} needs {required} in {phase}"
    )]
    InsufficientStrengthDays {
        template: TemplateKind,
        tier: Tier,
        phase: EndurancePhase,
        available: usize,
        required: u8,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
