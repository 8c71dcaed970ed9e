use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// `peakplan.toml`. Every section is optional; anything left out keeps the
/// built-in tables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PeakplanConfig {
    pub output: OutputSection,
    pub schedule: ScheduleSection,
    /// `tier -> phase -> weekly strength sessions`.
    pub frequency: BTreeMap<String, BTreeMap<String, u8>>,
    /// `endurance phase -> strength phase`; must be complete when present.
    pub alignment: Option<BTreeMap<String, String>>,
    pub catalog: CatalogSection,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl PeakplanConfig {
    /// Relative paths in the config resolve against the config file's
    /// directory.
    pub fn resolve_path<P: AsRef<Path>>(&self, candidate: P) -> PathBuf {
        let path = candidate.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn race_profiles_path(&self) -> Option<PathBuf> {
        self.catalog
            .race_profiles
            .as_ref()
            .map(|path| self.resolve_path(path))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSection {
    #[serde(default = "OutputSection::default_dir")]
    pub dir: String,
}

impl OutputSection {
    fn default_dir() -> String {
        "plans".to_string()
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleSection {
    #[serde(default)]
    pub supported_plan_weeks: Option<Vec<u32>>,
    #[serde(default)]
    pub buckets: Option<Vec<BucketEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketEntry {
    #[serde(default)]
    pub max_weeks: Option<u32>,
    pub phases: Vec<PhaseWeeksEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhaseWeeksEntry {
    pub phase: String,
    pub weeks: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSection {
    #[serde(default)]
    pub race_profiles: Option<String>,
}

pub fn load_peakplan_config<P: AsRef<Path>>(path: P) -> Result<PeakplanConfig> {
    let path = path.as_ref();
    let mut config: PeakplanConfig = load_toml(path)?;
    config.base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(config)
}

fn load_toml<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}
