//! Per-event strength emphasis.
//!
//! The catalog never fails a lookup: an event that has not been authored yet
//! resolves to [`RaceProfileCatalog::default_profile`], so new events can be
//! scheduled right away. Profiles do not influence day or slot placement;
//! they travel with the plan for the artifact renderer.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, Result};

pub const DEFAULT_PROFILE_NAME: &str = "default_gravel";

/// Returns the entry for `key`, or `default` when the catalog has none.
///
/// Used by [`RaceProfileCatalog::profile_for`]. The tier and phase tables are
/// complete by construction and index directly without a fallback.
pub fn resolve_with_fallback<'a, Q, V>(
    catalog: &'a BTreeMap<String, V>,
    key: &Q,
    default: &'a V,
) -> &'a V
where
    String: std::borrow::Borrow<Q>,
    Q: Ord + ?Sized,
{
    catalog.get(key).unwrap_or(default)
}

/// Physical demands an event places on the rider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Demand {
    Durability,
    Climbing,
    SustainedPower,
    RepeatedSurges,
    TechnicalHandling,
    Heat,
    Altitude,
}

impl fmt::Display for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Demand::Durability => "durability",
            Demand::Climbing => "climbing",
            Demand::SustainedPower => "sustained_power",
            Demand::RepeatedSurges => "repeated_surges",
            Demand::TechnicalHandling => "technical_handling",
            Demand::Heat => "heat",
            Demand::Altitude => "altitude",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceProfile {
    pub event_id: String,
    pub name: String,
    #[serde(default)]
    pub primary_demands: BTreeSet<Demand>,
    #[serde(default)]
    pub emphasized_exercises: Vec<String>,
    #[serde(default)]
    pub de_emphasized_exercises: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl RaceProfile {
    fn builtin(
        event_id: &str,
        name: &str,
        demands: &[Demand],
        emphasized: &[&str],
        de_emphasized: &[&str],
        notes: &str,
    ) -> Self {
        Self {
            event_id: event_id.to_string(),
            name: name.to_string(),
            primary_demands: demands.iter().copied().collect(),
            emphasized_exercises: emphasized.iter().map(|s| s.to_string()).collect(),
            de_emphasized_exercises: de_emphasized.iter().map(|s| s.to_string()).collect(),
            notes: notes.to_string(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_PROFILE_NAME
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    profiles: Vec<RaceProfile>,
}

/// Event id to [`RaceProfile`] lookup with a named default.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceProfileCatalog {
    profiles: BTreeMap<String, RaceProfile>,
    default: RaceProfile,
}

impl Default for RaceProfileCatalog {
    fn default() -> Self {
        let profiles = vec![
            RaceProfile::builtin(
                "unbound_200",
                "Unbound Gravel 200",
                &[Demand::Durability, Demand::Heat, Demand::SustainedPower],
                &["trap bar deadlift", "split squat", "suitcase carry", "dead bug"],
                &["box jump", "depth jump"],
                "Fifteen-plus hours in the saddle; trunk endurance keeps position late in the day.",
            ),
            RaceProfile::builtin(
                "leadville_100",
                "Leadville Trail 100 MTB",
                &[Demand::Altitude, Demand::Climbing, Demand::SustainedPower],
                &["back squat", "step up", "single leg romanian deadlift", "calf raise"],
                &["bench press"],
                "Long seated climbs above 3000 m; prioritise hip extension strength.",
            ),
            RaceProfile::builtin(
                "sbt_grvl",
                "SBT GRVL",
                &[Demand::Altitude, Demand::Climbing, Demand::RepeatedSurges],
                &["bulgarian split squat", "kettlebell swing", "pallof press"],
                &["heavy upper body pressing"],
                "",
            ),
            RaceProfile::builtin(
                "mid_south",
                "The Mid South",
                &[Demand::TechnicalHandling, Demand::RepeatedSurges],
                &["farmer carry", "push up", "single arm row", "side plank"],
                &["max effort squat"],
                "Red clay in wet years; upper body and grip carry the bike through mud.",
            ),
            RaceProfile::builtin(
                "big_sugar",
                "Big Sugar Gravel",
                &[Demand::RepeatedSurges, Demand::Climbing, Demand::TechnicalHandling],
                &["jump squat", "kettlebell swing", "chin up"],
                &["long tempo carries"],
                "Short steep rollers; power output off low cadence.",
            ),
            RaceProfile::builtin(
                "belgian_waffle_ride",
                "Belgian Waffle Ride",
                &[Demand::TechnicalHandling, Demand::Durability, Demand::RepeatedSurges],
                &["goblet squat", "renegade row", "copenhagen plank"],
                &[],
                "",
            ),
        ];
        Self {
            profiles: profiles
                .into_iter()
                .map(|profile| (profile.event_id.clone(), profile))
                .collect(),
            default: Self::builtin_default(),
        }
    }
}

impl RaceProfileCatalog {
    fn builtin_default() -> RaceProfile {
        RaceProfile::builtin(
            "default",
            DEFAULT_PROFILE_NAME,
            &[Demand::Durability, Demand::SustainedPower],
            &["goblet squat", "romanian deadlift", "step up", "plank", "single arm row"],
            &[],
            "General gravel emphasis; used until the event has its own profile.",
        )
    }

    /// Reads a YAML catalog (`profiles: [...]`) and layers its entries over
    /// the built-in catalog. An entry named after the default replaces it.
    pub fn load_overrides<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        let file: CatalogFile =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                source,
                path: path.to_path_buf(),
            })?;
        let mut catalog = Self::default();
        let count = file.profiles.len();
        for profile in file.profiles {
            catalog.insert(profile);
        }
        info!(
            target: "tables",
            path = %path.display(),
            profiles = count,
            "race catalog overrides loaded"
        );
        Ok(catalog)
    }

    pub fn insert(&mut self, mut profile: RaceProfile) {
        if profile.name == DEFAULT_PROFILE_NAME {
            self.default = profile;
            return;
        }
        profile.event_id = normalize_event_id(&profile.event_id);
        self.profiles.insert(profile.event_id.clone(), profile);
    }

    pub fn profile_for(&self, event_id: &str) -> &RaceProfile {
        let key = normalize_event_id(event_id);
        let profile = resolve_with_fallback(&self.profiles, key.as_str(), &self.default);
        if profile.is_default() {
            debug!(target: "tables", event_id, "no race profile authored; using default");
        }
        profile
    }

    pub fn default_profile(&self) -> &RaceProfile {
        &self.default
    }

    pub fn event_ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

/// Lowercases and replaces separators so "Unbound-200" finds `unbound_200`.
pub fn normalize_event_id(event_id: &str) -> String {
    event_id
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
        .collect()
}
