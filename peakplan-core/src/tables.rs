//! The immutable table bundle handed to the scheduler.
//!
//! Built once at startup, validated as a whole, and shared read-only by
//! every plan build afterwards.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::info;

use crate::config::{load_peakplan_config, PeakplanConfig};
use crate::error::{ConfigError, Result};
use crate::phase::{EndurancePhase, PhaseAlignmentTable};
use crate::plan::durations::{DurationBucket, PhaseDuration, PhaseDurationTable};
use crate::race::RaceProfileCatalog;
use crate::template::{TemplateKind, Weekday, WeeklyTemplateSelector};
use crate::tier::{Tier, TierFrequencyTable};

pub const DEFAULT_PLAN_WEEKS: [u32; 4] = [6, 12, 16, 20];

#[derive(Debug, Clone)]
pub struct SchedulerTables {
    pub alignment: PhaseAlignmentTable,
    pub frequency: TierFrequencyTable,
    pub catalog: RaceProfileCatalog,
    pub templates: WeeklyTemplateSelector,
    pub durations: PhaseDurationTable,
    pub supported_plan_weeks: BTreeSet<u32>,
}

impl SchedulerTables {
    /// Built-in tables, validated.
    pub fn builtin() -> Result<Self> {
        let tables = Self {
            alignment: PhaseAlignmentTable::default(),
            frequency: TierFrequencyTable::default(),
            catalog: RaceProfileCatalog::default(),
            templates: WeeklyTemplateSelector::default(),
            durations: PhaseDurationTable::default(),
            supported_plan_weeks: DEFAULT_PLAN_WEEKS.into_iter().collect(),
        };
        tables.validate()?;
        Ok(tables)
    }

    /// Loads `peakplan.toml` (plus the race catalog it points to) and
    /// validates the result.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = load_peakplan_config(path.as_ref())?;
        let tables = Self::from_config(&config)?;
        info!(
            target: "tables",
            path = %path.as_ref().display(),
            plan_weeks = ?tables.supported_plan_weeks,
            "scheduler tables loaded"
        );
        Ok(tables)
    }

    pub fn from_config(config: &PeakplanConfig) -> Result<Self> {
        let alignment = match &config.alignment {
            Some(names) => PhaseAlignmentTable::from_names(names)?,
            None => PhaseAlignmentTable::default(),
        };
        let frequency = TierFrequencyTable::from_overrides(&config.frequency)?;
        let catalog = match config.race_profiles_path() {
            Some(path) => RaceProfileCatalog::load_overrides(path)?,
            None => RaceProfileCatalog::default(),
        };
        let durations = match &config.schedule.buckets {
            Some(entries) => PhaseDurationTable::new(
                entries
                    .iter()
                    .map(|entry| -> Result<DurationBucket> {
                        let phases = entry
                            .phases
                            .iter()
                            .map(|item| -> Result<PhaseDuration> {
                                Ok(PhaseDuration {
                                    phase: item.phase.parse()?,
                                    weeks: item.weeks,
                                })
                            })
                            .collect::<Result<Vec<_>>>()?;
                        Ok(DurationBucket {
                            max_weeks: entry.max_weeks,
                            phases,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => PhaseDurationTable::default(),
        };
        let supported_plan_weeks = config
            .schedule
            .supported_plan_weeks
            .clone()
            .unwrap_or_else(|| DEFAULT_PLAN_WEEKS.to_vec())
            .into_iter()
            .collect();

        let tables = Self {
            alignment,
            frequency,
            catalog,
            templates: WeeklyTemplateSelector::default(),
            durations,
            supported_plan_weeks,
        };
        tables.validate()?;
        Ok(tables)
    }

    /// Every load-time check. Nothing here is repeated per request.
    pub fn validate(&self) -> Result<()> {
        self.alignment.validate()?;
        self.frequency.validate()?;
        self.templates.validate()?;
        self.durations.validate()?;

        if self.supported_plan_weeks.is_empty() {
            return Err(ConfigError::UnsupportedLength {
                weeks: 0,
                reason: "no plan lengths configured".into(),
            });
        }
        for weeks in &self.supported_plan_weeks {
            self.durations.validate_length(*weeks)?;
        }

        for tier in Tier::ALL {
            for phase in EndurancePhase::ALL {
                let template = self.templates.template_for(tier, phase);
                let required = self.frequency.frequency_for(tier, phase);
                let available = template.strength_eligible_days().len();
                if available < required as usize {
                    return Err(ConfigError::InsufficientStrengthDays {
                        template: template.kind,
                        tier,
                        phase,
                        available,
                        required,
                    });
                }
            }
        }

        // The final week turns one weekday into the event; the taper must
        // still hold enough strength days wherever it lands.
        let taper = self.templates.template(TemplateKind::Taper);
        let required = self.frequency.max_for_phase(EndurancePhase::Taper);
        for weekday in Weekday::ALL {
            let marked = taper.with_event_day(weekday);
            marked.validate_placement()?;
            let available = marked.strength_eligible_days().len();
            if available < required as usize {
                let tier = Tier::ALL
                    .into_iter()
                    .find(|tier| self.frequency.frequency_for(*tier, EndurancePhase::Taper) == required)
                    .unwrap_or(Tier::Ayahuasca);
                return Err(ConfigError::InsufficientStrengthDays {
                    template: TemplateKind::Taper,
                    tier,
                    phase: EndurancePhase::Taper,
                    available,
                    required,
                });
            }
        }
        Ok(())
    }

    pub fn is_supported_length(&self, weeks: u32) -> bool {
        self.supported_plan_weeks.contains(&weeks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BucketEntry, PhaseWeeksEntry};
    use std::collections::BTreeMap;

    #[test]
    fn builtin_tables_validate() {
        let tables = SchedulerTables::builtin().unwrap();
        assert!(tables.is_supported_length(12));
        assert!(!tables.is_supported_length(9));
    }

    #[test]
    fn fixture_config_matches_builtin_tables() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../configs/peakplan.toml");
        let loaded = SchedulerTables::load(path).unwrap();
        let builtin = SchedulerTables::builtin().unwrap();
        assert_eq!(loaded.frequency, builtin.frequency);
        assert_eq!(loaded.alignment, builtin.alignment);
        assert_eq!(loaded.durations, builtin.durations);
        assert_eq!(loaded.supported_plan_weeks, builtin.supported_plan_weeks);
        assert!(loaded.catalog.event_ids().any(|id| id == "gravel_worlds"));
    }

    #[test]
    fn frequency_above_template_capacity_is_rejected() {
        let mut config = PeakplanConfig::default();
        let row: BTreeMap<String, u8> = EndurancePhase::ALL
            .iter()
            .map(|phase| (phase.to_string(), 3))
            .collect();
        config.frequency.insert("finisher".into(), row.clone());
        config.frequency.insert("ayahuasca".into(), row);
        let err = SchedulerTables::from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InsufficientStrengthDays {
                tier: Tier::Ayahuasca,
                phase: EndurancePhase::Taper,
                ..
            }
        ));
    }

    #[test]
    fn supported_length_without_bucket_is_rejected() {
        let mut config = PeakplanConfig::default();
        config.schedule.supported_plan_weeks = Some(vec![6, 10]);
        let err = SchedulerTables::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedLength { weeks: 10, .. }));
    }

    #[test]
    fn deployment_can_add_a_bucket() {
        let mut config = PeakplanConfig::default();
        let phase = |name: &str, weeks| PhaseWeeksEntry {
            phase: name.into(),
            weeks,
        };
        config.schedule.buckets = Some(vec![
            BucketEntry {
                max_weeks: Some(8),
                phases: vec![
                    phase("base_1", 2),
                    phase("build_1", 2),
                    phase("peak", 2),
                    phase("taper", 2),
                ],
            },
            BucketEntry {
                max_weeks: None,
                phases: vec![
                    phase("base_1", 3),
                    phase("base_2", 2),
                    phase("build_1", 2),
                    phase("build_2", 2),
                    phase("peak", 2),
                    phase("taper", 1),
                ],
            },
        ]);
        config.schedule.supported_plan_weeks = Some(vec![8, 12]);
        let tables = SchedulerTables::from_config(&config).unwrap();
        assert!(tables.is_supported_length(8));
        assert!(!tables.is_supported_length(6));
    }

    #[test]
    fn unknown_phase_in_bucket_is_rejected() {
        let mut config = PeakplanConfig::default();
        config.schedule.buckets = Some(vec![BucketEntry {
            max_weeks: None,
            phases: vec![PhaseWeeksEntry {
                phase: "recovery".into(),
                weeks: 1,
            }],
        }]);
        assert!(matches!(
            SchedulerTables::from_config(&config),
            Err(ConfigError::UnknownPhase(name)) if name == "recovery"
        ));
    }
}
