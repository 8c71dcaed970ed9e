pub mod config;
pub mod error;
pub mod phase;
pub mod plan;
pub mod race;
pub mod tables;
pub mod template;
pub mod tier;

pub use config::{load_peakplan_config, PeakplanConfig};
pub use error::{ConfigError, Result};
pub use phase::{EndurancePhase, PhaseAlignmentTable, StrengthPhase};
pub use plan::{
    attach_artifacts, CalendarAssembler, DayEntry, PhaseScheduleBuilder, PlanError,
    PlanOutputWriter, PlanPipeline, PlanRequest, PlanResult, PlanSchedule, PlanSummary, Publisher,
    RenderedTable, StructuredCalendar, WeekEntry, WeekRecord, WorkoutArtifactRenderer,
    WrittenPlan,
};
pub use race::{Demand, RaceProfile, RaceProfileCatalog};
pub use tables::SchedulerTables;
pub use template::{Activity, TemplateKind, TimeOfDay, Weekday, WeeklyTemplate, WeeklyTemplateSelector};
pub use tier::{Tier, TierFrequencyTable};
