pub mod artifacts;
pub mod builder;
pub mod calendar;
pub mod durations;
pub mod error;
pub mod models;
pub mod output;
pub mod pipeline;

pub use artifacts::{
    attach_artifacts, ArtifactError, ArtifactRef, DaySlotDescriptor, PublishError, Publisher,
    WorkoutArtifactRenderer,
};
pub use builder::PhaseScheduleBuilder;
pub use calendar::{
    CalendarAssembler, DayEntry, PlanSummary, RenderedTable, StructuredCalendar, WeekEntry,
    WorkoutCounts,
};
pub use durations::{DurationBucket, PhaseDuration, PhaseDurationTable};
pub use error::{PlanError, PlanResult};
pub use models::{PlanRequest, PlanSchedule, WeekRecord, DATE_FORMAT};
pub use output::{
    write_atomic, PlanOutputWriter, WrittenPlan, CALENDAR_JSON_FILE, CALENDAR_TABLE_FILE,
    SUMMARY_FILE,
};
pub use pipeline::PlanPipeline;
