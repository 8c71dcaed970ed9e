//! Boundaries to the collaborators that turn a calendar into workout files
//! and push finished plans elsewhere. Neither is implemented here.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use crate::phase::{EndurancePhase, StrengthPhase};
use crate::template::{Activity, TimeOfDay, Weekday};
use crate::tier::Tier;

use super::calendar::StructuredCalendar;
use super::output::WrittenPlan;
use super::{PlanError, PlanResult};

/// Everything a renderer gets to see about one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySlotDescriptor<'a> {
    pub event_id: &'a str,
    pub tier: Tier,
    pub week: u32,
    pub weekday: Weekday,
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub activity: Activity,
    pub cycling_phase: EndurancePhase,
    pub strength_phase: StrengthPhase,
    pub emphasized_exercises: &'a [String],
    pub de_emphasized_exercises: &'a [String],
}

/// Opaque reference to a rendered workout file, usually a relative path.
pub type ArtifactRef = String;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ArtifactError(pub String);

#[derive(Debug, Error)]
#[error("{0}")]
pub struct PublishError(pub String);

/// Produces a workout file for one slot and returns a reference to it.
/// The scheduler never looks inside the file.
pub trait WorkoutArtifactRenderer: Send + Sync {
    fn render(&self, slot: &DaySlotDescriptor<'_>) -> Result<ArtifactRef, ArtifactError>;
}

/// Pushes written outputs to an external system. Called only after the
/// plan has been generated and written; retries are the publisher's own
/// business.
pub trait Publisher: Send + Sync {
    fn publish(&self, plan: &WrittenPlan) -> Result<(), PublishError>;
}

/// Returns a copy of `calendar` with `strength_file` filled for every
/// strength slot.
pub fn attach_artifacts(
    calendar: &StructuredCalendar,
    renderer: &dyn WorkoutArtifactRenderer,
) -> PlanResult<StructuredCalendar> {
    let mut attached = calendar.clone();
    let profile = &calendar.race_profile;
    let mut rendered = 0usize;
    for week in attached.weeks.iter_mut() {
        for (weekday, day) in week.days.iter_mut() {
            let time = match (day.am, day.pm) {
                (Some(Activity::Strength), _) => TimeOfDay::Am,
                (_, Some(Activity::Strength)) => TimeOfDay::Pm,
                _ => continue,
            };
            let descriptor = DaySlotDescriptor {
                event_id: &calendar.event_id,
                tier: calendar.tier,
                week: week.week,
                weekday: *weekday,
                date: day.date,
                time,
                activity: Activity::Strength,
                cycling_phase: week.cycling_phase,
                strength_phase: week.strength_phase,
                emphasized_exercises: &profile.emphasized_exercises,
                de_emphasized_exercises: &profile.de_emphasized_exercises,
            };
            let reference = renderer
                .render(&descriptor)
                .map_err(|err| PlanError::Artifact {
                    week: week.week,
                    day: *weekday,
                    reason: err.0,
                })?;
            day.strength_file = Some(reference);
            rendered += 1;
        }
    }
    debug!(target: "calendar", rendered, "strength artifacts attached");
    Ok(attached)
}
