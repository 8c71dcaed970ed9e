use std::path::Path;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::tables::SchedulerTables;

use super::artifacts::{attach_artifacts, Publisher, WorkoutArtifactRenderer};
use super::builder::PhaseScheduleBuilder;
use super::calendar::{CalendarAssembler, RenderedTable, StructuredCalendar};
use super::models::PlanRequest;
use super::output::{PlanOutputWriter, WrittenPlan};
use super::{PlanError, PlanResult};

/// Request in, calendar out: build, assemble, optionally render workout
/// files, then write. Holds only shared read-only state, so one pipeline
/// can serve concurrent requests.
///
/// `today` is the reference date requests are checked against; an event on
/// or before it is rejected before anything is built.
#[derive(Clone, Copy)]
pub struct PlanPipeline<'a> {
    tables: &'a SchedulerTables,
    today: NaiveDate,
    renderer: Option<&'a dyn WorkoutArtifactRenderer>,
}

impl<'a> PlanPipeline<'a> {
    pub fn new(tables: &'a SchedulerTables, today: NaiveDate) -> Self {
        Self {
            tables,
            today,
            renderer: None,
        }
    }

    pub fn with_renderer(mut self, renderer: &'a dyn WorkoutArtifactRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn tables(&self) -> &'a SchedulerTables {
        self.tables
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Everything except writing.
    pub fn preview(&self, request: &PlanRequest) -> PlanResult<(StructuredCalendar, RenderedTable)> {
        request.ensure_upcoming(self.today)?;
        let schedule = PhaseScheduleBuilder::new(self.tables).build_request(request)?;
        let (calendar, table) = CalendarAssembler.assemble(&schedule);
        match self.renderer {
            Some(renderer) => {
                let calendar = attach_artifacts(&calendar, renderer)?;
                let table = RenderedTable::from_calendar(&calendar);
                Ok((calendar, table))
            }
            None => Ok((calendar, table)),
        }
    }

    pub fn run(&self, request: &PlanRequest, output_dir: &Path) -> PlanResult<WrittenPlan> {
        let (calendar, _) = self.preview(request)?;
        let written = PlanOutputWriter::new(output_dir).write(&calendar)?;
        info!(
            target: "pipeline",
            event_id = %request.event_id,
            tier = %request.tier,
            plan_weeks = request.plan_weeks,
            dir = %written.dir.display(),
            "plan generated"
        );
        Ok(written)
    }

    /// Hands a written plan to `publisher`. Failures surface unchanged; the
    /// outputs on disk stay as they are.
    pub fn publish(&self, written: &WrittenPlan, publisher: &dyn Publisher) -> PlanResult<()> {
        publisher.publish(written).map_err(|err| {
            warn!(target: "pipeline", dir = %written.dir.display(), error = %err, "publish failed");
            PlanError::Publish(err.0)
        })?;
        info!(target: "pipeline", dir = %written.dir.display(), "plan published");
        Ok(())
    }
}
