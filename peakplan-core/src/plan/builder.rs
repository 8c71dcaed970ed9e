use chrono::{Datelike, Days, NaiveDate};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::phase::EndurancePhase;
use crate::race::RaceProfile;
use crate::tables::SchedulerTables;
use crate::template::Weekday;
use crate::tier::Tier;

use super::models::{PlanRequest, PlanSchedule, WeekRecord};
use super::{PlanError, PlanResult};

/// Spreads the endurance phases over the requested length and resolves
/// every week against the lookup tables.
#[derive(Debug, Clone, Copy)]
pub struct PhaseScheduleBuilder<'a> {
    tables: &'a SchedulerTables,
}

impl<'a> PhaseScheduleBuilder<'a> {
    pub fn new(tables: &'a SchedulerTables) -> Self {
        Self { tables }
    }

    /// Builds the schedule for a request and attaches its race profile.
    pub fn build_request(&self, request: &PlanRequest) -> PlanResult<PlanSchedule> {
        let profile = self.tables.catalog.profile_for(&request.event_id).clone();
        self.build_with_profile(
            request.event_id.clone(),
            profile,
            request.tier,
            request.plan_weeks,
            request.event_date,
        )
    }

    /// Builds the week structure alone; the schedule carries the default
    /// race profile.
    pub fn build(&self, tier: Tier, total_weeks: u32, event_date: NaiveDate) -> PlanResult<PlanSchedule> {
        let profile = self.tables.catalog.default_profile().clone();
        self.build_with_profile(
            profile.event_id.clone(),
            profile,
            tier,
            total_weeks,
            event_date,
        )
    }

    fn build_with_profile(
        &self,
        event_id: String,
        race_profile: RaceProfile,
        tier: Tier,
        total_weeks: u32,
        event_date: NaiveDate,
    ) -> PlanResult<PlanSchedule> {
        if !self.tables.is_supported_length(total_weeks) {
            let supported: Vec<String> = self
                .tables
                .supported_plan_weeks
                .iter()
                .map(u32::to_string)
                .collect();
            return Err(PlanError::validation(
                "plan_weeks",
                total_weeks,
                format!("supported lengths are {}", supported.join(", ")),
            ));
        }
        let bucket = self.tables.durations.bucket_for(total_weeks).ok_or_else(|| {
            ConfigError::UnsupportedLength {
                weeks: total_weeks,
                reason: "no bucket covers it".into(),
            }
        })?;
        let start_date = week_start(event_date, total_weeks, 1)?;
        let event_weekday = Weekday::from(event_date.weekday());

        let mut weeks = Vec::with_capacity(total_weeks as usize);
        'phases: for entry in &bucket.phases {
            for _ in 0..entry.weeks {
                let week_number = weeks.len() as u32 + 1;
                if week_number > total_weeks {
                    break 'phases;
                }
                let event_day = (week_number == total_weeks).then_some(event_weekday);
                weeks.push(self.resolve_week(
                    tier,
                    entry.phase,
                    week_number,
                    total_weeks,
                    event_date,
                    event_day,
                )?);
            }
        }
        settle_week_boundaries(&mut weeks, event_weekday);

        info!(
            target: "scheduler",
            event_id = %event_id,
            tier = %tier,
            total_weeks,
            %event_date,
            %start_date,
            "plan schedule built"
        );
        Ok(PlanSchedule::new(
            event_id,
            race_profile,
            tier,
            event_date,
            start_date,
            weeks,
        ))
    }

    fn resolve_week(
        &self,
        tier: Tier,
        phase: EndurancePhase,
        week_number: u32,
        total_weeks: u32,
        event_date: NaiveDate,
        event_day: Option<Weekday>,
    ) -> PlanResult<WeekRecord> {
        let strength_phase = self.tables.alignment.strength_phase_for(phase);
        let count = self.tables.frequency.frequency_for(tier, phase);
        let base = self.tables.templates.template_for(tier, phase);
        let template = match event_day {
            Some(day) => base.with_event_day(day),
            None => base.clone(),
        };
        let (strength_days, weekly_template) = template.resolve_strength(count as usize);
        if strength_days.len() < count as usize {
            return Err(ConfigError::InsufficientStrengthDays {
                template: template.kind,
                tier,
                phase,
                available: strength_days.len(),
                required: count,
            }
            .into());
        }
        let start_date = week_start(event_date, total_weeks, week_number)?;
        debug!(
            target: "scheduler",
            week = week_number,
            phase = %phase,
            strength_phase = %strength_phase,
            template = %weekly_template.kind,
            strength_days = ?strength_days,
            "week resolved"
        );
        Ok(WeekRecord {
            week_number,
            endurance_phase: phase,
            strength_phase,
            strength_session_count: count,
            strength_days,
            weekly_template,
            start_date,
        })
    }
}

/// Every week ends on the event weekday, so the day after it opens the next
/// week under that week's template. When that opening day is a key day, an
/// evening lift on the closing day moves to the morning.
fn settle_week_boundaries(weeks: &mut [WeekRecord], event_weekday: Weekday) {
    let opening = event_weekday.next();
    for index in 1..weeks.len() {
        if !weeks[index].weekly_template.day(opening).is_key_day {
            continue;
        }
        let closing = &mut weeks[index - 1];
        if closing.weekly_template.move_strength_to_morning(event_weekday) {
            debug!(
                target: "scheduler",
                week = closing.week_number,
                day = %event_weekday,
                "strength moved to morning ahead of next week's key day"
            );
        }
    }
}

/// `event_date - (total_weeks - week_number + 1) * 7` days.
fn week_start(event_date: NaiveDate, total_weeks: u32, week_number: u32) -> PlanResult<NaiveDate> {
    let days = u64::from(total_weeks - week_number + 1) * 7;
    event_date
        .checked_sub_days(Days::new(days))
        .ok_or_else(|| PlanError::validation("event_date", event_date, "too early to plan backwards from"))
}
