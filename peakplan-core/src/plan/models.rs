use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::phase::{EndurancePhase, StrengthPhase};
use crate::race::RaceProfile;
use crate::template::{Weekday, WeeklyTemplate};
use crate::tier::Tier;

use super::{PlanError, PlanResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One plan request, already parsed into domain types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub event_id: String,
    pub tier: Tier,
    pub plan_weeks: u32,
    pub event_date: NaiveDate,
}

impl PlanRequest {
    pub fn new(event_id: impl Into<String>, tier: Tier, plan_weeks: u32, event_date: NaiveDate) -> Self {
        Self {
            event_id: event_id.into(),
            tier,
            plan_weeks,
            event_date,
        }
    }

    /// Parses the raw boundary fields. An unknown tier is fatal to the
    /// request; an unknown event is not (see [`crate::RaceProfileCatalog`]).
    pub fn parse(event_id: &str, tier_id: &str, plan_weeks: u32, event_date: &str) -> PlanResult<Self> {
        if event_id.trim().is_empty() {
            return Err(PlanError::validation("event_id", event_id, "must not be empty"));
        }
        let tier = tier_id.parse::<Tier>().map_err(|_| {
            PlanError::validation(
                "tier_id",
                tier_id,
                format!(
                    "expected one of {}",
                    Tier::ALL.map(|tier| tier.as_str()).join(", ")
                ),
            )
        })?;
        let event_date = NaiveDate::parse_from_str(event_date.trim(), DATE_FORMAT).map_err(|err| {
            PlanError::validation("event_date", event_date, format!("expected YYYY-MM-DD ({err})"))
        })?;
        Ok(Self::new(event_id.trim(), tier, plan_weeks, event_date))
    }

    /// The event has to lie after `today`, otherwise there is nothing left
    /// to prepare for.
    pub fn ensure_upcoming(&self, today: NaiveDate) -> PlanResult<()> {
        if self.event_date <= today {
            return Err(PlanError::validation(
                "event_date",
                self.event_date,
                format!("must be after {today}"),
            ));
        }
        Ok(())
    }
}

/// A fully resolved training week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRecord {
    pub week_number: u32,
    pub endurance_phase: EndurancePhase,
    pub strength_phase: StrengthPhase,
    pub strength_session_count: u8,
    pub strength_days: Vec<Weekday>,
    pub weekly_template: WeeklyTemplate,
    pub start_date: NaiveDate,
}

impl WeekRecord {
    /// Calendar date of `weekday` in this week. A week covers the seven days
    /// after `start_date`, so the final week ends on the event date.
    pub fn date_of(&self, weekday: Weekday) -> NaiveDate {
        let first = self.start_date + Days::new(1);
        let first_weekday = Weekday::from(first.weekday());
        let offset = (weekday.index() + 7 - first_weekday.index()) % 7;
        first + Days::new(offset as u64)
    }
}

/// Immutable result of one build. Producing another length or tier means
/// building a new schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSchedule {
    event_id: String,
    race_profile: RaceProfile,
    tier: Tier,
    total_weeks: u32,
    event_date: NaiveDate,
    start_date: NaiveDate,
    weeks: Vec<WeekRecord>,
}

impl PlanSchedule {
    pub(crate) fn new(
        event_id: String,
        race_profile: RaceProfile,
        tier: Tier,
        event_date: NaiveDate,
        start_date: NaiveDate,
        weeks: Vec<WeekRecord>,
    ) -> Self {
        Self {
            event_id,
            race_profile,
            tier,
            total_weeks: weeks.len() as u32,
            event_date,
            start_date,
            weeks,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn race_profile(&self) -> &RaceProfile {
        &self.race_profile
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn total_weeks(&self) -> u32 {
        self.total_weeks
    }

    pub fn event_date(&self) -> NaiveDate {
        self.event_date
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn weeks(&self) -> &[WeekRecord] {
        &self.weeks
    }

    pub fn phase_breakdown(&self) -> BTreeMap<EndurancePhase, u32> {
        let mut breakdown = BTreeMap::new();
        for week in &self.weeks {
            *breakdown.entry(week.endurance_phase).or_insert(0) += 1;
        }
        breakdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reports_offending_field() {
        let err = PlanRequest::parse("unbound_200", "elite", 12, "2025-06-07").unwrap_err();
        assert!(matches!(err, PlanError::Validation { field: "tier_id", .. }));

        let err = PlanRequest::parse("unbound_200", "compete", 12, "06/07/2025").unwrap_err();
        assert!(matches!(err, PlanError::Validation { field: "event_date", .. }));

        let err = PlanRequest::parse("  ", "compete", 12, "2025-06-07").unwrap_err();
        assert!(matches!(err, PlanError::Validation { field: "event_id", .. }));
    }

    #[test]
    fn parse_accepts_any_event_id() {
        let request = PlanRequest::parse("unregistered_event", "Podium", 16, "2025-09-20").unwrap();
        assert_eq!(request.tier, Tier::Podium);
        assert_eq!(request.event_date, NaiveDate::from_ymd_opt(2025, 9, 20).unwrap());
    }

    #[test]
    fn event_must_be_upcoming() {
        let request = PlanRequest::parse("mid_south", "finisher", 6, "2025-03-15").unwrap();
        let before = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        request.ensure_upcoming(before).unwrap();
        let err = request
            .ensure_upcoming(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("event_date"));
    }
}
