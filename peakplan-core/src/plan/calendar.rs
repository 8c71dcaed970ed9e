//! Date-anchored calendar forms of a [`PlanSchedule`].
//!
//! [`StructuredCalendar`] is the source of truth: the plan summary and the
//! rendered table are both derived from it alone.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::phase::{EndurancePhase, StrengthPhase};
use crate::race::RaceProfile;
use crate::template::{Activity, TemplateKind, Weekday};
use crate::tier::Tier;

use super::models::PlanSchedule;
use super::PlanResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    pub date: NaiveDate,
    pub am: Option<Activity>,
    pub pm: Option<Activity>,
    pub is_key_day: bool,
    pub notes: String,
    /// Filled in by the external artifact renderer; `None` until then.
    pub strength_file: Option<String>,
}

impl DayEntry {
    pub fn activities(&self) -> impl Iterator<Item = Activity> {
        self.am.into_iter().chain(self.pm)
    }

    pub fn has_strength(&self) -> bool {
        self.activities().any(|activity| activity == Activity::Strength)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekEntry {
    pub week: u32,
    pub cycling_phase: EndurancePhase,
    pub strength_phase: StrengthPhase,
    pub strength_sessions: u8,
    pub template: TemplateKind,
    pub start_date: NaiveDate,
    pub days: BTreeMap<Weekday, DayEntry>,
}

impl WeekEntry {
    /// Days in calendar order.
    pub fn days_by_date(&self) -> Vec<(Weekday, &DayEntry)> {
        let mut days: Vec<(Weekday, &DayEntry)> =
            self.days.iter().map(|(weekday, day)| (*weekday, day)).collect();
        days.sort_by_key(|(_, day)| day.date);
        days
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredCalendar {
    pub event_id: String,
    pub race_profile: RaceProfile,
    pub tier: Tier,
    pub plan_weeks: u32,
    pub event_date: NaiveDate,
    pub start_date: NaiveDate,
    pub weeks: Vec<WeekEntry>,
}

impl StructuredCalendar {
    pub fn to_json(&self) -> PlanResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> PlanResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn phase_breakdown(&self) -> BTreeMap<EndurancePhase, u32> {
        let mut breakdown = BTreeMap::new();
        for week in &self.weeks {
            *breakdown.entry(week.cycling_phase).or_insert(0) += 1;
        }
        breakdown
    }

    pub fn workout_counts(&self) -> WorkoutCounts {
        let mut counts = WorkoutCounts::default();
        for day in self.weeks.iter().flat_map(|week| week.days.values()) {
            for activity in day.activities() {
                if activity == Activity::Strength {
                    counts.strength += 1;
                } else if activity.is_cycling() {
                    counts.cycling += 1;
                }
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutCounts {
    pub cycling: u32,
    pub strength: u32,
}

/// Structured plan overview written next to the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub event: String,
    pub event_name: String,
    pub tier: Tier,
    pub plan_weeks: u32,
    pub event_date: NaiveDate,
    pub start_date: NaiveDate,
    pub phase_breakdown: BTreeMap<EndurancePhase, u32>,
    pub workout_counts: WorkoutCounts,
}

impl PlanSummary {
    pub fn from_calendar(calendar: &StructuredCalendar) -> Self {
        Self {
            event: calendar.event_id.clone(),
            event_name: calendar.race_profile.name.clone(),
            tier: calendar.tier,
            plan_weeks: calendar.plan_weeks,
            event_date: calendar.event_date,
            start_date: calendar.start_date,
            phase_breakdown: calendar.phase_breakdown(),
            workout_counts: calendar.workout_counts(),
        }
    }
}

/// Plain-text tables, one per week, key days marked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable(String);

impl RenderedTable {
    pub const KEY_MARKER: &'static str = "KEY";

    pub fn from_calendar(calendar: &StructuredCalendar) -> Self {
        let mut lines = Vec::new();
        lines.push(format!(
            "# {} ({}), {} weeks",
            calendar.race_profile.name, calendar.tier, calendar.plan_weeks
        ));
        lines.push(String::new());
        lines.push(format!(
            "Event: {} | Plan start: {} | Event id: {}",
            calendar.event_date, calendar.start_date, calendar.event_id
        ));
        for week in &calendar.weeks {
            lines.push(String::new());
            lines.push(format!(
                "## Week {}: {} / {} ({} strength)",
                week.week, week.cycling_phase, week.strength_phase, week.strength_sessions
            ));
            lines.push(String::new());
            lines.push("| Day | Date | AM | PM | Key | Notes | Strength file |".to_string());
            lines.push("|-----|------|----|----|-----|-------|---------------|".to_string());
            for (weekday, day) in week.days_by_date() {
                lines.push(format!(
                    "| {} | {} | {} | {} | {} | {} | {} |",
                    weekday,
                    day.date,
                    slot_label(day.am),
                    slot_label(day.pm),
                    if day.is_key_day { Self::KEY_MARKER } else { "" },
                    day.notes,
                    day.strength_file.as_deref().unwrap_or("-"),
                ));
            }
        }
        let mut out = lines.join("\n");
        out.push('\n');
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn slot_label(activity: Option<Activity>) -> &'static str {
    activity.map(|activity| activity.as_str()).unwrap_or("-")
}

/// Expands week records into seven dated day entries each. Never calls
/// the artifact renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarAssembler;

impl CalendarAssembler {
    pub fn assemble(&self, schedule: &PlanSchedule) -> (StructuredCalendar, RenderedTable) {
        let weeks = schedule
            .weeks()
            .iter()
            .map(|record| {
                let days = Weekday::ALL
                    .into_iter()
                    .map(|weekday| {
                        let slot = record.weekly_template.day(weekday);
                        (
                            weekday,
                            DayEntry {
                                date: record.date_of(weekday),
                                am: slot.am,
                                pm: slot.pm,
                                is_key_day: slot.is_key_day,
                                notes: slot.note.clone(),
                                strength_file: None,
                            },
                        )
                    })
                    .collect();
                WeekEntry {
                    week: record.week_number,
                    cycling_phase: record.endurance_phase,
                    strength_phase: record.strength_phase,
                    strength_sessions: record.strength_session_count,
                    template: record.weekly_template.kind,
                    start_date: record.start_date,
                    days,
                }
            })
            .collect();

        let calendar = StructuredCalendar {
            event_id: schedule.event_id().to_string(),
            race_profile: schedule.race_profile().clone(),
            tier: schedule.tier(),
            plan_weeks: schedule.total_weeks(),
            event_date: schedule.event_date(),
            start_date: schedule.start_date(),
            weeks,
        };
        debug!(
            target: "calendar",
            event_id = %calendar.event_id,
            weeks = calendar.weeks.len(),
            "calendar assembled"
        );
        let table = RenderedTable::from_calendar(&calendar);
        (calendar, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PhaseScheduleBuilder;
    use crate::plan::PlanRequest;
    use crate::tables::SchedulerTables;

    fn calendar_for(tier: &str, weeks: u32) -> (StructuredCalendar, RenderedTable) {
        let tables = SchedulerTables::builtin().unwrap();
        let request = PlanRequest::parse("unbound_200", tier, weeks, "2025-05-31").unwrap();
        let schedule = PhaseScheduleBuilder::new(&tables)
            .build_request(&request)
            .unwrap();
        CalendarAssembler.assemble(&schedule)
    }

    #[test]
    fn every_week_has_seven_consecutive_days() {
        let (calendar, _) = calendar_for("finisher", 12);
        assert_eq!(calendar.weeks.len(), 12);
        for week in &calendar.weeks {
            let days = week.days_by_date();
            assert_eq!(days.len(), 7);
            let first = days[0].1.date;
            assert_eq!(first, week.start_date + chrono::Days::new(1));
            for (offset, (_, day)) in days.iter().enumerate() {
                assert_eq!(day.date, first + chrono::Days::new(offset as u64));
                assert!(day.strength_file.is_none());
            }
        }
        let last = calendar.weeks.last().unwrap();
        assert_eq!(last.days[&Weekday::Saturday].date, calendar.event_date);
        assert_eq!(last.days[&Weekday::Saturday].am, Some(Activity::Event));
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let (calendar, _) = calendar_for("compete", 16);
        let json = calendar.to_json().unwrap();
        assert!(json.contains("\"cycling_phase\": \"base_1\""));
        assert!(json.contains("\"monday\""));
        let parsed = StructuredCalendar::from_json(&json).unwrap();
        assert_eq!(parsed, calendar);
        assert_eq!(RenderedTable::from_calendar(&parsed).as_str(), RenderedTable::from_calendar(&calendar).as_str());
    }

    #[test]
    fn summary_counts_match_calendar() {
        let (calendar, _) = calendar_for("ayahuasca", 6);
        let summary = PlanSummary::from_calendar(&calendar);
        assert_eq!(summary.plan_weeks, 6);
        assert_eq!(summary.phase_breakdown.values().sum::<u32>(), 6);
        assert_eq!(summary.event, "unbound_200");
        let strength: u32 = calendar
            .weeks
            .iter()
            .map(|week| u32::from(week.strength_sessions))
            .sum();
        assert_eq!(summary.workout_counts.strength, strength);
        assert!(summary.workout_counts.cycling > 0);
    }

    #[test]
    fn rendered_table_marks_key_days() {
        let (calendar, table) = calendar_for("podium", 6);
        let text = table.as_str();
        assert!(text.starts_with("# Unbound Gravel 200 (podium), 6 weeks"));
        assert_eq!(text.matches("## Week").count(), calendar.weeks.len());
        let key_days: usize = calendar
            .weeks
            .iter()
            .map(|week| week.days.values().filter(|day| day.is_key_day).count())
            .sum();
        assert_eq!(text.matches("| KEY |").count(), key_days);
    }

    #[test]
    fn rendered_table_has_one_row_per_day() {
        let (calendar, table) = calendar_for("compete", 12);
        let text = table.as_str();
        assert!(text.ends_with("|\n"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "");
        assert!(lines[2].starts_with("Event: 2025-05-31 | Plan start: "));
        let sections: Vec<&str> = text.split("\n## Week ").skip(1).collect();
        assert_eq!(sections.len(), calendar.weeks.len());
        for (section, week) in sections.iter().zip(&calendar.weeks) {
            let rows: Vec<&str> = section
                .lines()
                .filter(|line| line.starts_with("| ") && !line.starts_with("| Day "))
                .collect();
            assert_eq!(rows.len(), 7, "week {}", week.week);
            let first_date = (week.start_date + chrono::Days::new(1)).to_string();
            assert!(rows[0].contains(&first_date), "week {}", week.week);
        }
    }
}
