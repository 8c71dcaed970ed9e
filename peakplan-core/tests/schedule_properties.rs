use std::path::Path;
use std::thread;

use chrono::NaiveDate;
use peakplan_core::{
    Activity, CalendarAssembler, EndurancePhase, PhaseScheduleBuilder, PlanError, PlanRequest,
    RenderedTable, SchedulerTables, StrengthPhase, StructuredCalendar, Tier, Weekday,
};

const LENGTHS: [u32; 4] = [6, 12, 16, 20];

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn fixture_tables() -> SchedulerTables {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../configs/peakplan.toml");
    SchedulerTables::load(path).unwrap()
}

/// Every tier and length against events on each weekday of one week.
fn all_calendars(tables: &SchedulerTables) -> Vec<StructuredCalendar> {
    let builder = PhaseScheduleBuilder::new(tables);
    let mut calendars = Vec::new();
    for tier in Tier::ALL {
        for weeks in LENGTHS {
            for offset in 0..7 {
                let event_date = date(2026, 6, 1) + chrono::Days::new(offset);
                let schedule = builder.build(tier, weeks, event_date).unwrap();
                calendars.push(CalendarAssembler.assemble(&schedule).0);
            }
        }
    }
    calendars
}

#[test]
fn strength_phase_follows_alignment_and_never_lifts_heavy_in_taper() {
    let tables = fixture_tables();
    for calendar in all_calendars(&tables) {
        for week in &calendar.weeks {
            assert_eq!(
                week.strength_phase,
                tables.alignment.strength_phase_for(week.cycling_phase)
            );
            assert!(
                !(week.cycling_phase == EndurancePhase::Taper
                    && week.strength_phase == StrengthPhase::LiftHeavy)
            );
        }
    }
}

#[test]
fn phase_weeks_sum_to_plan_length_and_end_in_taper() {
    let tables = fixture_tables();
    for calendar in all_calendars(&tables) {
        let total: u32 = calendar.phase_breakdown().values().sum();
        assert_eq!(total, calendar.plan_weeks);
        assert_eq!(calendar.weeks.len() as u32, calendar.plan_weeks);
        assert_eq!(
            calendar.weeks.last().unwrap().cycling_phase,
            EndurancePhase::Taper
        );
        let numbers: Vec<u32> = calendar.weeks.iter().map(|week| week.week).collect();
        assert_eq!(numbers, (1..=calendar.plan_weeks).collect::<Vec<_>>());
    }
}

#[test]
fn frequency_is_monotonic_by_tier_volume() {
    let tables = fixture_tables();
    for phase in EndurancePhase::ALL {
        for pair in Tier::ALL.windows(2) {
            assert!(
                tables.frequency.frequency_for(pair[0], phase)
                    >= tables.frequency.frequency_for(pair[1], phase),
                "{phase}: {} vs {}",
                pair[0],
                pair[1]
            );
        }
    }
}

#[test]
fn no_strength_on_or_the_evening_before_a_key_day() {
    let tables = fixture_tables();
    for calendar in all_calendars(&tables) {
        for week in &calendar.weeks {
            for (weekday, day) in &week.days {
                if day.is_key_day {
                    assert!(!day.has_strength(), "week {} {weekday}", week.week);
                }
                let next = &week.days[&weekday.next()];
                if next.is_key_day {
                    assert_ne!(day.pm, Some(Activity::Strength), "week {} {weekday}", week.week);
                }
            }
            let strength_days = week.days.values().filter(|day| day.has_strength()).count();
            assert_eq!(strength_days, usize::from(week.strength_sessions));
        }
    }
}

#[test]
fn no_evening_strength_before_a_key_day_across_weeks() {
    let tables = fixture_tables();
    for calendar in all_calendars(&tables) {
        let days: Vec<_> = calendar
            .weeks
            .iter()
            .flat_map(|week| {
                week.days_by_date()
                    .into_iter()
                    .map(move |(weekday, day)| (week.week, weekday, day))
            })
            .collect();
        assert_eq!(days.len() as u32, calendar.plan_weeks * 7);
        for pair in days.windows(2) {
            let (week, weekday, today) = pair[0];
            let (_, _, tomorrow) = pair[1];
            assert_eq!(today.date + chrono::Days::new(1), tomorrow.date);
            if tomorrow.is_key_day {
                assert_ne!(
                    today.pm,
                    Some(Activity::Strength),
                    "{} {}w event={}: week {week} {weekday} {}",
                    calendar.tier,
                    calendar.plan_weeks,
                    calendar.event_date,
                    today.date
                );
            }
        }
    }
}

#[test]
fn final_day_of_every_plan_is_the_event() {
    let tables = fixture_tables();
    for calendar in all_calendars(&tables) {
        let last = calendar.weeks.last().unwrap();
        let (_, final_day) = *last.days_by_date().last().unwrap();
        assert_eq!(final_day.date, calendar.event_date);
        assert_eq!(final_day.am, Some(Activity::Event));
        assert_eq!(
            calendar.start_date,
            calendar.event_date - chrono::Days::new(u64::from(calendar.plan_weeks) * 7)
        );
    }
}

#[test]
fn building_twice_is_identical() {
    let tables = fixture_tables();
    let builder = PhaseScheduleBuilder::new(&tables);
    let first = builder.build(Tier::Finisher, 16, date(2025, 9, 20)).unwrap();
    let second = builder.build(Tier::Finisher, 16, date(2025, 9, 20)).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        CalendarAssembler.assemble(&first),
        CalendarAssembler.assemble(&second)
    );
}

#[test]
fn calendar_round_trips_through_json() {
    let tables = fixture_tables();
    let request = PlanRequest::parse("gravel_worlds", "podium", 20, "2025-08-23").unwrap();
    let schedule = PhaseScheduleBuilder::new(&tables)
        .build_request(&request)
        .unwrap();
    let (calendar, table) = CalendarAssembler.assemble(&schedule);
    let parsed = StructuredCalendar::from_json(&calendar.to_json().unwrap()).unwrap();
    assert_eq!(parsed, calendar);
    assert_eq!(RenderedTable::from_calendar(&parsed), table);
}

#[test]
fn compete_twelve_week_plan_for_early_june() {
    let tables = fixture_tables();
    let schedule = PhaseScheduleBuilder::new(&tables)
        .build(Tier::Compete, 12, date(2025, 6, 7))
        .unwrap();
    let weeks = schedule.weeks();
    assert_eq!(weeks[0].endurance_phase, EndurancePhase::Base1);
    assert_eq!(weeks[11].endurance_phase, EndurancePhase::Taper);
    assert_eq!(weeks[11].strength_phase, StrengthPhase::DontLoseIt);
}

#[test]
fn frequency_extremes_by_tier() {
    let tables = fixture_tables();
    assert_eq!(
        tables
            .frequency
            .frequency_for(Tier::Ayahuasca, EndurancePhase::Base1),
        3
    );
    assert_eq!(
        tables.frequency.frequency_for(Tier::Podium, EndurancePhase::Taper),
        0
    );
}

#[test]
fn unregistered_event_gets_default_profile() {
    let tables = fixture_tables();
    let profile = tables.catalog.profile_for("unregistered_event");
    assert!(profile.is_default());
    assert_eq!(profile, tables.catalog.default_profile());
}

#[test]
fn nine_weeks_is_rejected_naming_plan_weeks() {
    let tables = fixture_tables();
    let err = PhaseScheduleBuilder::new(&tables)
        .build(Tier::Compete, 9, date(2025, 6, 7))
        .unwrap_err();
    assert!(matches!(err, PlanError::Validation { field: "plan_weeks", .. }));
    assert!(err.to_string().contains("plan_weeks"));
}

#[test]
fn concurrent_builds_share_tables() {
    let tables = fixture_tables();
    let builder = PhaseScheduleBuilder::new(&tables);
    let sequential: Vec<_> = Tier::ALL
        .into_iter()
        .map(|tier| builder.build(tier, 12, date(2025, 10, 18)).unwrap())
        .collect();
    let concurrent: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = Tier::ALL
            .into_iter()
            .map(|tier| scope.spawn(move || builder.build(tier, 12, date(2025, 10, 18)).unwrap()))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });
    assert_eq!(sequential, concurrent);
}

#[test]
fn every_event_weekday_keeps_taper_lift() {
    let tables = fixture_tables();
    let builder = PhaseScheduleBuilder::new(&tables);
    for offset in 0..7 {
        let event_date = date(2025, 6, 2) + chrono::Days::new(offset);
        let schedule = builder.build(Tier::Ayahuasca, 6, event_date).unwrap();
        let last = schedule.weeks().last().unwrap();
        assert_eq!(last.strength_days.len(), 1, "{event_date}");
        assert!(!last.strength_days.contains(&Weekday::from(
            chrono::Datelike::weekday(&event_date)
        )));
    }
}
