//! Weekly slot templates and the ordered rule list that picks one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::phase::EndurancePhase;
use crate::tier::Tier;

use Activity::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Previous weekday; the week wraps, so sunday precedes monday.
    pub fn previous(&self) -> Weekday {
        Weekday::ALL[(self.index() + 6) % 7]
    }

    pub fn next(&self) -> Weekday {
        Weekday::ALL[(self.index() + 1) % 7]
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Weekday::ALL[day.num_days_from_monday() as usize]
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Am,
    Pm,
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeOfDay::Am => "am",
            TimeOfDay::Pm => "pm",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Rest,
    Recovery,
    Endurance,
    Tempo,
    Intervals,
    LongRide,
    Openers,
    Strength,
    Mobility,
    Event,
}

impl Activity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Rest => "rest",
            Activity::Recovery => "recovery",
            Activity::Endurance => "endurance",
            Activity::Tempo => "tempo",
            Activity::Intervals => "intervals",
            Activity::LongRide => "long_ride",
            Activity::Openers => "openers",
            Activity::Strength => "strength",
            Activity::Mobility => "mobility",
            Activity::Event => "event",
        }
    }

    pub fn is_cycling(&self) -> bool {
        matches!(
            self,
            Activity::Recovery
                | Activity::Endurance
                | Activity::Tempo
                | Activity::Intervals
                | Activity::LongRide
                | Activity::Openers
                | Activity::Event
        )
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlot {
    pub am: Option<Activity>,
    pub pm: Option<Activity>,
    pub is_key_day: bool,
    pub note: String,
}

impl DaySlot {
    fn new(am: Option<Activity>, pm: Option<Activity>, is_key_day: bool, note: &str) -> Self {
        Self {
            am,
            pm,
            is_key_day,
            note: note.to_string(),
        }
    }

    pub fn slot(&self, time: TimeOfDay) -> Option<Activity> {
        match time {
            TimeOfDay::Am => self.am,
            TimeOfDay::Pm => self.pm,
        }
    }

    /// First time-of-day slot holding a strength session.
    pub fn strength_slot(&self) -> Option<TimeOfDay> {
        [TimeOfDay::Am, TimeOfDay::Pm]
            .into_iter()
            .find(|time| self.slot(*time) == Some(Activity::Strength))
    }

    pub fn has_strength(&self) -> bool {
        self.strength_slot().is_some()
    }

    fn clear_strength(&mut self) {
        if self.am == Some(Activity::Strength) {
            self.am = None;
        }
        if self.pm == Some(Activity::Strength) {
            self.pm = None;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Taper,
    StrengthPriority,
    ThreeKey,
    Standard,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::Taper,
        TemplateKind::StrengthPriority,
        TemplateKind::ThreeKey,
        TemplateKind::Standard,
    ];

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TemplateKind::Taper => "taper",
            TemplateKind::StrengthPriority => "strength_priority",
            TemplateKind::ThreeKey => "three_key",
            TemplateKind::Standard => "standard",
        })
    }
}

/// Seven day slots, indexed by [`Weekday::index`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyTemplate {
    pub kind: TemplateKind,
    pub days: [DaySlot; 7],
}

impl WeeklyTemplate {
    pub fn day(&self, weekday: Weekday) -> &DaySlot {
        &self.days[weekday.index()]
    }

    pub fn key_days(&self) -> Vec<Weekday> {
        Weekday::ALL
            .into_iter()
            .filter(|day| self.day(*day).is_key_day)
            .collect()
    }

    /// Days pre-flagged for strength, in weekday order.
    pub fn strength_eligible_days(&self) -> Vec<Weekday> {
        Weekday::ALL
            .into_iter()
            .filter(|day| self.day(*day).has_strength())
            .collect()
    }

    /// Checks that no key day holds strength and that no strength session
    /// sits in the pm slot right before a key day.
    pub fn validate_placement(&self) -> Result<()> {
        for weekday in Weekday::ALL {
            let slot = self.day(weekday);
            if let Some(time) = slot.strength_slot() {
                if slot.is_key_day {
                    return Err(ConfigError::TemplatePlacement {
                        template: self.kind,
                        day: weekday,
                        slot: time,
                        reason: "strength on a key day",
                    });
                }
            }
            if slot.pm == Some(Activity::Strength) && self.day(weekday.next()).is_key_day {
                return Err(ConfigError::TemplatePlacement {
                    template: self.kind,
                    day: weekday,
                    slot: TimeOfDay::Pm,
                    reason: "strength in the slot before a key day",
                });
            }
        }
        Ok(())
    }

    /// Turns `weekday` into the event: a key day with nothing else on it.
    /// A pm strength slot on the day before is dropped.
    pub fn with_event_day(&self, weekday: Weekday) -> WeeklyTemplate {
        let mut template = self.clone();
        template.days[weekday.index()] =
            DaySlot::new(Some(Activity::Event), None, true, "Event day");
        let eve = &mut template.days[weekday.previous().index()];
        if eve.pm == Some(Activity::Strength) {
            eve.pm = None;
        }
        template
    }

    /// Moves a pm strength session on `weekday` into the am slot; whatever
    /// was in the am slot takes the evening. Returns whether it moved.
    pub fn move_strength_to_morning(&mut self, weekday: Weekday) -> bool {
        let slot = &mut self.days[weekday.index()];
        if slot.pm != Some(Activity::Strength) {
            return false;
        }
        slot.pm = slot.am.take();
        slot.am = Some(Activity::Strength);
        true
    }

    /// Keeps the first `count` strength-eligible days and strips strength
    /// from the rest. Returns the kept days with the resolved template.
    pub fn resolve_strength(&self, count: usize) -> (Vec<Weekday>, WeeklyTemplate) {
        let eligible = self.strength_eligible_days();
        let kept: Vec<Weekday> = eligible.iter().copied().take(count).collect();
        let mut template = self.clone();
        for weekday in eligible.into_iter().skip(count) {
            template.days[weekday.index()].clear_strength();
        }
        (kept, template)
    }
}

struct TemplateRule {
    kind: TemplateKind,
    applies: fn(Tier, EndurancePhase) -> bool,
}

/// Ordered decision table; the first matching rule wins.
const RULES: [TemplateRule; 4] = [
    TemplateRule {
        kind: TemplateKind::Taper,
        applies: |_, phase| phase == EndurancePhase::Taper,
    },
    TemplateRule {
        kind: TemplateKind::StrengthPriority,
        applies: |tier, _| tier.is_lowest_volume(),
    },
    TemplateRule {
        kind: TemplateKind::ThreeKey,
        applies: |tier, phase| tier.is_high_volume() && phase.is_build(),
    },
    TemplateRule {
        kind: TemplateKind::Standard,
        applies: |_, _| true,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyTemplateSelector {
    templates: [WeeklyTemplate; 4],
}

impl Default for WeeklyTemplateSelector {
    fn default() -> Self {
        Self {
            templates: [
                taper_template(),
                strength_priority_template(),
                three_key_template(),
                standard_template(),
            ],
        }
    }
}

impl WeeklyTemplateSelector {
    pub fn kind_for(tier: Tier, phase: EndurancePhase) -> TemplateKind {
        RULES
            .iter()
            .find(|rule| (rule.applies)(tier, phase))
            .map(|rule| rule.kind)
            .unwrap_or(TemplateKind::Standard)
    }

    pub fn template_for(&self, tier: Tier, phase: EndurancePhase) -> &WeeklyTemplate {
        self.template(Self::kind_for(tier, phase))
    }

    pub fn template(&self, kind: TemplateKind) -> &WeeklyTemplate {
        &self.templates[kind.index()]
    }

    pub fn validate(&self) -> Result<()> {
        self.templates
            .iter()
            .try_for_each(WeeklyTemplate::validate_placement)
    }
}

fn week(kind: TemplateKind, days: [DaySlot; 7]) -> WeeklyTemplate {
    WeeklyTemplate { kind, days }
}

fn taper_template() -> WeeklyTemplate {
    week(
        TemplateKind::Taper,
        [
            DaySlot::new(Some(Strength), None, false, "Maintenance lift, cut sets in half"),
            DaySlot::new(Some(Intervals), None, true, "Short race-pace efforts"),
            DaySlot::new(Some(Strength), Some(Endurance), false, "Easy spin"),
            DaySlot::new(Some(Endurance), None, false, "Easy endurance, 45 min"),
            DaySlot::new(Some(Rest), None, false, "Rest"),
            DaySlot::new(Some(Openers), None, false, "Openers: 3 x 1 min at race pace"),
            DaySlot::new(Some(Endurance), None, false, "Easy endurance, 60 min"),
        ],
    )
}

fn strength_priority_template() -> WeeklyTemplate {
    week(
        TemplateKind::StrengthPriority,
        [
            DaySlot::new(None, Some(Strength), false, "Recovery from the weekend"),
            DaySlot::new(Some(Endurance), None, false, "Easy endurance, 60 min"),
            DaySlot::new(Some(Intervals), None, true, "Key ride: threshold intervals"),
            DaySlot::new(Some(Recovery), Some(Strength), false, "Spin legs out"),
            DaySlot::new(Some(Rest), None, false, "Rest"),
            DaySlot::new(Some(Strength), None, false, "Lift early, keep the evening free"),
            DaySlot::new(Some(LongRide), None, true, "Key ride: long endurance"),
        ],
    )
}

fn three_key_template() -> WeeklyTemplate {
    week(
        TemplateKind::ThreeKey,
        [
            DaySlot::new(Some(Rest), None, false, "Rest"),
            DaySlot::new(Some(Intervals), None, true, "Key ride: VO2 intervals"),
            DaySlot::new(Some(Strength), Some(Endurance), false, "Lift morning, easy spin evening"),
            DaySlot::new(Some(Tempo), None, true, "Key ride: threshold"),
            DaySlot::new(Some(Strength), None, false, "Short lift, no riding"),
            DaySlot::new(Some(LongRide), None, true, "Key ride: long ride with race-pace blocks"),
            DaySlot::new(Some(Endurance), None, false, "Endurance, 90 min"),
        ],
    )
}

fn standard_template() -> WeeklyTemplate {
    week(
        TemplateKind::Standard,
        [
            DaySlot::new(Some(Rest), None, false, "Rest"),
            DaySlot::new(Some(Intervals), None, true, "Key ride: intervals"),
            DaySlot::new(Some(Endurance), Some(Strength), false, "Endurance, 60-90 min"),
            DaySlot::new(Some(Tempo), None, false, "Tempo, 60 min"),
            DaySlot::new(Some(Recovery), Some(Mobility), false, "Recovery spin"),
            DaySlot::new(Some(LongRide), None, true, "Key ride: long ride"),
            DaySlot::new(Some(Endurance), Some(Strength), false, "Endurance, 2 h"),
        ],
    )
}
