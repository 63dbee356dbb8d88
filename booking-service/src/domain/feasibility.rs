use shared::time::LocalParts;
use shared::types::DaySchedule;

use crate::domain::rejection::Rejection;
use crate::domain::schedule::EffectiveSchedule;

/// A proposed booking expressed on the local wall clock.
///
/// `end_minute` may run past 1440 when the booking crosses local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    pub parts: LocalParts,
    pub start_minute: u32,
    pub end_minute: u32,
}

impl SlotWindow {
    pub fn new(parts: LocalParts, duration_minutes: u32) -> Self {
        let start_minute = u32::from(parts.minute_of_day);
        Self {
            parts,
            start_minute,
            end_minute: start_minute + duration_minutes,
        }
    }
}

pub struct SlotContext<'a> {
    pub schedule: &'a EffectiveSchedule,
    /// Day entry for the slot's weekday, `None` when the schedule has no such day.
    pub day: Option<&'a DaySchedule>,
    pub slot: &'a SlotWindow,
}

// region: Feasibility rules

pub trait FeasibilityRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, ctx: &SlotContext<'_>) -> Result<(), Rejection>;
}

pub struct DayEnabledRule;

impl FeasibilityRule for DayEnabledRule {
    fn name(&self) -> &'static str {
        "day_enabled"
    }

    fn check(&self, ctx: &SlotContext<'_>) -> Result<(), Rejection> {
        match ctx.day {
            Some(day) if day.enabled => Ok(()),
            _ => Err(Rejection::DayDisabled {
                day: ctx.slot.parts.day_of_week,
            }),
        }
    }
}

/// Both boundaries are inclusive: a slot may start at opening and end at closing.
pub struct WithinHoursRule;

impl FeasibilityRule for WithinHoursRule {
    fn name(&self) -> &'static str {
        "within_hours"
    }

    fn check(&self, ctx: &SlotContext<'_>) -> Result<(), Rejection> {
        let Some(day) = ctx.day else {
            return Ok(());
        };
        let open = u32::from(day.start_time.minutes());
        let close = u32::from(day.end_time.minutes());
        if ctx.slot.start_minute < open || ctx.slot.end_minute > close {
            return Err(Rejection::OutsideHours {
                start: day.start_time,
                end: day.end_time,
            });
        }
        Ok(())
    }
}

/// Breaks may overlap each other; touching one is enough to reject.
pub struct BreakRule;

impl FeasibilityRule for BreakRule {
    fn name(&self) -> &'static str {
        "break"
    }

    fn check(&self, ctx: &SlotContext<'_>) -> Result<(), Rejection> {
        let Some(day) = ctx.day else {
            return Ok(());
        };
        let hit = day.breaks.iter().find(|b| {
            ctx.slot.start_minute < u32::from(b.end.minutes())
                && ctx.slot.end_minute > u32::from(b.start.minutes())
        });
        match hit {
            Some(b) => Err(Rejection::BreakConflict {
                start: b.start,
                end: b.end,
            }),
            None => Ok(()),
        }
    }
}

/// Only the hour the slot starts in is consulted.
pub struct IndividualOverrideRule;

impl FeasibilityRule for IndividualOverrideRule {
    fn name(&self) -> &'static str {
        "individual_override"
    }

    fn check(&self, ctx: &SlotContext<'_>) -> Result<(), Rejection> {
        let key = ctx.slot.parts.override_key();
        match ctx.schedule.override_for(&key) {
            Some(false) => Err(Rejection::IndividualOverrideDenied { key }),
            _ => Ok(()),
        }
    }
}

static RULES: &[&dyn FeasibilityRule] = &[
    &DayEnabledRule,
    &WithinHoursRule,
    &BreakRule,
    &IndividualOverrideRule,
];

/// Rules in evaluation order.
pub fn feasibility_rules() -> &'static [&'static dyn FeasibilityRule] {
    RULES
}

// endregion: Feasibility rules

/// Checks a slot against the schedule, returning the first failing rule's rejection.
pub fn evaluate(schedule: &EffectiveSchedule, slot: &SlotWindow) -> Result<(), Rejection> {
    let ctx = SlotContext {
        schedule,
        day: schedule.day(slot.parts.day_of_week),
        slot,
    };
    for rule in feasibility_rules() {
        if let Err(rejection) = rule.check(&ctx) {
            tracing::debug!(rule = rule.name(), reason = rejection.code(), "Slot infeasible");
            return Err(rejection);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::types::{BreakWindow, DayOfWeek, OverrideKey};

    fn monday_schedule() -> EffectiveSchedule {
        let mut schedule = EffectiveSchedule::default();
        schedule.weekly.days.insert(
            DayOfWeek::Monday,
            DaySchedule {
                enabled: true,
                start_time: "09:00".parse().unwrap(),
                end_time: "17:00".parse().unwrap(),
                breaks: vec![
                    BreakWindow {
                        start: "12:30".parse().unwrap(),
                        end: "13:00".parse().unwrap(),
                    },
                    // overlapping, unsorted
                    BreakWindow {
                        start: "12:00".parse().unwrap(),
                        end: "12:45".parse().unwrap(),
                    },
                ],
            },
        );
        schedule.weekly.days.insert(
            DayOfWeek::Sunday,
            DaySchedule {
                enabled: false,
                start_time: "09:00".parse().unwrap(),
                end_time: "17:00".parse().unwrap(),
                breaks: vec![],
            },
        );
        schedule
    }

    fn slot(day: DayOfWeek, date: (i32, u32, u32), hm: (u16, u16), duration: u32) -> SlotWindow {
        let minute_of_day = hm.0 * 60 + hm.1;
        SlotWindow::new(
            LocalParts {
                day_of_week: day,
                hour: (hm.0) as u8,
                minute_of_day,
                date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            },
            duration,
        )
    }

    fn monday(hm: (u16, u16), duration: u32) -> SlotWindow {
        slot(DayOfWeek::Monday, (2024, 6, 10), hm, duration)
    }

    #[test]
    fn disabled_or_missing_day_is_rejected() {
        let schedule = monday_schedule();
        for day in [DayOfWeek::Sunday, DayOfWeek::Tuesday] {
            let result = evaluate(&schedule, &slot(day, (2024, 6, 11), (10, 0), 30));
            assert_eq!(result, Err(Rejection::DayDisabled { day }));
        }
    }

    #[test]
    fn hours_boundaries_are_inclusive() {
        let schedule = monday_schedule();
        assert_eq!(evaluate(&schedule, &monday((9, 0), 30)), Ok(()));
        assert_eq!(evaluate(&schedule, &monday((16, 30), 30)), Ok(()));
        assert!(matches!(
            evaluate(&schedule, &monday((8, 45), 30)),
            Err(Rejection::OutsideHours { .. })
        ));
        assert!(matches!(
            evaluate(&schedule, &monday((16, 45), 30)),
            Err(Rejection::OutsideHours { .. })
        ));
    }

    #[test]
    fn crossing_local_midnight_is_outside_hours() {
        let mut schedule = EffectiveSchedule::default();
        schedule.weekly.days.insert(
            DayOfWeek::Monday,
            DaySchedule {
                enabled: true,
                start_time: "00:00".parse().unwrap(),
                end_time: "24:00".parse().unwrap(),
                breaks: vec![],
            },
        );
        assert_eq!(evaluate(&schedule, &monday((23, 30), 30)), Ok(()));
        assert!(matches!(
            evaluate(&schedule, &monday((23, 45), 30)),
            Err(Rejection::OutsideHours { .. })
        ));
    }

    #[test]
    fn breaks_use_union_semantics() {
        let schedule = monday_schedule();
        assert!(matches!(
            evaluate(&schedule, &monday((12, 30), 30)),
            Err(Rejection::BreakConflict { .. })
        ));
        assert!(matches!(
            evaluate(&schedule, &monday((12, 15), 10)),
            Err(Rejection::BreakConflict { .. })
        ));
        // ends exactly when the first break starts
        assert_eq!(evaluate(&schedule, &monday((11, 30), 30)), Ok(()));
        assert_eq!(evaluate(&schedule, &monday((13, 0), 30)), Ok(()));
    }

    #[test]
    fn denied_override_blocks_the_start_hour_only() {
        let mut schedule = monday_schedule();
        let key: OverrideKey = "2024-06-10-14".parse().unwrap();
        schedule.overrides.entries.insert(key, false);
        schedule
            .overrides
            .entries
            .insert("2024-06-10-15".parse().unwrap(), true);

        assert_eq!(
            evaluate(&schedule, &monday((14, 0), 30)),
            Err(Rejection::IndividualOverrideDenied { key })
        );
        assert_eq!(
            evaluate(&schedule, &monday((14, 45), 30)),
            Err(Rejection::IndividualOverrideDenied { key })
        );
        // starts at 13:30, runs into hour 14, still allowed
        assert_eq!(evaluate(&schedule, &monday((13, 30), 60)), Ok(()));
        // `true` never widens the weekly schedule
        assert_eq!(evaluate(&schedule, &monday((15, 0), 30)), Ok(()));
    }

    #[test]
    fn first_failing_rule_wins() {
        let mut schedule = monday_schedule();
        schedule
            .overrides
            .entries
            .insert("2024-06-10-12".parse().unwrap(), false);
        // both in a break and denied; the break is reported
        assert!(matches!(
            evaluate(&schedule, &monday((12, 30), 30)),
            Err(Rejection::BreakConflict { .. })
        ));
    }

    #[test]
    fn rule_order_is_stable() {
        let names: Vec<_> = feasibility_rules().iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            ["day_enabled", "within_hours", "break", "individual_override"]
        );
    }
}
