use shared::types::{
    AvailabilitySettings, DaySchedule, IndividualOverrides, OverrideKey, WeeklySchedule,
};
use uuid::Uuid;

/// Weekly schedule and individual overrides in force for one evaluation.
///
/// Always derived from the settings record at request time, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveSchedule {
    pub weekly: WeeklySchedule,
    pub overrides: IndividualOverrides,
}

impl EffectiveSchedule {
    pub fn day(&self, day: shared::types::DayOfWeek) -> Option<&DaySchedule> {
        self.weekly.get(day)
    }

    pub fn override_for(&self, key: &OverrideKey) -> Option<bool> {
        self.overrides.get(key)
    }
}

/// Merges workspace settings with the provider's override layer, if any.
///
/// Provider days replace workspace days whole; absent days fall through. Provider
/// individual overrides win over workspace ones on the same key. An unknown
/// provider, or `None`, yields the workspace schedule.
#[tracing::instrument(skip(settings))]
pub fn merge_schedule(settings: &AvailabilitySettings, provider_id: Option<Uuid>) -> EffectiveSchedule {
    let mut weekly = settings.weekly_schedule.clone();
    let mut overrides = settings.individual_overrides.clone();

    if let Some(layer) = provider_id.and_then(|id| settings.providers.get(&id)) {
        if let Some(provider_weekly) = &layer.weekly_schedule {
            for (day, schedule) in &provider_weekly.days {
                weekly.days.insert(*day, schedule.clone());
            }
        }
        if let Some(provider_overrides) = &layer.individual_overrides {
            overrides
                .entries
                .extend(provider_overrides.entries.iter().map(|(k, v)| (*k, *v)));
        }
    } else if let Some(id) = provider_id {
        tracing::debug!(provider_id = %id, "Provider has no override layer, using workspace schedule");
    }

    EffectiveSchedule {
        weekly: sanitize(weekly),
        overrides,
    }
}

/// Disables days whose window is empty and drops inverted breaks.
fn sanitize(mut weekly: WeeklySchedule) -> WeeklySchedule {
    for (day, schedule) in weekly.days.iter_mut() {
        if schedule.enabled && !schedule.is_well_formed() {
            tracing::warn!(
                ?day,
                start = %schedule.start_time,
                end = %schedule.end_time,
                "Day window is empty, treating day as disabled"
            );
            schedule.enabled = false;
        }
        schedule.breaks.retain(|b| {
            let keep = b.start < b.end;
            if !keep {
                tracing::warn!(?day, start = %b.start, end = %b.end, "Dropping inverted break");
            }
            keep
        });
    }
    weekly
}
