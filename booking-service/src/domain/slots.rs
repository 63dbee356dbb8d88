use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::conflict::Interval;
use crate::domain::gate::GateInputs;

const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SlotQuery {
    /// Local calendar date to list, `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub service_provider_id: Option<Uuid>,
    pub event_type_id: Option<Uuid>,
    /// IANA zone of the viewer; the workspace zone is used when absent or invalid.
    pub timezone: Option<String>,
}

/// One candidate start time in the slot list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SlotView {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    /// Wall-clock start, `HH:MM`.
    pub local_time: String,
    pub available: bool,
    /// Rejection code when not available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub timezone: String,
    pub duration_minutes: u32,
    pub slots: Vec<SlotView>,
}

/// Lists every `duration_minutes` step of the local `date`, each marked with the gate's verdict.
///
/// Local times skipped by a DST jump are left out; repeated ones use the earlier instant.
pub fn generate_day_slots(
    inputs: &GateInputs<'_>,
    date: NaiveDate,
    duration_minutes: u32,
) -> Vec<SlotView> {
    let step = duration_minutes.max(1);
    let mut slots = Vec::new();

    for minute in (0..MINUTES_PER_DAY).step_by(step as usize) {
        let Some(local_time) = NaiveTime::from_hms_opt(minute / 60, minute % 60, 0) else {
            continue;
        };
        let Some(start) = inputs
            .timezone
            .from_local_datetime(&date.and_time(local_time))
            .earliest()
        else {
            tracing::debug!(%date, %local_time, "Local time does not exist, skipping slot");
            continue;
        };
        let start_at = start.with_timezone(&Utc);
        let end_at = start_at + Duration::minutes(i64::from(step));

        let verdict = inputs.assess(&Interval::new(start_at, Some(end_at)));
        slots.push(SlotView {
            start_at,
            end_at,
            local_time: local_time.format("%H:%M").to_string(),
            available: verdict.is_ok(),
            reason: verdict.err().map(|r| r.code().to_owned()),
        });
    }

    slots
}
