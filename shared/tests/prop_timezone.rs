//! Property tests for zone-local decomposition.
//!
//! These must hold on any host, whatever its own `TZ`.

use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use proptest::prelude::*;
use shared::time::LocalParts;
use shared::types::DayOfWeek;

fn arb_timezone() -> impl Strategy<Value = Tz> {
    prop_oneof![
        Just(Tz::UTC),
        Just(chrono_tz::America::New_York),
        Just(chrono_tz::America::Los_Angeles),
        Just(chrono_tz::Europe::London),
        Just(chrono_tz::Asia::Kolkata),
        Just(chrono_tz::Asia::Tokyo),
        Just(chrono_tz::Australia::Lord_Howe),
        Just(chrono_tz::Pacific::Kiritimati),
    ]
}

/// Instants between 2000-01-01 and 2040-01-01 at minute precision.
fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800i64 / 60..2_208_988_800i64 / 60)
        .prop_map(|minutes| Utc.timestamp_opt(minutes * 60, 0).unwrap())
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 512,
        ..ProptestConfig::default()
    }
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn parts_match_zone_wall_clock(instant in arb_instant(), tz in arb_timezone()) {
        let parts = LocalParts::in_zone(instant, tz);
        let local = instant.with_timezone(&tz);

        prop_assert_eq!(parts.date, local.date_naive());
        prop_assert_eq!(parts.day_of_week, DayOfWeek::from(local.weekday()));
        prop_assert_eq!(u32::from(parts.hour), local.hour());
        prop_assert_eq!(u32::from(parts.minute_of_day), local.hour() * 60 + local.minute());
        prop_assert!(parts.minute_of_day < 1440);
        prop_assert!(parts.day_of_week.index() < 7);
    }

    #[test]
    fn relocalizing_reproduces_the_instant(instant in arb_instant(), tz in arb_timezone()) {
        let parts = LocalParts::in_zone(instant, tz);
        let time = NaiveTime::from_hms_opt(
            u32::from(parts.minute_of_day / 60),
            u32::from(parts.minute_of_day % 60),
            0,
        )
        .unwrap();

        // Ambiguous local times map back to one of two instants; ours must be among them.
        let candidates: Vec<_> = tz
            .from_local_datetime(&parts.date.and_time(time))
            .earliest()
            .into_iter()
            .chain(tz.from_local_datetime(&parts.date.and_time(time)).latest())
            .map(|dt| dt.with_timezone(&Utc))
            .collect();
        prop_assert!(candidates.contains(&instant), "{instant} not in {candidates:?}");

        let again = LocalParts::in_zone(instant, tz);
        prop_assert_eq!(parts, again);
    }
}
