//! Tests for the business clock

use chrono::{NaiveDate, TimeZone, Utc};
use core_kernel::{BusinessClock, Clock, FixedClock};

#[test]
fn test_fixed_clock_returns_pinned_instant() {
    let instant = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
    let clock = FixedClock::at(instant);

    assert_eq!(clock.now(), instant);
    assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
}

#[test]
fn test_fixed_clock_negative_offset_stays_on_previous_day() {
    let instant = Utc.with_ymd_and_hms(2024, 1, 15, 2, 0, 0).unwrap();
    let clock = FixedClock::at(instant).in_timezone(chrono_tz::America::New_York);

    assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
}

#[test]
fn test_utc_business_clock_matches_system_date() {
    let clock = BusinessClock::utc();
    let before = Utc::now().date_naive();
    let today = clock.today();
    let after = Utc::now().date_naive();

    assert!(today == before || today == after);
}
