use daqline_core::{DaqError, normalize_time_key};
use proptest::prelude::*;

#[test]
fn midnight_and_noon_edges() {
    assert_eq!(normalize_time_key("12:00:00 AM").unwrap(), "00:00:00");
    assert_eq!(normalize_time_key("12:00:00 PM").unwrap(), "12:00:00");
}

#[test]
fn pm_adds_twelve_hours() {
    assert_eq!(normalize_time_key("01:30:15 PM").unwrap(), "13:30:15");
    assert_eq!(normalize_time_key("11:59:59 PM").unwrap(), "23:59:59");
}

#[test]
fn am_hours_pass_through_zero_padded() {
    assert_eq!(normalize_time_key("1:05:09 AM").unwrap(), "01:05:09");
    assert_eq!(normalize_time_key("11:00:00 AM").unwrap(), "11:00:00");
}

#[test]
fn canonical_input_is_unchanged() {
    assert_eq!(normalize_time_key("00:00:00").unwrap(), "00:00:00");
    assert_eq!(normalize_time_key("23:59:59").unwrap(), "23:59:59");
}

#[test]
fn lowercase_meridiem_is_accepted() {
    assert_eq!(normalize_time_key("01:30:15 pm").unwrap(), "13:30:15");
}

#[test]
fn marker_without_parseable_clock_is_rejected() {
    for raw in [
        "PM",
        "1:30 PM",
        "1:30:15:00 PM",
        "aa:bb:cc AM",
        "13:30:15 PM",
        "10:75:00 AM",
        "1:30:15 PM extra",
    ] {
        let err = normalize_time_key(raw).unwrap_err();
        assert!(
            matches!(err, DaqError::MalformedTime { .. }),
            "expected MalformedTime for {raw:?}, got {err:?}"
        );
    }
}

fn arb_twelve_hour() -> impl Strategy<Value = String> {
    (1u32..=12, 0u32..=59, 0u32..=59, any::<bool>()).prop_map(|(h, m, s, pm)| {
        let period = if pm { "PM" } else { "AM" };
        format!("{h:02}:{m:02}:{s:02} {period}")
    })
}

proptest! {
    #[test]
    fn normalized_output_is_fixed_width_twenty_four_hour(raw in arb_twelve_hour()) {
        let key = normalize_time_key(&raw).unwrap();
        prop_assert_eq!(key.len(), 8);
        let hours: u32 = key[..2].parse().unwrap();
        prop_assert!(hours < 24);
        prop_assert!(!key.contains("AM") && !key.contains("PM"));
    }

    #[test]
    fn normalize_is_idempotent(raw in arb_twelve_hour()) {
        let once = normalize_time_key(&raw).unwrap();
        let twice = normalize_time_key(&once).unwrap();
        prop_assert_eq!(once, twice);
    }
}
