// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn levels_are_ordered_stealth_to_full() {
    assert!(LogLevel::Stealth < LogLevel::Off);
    assert!(LogLevel::Off < LogLevel::Quiet);
    assert!(LogLevel::Quiet < LogLevel::Full);
}

#[test]
fn from_str_loose_is_case_insensitive() {
    assert_eq!(LogLevel::from_str_loose("full"), Some(LogLevel::Full));
    assert_eq!(LogLevel::from_str_loose("FULL"), Some(LogLevel::Full));
    assert_eq!(LogLevel::from_str_loose("Quiet"), Some(LogLevel::Quiet));
    assert_eq!(LogLevel::from_str_loose("nonsense"), None);
}

#[test]
fn from_i32_round_trips_with_discriminant() {
    for level in [LogLevel::Stealth, LogLevel::Off, LogLevel::Quiet, LogLevel::Full] {
        assert_eq!(LogLevel::from_i32(level as i32), Some(level));
    }
    assert_eq!(LogLevel::from_i32(99), None);
}

#[test]
fn display_matches_formula_key_casing() {
    assert_eq!(LogLevel::Full.to_string(), "full");
    assert_eq!(LogLevel::Stealth.as_str(), "stealth");
}

#[test]
fn screen_collector_accepts_a_record_without_panicking() {
    let collector = ScreenCollector::new();
    let mut record = LogRecord::new(tasktonic_ledger::EntityId::from_index(3), 1_700_000_000);
    record.log.push("hello".to_string());
    record.sys.insert("finished".to_string(), serde_json::json!(true));
    collector.put_log(&record);
}
