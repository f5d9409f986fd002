// SPDX-License-Identifier: MIT

use super::*;
use tasktonic_ledger::Ledger;

#[test]
fn install_defaults_seeds_the_well_known_formula_keys() {
    let ledger = Ledger::new();
    RuntimeConfig::install_defaults(&ledger).unwrap();

    assert_eq!(ledger.formula().get(formula_keys::PROJECT_STATUS).unwrap(), Some(serde_json::json!("starting")));
    assert_eq!(ledger.formula().get(formula_keys::LOG_TO).unwrap(), Some(serde_json::json!("screen")));
    assert_eq!(ledger.formula().get(formula_keys::LOG_DEFAULT).unwrap(), Some(serde_json::json!("off")));
    assert_eq!(
        ledger.formula().get(formula_keys::TESTING_DONT_START_CATALYSTS).unwrap(),
        Some(serde_json::json!(false))
    );
}

#[test]
fn apply_overrides_only_touches_fields_the_caller_set() {
    let ledger = Ledger::new();
    RuntimeConfig::install_defaults(&ledger).unwrap();

    let config = RuntimeConfig { log_to: Some("off".to_string()), ..RuntimeConfig::default() };
    config.apply_overrides(&ledger).unwrap();

    assert_eq!(ledger.formula().get(formula_keys::LOG_TO).unwrap(), Some(serde_json::json!("off")));
    assert_eq!(ledger.formula().get(formula_keys::LOG_DEFAULT).unwrap(), Some(serde_json::json!("off")));
    assert!(ledger.formula().get(formula_keys::PROJECT_NAME).unwrap().is_none());
}

#[test]
fn apply_overrides_sets_dont_start_catalysts_when_true() {
    let ledger = Ledger::new();
    RuntimeConfig::install_defaults(&ledger).unwrap();

    let config = RuntimeConfig { dont_start_catalysts: true, ..RuntimeConfig::default() };
    config.apply_overrides(&ledger).unwrap();

    assert_eq!(
        ledger.formula().get(formula_keys::TESTING_DONT_START_CATALYSTS).unwrap(),
        Some(serde_json::json!(true))
    );
}

#[test]
fn from_toml_str_parses_a_partial_document() {
    let config = RuntimeConfig::from_toml_str(
        r#"
        project_name = "demo"
        log_to = "off"
        "#,
    )
    .unwrap();

    assert_eq!(config.project_name.as_deref(), Some("demo"));
    assert_eq!(config.log_to.as_deref(), Some("off"));
    assert_eq!(config.log_default, None);
    assert!(!config.dont_start_catalysts);
}

#[test]
fn from_toml_str_rejects_malformed_documents() {
    let result = RuntimeConfig::from_toml_str("this is not = valid [toml");
    assert!(result.is_err());
}
