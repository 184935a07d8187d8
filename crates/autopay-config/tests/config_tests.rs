// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the autopay configuration system.

use autopay_config::diagnostic::ConfigError;
use autopay_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_autopay_config() {
    let toml = r#"
[engine]
tick_interval_secs = 5
settlement_delay_ms = 100
price_symbol = "ETH-USD"
funding_wallet = "savings"

[log]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.engine.tick_interval_secs, 5);
    assert_eq!(config.engine.settlement_delay_ms, 100);
    assert_eq!(config.engine.price_symbol, "ETH-USD");
    assert_eq!(config.engine.funding_wallet, "savings");
    assert_eq!(config.log.level, "debug");
}

/// Empty TOML falls back to compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("defaults should apply");
    assert_eq!(config.engine.tick_interval_secs, 60);
    assert_eq!(config.engine.settlement_delay_ms, 2_000);
    assert_eq!(config.log.level, "info");
}

/// Unknown field in [engine] produces an UnknownKey diagnostic with a
/// fuzzy suggestion.
#[test]
fn unknown_field_produces_suggestion() {
    let toml = r#"
[engine]
tick_intervl_secs = 30
"#;

    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey { key, suggestion, .. } => {
            assert_eq!(key, "tick_intervl_secs");
            assert_eq!(suggestion.as_deref(), Some("tick_interval_secs"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Wrong value type produces an InvalidType diagnostic.
#[test]
fn wrong_type_produces_invalid_type_error() {
    let toml = r#"
[engine]
tick_interval_secs = "soon"
"#;

    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { .. })));
}

/// Semantic validation rejects a zero tick interval after deserialization.
#[test]
fn zero_tick_interval_fails_validation() {
    let toml = r#"
[engine]
tick_interval_secs = 0
"#;

    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { .. })));
}
