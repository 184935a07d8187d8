// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./autopay.toml` > `~/.config/autopay/autopay.toml`
//! > `/etc/autopay/autopay.toml`, with environment variable overrides via
//! the `AUTOPAY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AutopayConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/autopay/autopay.toml` (system-wide)
/// 3. `~/.config/autopay/autopay.toml` (user XDG config)
/// 4. `./autopay.toml` (local directory)
/// 5. `AUTOPAY_*` environment variables
pub fn load_config() -> Result<AutopayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AutopayConfig::default()))
        .merge(Toml::file("/etc/autopay/autopay.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("autopay/autopay.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("autopay.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<AutopayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AutopayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AutopayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AutopayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `AUTOPAY_ENGINE_TICK_INTERVAL_SECS`
/// must map to `engine.tick_interval_secs`, not `engine.tick.interval.secs`.
fn env_provider() -> Env {
    Env::prefixed("AUTOPAY_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("engine_", "engine.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}
