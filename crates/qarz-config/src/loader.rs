// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./qarz.toml` > `~/.config/qarz/qarz.toml` > `/etc/qarz/qarz.toml`
//! with environment variable overrides via `QARZ_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::QarzConfig;

/// Sections recognised in `QARZ_<SECTION>_<KEY>` environment variables.
const ENV_SECTIONS: &[&str] = &["bot", "telegram", "storage", "ledger", "dialogue"];

/// Candidate config files, lowest precedence first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/qarz/qarz.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("qarz/qarz.toml"));
    }
    paths.push(PathBuf::from("qarz.toml"));
    paths
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/qarz/qarz.toml` (system-wide)
/// 3. `~/.config/qarz/qarz.toml` (user XDG config)
/// 4. `./qarz.toml` (local directory)
/// 5. `QARZ_*` environment variables
pub fn load_config() -> Result<QarzConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<QarzConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QarzConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<QarzConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QarzConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    config_paths().into_iter().fold(
        Figment::new().merge(Serialized::defaults(QarzConfig::default())),
        |figment, path| figment.merge(Toml::file(path)),
    )
    .merge(env_provider())
}

/// Environment provider mapping `QARZ_TELEGRAM_BOT_TOKEN` to `telegram.bot_token`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that contain underscores survive intact.
fn env_provider() -> Env {
    Env::prefixed("QARZ_").map(|key| {
        let key_str = key.as_str();
        for section in ENV_SECTIONS {
            if let Some(rest) = key_str
                .strip_prefix(section)
                .and_then(|r| r.strip_prefix('_'))
            {
                return format!("{section}.{rest}").into();
            }
        }
        key_str.to_string().into()
    })
}
