// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `qarz check-config` command implementation.

use qarz_config::QarzConfig;
use qarz_core::QarzError;

/// Prints the effective configuration as TOML, with secrets redacted.
pub fn run_check_config(config: &QarzConfig) -> Result<(), QarzError> {
    print!("{}", render_config(config)?);
    eprintln!("qarz: configuration is valid");
    Ok(())
}

pub fn render_config(config: &QarzConfig) -> Result<String, QarzError> {
    let mut shown = config.clone();
    if shown.telegram.bot_token.is_some() {
        shown.telegram.bot_token = Some("<redacted>".to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| QarzError::Config(format!("failed to render configuration: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_token_is_redacted() {
        let mut config = QarzConfig::default();
        config.telegram.bot_token = Some("123456:secret".into());
        let rendered = render_config(&config).unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn rendered_config_loads_back() {
        let mut config = QarzConfig::default();
        config.ledger.currency = "sum".into();
        let rendered = render_config(&config).unwrap();
        let reloaded = qarz_config::load_config_from_str(&rendered).unwrap();
        assert_eq!(reloaded.ledger.currency, "sum");
        assert_eq!(reloaded.dialogue.max_effect_chain, config.dialogue.max_effect_chain);
    }
}
