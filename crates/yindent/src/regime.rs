//! Regime initialization and decree loading

use yindent_core::{Regime, YindentConfig};

/// Check if a decree should be loaded based on config.
/// Returns true if: no config, no decree entry, or enabled != false
fn should_load_decree(config: Option<&YindentConfig>, key: &str) -> bool {
    config
        .and_then(|c| c.decree.get(key))
        .is_none_or(|s| s.is_enabled())
}

/// Build the regime for one run.
pub fn init_regime(decree_config: Option<&YindentConfig>) -> Regime {
    let mut regime = Regime::new();

    if should_load_decree(decree_config, "yaml") {
        if let Some(config) = decree_config
            && let Some(yaml_settings) = config.decree.get("yaml")
        {
            let yaml_config = yindent_indent::config_from_decree_settings(yaml_settings);
            tracing::debug!(?yaml_config, "yaml decree configured");
            regime.add_decree(yindent_indent::init_decree_with_config(yaml_config));
        } else {
            regime.add_decree(yindent_indent::init_decree());
        }
    }

    regime
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_yaml_decree_by_default() {
        let regime = init_regime(None);
        let exts = regime.watched_extensions().unwrap();
        assert!(exts.contains("yml") && exts.contains("yaml"));
    }

    #[test]
    fn disabled_decree_is_skipped() {
        let config = YindentConfig::from_toml("[decree.yaml]\nenabled = false\n").unwrap();
        assert!(init_regime(Some(&config)).is_empty());
    }
}
