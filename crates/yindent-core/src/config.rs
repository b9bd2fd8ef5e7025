//! Configuration loading for .yindent.toml

use garde::Validate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const CONFIG_FILE: &str = ".yindent.toml";

/// Root configuration from .yindent.toml
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[garde(context(()))]
pub struct YindentConfig {
    /// Default output format for `lint`: "human" or "json".
    #[garde(custom(validate_format))]
    pub format: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub decree: HashMap<String, DecreeSettings>,
}

/// Settings for a specific decree
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[garde(context(()))]
pub struct DecreeSettings {
    #[garde(skip)]
    pub enabled: Option<bool>,

    #[garde(custom(validate_indent_width))]
    pub indent_unit: Option<u32>,
    #[garde(skip)]
    pub indent_block_sequences: Option<bool>,
    #[garde(custom(validate_indicator_value_indent))]
    pub indicator_value_indent: Option<u32>,
    #[garde(skip)]
    pub align_multiline_flow_scalars: Option<bool>,
}

impl DecreeSettings {
    /// Decrees are on unless switched off explicitly.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

// ============================================================================
// Custom Validators
// Note: garde requires `&Option<T>` and `&()` signatures - clippy lints suppressed
// ============================================================================

#[allow(
    clippy::ref_option,
    clippy::trivially_copy_pass_by_ref,
    clippy::option_if_let_else
)]
fn validate_format(value: &Option<String>, _ctx: &()) -> garde::Result {
    if let Some(v) = value {
        match v.as_str() {
            "human" | "json" => Ok(()),
            _ => Err(garde::Error::new(format!(
                "'{v}' is not a valid format - use 'human' or 'json'"
            ))),
        }
    } else {
        Ok(())
    }
}

#[allow(
    clippy::ref_option,
    clippy::trivially_copy_pass_by_ref,
    clippy::option_if_let_else
)]
fn validate_indent_width(value: &Option<u32>, _ctx: &()) -> garde::Result {
    if let Some(v) = value {
        if (2..=16).contains(v) {
            Ok(())
        } else {
            Err(garde::Error::new(format!(
                "{v} is outside the range 2-16 - common values are 2 or 4"
            )))
        }
    } else {
        Ok(())
    }
}

#[allow(
    clippy::ref_option,
    clippy::trivially_copy_pass_by_ref,
    clippy::option_if_let_else
)]
fn validate_indicator_value_indent(value: &Option<u32>, _ctx: &()) -> garde::Result {
    if let Some(v) = value {
        // Measured from the `-` itself, so 1 would glue the value to the dash.
        if (2..=16).contains(v) {
            Ok(())
        } else {
            Err(garde::Error::new(format!(
                "{v} is outside the range 2-16 - the value must leave a space after `-`"
            )))
        }
    } else {
        Ok(())
    }
}

// ============================================================================
// Config Error
// ============================================================================

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

// ============================================================================
// Config Loading
// ============================================================================

impl YindentConfig {
    /// Load configuration from a TOML file with validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read.
    /// Returns `ConfigError::Parse` if the TOML content is invalid.
    /// Returns `ConfigError::Validation` if settings fail validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    ///
    /// See [`YindentConfig::from_file`].
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;

        config
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        for (name, settings) in &config.decree {
            settings
                .validate()
                .map_err(|e| ConfigError::Validation(format!("decree.{name}: {e}")))?;
        }

        Ok(config)
    }

    /// Settings for `name`, or defaults when the table is absent.
    #[must_use]
    pub fn decree_settings(&self, name: &str) -> DecreeSettings {
        self.decree.get(name).cloned().unwrap_or_default()
    }

    /// Load from default location (.yindent.toml in current directory)
    #[must_use]
    pub fn load_default() -> Option<Self> {
        Self::load_default_strict().ok().flatten()
    }

    /// Load from default location, returning error details on failure.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` with details if loading or validation fails.
    pub fn load_default_strict() -> Result<Option<Self>, ConfigError> {
        let cwd = std::env::current_dir()?;
        let config_path = cwd.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(None);
        }

        tracing::debug!(path = %config_path.display(), "loading config");
        Self::from_file(&config_path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_config() {
        let toml = r#"
format = "json"

[decree.yaml]
indent_unit = 4
indent_block_sequences = false
indicator_value_indent = 2
align_multiline_flow_scalars = true
"#;

        let config = YindentConfig::from_toml(toml).unwrap();
        assert_eq!(config.format.as_deref(), Some("json"));

        let yaml = config.decree_settings("yaml");
        assert_eq!(yaml.indent_unit, Some(4));
        assert_eq!(yaml.indent_block_sequences, Some(false));
        assert_eq!(yaml.indicator_value_indent, Some(2));
        assert_eq!(yaml.align_multiline_flow_scalars, Some(true));
        assert!(yaml.is_enabled());
    }

    #[test]
    fn rejects_indent_unit_out_of_range() {
        let settings = DecreeSettings {
            indent_unit: Some(1),
            ..Default::default()
        };

        let result = settings.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("2-16"));
    }

    #[test]
    fn indicator_value_indent_must_clear_the_dash() {
        let settings = DecreeSettings {
            indicator_value_indent: Some(1),
            ..Default::default()
        };
        let err = settings.validate().unwrap_err().to_string();
        assert!(err.contains("space after `-`"), "{err}");

        let two = DecreeSettings {
            indicator_value_indent: Some(2),
            ..Default::default()
        };
        assert!(two.validate().is_ok());
    }

    #[test]
    fn rejects_negative_indent_at_parse() {
        let toml = r"
[decree.yaml]
indent_unit = -2
";
        let result = YindentConfig::from_toml(toml);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_unknown_format() {
        let result = YindentConfig::from_toml("format = \"xml\"\n");
        let Err(ConfigError::Validation(msg)) = result else {
            panic!("expected validation error");
        };
        assert!(msg.contains("human"));
    }

    #[test]
    fn names_the_failing_decree() {
        let toml = "[decree.yaml]\nindicator_value_indent = 40\n";
        let Err(ConfigError::Validation(msg)) = YindentConfig::from_toml(toml) else {
            panic!("expected validation error");
        };
        assert!(msg.starts_with("decree.yaml"));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[decree.yaml]\nenabled = false\n").unwrap();

        let config = YindentConfig::from_file(&path).unwrap();
        assert!(!config.decree_settings("yaml").is_enabled());

        let missing = YindentConfig::from_file(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn accepts_none_values() {
        let settings = DecreeSettings::default();
        assert!(settings.validate().is_ok());
    }
}
