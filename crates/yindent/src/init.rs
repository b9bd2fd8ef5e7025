//! Init command - write .yindent.toml with defaults

use anyhow::Result;
use camino::Utf8PathBuf;
use std::fs;
use yindent_core::CONFIG_FILE;

use crate::cli::InitArgs;

/// Default .yindent.toml template
const DEFAULT_CONFIG: &str = include_str!("../templates/default.yindent.toml");

/// Run the init command to create a .yindent.toml file.
///
/// # Errors
///
/// Returns an error if:
/// - The target path is not a valid UTF-8 path
/// - The target directory does not exist or is not a directory
/// - The config file already exists and `--force` is not set
/// - Writing the config file fails
pub fn run_init(args: InitArgs) -> Result<Utf8PathBuf> {
    let target_dir = if args.path.is_absolute() {
        args.path
    } else {
        let cwd = std::env::current_dir()?;
        Utf8PathBuf::from_path_buf(cwd)
            .map_err(|_| anyhow::anyhow!("non-utf8 path"))?
            .join(&args.path)
    };

    if !target_dir.exists() {
        return Err(anyhow::anyhow!(
            "Target directory does not exist: {target_dir}"
        ));
    }

    if !target_dir.is_dir() {
        return Err(anyhow::anyhow!(
            "Target path is not a directory: {target_dir}"
        ));
    }

    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "{CONFIG_FILE} already exists at {config_path}\nUse --force to overwrite"
        ));
    }

    fs::write(&config_path, DEFAULT_CONFIG)?;
    println!("✓ Created {CONFIG_FILE} at {config_path}");

    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = yindent_core::YindentConfig::from_toml(DEFAULT_CONFIG);
        assert!(
            config.is_ok(),
            "Default config must load as YindentConfig: {:?}",
            config.err()
        );
    }

    #[test]
    fn test_default_config_has_yaml_decree() {
        let config = yindent_core::YindentConfig::from_toml(DEFAULT_CONFIG).unwrap();
        let yaml = config.decree.get("yaml").expect("decree.yaml present");
        assert_eq!(yaml.indent_unit, Some(2));
        assert!(yaml.is_enabled());
    }
}
