//! Integration tests for the init command

use anyhow::Result;
use camino::Utf8PathBuf;
use std::fs;
use tempfile::TempDir;
use yindent::cli::InitArgs;
use yindent::init::run_init;

fn temp_root(temp_dir: &TempDir) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf())
        .map_err(|_| anyhow::anyhow!("non-utf8 path"))
}

#[test]
fn test_init_creates_config_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let temp_path = temp_root(&temp_dir)?;
    let config_path = temp_path.join(".yindent.toml");
    assert!(!config_path.exists());

    let written = run_init(InitArgs {
        path: temp_path.clone(),
        force: false,
    })?;

    assert_eq!(written, config_path);
    let config = yindent_core::YindentConfig::from_file(config_path.as_std_path())?;
    assert!(config.decree.contains_key("yaml"));
    Ok(())
}

#[test]
fn test_init_fails_without_force_if_exists() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let temp_path = temp_root(&temp_dir)?;
    let config_path = temp_path.join(".yindent.toml");
    fs::write(&config_path, "# existing content\n")?;

    let result = run_init(InitArgs {
        path: temp_path.clone(),
        force: false,
    });

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("already exists"));
    assert_eq!(fs::read_to_string(&config_path)?, "# existing content\n");
    Ok(())
}

#[test]
fn test_init_overwrites_with_force() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let temp_path = temp_root(&temp_dir)?;
    let config_path = temp_path.join(".yindent.toml");
    fs::write(&config_path, "# old content\n")?;

    run_init(InitArgs {
        path: temp_path.clone(),
        force: true,
    })?;

    let content = fs::read_to_string(&config_path)?;
    assert!(content.contains("[decree.yaml]"));
    assert!(!content.contains("# old content"));
    Ok(())
}

#[test]
fn test_init_fails_on_nonexistent_directory() {
    let result = run_init(InitArgs {
        path: Utf8PathBuf::from("/nonexistent/path/that/does/not/exist"),
        force: false,
    });

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("does not exist"));
}
