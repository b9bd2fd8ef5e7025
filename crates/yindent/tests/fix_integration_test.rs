//! Integration tests for the fix and lint commands

use anyhow::Result;
use camino::Utf8PathBuf;
use std::fs;
use tempfile::TempDir;
use yindent::cli::{FixArgs, LintArgs};
use yindent::fix::{FixSummary, run_fix};
use yindent::lint::run_lint;

fn temp_root(temp_dir: &TempDir) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf())
        .map_err(|_| anyhow::anyhow!("non-utf8 path"))
}

fn fix_args(paths: Vec<Utf8PathBuf>, config: Option<Utf8PathBuf>, check: bool) -> FixArgs {
    FixArgs {
        paths,
        config,
        check,
    }
}

#[test]
fn test_fix_rewrites_misindented_yaml() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_root(&temp_dir)?;
    let file = root.join("app.yml");
    fs::write(&file, "a:\n  b: 1\n     c: 2\n")?;

    let summary = run_fix(fix_args(vec![root.clone()], None, false))?;

    assert_eq!(
        summary,
        FixSummary {
            checked: 1,
            changed: 1
        }
    );
    assert_eq!(fs::read_to_string(&file)?, "a:\n  b: 1\n  c: 2\n");
    Ok(())
}

#[test]
fn test_fix_check_leaves_files_untouched() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_root(&temp_dir)?;
    let file = root.join("list.yaml");
    fs::write(&file, "-   a\n- b\n")?;

    let summary = run_fix(fix_args(vec![file.clone()], None, true))?;

    assert_eq!(summary.changed, 1);
    assert_eq!(fs::read_to_string(&file)?, "-   a\n- b\n");
    Ok(())
}

#[test]
fn test_fix_skips_non_yaml_files_in_directories() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_root(&temp_dir)?;
    fs::write(root.join("notes.txt"), "a:\n     b\n")?;
    fs::write(root.join("ok.yml"), "a:\n  b: 1\n")?;

    let summary = run_fix(fix_args(vec![root.clone()], None, false))?;

    assert_eq!(
        summary,
        FixSummary {
            checked: 1,
            changed: 0
        }
    );
    assert_eq!(fs::read_to_string(root.join("notes.txt"))?, "a:\n     b\n");
    Ok(())
}

#[test]
fn test_fix_honours_configured_indent_unit() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_root(&temp_dir)?;
    let config = root.join("custom.toml");
    fs::write(&config, "[decree.yaml]\nindent_unit = 4\n")?;
    let file = root.join("deep.yml");
    fs::write(&file, "a:\n  b:\n    c: 1\n")?;

    run_fix(fix_args(vec![file.clone()], Some(config), false))?;

    assert_eq!(fs::read_to_string(&file)?, "a:\n    b:\n        c: 1\n");
    Ok(())
}

#[test]
fn test_fix_leaves_unparsable_files_alone() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_root(&temp_dir)?;
    let file = root.join("broken.yml");
    fs::write(&file, "a: [1, 2\n")?;

    let summary = run_fix(fix_args(vec![file.clone()], None, false))?;

    assert_eq!(summary.changed, 0);
    assert_eq!(fs::read_to_string(&file)?, "a: [1, 2\n");
    Ok(())
}

#[test]
fn test_invalid_config_is_reported() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_root(&temp_dir)?;
    let config = root.join("bad.toml");
    fs::write(&config, "[decree.yaml]\nindent_unit = 1\n")?;
    fs::write(root.join("a.yml"), "a: 1\n")?;

    let result = run_fix(fix_args(vec![root.clone()], Some(config), false));

    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("2-16"));
    Ok(())
}

#[test]
fn test_lint_reports_until_fixed() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_root(&temp_dir)?;
    fs::write(root.join("app.yml"), "a:\n  b: 1\n     c: 2\n")?;

    let lint = |root: &Utf8PathBuf| {
        run_lint(LintArgs {
            paths: vec![root.clone()],
            config: None,
            json: true,
        })
    };

    assert!(lint(&root)?, "misindented file should be reported");
    run_fix(fix_args(vec![root.clone()], None, false))?;
    assert!(!lint(&root)?, "fixed file should be clean");
    Ok(())
}
