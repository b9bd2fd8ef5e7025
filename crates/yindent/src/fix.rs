//! Fix command implementation - indentation rewriting

use anyhow::{Context, Result};
use std::fs;
use yindent_core::Source;

use crate::cli::FixArgs;
use crate::config::load_config;
use crate::files::collect_all_files;
use crate::regime::init_regime;

/// Counts from one `fix` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixSummary {
    pub checked: usize,
    pub changed: usize,
}

/// Fix (or with `--check`, only detect) indentation in every file under
/// `args.paths`.
pub fn run_fix(args: FixArgs) -> Result<FixSummary> {
    let config = load_config(args.config.as_ref())?;
    let regime = init_regime(config.as_ref());
    let files = collect_all_files(&args.paths, regime.watched_extensions().as_ref())?;
    if files.is_empty() {
        eprintln!("No files found");
        return Ok(FixSummary::default());
    }

    let mut summary = FixSummary::default();
    for path in files {
        let original =
            fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
        let source = Source {
            path: path.as_path(),
            text: &original,
        };
        summary.checked += 1;

        let Some(fixed) = regime.fix(&source) else {
            continue;
        };
        summary.changed += 1;
        if args.check {
            println!("Would fix: {path}");
        } else {
            fs::write(&path, &fixed).with_context(|| format!("failed to write {path}"))?;
            println!("Fixed: {path}");
        }
    }

    let FixSummary { checked, changed } = summary;
    if changed == 0 {
        println!("All {checked} file(s) already compliant.");
    } else if args.check {
        println!("{changed} file(s) out of {checked} would be fixed.");
    } else {
        println!("Fixed {changed} file(s) out of {checked} checked.");
    }

    Ok(summary)
}
