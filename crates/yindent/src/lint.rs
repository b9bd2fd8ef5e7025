//! Lint command implementation

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use yindent_core::Source;

use crate::cli::{LintArgs, OutputFormat};
use crate::config::{load_config, output_format};
use crate::files::collect_all_files;
use crate::output::{SerializableDiagnostic, print_diagnostic};
use crate::regime::init_regime;

/// Lint every file under `args.paths`. Returns true when anything was
/// reported.
pub fn run_lint(args: LintArgs) -> Result<bool> {
    let config = load_config(args.config.as_ref())?;
    let format = output_format(args.json, config.as_ref());

    let regime = init_regime(config.as_ref());
    let files = collect_all_files(&args.paths, regime.watched_extensions().as_ref())?;
    if files.is_empty() {
        eprintln!("No files found");
        return Ok(false);
    }

    let mut reported = false;
    let mut json_out: Vec<SerializableDiagnostic> = Vec::new();
    for path in files {
        let text = fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
        let source = Source {
            path: path.as_path(),
            text: &text,
        };
        let diags = regime.enforce(&[source])?;
        let mut seen = HashSet::new();
        for diag in diags {
            let key = (
                diag.span.start,
                diag.span.end,
                diag.rule.clone(),
                diag.message.clone(),
            );
            if !seen.insert(key) {
                continue;
            }
            match format {
                OutputFormat::Human => print_diagnostic(path.as_str(), &text, &diag),
                OutputFormat::Json => {
                    json_out.push(SerializableDiagnostic::new(path.as_str(), &text, &diag));
                }
            }
            reported = true;
        }
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&json_out)?);
    }

    Ok(reported)
}
