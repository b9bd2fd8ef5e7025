#![warn(rust_2024_compatibility, clippy::all)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use yindent::cli::{Args, Command};
use yindent::fix::run_fix;
use yindent::init::run_init;
use yindent::lint::run_lint;

fn main() -> Result<()> {
    // stdout carries diagnostics (possibly JSON); logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let exit_code = match args.command {
        Command::Lint(lint) => i32::from(run_lint(lint)?),
        Command::Fix(fix) => {
            let check = fix.check;
            let summary = run_fix(fix)?;
            i32::from(check && summary.changed > 0)
        }
        Command::Init(init) => {
            run_init(init)?;
            0
        }
    };
    std::process::exit(exit_code);
}
