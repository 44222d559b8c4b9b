//! iopace CLI entry point

use anyhow::{Context, Result};
use clap::CommandFactory;
use iopace::config::cli::Cli;
use iopace::coordinator::Coordinator;
use iopace::output::{json, text};
use iopace::PaceError;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let cli = match Cli::parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage problems are not failures
            let _ = e.print();
            return Ok(());
        }
    };

    init_logging(cli.debug);

    let config = match cli.to_params().and_then(|params| params.into_run_config()) {
        Ok(config) => config,
        Err(e) => return usage(&e),
    };

    let coordinator = match Coordinator::new(config) {
        Ok(coordinator) => coordinator,
        Err(e) => return usage(&e),
    };

    let report = match coordinator.run() {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "run aborted");
            std::process::exit(1);
        }
    };

    text::print_results(&report);

    if let Some(path) = &cli.json {
        json::write_report(path, &report)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("\nJSON report written to {}", path.display());
    }

    Ok(())
}

/// Install the global subscriber; `RUST_LOG` wins over `--debug`
fn init_logging(debug: bool) {
    let default = if debug { "iopace=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .init();
}

fn usage(error: &PaceError) -> Result<()> {
    eprintln!("{}", error);
    eprintln!("{}", Cli::command().render_usage());
    Ok(())
}
