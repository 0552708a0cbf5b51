//! CLI entrypoint for the rsocket availability probe.
//!
//! Exit status: 0 when the transport binds, 2 when it is unavailable, 1 on
//! I/O errors.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rsocket_core::{FailurePolicy, LoaderConfig};
use rsocket_harness::probe::probe;

/// Check whether the RDMA sockets transport can be loaded on this host.
#[derive(Debug, Parser)]
#[command(name = "rsocket-probe")]
#[command(about = "Report whether the rsocket transport library binds")]
struct Cli {
    /// Library to open (defaults to RSOCKET_LIBRARY, then librdmacm.so.1).
    #[arg(long)]
    library: Option<String>,
    /// Handle policy after a failed attempt: `keep` or `close`.
    #[arg(long)]
    on_failure: Option<String>,
    /// Append load events to this JSONL file.
    #[arg(long)]
    log: Option<PathBuf>,
    /// Write the report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = LoaderConfig::from_env();
    if let Some(library) = cli.library {
        config = config.with_library(library);
    }
    if let Some(policy) = cli.on_failure.as_deref() {
        config = config.with_failure_policy(FailurePolicy::from_str_loose(policy));
    }
    if let Some(log) = cli.log {
        config = config.with_log_path(log);
    }

    let report = probe(config);
    if let Some(reason) = report.log_error.as_deref() {
        eprintln!("rsocket-probe: load log disabled: {reason}");
    }
    let written = match &cli.output {
        Some(path) => report.write_to(path, cli.pretty),
        None => report
            .to_json(cli.pretty)
            .map(|json| println!("{json}"))
            .map_err(Into::into),
    };
    if let Err(err) = written {
        eprintln!("rsocket-probe: {err}");
        return ExitCode::from(1);
    }

    if report.available {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}
