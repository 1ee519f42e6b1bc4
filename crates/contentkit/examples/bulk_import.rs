//! Run an operation file against a content API
//!
//! This example shows how to:
//! 1. Build a client from environment configuration
//! 2. Load and validate an operation file
//! 3. Run it with stop- or continue-on-error semantics
//! 4. Map the outcome to a process exit code
//!
//! # Prerequisites
//!
//! ```bash
//! export CONTENTKIT_SERVICE_DOMAIN=my-blog
//! export CONTENTKIT_API_KEY=...
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --example bulk_import --features trace -- ops.json \
//!     [--continue-on-error] [--stop-on-error] [--validate-payload] \
//!     [--strict-warnings] [--interval-ms 200] [--json] [--verbose]
//! ```

use contentkit::bulk::{BulkOptions, ErrorPolicy, load_operations};
use contentkit::observability::init_tracing;
use contentkit::{BulkRunResult, ClassifiedError, Client, ClientConfig, Result};
use contentkit_core::diagnostics::sink_for_output;
use std::time::Duration;

#[derive(Debug, Default)]
struct Args {
    file: Option<String>,
    stop_on_error: bool,
    continue_on_error: bool,
    validate_payload: bool,
    strict_warnings: bool,
    interval_ms: u64,
    json: bool,
    verbose: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--stop-on-error" => args.stop_on_error = true,
            "--continue-on-error" => args.continue_on_error = true,
            "--validate-payload" => args.validate_payload = true,
            "--strict-warnings" => args.strict_warnings = true,
            "--json" => args.json = true,
            "--verbose" => args.verbose = true,
            "--interval-ms" => {
                let value = iter.next().unwrap_or_default();
                args.interval_ms = value.parse().map_err(|_| {
                    ClassifiedError::invalid_input(format!(
                        "--interval-ms must be a non-negative integer, got '{}'",
                        value
                    ))
                })?;
            }
            flag if flag.starts_with("--") => {
                return Err(ClassifiedError::invalid_input(format!("unknown flag {}", flag)));
            }
            _ => args.file = Some(arg),
        }
    }
    Ok(args)
}

async fn run(args: &Args) -> Result<BulkRunResult> {
    let file = args
        .file
        .as_deref()
        .ok_or_else(|| ClassifiedError::invalid_input("an operation file is required"))?;

    let policy = ErrorPolicy::from_flags(args.stop_on_error, args.continue_on_error)?;
    let mut options = BulkOptions::default()
        .with_error_policy(policy)
        .with_interval(Duration::from_millis(args.interval_ms))
        .with_verbose(args.verbose);
    if args.validate_payload || args.strict_warnings {
        options = options.with_validation(args.strict_warnings);
    }

    let config = ClientConfig::from_env()?;
    let verbose = args.verbose || config.verbose;
    let client = Client::builder()
        .config(config)
        .verbose(verbose)
        .diagnostics(sink_for_output(args.json))
        .build()?;

    let operations = load_operations(file).await?;
    client.bulk().run(&operations, &options).await
}

#[tokio::main]
async fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = init_tracing(args.verbose) {
        eprintln!("{}", e);
    }

    let code = match run(&args).await {
        Ok(result) => {
            if args.json {
                match serde_json::to_string_pretty(&result) {
                    Ok(text) => println!("{}", text),
                    Err(e) => eprintln!("failed to render result: {}", e),
                }
            } else {
                println!(
                    "{} operations: {} succeeded, {} failed, {} skipped",
                    result.total, result.succeeded, result.failed, result.skipped
                );
                for item in result.results.iter().filter(|r| r.error.is_some()) {
                    if let Some(error) = &item.error {
                        println!("  #{} {} {}: {}", item.index, item.action, item.endpoint, error.message);
                    }
                }
            }
            result.exit_code()
        }
        Err(e) => {
            if args.json {
                let payload = serde_json::json!({ "error": e.to_payload(args.verbose) });
                println!("{}", payload);
            } else {
                eprintln!("error [{}]: {}", e.code(), e);
            }
            e.exit_code()
        }
    };

    std::process::exit(code);
}
