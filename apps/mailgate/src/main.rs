//! mailgate - Batch email verification with request pacing
//!
//! This is the main CLI application that drives verification runs through
//! the ops crate.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, ConfigCommands, GlobalArgs, VerifyArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use mailgate_config::{Config, RunInput};
use mailgate_errors::Error;
use mailgate_events::EventReceiver;
use mailgate_ops::{
    cancel_pair, verify_batch, CancelHandle, ConfigSnapshot, FixedWindowGate, JsonFileSink,
    MemorySink, OperationResult, OpsContextBuilder, PacingPolicy, RecordSink, StdoutSink,
    VerificationReport,
};
use mailgate_types::{ColorChoice, OutputFormat};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info, warn};

/// Exit status after an interrupted run
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    // The log directory comes from the config file, so load it before tracing
    let config = Config::load_or_default(cli.global.config.as_deref()).await;
    let log_dir = config
        .as_ref()
        .map_or_else(|_| Config::default().log_dir(), Config::log_dir);
    init_tracing(json_mode, cli.global.debug, &log_dir);

    match run(cli, config).await {
        Ok(result) if result.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_INTERRUPTED),
        Err(e) => {
            error!("Application error: {}", e);
            if json_mode {
                let body = serde_json::json!({ "error": e.to_string(), "code": e.code() });
                println!("{body}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(cli: Cli, config: Result<Config, Error>) -> Result<OperationResult, CliError> {
    info!("Starting mailgate v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with proper precedence:
    // 1. File config (or defaults)
    let mut config = config?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global);
    config.validate()?;

    let json_output = cli.global.json || config.general.default_output == OutputFormat::Json;
    let plain = config.general.default_output == OutputFormat::Plain;
    let renderer = OutputRenderer::new(json_output, config.general.color, plain);

    let colors_enabled = !plain
        && match config.general.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
        };

    let (result, renderer) = match cli.command {
        Commands::Config(ConfigCommands::Show) => {
            let source = config_source(cli.global.config.as_deref());
            (
                OperationResult::Config(ConfigSnapshot::new(source, config)),
                renderer,
            )
        }
        Commands::Verify(args) => {
            let mut event_handler = EventHandler::new(colors_enabled, cli.global.debug, json_output);
            let (report, emitted) = run_verify(args, &config, &mut event_handler).await?;
            let renderer = match emitted {
                Emitted::Memory => renderer,
                Emitted::File => renderer.records_emitted(false),
                Emitted::Stdout => renderer.records_emitted(true),
            };
            (OperationResult::Verification(report), renderer)
        }
    };

    // Render final result
    renderer.render_result(&result)?;

    info!("Command completed");
    Ok(result)
}

/// Where the record batch went
enum Emitted {
    Memory,
    File,
    Stdout,
}

/// Build the plan, wire the collaborators and run the verification loop
async fn run_verify(
    args: VerifyArgs,
    config: &Config,
    event_handler: &mut EventHandler,
) -> Result<(VerificationReport, Emitted), CliError> {
    // Run input: file, then environment, then flags
    let mut input = match &args.input {
        Some(path) => RunInput::load(path).await?,
        None => RunInput::default(),
    };
    input.merge_env();
    input.apply_overrides(args.api_key, args.api_secret, args.emails, args.max_results);
    let plan = input.into_plan(config.run.default_max_results)?;

    let verifier = mailgate_net::verifier_from_config(config, &plan.credentials)?;

    let (event_sender, event_receiver) = mailgate_events::channel();
    let (cancel, signal) = cancel_pair();

    let ctx = OpsContextBuilder::new()
        .with_verifier(Arc::new(verifier))
        .with_event_sender(event_sender.clone())
        .with_cancel(signal)
        .build()?;
    let mut gate =
        FixedWindowGate::system(PacingPolicy::from_config(config)).with_events(event_sender);

    let format = args.format.unwrap_or(config.output.format);
    let output = args.output.or_else(|| config.output.path.clone());
    let (mut sink, emitted): (Box<dyn RecordSink>, Emitted) = match output {
        Some(path) if path.as_os_str() == "-" => (Box::new(StdoutSink::new(format)), Emitted::Stdout),
        Some(path) => (Box::new(JsonFileSink::new(path, format)), Emitted::File),
        None => (Box::new(MemorySink::new()), Emitted::Memory),
    };

    let report = execute_with_events(
        verify_batch(&ctx, &plan, &mut gate, sink.as_mut()),
        event_receiver,
        event_handler,
        &cancel,
    )
    .await?;

    if report.cancelled {
        warn!(run_id = %report.run_id, "run ended early; partial results emitted");
    }
    Ok((report, emitted))
}

/// Execute an operation with concurrent event handling
///
/// The first Ctrl-C requests cooperative cancellation; the operation still
/// finishes and returns what it collected.
async fn execute_with_events<F>(
    operation: F,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
    cancel: &CancelHandle,
) -> Result<VerificationReport, CliError>
where
    F: Future<Output = Result<VerificationReport, Error>>,
{
    let mut operation = std::pin::pin!(operation);
    let mut interrupted = false;

    loop {
        select! {
            // Operation completed
            result = &mut operation => {
                // Drain any remaining events
                while let Ok(message) = event_receiver.try_recv() {
                    event_handler.handle_event(&message);
                }
                return result.map_err(Into::into);
            }

            // Event received
            Some(message) = event_receiver.recv() => {
                event_handler.handle_event(&message);
            }

            // Interrupt
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                warn!("interrupt received, cancelling run");
                event_handler.show_interrupt();
                cancel.cancel();
            }
        }
    }
}

/// File the configuration came from, if any
fn config_source(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Config::default_path().ok().filter(|path| path.exists()),
    }
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool, log_dir: &Path) {
    // Check if debug logging is enabled
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;
    let default_filter = |level: &str| {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(format!(
                "{level},mailgate={level},mailgate_ops={level},mailgate_net={level}"
            ))
        })
    };

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        if let Some(file) = create_log_file(log_dir, json_mode) {
            tracing_subscriber::fmt()
                .json()
                .with_writer(file)
                .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                    |_| tracing_subscriber::EnvFilter::new("info,mailgate=debug,mailgate_ops=debug"),
                ))
                .init();
            return;
        }
    }

    if json_mode {
        // JSON mode: suppress all console output to avoid contaminating JSON
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .compact()
            .with_writer(std::io::stderr)
            .with_env_filter(default_filter("warn"))
            .init();
    }
}

/// Open a fresh timestamped log file, announcing it unless in JSON mode
fn create_log_file(log_dir: &Path, json_mode: bool) -> Option<std::fs::File> {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        if !json_mode {
            eprintln!("Warning: Failed to create log directory: {e}");
        }
        return None;
    }

    let log_file = log_dir.join(format!(
        "mailgate-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));

    match std::fs::File::create(&log_file) {
        Ok(file) => {
            if !json_mode {
                eprintln!("Debug logging enabled: {}", log_file.display());
            }
            Some(file)
        }
        Err(e) => {
            if !json_mode {
                eprintln!("Warning: Failed to create log file: {e}");
            }
            None
        }
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs) {
    if let Some(color) = global.color {
        config.general.color = color;
    }
    if global.json {
        config.general.default_output = OutputFormat::Json;
    }
}
