//! # Bill Generator
//!
//! Command-line bill generator: build a bill of GST-taxed products for a
//! shop, save it to a local history, print or export the receipt.
//!
//! ## Module Organization
//! ```text
//! billgen/
//! ├── lib.rs          ◄─── You are here (startup & dispatch)
//! ├── cli.rs          ◄─── Argument parsing
//! ├── controller.rs   ◄─── Drafting ⇄ Finalized state machine
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── draft.rs    ◄─── Draft bill (shop + products)
//! │   └── config.rs   ◄─── Configuration file and env
//! ├── receipt/
//! │   ├── render.rs   ◄─── Text / HTML receipts and listings
//! │   └── export.rs   ◄─── Receipt files
//! ├── commands/
//! │   ├── mod.rs      ◄─── Context and dispatch
//! │   ├── bill.rs     ◄─── One-shot generate
//! │   ├── history.rs  ◄─── List, show, delete, export, print
//! │   ├── session.rs  ◄─── Interactive session
//! │   └── config.rs   ◄─── Effective configuration
//! └── error.rs        ◄─── User-facing error type
//! ```

pub mod cli;
pub mod commands;
pub mod controller;
pub mod error;
pub mod receipt;
pub mod state;

use billgen_store::{HistoryStore, SqliteBackend, SqliteConfig};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use commands::Context;
use error::{AppError, AppResult};
use state::AppConfig;

/// Runs one invocation and returns the process exit status.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, to stderr                     │
/// │     • Default: WARN, billgen=info; override with RUST_LOG               │
/// │                                                                         │
/// │  2. Parse Arguments ──────────────────────────────────────────────────► │
/// │                                                                         │
/// │  3. Load Configuration ───────────────────────────────────────────────► │
/// │     • defaults < billgen.toml < BILLGEN_* < --db                        │
/// │                                                                         │
/// │  4. Open History (history commands only) ─────────────────────────────► │
/// │     • SQLite with WAL mode                                              │
/// │     • Run pending migrations                                            │
/// │                                                                         │
/// │  5. Dispatch Command ─────────────────────────────────────────────────► │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(args: Vec<String>) -> u8 {
    init_tracing();

    let cli = match cli::parse(&args) {
        Ok(cli) => cli,
        Err(e) => return report(&e, false, &mut std::io::stdout(), &mut std::io::stderr()),
    };

    let json = cli.command.wants_json();
    match execute(cli).await {
        Ok(()) => 0,
        Err(e) => report(&e, json, &mut std::io::stdout(), &mut std::io::stderr()),
    }
}

/// Prints a failure and returns its exit status.
///
/// JSON commands get the error as a JSON object on stdout; everything else
/// gets `error: <message>` on stderr.
fn report<O: Write, E: Write>(err: &AppError, json: bool, out: &mut O, err_out: &mut E) -> u8 {
    let written = if json {
        serde_json::to_string_pretty(err)
            .map_err(std::io::Error::from)
            .and_then(|body| writeln!(out, "{}", body))
    } else {
        writeln!(err_out, "error: {}", err)
    };
    if let Err(e) = written {
        warn!(error = %e, "Could not print error");
    }
    err.exit_code()
}

async fn execute(cli: Cli) -> AppResult<()> {
    let Cli {
        config_path,
        db_path,
        command,
    } = cli;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if command == Command::Help {
        write!(out, "{}", cli::USAGE)?;
        return Ok(());
    }

    let mut config = AppConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.storage.database_path = Some(path);
    }

    if !command.needs_history() {
        return commands::config::show(&config, &mut out);
    }

    let ctx = open(config).await?;
    let stdin = std::io::stdin();
    let result = commands::dispatch(&ctx, command, stdin.lock(), &mut out).await;

    ctx.history.backend().close().await;
    result
}

/// Opens the history database and builds the command context.
async fn open(config: AppConfig) -> AppResult<Context<SqliteBackend>> {
    let db_path = config.database_path()?;
    debug!(?db_path, "Database path determined");

    let backend = SqliteBackend::new(SqliteConfig::new(&db_path)).await?;
    info!(?db_path, "History database opened");

    Ok(Context::new(config, Arc::new(HistoryStore::new(backend))))
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so receipts and JSON on stdout stay clean.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=billgen=trace` - Show trace for billgen crates only
/// - Default: WARN, INFO for billgen
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,billgen=info,billgen_store=info,sqlx=warn"));

    // Already set when run() is called more than once in a process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
