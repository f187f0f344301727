//! # Commands Module
//!
//! One function per user-facing action. Each takes the shared [`Context`]
//! and a writer, so tests drive them with an in-memory backend and a
//! `Vec<u8>`.
//!
//! ## Command Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Command Categories                               │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────────┐  ┌──────────────────┐  │
//! │  │   Bill           │  │   History            │  │   Session        │  │
//! │  │                  │  │                      │  │                  │  │
//! │  │  generate        │  │  list / search       │  │  shop, add,      │  │
//! │  │                  │  │  show, print         │  │  update, remove, │  │
//! │  │                  │  │  export              │  │  generate, back  │  │
//! │  │                  │  │  delete, clear       │  │                  │  │
//! │  └──────────────────┘  └──────────────────────┘  └──────────────────┘  │
//! │                                                                         │
//! │  ┌──────────────────┐                                                  │
//! │  │   Config         │                                                  │
//! │  │  show effective  │                                                  │
//! │  └──────────────────┘                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod bill;
pub mod config;
pub mod history;
pub mod session;

use billgen_store::{HistoryStore, KeyValueBackend};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::Command;
use crate::error::{AppError, AppResult};
use crate::receipt::{ExportFormat, FileExporter, ReceiptRenderer};
use crate::state::AppConfig;

/// What every command can reach.
pub struct Context<B> {
    pub config: AppConfig,
    pub history: Arc<HistoryStore<B>>,
    pub renderer: ReceiptRenderer,
}

impl<B: KeyValueBackend> Context<B> {
    pub fn new(config: AppConfig, history: Arc<HistoryStore<B>>) -> Self {
        let renderer = ReceiptRenderer::new(config.display.currency_symbol.clone());
        Context {
            config,
            history,
            renderer,
        }
    }

    /// File exporter, with optional per-call overrides of the configured
    /// format and directory.
    pub fn exporter(&self, format: Option<ExportFormat>, dir: Option<PathBuf>) -> FileExporter {
        FileExporter::new(
            dir.unwrap_or_else(|| self.config.export.directory.clone()),
            format.unwrap_or(self.config.export.format),
            self.renderer.clone(),
        )
    }
}

/// Runs a history-backed command.
///
/// `Config` and `Help` are handled before the database is opened.
pub async fn dispatch<B, R, W>(ctx: &Context<B>, command: Command, input: R, out: &mut W) -> AppResult<()>
where
    B: KeyValueBackend,
    R: BufRead,
    W: Write,
{
    match command {
        Command::Generate(args) => bill::generate(ctx, args, out).await.map(|_| ()),
        Command::History { search, json } => history::list(ctx, search.as_deref(), json, out).await,
        Command::Show { id, json } => history::show(ctx, &id, json, out).await,
        Command::Delete { id } => history::delete(ctx, &id, out).await,
        Command::Clear => history::clear(ctx, out).await,
        Command::Export { id, format, dir } => history::export(ctx, &id, format, dir, out).await,
        Command::Print { id } => history::print(ctx, &id, out).await,
        Command::Session => session::run(ctx, input, out).await,
        Command::Config => config::show(&ctx.config, out),
        Command::Help => {
            write!(out, "{}", crate::cli::USAGE)?;
            Ok(())
        }
    }
}

/// Pretty JSON followed by a newline.
pub(crate) fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> AppResult<()> {
    serde_json::to_writer_pretty(&mut *out, value)
        .map_err(|e| AppError::internal(format!("Could not encode JSON: {}", e)))?;
    writeln!(out)?;
    Ok(())
}
