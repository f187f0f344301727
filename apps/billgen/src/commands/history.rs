//! # History Commands
//!
//! List, search, show, print, export and delete saved bills.

use billgen_core::{Bill, CoreError};
use billgen_store::KeyValueBackend;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use super::{write_json, Context};
use crate::error::AppResult;
use crate::receipt::{ExportFormat, ReceiptExporter};

/// Lists saved bills, newest first, optionally filtered by `search`.
pub async fn list<B, W>(ctx: &Context<B>, search: Option<&str>, json: bool, out: &mut W) -> AppResult<()>
where
    B: KeyValueBackend,
    W: Write,
{
    let bills = match search {
        Some(term) => ctx.history.search(term).await,
        None => ctx.history.list().await,
    };

    if json {
        return write_json(out, &bills);
    }

    if bills.is_empty() {
        let message = if search.is_some_and(|t| !t.trim().is_empty()) {
            "No bills found matching your search"
        } else {
            "No bills generated yet"
        };
        writeln!(out, "{}", message)?;
        return Ok(());
    }

    writeln!(out, "Bill History ({})", bills.len())?;
    for bill in &bills {
        writeln!(out, "{}", ctx.renderer.history_line(bill))?;
    }
    Ok(())
}

/// Shows one bill as a text receipt or JSON.
pub async fn show<B, W>(ctx: &Context<B>, id: &str, json: bool, out: &mut W) -> AppResult<()>
where
    B: KeyValueBackend,
    W: Write,
{
    let bill = find(ctx, id).await?;
    if json {
        write_json(out, &bill)
    } else {
        write!(out, "{}", ctx.renderer.text(&bill))?;
        Ok(())
    }
}

/// Prints the text receipt of a saved bill.
pub async fn print<B, W>(ctx: &Context<B>, id: &str, out: &mut W) -> AppResult<()>
where
    B: KeyValueBackend,
    W: Write,
{
    let bill = find(ctx, id).await?;
    write!(out, "{}", ctx.renderer.text(&bill))?;
    Ok(())
}

/// Writes the receipt of a saved bill to a file.
pub async fn export<B, W>(
    ctx: &Context<B>,
    id: &str,
    format: Option<ExportFormat>,
    dir: Option<PathBuf>,
    out: &mut W,
) -> AppResult<()>
where
    B: KeyValueBackend,
    W: Write,
{
    let bill = find(ctx, id).await?;
    let path = ctx.exporter(format, dir).export(&bill).await?;
    writeln!(out, "Receipt written to {}", path.display())?;
    Ok(())
}

/// Deletes one bill. An unknown id leaves history unchanged and is not an
/// error.
pub async fn delete<B, W>(ctx: &Context<B>, id: &str, out: &mut W) -> AppResult<()>
where
    B: KeyValueBackend,
    W: Write,
{
    if ctx.history.delete_by_id(id).await? {
        info!(bill_id = %id, "Bill deleted");
        writeln!(out, "Deleted bill {}", id)?;
    } else {
        writeln!(out, "No bill with id {}; history unchanged", id)?;
    }
    Ok(())
}

/// Removes every saved bill.
pub async fn clear<B, W>(ctx: &Context<B>, out: &mut W) -> AppResult<()>
where
    B: KeyValueBackend,
    W: Write,
{
    let count = ctx.history.len().await;
    ctx.history.clear().await?;
    info!(count, "History cleared");
    writeln!(out, "Cleared {} bill{}", count, if count == 1 { "" } else { "s" })?;
    Ok(())
}

/// Looks a bill up by id. An unreadable history is an error, not a miss.
async fn find<B: KeyValueBackend>(ctx: &Context<B>, id: &str) -> AppResult<Bill> {
    ctx.history
        .get(id)
        .await?
        .ok_or_else(|| CoreError::BillNotFound(id.to_string()).into())
}
