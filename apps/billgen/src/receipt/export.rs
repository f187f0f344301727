//! # Receipt Export
//!
//! Writes a rendered receipt to a file named after the bill.
//!
//! ## File Name
//! ```text
//! Bill_BILL-20240115-143052_2024-01-15T14-30-52.123Z.html
//! │    │                    │                        │
//! │    │                    │                        └── format extension
//! │    │                    └── finalization time, ':' replaced by '-'
//! │    └── bill number
//! └── fixed prefix
//! ```

use billgen_core::Bill;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use super::ReceiptRenderer;

// =============================================================================
// Export Format
// =============================================================================

/// Output format of an exported receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Standalone printable HTML document.
    #[default]
    Html,

    /// Plain text, same layout as the terminal receipt.
    #[serde(alias = "txt")]
    Text,
}

impl ExportFormat {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Text => "txt",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Html => write!(f, "html"),
            ExportFormat::Text => write!(f, "text"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" | "htm" => Ok(ExportFormat::Html),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => Err(format!(
                "Unknown export format: '{}'. Valid options: html, text",
                other
            )),
        }
    }
}

// =============================================================================
// Export Error
// =============================================================================

/// Receipt export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Target directory is missing or is not a directory.
    #[error("{} is not a directory", .0.display())]
    InvalidDirectory(PathBuf),

    /// Writing the file failed.
    #[error("could not write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Exporter
// =============================================================================

/// Writes a finalized bill somewhere a user can pick it up.
pub trait ReceiptExporter: Send + Sync {
    /// Exports `bill`, returning where it was written.
    fn export(&self, bill: &Bill) -> impl Future<Output = Result<PathBuf, ExportError>> + Send;
}

/// Builds `Bill_<billNumber>_<date>.<ext>`.
///
/// `date` is the finalization time in RFC 3339 UTC with milliseconds, the
/// same text the bill carries, with `:` swapped for `-`.
pub fn export_file_name(bill: &Bill, format: ExportFormat) -> String {
    let date = bill
        .date
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(':', "-");
    format!("Bill_{}_{}.{}", bill.bill_number, date, format.extension())
}

/// Writes receipts into a directory.
#[derive(Debug, Clone)]
pub struct FileExporter {
    directory: PathBuf,
    format: ExportFormat,
    renderer: ReceiptRenderer,
}

impl FileExporter {
    /// Creates an exporter writing `format` files into `directory`.
    pub fn new(directory: impl Into<PathBuf>, format: ExportFormat, renderer: ReceiptRenderer) -> Self {
        FileExporter {
            directory: directory.into(),
            format,
            renderer,
        }
    }
}

impl ReceiptExporter for FileExporter {
    async fn export(&self, bill: &Bill) -> Result<PathBuf, ExportError> {
        let is_dir = tokio::fs::metadata(&self.directory)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(ExportError::InvalidDirectory(self.directory.clone()));
        }

        let path = self.directory.join(export_file_name(bill, self.format));
        let contents = self.renderer.render(bill, self.format);
        debug!(path = %path.display(), bytes = contents.len(), "Writing receipt");

        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;

        info!(bill_number = %bill.bill_number, path = %path.display(), "Receipt exported");
        Ok(path)
    }
}
