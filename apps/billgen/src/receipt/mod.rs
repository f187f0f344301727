//! # Receipt Module
//!
//! Turns a finalized bill into something a person reads: a terminal or
//! printer rendering, and a file written to disk.
//!
//! ```text
//! Bill ──► ReceiptRenderer ──► text / HTML
//!                  │
//!                  └──► FileExporter ──► Bill_<billNumber>_<date>.<html|txt>
//! ```
//!
//! Rendering never touches the controller or the history store, so an
//! export failure leaves both exactly as they were.

mod export;
mod render;

pub use export::{export_file_name, ExportError, ExportFormat, FileExporter, ReceiptExporter};
pub use render::ReceiptRenderer;
