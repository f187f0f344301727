//! # State Module
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐        ┌──────────────────────────────────┐      │
//! │  │   AppConfig      │        │   Draft                          │      │
//! │  │                  │        │                                  │      │
//! │  │  database path   │        │  shop details (kept across bills)│      │
//! │  │  export dir/fmt  │        │  products (cleared per bill)     │      │
//! │  │  currency symbol │        │                                  │      │
//! │  │  default shop    │        │  view() ──► DraftView snapshot   │      │
//! │  └──────────────────┘        └──────────────────────────────────┘      │
//! │                                                                         │
//! │  AppConfig: read-only after startup                                    │
//! │  Draft: owned by the BillController, mutated only through it           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod draft;

pub use config::{AppConfig, ConfigError, DisplaySettings, ExportSettings, ShopDefaults, StorageSettings};
pub use draft::{Draft, DraftLine, DraftView, ShopField};
