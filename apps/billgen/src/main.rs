//! # Bill Generator Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging to stderr)
//! 2. Parse the command line
//! 3. Load configuration (file, then environment)
//! 4. Open the history database & run migrations
//! 5. Run the command

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // The actual setup is in lib.rs for testability
    ExitCode::from(billgen::run(std::env::args().collect()).await)
}
