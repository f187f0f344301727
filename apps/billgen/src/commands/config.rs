//! Shows the effective configuration.

use std::io::Write;

use crate::error::AppResult;
use crate::state::AppConfig;

/// Writes the resolved database path followed by the effective TOML.
pub fn show<W: Write>(config: &AppConfig, out: &mut W) -> AppResult<()> {
    match config.database_path() {
        Ok(path) => writeln!(out, "# database: {}", path.display())?,
        Err(e) => writeln!(out, "# database: unavailable ({})", e)?,
    }
    write!(out, "{}", config.to_toml()?)?;
    Ok(())
}
