//! Path utilities for RoleChat directory resolution.

use anyhow::Result;
use std::path::PathBuf;

const ROLECHAT_DIR: &str = ".rolechat";
const DATABASE_FILE: &str = "rolechat.db";

/// Environment variable to override the RoleChat directory.
const ROLECHAT_DIR_ENV: &str = "ROLECHAT_DIR";

/// Resolve the RoleChat data directory.
/// Priority: ROLECHAT_DIR env var > ~/.rolechat/
pub fn resolve_rolechat_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ROLECHAT_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(ROLECHAT_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the RoleChat directory exists and return its path.
pub fn ensure_rolechat_dir() -> Result<PathBuf> {
    let dir = resolve_rolechat_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Default database path: ~/.rolechat/rolechat.db
pub fn default_database_path() -> Result<PathBuf> {
    Ok(ensure_rolechat_dir()?.join(DATABASE_FILE))
}
