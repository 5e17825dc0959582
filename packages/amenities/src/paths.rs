#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the data directory.
//!
//! All paths are relative to the project root's `data/` directory unless
//! [`DATA_DIR_ENV`] points somewhere else.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "HDB_RESALE_DATA_DIR";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
///
/// # Panics
///
/// Panics if the project root cannot be resolved.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("Failed to find project root from CARGO_MANIFEST_DIR")
        .to_path_buf()
}

/// Returns the data directory: [`DATA_DIR_ENV`] if set, else `data/`
/// under the project root.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .map_or_else(|| project_root().join("data"), PathBuf::from)
}

/// Returns the `amenities/` directory holding one CSV per category.
#[must_use]
pub fn amenities_dir() -> PathBuf {
    data_dir().join("amenities")
}

/// Returns the default cleaned transactions table.
#[must_use]
pub fn transactions_path() -> PathBuf {
    data_dir().join("transactions.csv")
}

/// Returns the `generated/` directory for output artifacts.
#[must_use]
pub fn generated_dir() -> PathBuf {
    data_dir().join("generated")
}

/// Returns the default feature table path.
#[must_use]
pub fn features_path() -> PathBuf {
    generated_dir().join("features.csv")
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_root_contains_workspace_manifest() {
        assert!(project_root().join("Cargo.toml").exists());
    }

    #[test]
    fn generated_paths_nest_under_data_dir() {
        assert!(features_path().starts_with(generated_dir()));
        assert!(amenities_dir().starts_with(data_dir()));
    }
}
