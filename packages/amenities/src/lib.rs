#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Amenity categories and their coordinate tables.
//!
//! Each category (schools, malls, parks, MRT stations) is described by a
//! TOML file in `categories/`, embedded at compile time by the
//! [`registry`]. The [`loader`] reads the matching CSV table from the
//! amenities data directory into an
//! [`AmenityCategory`](hdb_resale_proximity_models::AmenityCategory).

pub mod loader;
pub mod paths;
pub mod registry;

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading amenity tables.
#[derive(Debug, Error)]
pub enum AmenityError {
    /// I/O error opening or reading a table.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// CSV decoding error.
    #[error("CSV error in {table}: {source}")]
    Csv {
        /// Table being parsed.
        table: String,
        /// Underlying error.
        source: csv::Error,
    },

    /// A column named in the category config is absent from the table.
    #[error("Column {column:?} missing from {table}")]
    MissingColumn {
        /// Table being parsed.
        table: String,
        /// The configured column name.
        column: String,
    },

    /// A temporally gated category has no opening-date columns configured.
    #[error("Category {id} is temporal but has no opening_year/opening_month columns")]
    MissingOpeningColumns {
        /// Category id.
        id: String,
    },

    /// An opening date cell could not be parsed.
    #[error("Invalid opening date in {table} row {row}: {message}")]
    InvalidOpeningDate {
        /// Table being parsed.
        table: String,
        /// 1-based data row number.
        row: usize,
        /// What was wrong.
        message: String,
    },
}
