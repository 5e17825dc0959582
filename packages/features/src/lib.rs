#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch feature generation for resale flat transactions.
//!
//! Reads the cleaned transaction table, derives calendar, lease, and region
//! columns, runs every transaction through a
//! [`ProximityFeatureEngine`](hdb_resale_proximity::ProximityFeatureEngine),
//! and writes the resulting feature table.

pub mod derived;
pub mod generate;
pub mod output;
pub mod progress;
pub mod transactions;

use std::path::PathBuf;

pub use derived::{DerivedFeatures, RegionMap, derive};
pub use generate::{FeatureRow, FeatureSummary, generate};
pub use output::{WriteOptions, write_features, write_features_to_path};
pub use transactions::{read_transactions, read_transactions_from};

use thiserror::Error;

/// Errors from reading transactions or writing features.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// I/O error on a named file.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// CSV encoding or decoding error.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// A required transaction column is absent.
    #[error("Transaction table has no {column:?} column")]
    MissingColumn {
        /// The required column.
        column: String,
    },

    /// A transaction field could not be parsed.
    #[error("Invalid {column} {value:?} in transaction row {row}")]
    InvalidField {
        /// 1-based data row number.
        row: usize,
        /// Column name.
        column: String,
        /// The offending cell.
        value: String,
    },

    /// The region table is malformed.
    #[error("Invalid region table: {0}")]
    Regions(#[from] toml::de::Error),

    /// A town appears under two regions.
    #[error("Town {town:?} is listed under both {first} and {second}")]
    DuplicateTown {
        /// The town.
        town: String,
        /// Region seen first.
        first: String,
        /// Region seen second.
        second: String,
    },
}
