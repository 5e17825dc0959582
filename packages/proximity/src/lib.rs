#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Amenity proximity features for resale flat transactions.
//!
//! For a transaction and an amenity category this crate computes how many
//! amenities lie within the category radius and how far away the nearest
//! one is, using great-circle ([`haversine`]) distance. Temporally gated
//! categories only consider amenities that had opened by the transaction
//! month.
//!
//! The per-category search sits behind the [`AmenityIndex`] trait with two
//! implementations that must agree exactly:
//!
//! * [`LinearScan`] compares against every record.
//! * [`RTreeIndex`] embeds amenities on the unit sphere and answers
//!   queries from an `rstar` R-tree.
//!
//! [`ProximityFeatureEngine`] owns one index per category and is shared
//! read-only across worker threads.

pub mod engine;
pub mod haversine;
pub mod index;
pub mod rtree;

pub use engine::{ProximityFeatureEngine, compute};
pub use index::{AmenityIndex, LinearScan};
pub use rtree::RTreeIndex;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Which [`AmenityIndex`] implementation to build for each category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IndexKind {
    /// Full scan over the category's records.
    Linear,
    /// Unit-sphere R-tree.
    #[default]
    #[serde(rename = "rtree")]
    #[strum(serialize = "rtree")]
    RTree,
}

/// Errors from building or querying a [`ProximityFeatureEngine`].
#[derive(Debug, Error)]
pub enum ProximityError {
    /// A query named a category the engine was not built with.
    #[error("Unknown amenity category: {id}")]
    UnknownCategory {
        /// The requested category id.
        id: String,
    },

    /// Two categories share the same id.
    #[error("Duplicate amenity category: {id}")]
    DuplicateCategory {
        /// The repeated category id.
        id: String,
    },

    /// A category radius is negative or not a finite number.
    #[error("Invalid radius {radius_km} km for amenity category {id}")]
    InvalidRadius {
        /// The offending category id.
        id: String,
        /// The configured radius.
        radius_km: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_kind_parses_cli_names() {
        assert_eq!("linear".parse::<IndexKind>().unwrap(), IndexKind::Linear);
        assert_eq!("rtree".parse::<IndexKind>().unwrap(), IndexKind::RTree);
        assert_eq!(IndexKind::RTree.to_string(), "rtree");
        assert!("kdtree".parse::<IndexKind>().is_err());
    }
}
