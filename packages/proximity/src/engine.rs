//! Per-transaction proximity features across all amenity categories.

use std::collections::BTreeSet;

use hdb_resale_proximity_models::{AmenityCategory, ProximityResult, Transaction};

use crate::index::{self, AmenityIndex, LinearScan};
use crate::{IndexKind, ProximityError, RTreeIndex};

/// Computes proximity features for one transaction against one category.
///
/// Transactions without a resolved location yield
/// [`ProximityResult::unknown`]; no distance is ever computed for them.
/// This is the index-free form of [`AmenityIndex::query`], doing a single
/// linear pass over `category.records`.
///
/// `category.radius_km` must be finite and non-negative, the same
/// condition [`ProximityFeatureEngine::build`] enforces. Debug builds
/// assert it.
#[must_use]
pub fn compute(transaction: &Transaction, category: &AmenityCategory) -> ProximityResult {
    debug_assert!(
        valid_radius(category.radius_km),
        "Category {} has invalid radius {}",
        category.id,
        category.radius_km
    );
    match transaction.location {
        Some(origin) if origin.is_finite() => {
            index::scan(category, origin, transaction.year_month)
        }
        _ => ProximityResult::unknown(),
    }
}

/// Holds one [`AmenityIndex`] per category and answers queries for
/// transactions.
///
/// Built once, then shared read-only (it is `Send + Sync`) across however
/// many workers the caller uses.
pub struct ProximityFeatureEngine {
    indexes: Vec<Box<dyn AmenityIndex>>,
}

impl ProximityFeatureEngine {
    /// Builds an index of the given kind for every category, preserving
    /// category order.
    ///
    /// # Errors
    ///
    /// Returns [`ProximityError::DuplicateCategory`] if two categories share
    /// an id, or [`ProximityError::InvalidRadius`] if a radius is negative
    /// or not finite.
    pub fn build(
        categories: Vec<AmenityCategory>,
        kind: IndexKind,
    ) -> Result<Self, ProximityError> {
        let mut seen = BTreeSet::new();
        for category in &categories {
            if !seen.insert(category.id.clone()) {
                return Err(ProximityError::DuplicateCategory {
                    id: category.id.clone(),
                });
            }
            if !valid_radius(category.radius_km) {
                return Err(ProximityError::InvalidRadius {
                    id: category.id.clone(),
                    radius_km: category.radius_km,
                });
            }
        }

        let indexes = categories
            .into_iter()
            .map(|category| -> Box<dyn AmenityIndex> {
                log::debug!(
                    "Indexing {} ({} amenities, radius {} km, temporal: {}) with {kind} index",
                    category.id,
                    category.records.len(),
                    category.radius_km,
                    category.temporal
                );
                match kind {
                    IndexKind::Linear => Box::new(LinearScan::new(category)),
                    IndexKind::RTree => Box::new(RTreeIndex::new(category)),
                }
            })
            .collect();

        Ok(Self { indexes })
    }

    /// Categories in the order results are reported.
    pub fn categories(&self) -> impl Iterator<Item = &AmenityCategory> {
        self.indexes.iter().map(|index| index.category())
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Whether the engine has no categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Proximity features for `transaction` against the category `category_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ProximityError::UnknownCategory`] if the engine has no
    /// category with that id.
    pub fn compute(
        &self,
        transaction: &Transaction,
        category_id: &str,
    ) -> Result<ProximityResult, ProximityError> {
        let index = self
            .indexes
            .iter()
            .find(|index| index.category().id == category_id)
            .ok_or_else(|| ProximityError::UnknownCategory {
                id: category_id.to_string(),
            })?;

        Ok(query(index.as_ref(), transaction))
    }

    /// Proximity features for `transaction` against every category, in
    /// [`categories`](Self::categories) order.
    #[must_use]
    pub fn compute_all(&self, transaction: &Transaction) -> Vec<ProximityResult> {
        self.indexes
            .iter()
            .map(|index| query(index.as_ref(), transaction))
            .collect()
    }
}

const fn valid_radius(radius_km: f64) -> bool {
    radius_km.is_finite() && radius_km >= 0.0
}

fn query(index: &dyn AmenityIndex, transaction: &Transaction) -> ProximityResult {
    match transaction.location {
        Some(origin) if origin.is_finite() => index.query(origin, transaction.year_month),
        _ => ProximityResult::unknown(),
    }
}
