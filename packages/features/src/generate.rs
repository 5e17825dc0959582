//! Parallel feature generation over a batch of transactions.

use std::sync::Arc;

use hdb_resale_proximity::ProximityFeatureEngine;
use hdb_resale_proximity_models::{ProximityResult, Transaction};
use rayon::prelude::*;

use crate::derived::{DerivedFeatures, RegionMap, derive};
use crate::progress::ProgressCallback;

/// Every feature computed for one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow<'a> {
    /// The source transaction.
    pub transaction: &'a Transaction,
    /// Calendar, lease, and region columns.
    pub derived: DerivedFeatures,
    /// One result per engine category, in engine category order.
    pub proximity: Vec<ProximityResult>,
}

/// Computes a [`FeatureRow`] for every transaction.
///
/// Work is spread across the rayon thread pool; the output keeps input
/// order. `progress` advances by one per transaction.
#[must_use]
pub fn generate<'a>(
    engine: &ProximityFeatureEngine,
    regions: &RegionMap,
    transactions: &'a [Transaction],
    progress: &Arc<dyn ProgressCallback>,
) -> Vec<FeatureRow<'a>> {
    progress.set_total(u64::try_from(transactions.len()).unwrap_or(u64::MAX));
    progress.set_message(format!(
        "{} transactions x {} categories",
        transactions.len(),
        engine.len()
    ));

    let rows: Vec<FeatureRow<'a>> = transactions
        .par_iter()
        .map(|transaction| {
            let row = FeatureRow {
                transaction,
                derived: derive(transaction, regions),
                proximity: engine.compute_all(transaction),
            };
            progress.inc(1);
            row
        })
        .collect();

    progress.finish(format!("Computed features for {} transactions", rows.len()));
    rows
}

/// Counts of what a feature run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureSummary {
    /// Rows generated.
    pub rows: usize,
    /// Rows whose transaction had no resolved location.
    pub unresolved: usize,
    /// Proximity cells left empty because the value is unknown.
    pub empty_proximity_cells: usize,
}

impl FeatureSummary {
    /// Tallies `rows`.
    #[must_use]
    pub fn of(rows: &[FeatureRow<'_>]) -> Self {
        rows.iter().fold(Self::default(), |mut summary, row| {
            summary.rows += 1;
            if row.transaction.location.is_none() {
                summary.unresolved += 1;
            }
            summary.empty_proximity_cells += row
                .proximity
                .iter()
                .map(|result| {
                    usize::from(result.count_within_radius.is_none())
                        + usize::from(result.distance_to_nearest_km.is_none())
                })
                .sum::<usize>();
            summary
        })
    }

    /// Logs the summary, warning when any cell is empty.
    pub fn log(&self) {
        log::info!("Generated {} feature rows", self.rows);
        if self.empty_proximity_cells > 0 {
            log::warn!(
                "{} empty proximity cells ({} rows without a location)",
                self.empty_proximity_cells,
                self.unresolved
            );
        }
    }
}
