//! The per-category search seam and the reference linear scan.

use hdb_resale_proximity_models::{
    AmenityCategory, Coordinates, NearestAmenity, ProximityResult, YearMonth,
};

use crate::haversine;

/// A searchable view over one amenity category.
///
/// Implementations must return identical results for identical inputs:
/// records the category does not admit for `year_month` and records with
/// non-finite coordinates are ignored, the radius comparison is inclusive,
/// and the nearest amenity is the first in category order among records
/// at the minimum distance.
pub trait AmenityIndex: Send + Sync {
    /// The category this index was built from.
    fn category(&self) -> &AmenityCategory;

    /// Proximity features for a located transaction dated `year_month`.
    fn query(&self, origin: Coordinates, year_month: YearMonth) -> ProximityResult;
}

/// Compares the origin against every record in the category.
#[derive(Debug, Clone)]
pub struct LinearScan {
    category: AmenityCategory,
}

impl LinearScan {
    /// Wraps a category.
    #[must_use]
    pub const fn new(category: AmenityCategory) -> Self {
        Self { category }
    }
}

impl AmenityIndex for LinearScan {
    fn category(&self) -> &AmenityCategory {
        &self.category
    }

    fn query(&self, origin: Coordinates, year_month: YearMonth) -> ProximityResult {
        scan(&self.category, origin, year_month)
    }
}

/// Single pass over `category.records`.
pub(crate) fn scan(
    category: &AmenityCategory,
    origin: Coordinates,
    year_month: YearMonth,
) -> ProximityResult {
    let mut count: u32 = 0;
    let mut nearest: Option<(usize, f64)> = None;

    for (index, record) in category.records.iter().enumerate() {
        if !category.admits(record, year_month) {
            continue;
        }
        let Some(point) = record.coordinates() else {
            continue;
        };

        let distance = haversine::distance_km(origin, point);
        if distance.is_nan() {
            continue;
        }

        if distance <= category.radius_km {
            count += 1;
        }

        // Strict comparison keeps the earliest record on ties.
        if nearest.is_none_or(|(_, best)| distance < best) {
            nearest = Some((index, distance));
        }
    }

    assemble(category, count, nearest)
}

/// Builds a [`ProximityResult`] from a count and the `(index, distance)`
/// of the nearest eligible record.
pub(crate) fn assemble(
    category: &AmenityCategory,
    count: u32,
    nearest: Option<(usize, f64)>,
) -> ProximityResult {
    let Some((index, distance)) = nearest else {
        return ProximityResult::none_eligible();
    };

    let record = &category.records[index];

    ProximityResult {
        count_within_radius: Some(count),
        distance_to_nearest_km: Some(distance),
        nearest: Some(NearestAmenity {
            index,
            name: record.name.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
        }),
    }
}
