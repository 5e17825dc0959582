//! R-tree backed [`AmenityIndex`].
//!
//! Amenities are stored as points on the unit sphere in 3-D Cartesian
//! space. The straight-line (chord) distance between two such points grows
//! monotonically with their great-circle distance, so Euclidean R-tree
//! queries in 3-D order and bound candidates the same way haversine
//! distance would. Every candidate is then re-measured with
//! [`haversine::distance_km`] so the final numbers match [`LinearScan`]
//! bit for bit.
//!
//! [`LinearScan`]: crate::LinearScan

use hdb_resale_proximity_models::{AmenityCategory, Coordinates, ProximityResult, YearMonth};
use rstar::primitives::GeomWithData;
use rstar::{PointDistance, RTree};

use crate::haversine::{self, EARTH_RADIUS_KM};
use crate::index::{AmenityIndex, assemble};

/// Relative slack applied to chord bounds so that rounding in the
/// Cartesian embedding never drops a candidate the haversine check would
/// accept.
const CHORD_SLACK: f64 = 1e-9;

/// A unit-sphere point tagged with its index in the category's records.
type SpherePoint = GeomWithData<[f64; 3], usize>;

/// An [`AmenityIndex`] answering queries from an `rstar` R-tree.
pub struct RTreeIndex {
    category: AmenityCategory,
    tree: RTree<SpherePoint>,
}

impl RTreeIndex {
    /// Builds the tree from a category's records.
    ///
    /// Records with non-finite coordinates are left out of the tree and
    /// logged; they can never match a query.
    #[must_use]
    pub fn new(category: AmenityCategory) -> Self {
        let mut points = Vec::with_capacity(category.records.len());

        for (index, record) in category.records.iter().enumerate() {
            let Some(coords) = record.coordinates() else {
                log::warn!(
                    "Skipping {} amenity {:?}: invalid coordinates ({}, {})",
                    category.id,
                    record.name,
                    record.latitude,
                    record.longitude
                );
                continue;
            };
            points.push(GeomWithData::new(to_unit_sphere(coords), index));
        }

        log::debug!(
            "Built R-tree for {} with {} of {} amenities",
            category.id,
            points.len(),
            category.records.len()
        );

        Self {
            category,
            tree: RTree::bulk_load(points),
        }
    }

    /// Number of amenities stored in the tree.
    #[must_use]
    pub fn size(&self) -> usize {
        self.tree.size()
    }

    fn count_within_radius(
        &self,
        origin: Coordinates,
        query: &[f64; 3],
        year_month: YearMonth,
    ) -> u32 {
        let category = &self.category;
        let matches = |index: usize| {
            let record = &category.records[index];
            category.admits(record, year_month)
                && record.coordinates().is_some_and(|point| {
                    haversine::distance_km(origin, point) <= category.radius_km
                })
        };

        let count = match chord_for_km(category.radius_km) {
            Some(chord) => {
                let bound = widen(chord);
                self.tree
                    .locate_within_distance(*query, bound * bound)
                    .filter(|point| matches(point.data))
                    .count()
            }
            // The radius covers the whole sphere.
            None => self.tree.iter().filter(|point| matches(point.data)).count(),
        };

        u32::try_from(count).unwrap_or(u32::MAX)
    }

    #[allow(clippy::float_cmp)]
    fn nearest(
        &self,
        origin: Coordinates,
        query: &[f64; 3],
        year_month: YearMonth,
    ) -> Option<(usize, f64)> {
        let category = &self.category;
        let mut best: Option<(usize, f64)> = None;
        let mut bound_2 = f64::INFINITY;

        for point in self.tree.nearest_neighbor_iter(query) {
            let distance_2 = point.distance_2(query);
            if distance_2 > bound_2 {
                break;
            }

            let record = &category.records[point.data];
            if !category.admits(record, year_month) {
                continue;
            }
            let Some(coords) = record.coordinates() else {
                continue;
            };

            if best.is_none() {
                // Anything farther than the first eligible hit (plus slack)
                // cannot be nearer by haversine.
                let bound = widen(distance_2.sqrt());
                bound_2 = bound * bound;
            }

            let distance = haversine::distance_km(origin, coords);
            let index = point.data;
            let better = best.is_none_or(|(best_index, best_distance)| {
                distance < best_distance || (distance == best_distance && index < best_index)
            });
            if better {
                best = Some((index, distance));
            }
        }

        best
    }
}

impl AmenityIndex for RTreeIndex {
    fn category(&self) -> &AmenityCategory {
        &self.category
    }

    fn query(&self, origin: Coordinates, year_month: YearMonth) -> ProximityResult {
        let query = to_unit_sphere(origin);
        let count = self.count_within_radius(origin, &query, year_month);
        let nearest = self.nearest(origin, &query, year_month);
        assemble(&self.category, count, nearest)
    }
}

/// Projects a latitude/longitude pair onto the unit sphere.
fn to_unit_sphere(coords: Coordinates) -> [f64; 3] {
    let phi = coords.latitude.to_radians();
    let lambda = coords.longitude.to_radians();
    [phi.cos() * lambda.cos(), phi.cos() * lambda.sin(), phi.sin()]
}

/// Unit-sphere chord length for a great-circle distance in kilometres, or
/// `None` if the distance reaches halfway around the Earth.
fn chord_for_km(km: f64) -> Option<f64> {
    let angle = km / EARTH_RADIUS_KM;
    (angle < std::f64::consts::PI).then(|| 2.0 * (angle / 2.0).sin())
}

fn widen(chord: f64) -> f64 {
    chord.mul_add(1.0 + CHORD_SLACK, CHORD_SLACK)
}
