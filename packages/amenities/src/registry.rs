//! Compile-time registry of amenity category configurations.
//!
//! Each category is defined in a TOML file under `categories/`. Adding a
//! category requires creating the TOML file and adding an entry to
//! [`CATEGORY_TOMLS`].

use serde::Deserialize;

/// An amenity category configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    /// Unique identifier, used in feature column names (e.g. `"malls"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this category is part of the default feature set.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Inclusive radius for the "within radius" count, in kilometres.
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
    /// Whether amenities are gated by their opening month.
    #[serde(default)]
    pub temporal: bool,
    /// CSV file name inside the amenities directory.
    pub file: String,
    /// Which CSV columns hold each field.
    pub columns: ColumnMapping,
}

/// CSV column names for an amenity table.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnMapping {
    /// Column holding the amenity's name or address.
    pub name: String,
    /// Latitude column.
    #[serde(default = "default_latitude")]
    pub latitude: String,
    /// Longitude column.
    #[serde(default = "default_longitude")]
    pub longitude: String,
    /// Opening year column (temporal categories only).
    pub opening_year: Option<String>,
    /// Opening month column, numeric or month name (temporal categories only).
    pub opening_month: Option<String>,
}

const fn default_true() -> bool {
    true
}

const fn default_radius_km() -> f64 {
    2.0
}

fn default_latitude() -> String {
    "LATITUDE".to_string()
}

fn default_longitude() -> String {
    "LONGITUDE".to_string()
}

// ── Compile-time embedded TOML files ────────────────────────────────

const CATEGORY_TOMLS: &[(&str, &str)] = &[
    ("malls", include_str!("../categories/malls.toml")),
    ("schools", include_str!("../categories/schools.toml")),
    ("parks", include_str!("../categories/parks.toml")),
    ("mrt_stations", include_str!("../categories/mrt_stations.toml")),
];

#[cfg(test)]
const EXPECTED_CATEGORY_COUNT: usize = 4;

/// Environment variable holding a comma-separated category filter.
pub const CATEGORIES_ENV: &str = "HDB_RESALE_CATEGORIES";

/// Returns all amenity category configurations (enabled and disabled), in
/// feature column order.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught by tests.
#[must_use]
pub fn all_categories() -> Vec<CategoryConfig> {
    CATEGORY_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse amenity category '{name}': {e}"))
        })
        .collect()
}

/// Returns the categories to compute, filtered by the `--categories` CLI
/// flag or the [`CATEGORIES_ENV`] environment variable. Without a filter,
/// every enabled category is returned.
///
/// Filters match category ids case-insensitively and may name disabled
/// categories.
#[must_use]
pub fn enabled_categories(cli_filter: Option<String>) -> Vec<CategoryConfig> {
    let filter = cli_filter.or_else(|| std::env::var(CATEGORIES_ENV).ok());

    let all = all_categories();

    let Some(filter_str) = filter else {
        return all.into_iter().filter(|c| c.enabled).collect();
    };

    let ids: Vec<&str> = filter_str
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let filtered: Vec<CategoryConfig> = all
        .into_iter()
        .filter(|c| ids.iter().any(|id| id.eq_ignore_ascii_case(&c.id)))
        .collect();

    if filtered.is_empty() {
        log::warn!(
            "No matching amenity categories for filter {:?}. Available: {}",
            ids,
            all_categories()
                .iter()
                .map(|c| c.id.clone())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_categories() {
        let categories = all_categories();
        assert_eq!(
            categories.len(),
            EXPECTED_CATEGORY_COUNT,
            "Expected {EXPECTED_CATEGORY_COUNT} amenity categories, found {}. \
             Update EXPECTED_CATEGORY_COUNT after adding/removing categories.",
            categories.len()
        );
    }

    #[test]
    fn category_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for category in &all_categories() {
            assert!(
                seen.insert(category.id.to_ascii_lowercase()),
                "Duplicate amenity category ID: {}",
                category.id
            );
        }
    }

    #[test]
    fn all_categories_have_required_fields() {
        for category in &all_categories() {
            assert!(!category.id.is_empty(), "Category has empty id");
            assert!(
                !category.name.is_empty(),
                "Category {} has empty name",
                category.id
            );
            assert!(
                category.file.ends_with(".csv"),
                "Category {} file is not a CSV: {}",
                category.id,
                category.file
            );
            assert!(
                category.radius_km.is_finite() && category.radius_km > 0.0,
                "Category {} has invalid radius {}",
                category.id,
                category.radius_km
            );
            if category.temporal {
                assert!(
                    category.columns.opening_year.is_some()
                        && category.columns.opening_month.is_some(),
                    "Temporal category {} lacks opening columns",
                    category.id
                );
            }
        }
    }

    #[test]
    fn only_stations_are_temporal() {
        let temporal: Vec<String> = all_categories()
            .into_iter()
            .filter(|c| c.temporal)
            .map(|c| c.id)
            .collect();
        assert_eq!(temporal, ["MRT_stations"]);
    }

    #[test]
    fn cli_filter_selects_case_insensitively() {
        let selected = enabled_categories(Some("mrt_stations, parks".to_string()));
        let ids: Vec<&str> = selected.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["parks", "MRT_stations"]);
    }

    #[test]
    fn unknown_filter_selects_nothing() {
        assert!(enabled_categories(Some("hawker_centres".to_string())).is_empty());
    }
}
