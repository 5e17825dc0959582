//! Non-spatial columns derived from each transaction.

use std::collections::BTreeMap;

use hdb_resale_proximity_models::Transaction;
use serde::Deserialize;

use crate::FeatureError;

const REGIONS_TOML: &str = include_str!("../regions.toml");

/// Columns computed from a transaction's own fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFeatures {
    /// Calendar year of the sale.
    pub year: i32,
    /// Month of the sale, 1 through 12.
    pub month: u32,
    /// Years between lease commencement and the sale.
    pub lease_age: Option<i32>,
    /// Planning region of the transaction's town.
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegionsFile {
    regions: BTreeMap<String, Vec<String>>,
}

/// Maps town names to planning regions.
///
/// Lookups ignore case and surrounding whitespace.
#[derive(Debug, Clone, Default)]
pub struct RegionMap {
    towns: BTreeMap<String, String>,
}

impl RegionMap {
    /// The embedded Singapore town grouping.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `regions.toml` is malformed, which the tests
    /// rule out.
    #[must_use]
    pub fn singapore() -> Self {
        Self::from_toml(REGIONS_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded regions.toml: {e}"))
    }

    /// Parses a `[regions]` table of region name to town list.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Regions`] if the TOML is malformed, or
    /// [`FeatureError::DuplicateTown`] if a town is listed under two
    /// regions.
    pub fn from_toml(source: &str) -> Result<Self, FeatureError> {
        let file: RegionsFile = toml::de::from_str(source)?;

        let mut towns = BTreeMap::new();
        for (region, members) in file.regions {
            for town in members {
                let key = normalize(&town);
                if let Some(previous) = towns.insert(key, region.clone()) {
                    return Err(FeatureError::DuplicateTown {
                        town,
                        first: previous,
                        second: region,
                    });
                }
            }
        }

        Ok(Self { towns })
    }

    /// Region for `town`, if known.
    #[must_use]
    pub fn region_for(&self, town: &str) -> Option<&str> {
        self.towns.get(&normalize(town)).map(String::as_str)
    }

    /// Number of towns mapped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.towns.len()
    }

    /// Whether no towns are mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.towns.is_empty()
    }
}

fn normalize(town: &str) -> String {
    town.trim().to_ascii_uppercase()
}

/// Derives year, month, lease age, and region for `transaction`.
#[must_use]
pub fn derive(transaction: &Transaction, regions: &RegionMap) -> DerivedFeatures {
    let year = transaction.year_month.year();

    let region = transaction.town.as_deref().and_then(|town| {
        let region = regions.region_for(town);
        if region.is_none() {
            log::debug!("Transaction {}: no region for town {town:?}", transaction.id);
        }
        region.map(str::to_string)
    });

    DerivedFeatures {
        year,
        month: transaction.year_month.month(),
        lease_age: transaction.lease_commence_year.map(|commenced| year - commenced),
        region,
    }
}
