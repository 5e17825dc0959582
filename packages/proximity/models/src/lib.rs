#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Transaction, amenity, and proximity result types.
//!
//! These types are shared by the proximity engine, the amenity loaders,
//! and the batch feature generator. A transaction whose address could not
//! be geocoded carries no [`Coordinates`] at all rather than a sentinel
//! value, so distance math can never run against a placeholder location.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees (-90..90).
    pub latitude: f64,
    /// Longitude in degrees (-180..180).
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair without validation.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Converts a geocoder response into coordinates.
    ///
    /// Geocoders report "no match" as `(+inf, +inf)`. Any non-finite
    /// component (infinity or NaN) yields `None`.
    #[must_use]
    pub fn from_geocoded(latitude: f64, longitude: f64) -> Option<Self> {
        let coords = Self::new(latitude, longitude);
        coords.is_finite().then_some(coords)
    }

    /// Whether both components are finite numbers.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Error returned when a year-month string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid year-month {value:?}: expected YYYY-MM or YYYY-MM-DD")]
pub struct ParseYearMonthError {
    /// The rejected input.
    pub value: String,
}

/// A calendar month, the granularity at which transactions are dated.
///
/// Ordering is chronological (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Creates a year-month, returning `None` if `month` is not 1-12.
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Option<Self> {
        if matches!(month, 1..=12) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// The month of the year (1-12).
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl FromStr for YearMonth {
    type Err = ParseYearMonthError;

    /// Accepts `YYYY-MM`, or any string starting with a `YYYY-MM-DD` date
    /// (the day and anything after it are ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || ParseYearMonthError {
            value: s.to_string(),
        };

        let date = if trimmed.len() == 7 {
            NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
        } else {
            let prefix = trimmed.get(..10).ok_or_else(err)?;
            NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        };

        date.map(Self::from).map_err(|_| err())
    }
}

impl TryFrom<String> for YearMonth {
    type Error = ParseYearMonthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One resale flat transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Identifier used to correlate output rows back to input rows.
    pub id: String,
    /// Month in which the sale was registered.
    pub year_month: YearMonth,
    /// Resolved location, or `None` if the address could not be geocoded.
    pub location: Option<Coordinates>,
    /// HDB town (e.g. "ANG MO KIO").
    pub town: Option<String>,
    /// Year in which the 99-year lease commenced.
    pub lease_commence_year: Option<i32>,
}

impl Transaction {
    /// Creates a transaction with no town or lease information.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        year_month: YearMonth,
        location: Option<Coordinates>,
    ) -> Self {
        Self {
            id: id.into(),
            year_month,
            location,
            town: None,
            lease_commence_year: None,
        }
    }

    /// Sets the HDB town.
    #[must_use]
    pub fn with_town(mut self, town: impl Into<String>) -> Self {
        self.town = Some(town.into());
        self
    }

    /// Sets the lease commencement year.
    #[must_use]
    pub const fn with_lease_commence_year(mut self, year: i32) -> Self {
        self.lease_commence_year = Some(year);
        self
    }
}

/// A single point of interest within an amenity category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmenityRecord {
    /// Label, unique within its category.
    pub name: String,
    /// Latitude in degrees. May be NaN if the source row was malformed.
    pub latitude: f64,
    /// Longitude in degrees. May be NaN if the source row was malformed.
    pub longitude: f64,
    /// Month the amenity opened. `None` means it has always existed.
    pub opens: Option<YearMonth>,
}

impl AmenityRecord {
    /// Creates an amenity with no opening date.
    #[must_use]
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            opens: None,
        }
    }

    /// Sets the opening month.
    #[must_use]
    pub const fn opening(mut self, opens: YearMonth) -> Self {
        self.opens = Some(opens);
        self
    }

    /// The record's location, or `None` if either component is not finite.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_geocoded(self.latitude, self.longitude)
    }

    /// Whether the amenity existed in the given month.
    #[must_use]
    pub fn is_open_by(&self, year_month: YearMonth) -> bool {
        self.opens.is_none_or(|opens| opens <= year_month)
    }
}

/// A named set of amenities with the parameters used to derive features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmenityCategory {
    /// Category identifier (e.g. `"malls"`), used in feature column names.
    pub id: String,
    /// Amenities in source order. Order decides ties for "nearest".
    pub records: Vec<AmenityRecord>,
    /// Inclusive radius for the "within radius" count, in kilometres.
    pub radius_km: f64,
    /// Whether amenities opening after the transaction month are excluded.
    pub temporal: bool,
}

impl AmenityCategory {
    /// Creates a category.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        records: Vec<AmenityRecord>,
        radius_km: f64,
        temporal: bool,
    ) -> Self {
        Self {
            id: id.into(),
            records,
            radius_km,
            temporal,
        }
    }

    /// Whether `record` is eligible for a transaction dated `year_month`.
    ///
    /// Non-temporal categories admit every record.
    #[must_use]
    pub fn admits(&self, record: &AmenityRecord, year_month: YearMonth) -> bool {
        !self.temporal || record.is_open_by(year_month)
    }
}

/// Identity of the nearest eligible amenity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestAmenity {
    /// Position of the amenity in its category's record list.
    pub index: usize,
    /// Amenity name.
    pub name: String,
    /// Amenity latitude.
    pub latitude: f64,
    /// Amenity longitude.
    pub longitude: f64,
}

/// Proximity features for one transaction against one category.
///
/// Every field is `None` when the transaction's location is unknown.
/// A resolved transaction always has a count; the distance and nearest
/// amenity are `None` only when no amenity was eligible.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProximityResult {
    /// Number of eligible amenities within the category radius (inclusive).
    pub count_within_radius: Option<u32>,
    /// Great-circle distance to the nearest eligible amenity, in kilometres.
    pub distance_to_nearest_km: Option<f64>,
    /// The nearest eligible amenity (first in category order on ties).
    pub nearest: Option<NearestAmenity>,
}

impl ProximityResult {
    /// The result for a transaction whose location is unknown.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            count_within_radius: None,
            distance_to_nearest_km: None,
            nearest: None,
        }
    }

    /// The result for a located transaction with no eligible amenities.
    #[must_use]
    pub const fn none_eligible() -> Self {
        Self {
            count_within_radius: Some(0),
            distance_to_nearest_km: None,
            nearest: None,
        }
    }

    /// Whether this is the "location unknown" outcome.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        self.count_within_radius.is_none()
    }
}
