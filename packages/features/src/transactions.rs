//! Reads the cleaned transaction table.
//!
//! Required columns are `month`, `latitude`, and `longitude`. `id`, `town`,
//! and `lease_commence_date` are picked up when present. Header lookup is
//! case-insensitive. A coordinate cell that is empty or infinite marks the
//! transaction as unresolved (the geocoder found nothing); any other
//! unparsable value fails the load.

use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use hdb_resale_proximity_models::{Coordinates, Transaction, YearMonth};

use crate::FeatureError;

/// Reads every transaction in the CSV at `path`.
///
/// # Errors
///
/// Returns [`FeatureError`] if the file cannot be opened, a required column
/// is missing, or a field is malformed.
pub fn read_transactions(path: &Path) -> Result<Vec<Transaction>, FeatureError> {
    let file = std::fs::File::open(path).map_err(|source| FeatureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let transactions = read_transactions_from(file)?;
    log::info!("Read {} transactions from {}", transactions.len(), path.display());
    Ok(transactions)
}

/// Reads transactions from any CSV reader.
///
/// # Errors
///
/// Returns [`FeatureError`] if a required column is missing or a field is
/// malformed.
pub fn read_transactions_from<R: Read>(reader: R) -> Result<Vec<Transaction>, FeatureError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut transactions = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row?;
        let row_number = i + 1;
        let cell = |index: usize| row.get(index).unwrap_or_default();

        let year_month = cell(columns.month)
            .parse::<YearMonth>()
            .map_err(|_| invalid(row_number, "month", cell(columns.month)))?;

        let latitude = parse_coordinate(cell(columns.latitude))
            .ok_or_else(|| invalid(row_number, "latitude", cell(columns.latitude)))?;
        let longitude = parse_coordinate(cell(columns.longitude))
            .ok_or_else(|| invalid(row_number, "longitude", cell(columns.longitude)))?;

        let id = columns
            .id
            .map(cell)
            .filter(|id| !id.is_empty())
            .map_or_else(|| row_number.to_string(), str::to_string);

        let location = Coordinates::from_geocoded(latitude, longitude);
        let mut transaction = Transaction::new(id, year_month, location);

        if let Some(town) = columns.town.map(cell).filter(|town| !town.is_empty()) {
            transaction = transaction.with_town(town);
        }

        if let Some(lease) = columns.lease.map(cell).filter(|lease| !lease.is_empty()) {
            let year = lease
                .parse::<i32>()
                .map_err(|_| invalid(row_number, "lease_commence_date", lease))?;
            transaction = transaction.with_lease_commence_year(year);
        }

        transactions.push(transaction);
    }

    let unresolved = transactions.iter().filter(|t| t.location.is_none()).count();
    if unresolved > 0 {
        log::warn!(
            "{unresolved} of {} transactions have no resolved location",
            transactions.len()
        );
    }

    Ok(transactions)
}

struct Columns {
    month: usize,
    latitude: usize,
    longitude: usize,
    id: Option<usize>,
    town: Option<usize>,
    lease: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, FeatureError> {
        let find = |column: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(column));
        let require = |column: &str| {
            find(column).ok_or_else(|| FeatureError::MissingColumn {
                column: column.to_string(),
            })
        };

        Ok(Self {
            month: require("month")?,
            latitude: require("latitude")?,
            longitude: require("longitude")?,
            id: find("id"),
            town: find("town"),
            lease: find("lease_commence_date"),
        })
    }
}

/// Empty cells read as infinity, the geocoder's "not found" marker.
fn parse_coordinate(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return Some(f64::INFINITY);
    }
    cell.parse::<f64>().ok().filter(|value| !value.is_nan())
}

fn invalid(row: usize, column: &str, value: &str) -> FeatureError {
    FeatureError::InvalidField {
        row,
        column: column.to_string(),
        value: value.to_string(),
    }
}
