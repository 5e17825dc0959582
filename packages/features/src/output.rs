//! Writes feature rows as CSV.
//!
//! Fixed columns come first, then a count and a distance column per
//! category, then `date_context`. Unknown values are written as empty
//! cells so that downstream readers see them as missing, never as zero.

use std::io::Write;
use std::path::Path;

use hdb_resale_proximity_models::AmenityCategory;

use crate::FeatureError;
use crate::generate::FeatureRow;

const FIXED_COLUMNS: &[&str] = &[
    "id",
    "year_month",
    "year",
    "month",
    "town",
    "region",
    "lease_commence_date",
    "lease_age",
    "latitude",
    "longitude",
];

/// Name of the "amenities within radius" column, e.g.
/// `no_of_malls_within_2_km`.
#[must_use]
pub fn count_column(id: &str, radius_km: f64) -> String {
    format!("no_of_{id}_within_{radius_km}_km")
}

/// Name of the nearest-distance column, e.g. `distance_to_nearest_malls`.
#[must_use]
pub fn distance_column(id: &str) -> String {
    format!("distance_to_nearest_{id}")
}

/// Name of the nearest-amenity label column, e.g. `nearest_malls`.
#[must_use]
pub fn nearest_column(id: &str) -> String {
    format!("nearest_{id}")
}

/// Output options for [`write_features`].
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Value of the `date_context` column, typically the run date.
    pub date_context: Option<String>,
    /// Also write the nearest amenity's name per category.
    pub include_nearest: bool,
}

/// Header row for `categories` under `options`.
#[must_use]
pub fn header(categories: &[&AmenityCategory], options: &WriteOptions) -> Vec<String> {
    let mut header: Vec<String> = FIXED_COLUMNS.iter().map(ToString::to_string).collect();
    for category in categories {
        header.push(count_column(&category.id, category.radius_km));
        header.push(distance_column(&category.id));
        if options.include_nearest {
            header.push(nearest_column(&category.id));
        }
    }
    header.push("date_context".to_string());
    header
}

/// Writes `rows` to the CSV file at `path`.
///
/// # Errors
///
/// Returns [`FeatureError`] if the file cannot be created or written.
pub fn write_features_to_path(
    path: &Path,
    categories: &[&AmenityCategory],
    rows: &[FeatureRow<'_>],
    options: &WriteOptions,
) -> Result<(), FeatureError> {
    let file = std::fs::File::create(path).map_err(|source| FeatureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_features(file, categories, rows, options)?;
    log::info!("Wrote {} feature rows to {}", rows.len(), path.display());
    Ok(())
}

/// Writes a header and one record per row.
///
/// `categories` must be the engine categories that produced `rows`, in
/// the same order.
///
/// # Errors
///
/// Returns [`FeatureError::Csv`] if writing fails.
pub fn write_features<W: Write>(
    writer: W,
    categories: &[&AmenityCategory],
    rows: &[FeatureRow<'_>],
    options: &WriteOptions,
) -> Result<(), FeatureError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(header(categories, options))?;

    let date_context = options.date_context.as_deref().unwrap_or_default();

    for row in rows {
        let transaction = row.transaction;
        let derived = &row.derived;

        let mut record = vec![
            transaction.id.clone(),
            transaction.year_month.to_string(),
            derived.year.to_string(),
            derived.month.to_string(),
            transaction.town.clone().unwrap_or_default(),
            derived.region.clone().unwrap_or_default(),
            cell(transaction.lease_commence_year),
            cell(derived.lease_age),
            cell(transaction.location.map(|l| l.latitude)),
            cell(transaction.location.map(|l| l.longitude)),
        ];

        for result in &row.proximity {
            record.push(cell(result.count_within_radius));
            record.push(cell(result.distance_to_nearest_km));
            if options.include_nearest {
                record.push(
                    result
                        .nearest
                        .as_ref()
                        .map(|nearest| nearest.name.clone())
                        .unwrap_or_default(),
                );
            }
        }
        record.push(date_context.to_string());

        writer.write_record(&record)?;
    }

    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use hdb_resale_proximity::{IndexKind, ProximityFeatureEngine};
    use hdb_resale_proximity_models::{AmenityRecord, Coordinates, Transaction};

    use super::*;
    use crate::derived::RegionMap;
    use crate::generate::generate;
    use crate::progress::null_progress;

    fn engine() -> ProximityFeatureEngine {
        ProximityFeatureEngine::build(
            vec![
                AmenityCategory::new(
                    "malls",
                    vec![AmenityRecord::new("Junction 8", 1.30, 103.80)],
                    2.0,
                    false,
                ),
                AmenityCategory::new("parks", vec![], 1.5, false),
            ],
            IndexKind::Linear,
        )
        .unwrap()
    }

    fn render(
        rows: &[FeatureRow<'_>],
        engine: &ProximityFeatureEngine,
        options: &WriteOptions,
    ) -> String {
        let categories: Vec<&AmenityCategory> = engine.categories().collect();
        let mut out = Vec::new();
        write_features(&mut out, &categories, rows, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn column_names_follow_category_and_radius() {
        assert_eq!(count_column("malls", 2.0), "no_of_malls_within_2_km");
        assert_eq!(count_column("parks", 1.5), "no_of_parks_within_1.5_km");
        assert_eq!(count_column("MRT_stations", 2.0), "no_of_MRT_stations_within_2_km");
        assert_eq!(distance_column("schools"), "distance_to_nearest_schools");
    }

    #[test]
    fn writes_header_and_values() {
        let engine = engine();
        let transactions = vec![
            Transaction::new(
                "a",
                "2019-04".parse().unwrap(),
                Coordinates::from_geocoded(1.30, 103.80),
            )
            .with_town("CLEMENTI")
            .with_lease_commence_year(1980),
        ];
        let regions = RegionMap::singapore();
        let rows = generate(&engine, &regions, &transactions, &null_progress());
        let options = WriteOptions {
            date_context: Some("2024-01-15".to_string()),
            include_nearest: false,
        };
        let csv = render(&rows, &engine, &options);
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "id,year_month,year,month,town,region,lease_commence_date,lease_age,latitude,longitude,\
             no_of_malls_within_2_km,distance_to_nearest_malls,\
             no_of_parks_within_1.5_km,distance_to_nearest_parks,date_context"
        );
        assert_eq!(
            lines.next().unwrap(),
            "a,2019-04,2019,4,CLEMENTI,West,1980,39,1.3,103.8,1,0,0,,2024-01-15"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn unknown_location_writes_empty_cells() {
        let engine = engine();
        let transactions = vec![Transaction::new("b", "2019-04".parse().unwrap(), None)];
        let regions = RegionMap::singapore();
        let rows = generate(&engine, &regions, &transactions, &null_progress());
        let csv = render(&rows, &engine, &WriteOptions::default());

        let record = csv.lines().nth(1).unwrap();
        assert_eq!(record, "b,2019-04,2019,4,,,,,,,,,,,");
    }

    #[test]
    fn nearest_names_are_optional_columns() {
        let engine = engine();
        let transactions = vec![Transaction::new(
            "c",
            "2019-04".parse().unwrap(),
            Coordinates::from_geocoded(1.31, 103.80),
        )];
        let regions = RegionMap::singapore();
        let rows = generate(&engine, &regions, &transactions, &null_progress());
        let options = WriteOptions {
            date_context: None,
            include_nearest: true,
        };
        let csv = render(&rows, &engine, &options);
        let mut reader = csv::Reader::from_reader(csv.as_bytes());

        let headers = reader.headers().unwrap().clone();
        let record = reader.records().next().unwrap().unwrap();
        let value = |name: &str| {
            let index = headers.iter().position(|h| h == name).unwrap();
            record.get(index).unwrap().to_string()
        };
        assert_eq!(value("nearest_malls"), "Junction 8");
        assert_eq!(value("nearest_parks"), "");
        assert_eq!(value("no_of_malls_within_2_km"), "1");
    }
}
