//! Reads amenity coordinate tables into [`AmenityCategory`] values.
//!
//! Tables are CSV files with a header row. Coordinates that are empty or
//! unparsable become NaN and are skipped at query time; a missing
//! configured column or a malformed opening date fails the whole load.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use chrono::Month;
use csv::StringRecord;
use hdb_resale_proximity_models::{AmenityCategory, AmenityRecord, YearMonth};

use crate::AmenityError;
use crate::registry::CategoryConfig;

/// Loads the table for `config` from `dir`.
///
/// # Errors
///
/// Returns [`AmenityError`] if the file cannot be read, a configured column
/// is missing, or an opening date is malformed.
pub fn load_category(
    config: &CategoryConfig,
    dir: &Path,
) -> Result<AmenityCategory, AmenityError> {
    let path = dir.join(&config.file);
    let file = std::fs::File::open(&path).map_err(|source| AmenityError::Io {
        path: path.clone(),
        source,
    })?;

    let category = load_from_reader(config, file)?;
    log::info!(
        "Loaded {} {} from {}",
        category.records.len(),
        config.id,
        path.display()
    );
    Ok(category)
}

/// Loads every category in `configs` from `dir`, preserving order.
///
/// # Errors
///
/// Returns the first [`AmenityError`] encountered.
pub fn load_all(
    configs: &[CategoryConfig],
    dir: &Path,
) -> Result<Vec<AmenityCategory>, AmenityError> {
    configs.iter().map(|config| load_category(config, dir)).collect()
}

/// Parses an amenity table from any reader.
///
/// # Errors
///
/// Returns [`AmenityError`] if the CSV is malformed, a configured column
/// is missing, or an opening date is malformed.
pub fn load_from_reader<R: Read>(
    config: &CategoryConfig,
    reader: R,
) -> Result<AmenityCategory, AmenityError> {
    let table = config.file.as_str();
    let csv_err = |source| AmenityError::Csv {
        table: table.to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers().map_err(csv_err)?.clone();

    let columns = Columns::resolve(config, &headers)?;

    let mut records = Vec::new();
    let mut names = BTreeSet::new();
    let mut invalid_coordinates = 0_usize;

    for (i, row) in reader.records().enumerate() {
        let row = row.map_err(csv_err)?;
        let row_number = i + 1;

        let name = row.get(columns.name).unwrap_or_default().to_string();
        let latitude = parse_coordinate(row.get(columns.latitude));
        let longitude = parse_coordinate(row.get(columns.longitude));
        if !latitude.is_finite() || !longitude.is_finite() {
            invalid_coordinates += 1;
            log::warn!("{table} row {row_number} ({name:?}) has no usable coordinates");
        }

        if !names.insert(name.clone()) {
            log::warn!("{table} row {row_number}: duplicate amenity name {name:?}");
        }

        let mut record = AmenityRecord::new(name, latitude, longitude);
        if let Some((year_col, month_col)) = columns.opening {
            record.opens = parse_opening(row.get(year_col), row.get(month_col)).map_err(
                |message| AmenityError::InvalidOpeningDate {
                    table: table.to_string(),
                    row: row_number,
                    message,
                },
            )?;
        }
        records.push(record);
    }

    if invalid_coordinates > 0 {
        log::warn!(
            "{table}: {invalid_coordinates} of {} amenities will be ignored (invalid coordinates)",
            records.len()
        );
    }

    Ok(AmenityCategory::new(
        config.id.clone(),
        records,
        config.radius_km,
        config.temporal,
    ))
}

/// Column positions resolved against a table's header row.
struct Columns {
    name: usize,
    latitude: usize,
    longitude: usize,
    opening: Option<(usize, usize)>,
}

impl Columns {
    fn resolve(config: &CategoryConfig, headers: &StringRecord) -> Result<Self, AmenityError> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(column))
                .ok_or_else(|| AmenityError::MissingColumn {
                    table: config.file.clone(),
                    column: column.to_string(),
                })
        };

        let opening = if config.temporal {
            let (Some(year), Some(month)) =
                (&config.columns.opening_year, &config.columns.opening_month)
            else {
                return Err(AmenityError::MissingOpeningColumns {
                    id: config.id.clone(),
                });
            };
            Some((find(year)?, find(month)?))
        } else {
            None
        };

        Ok(Self {
            name: find(&config.columns.name)?,
            latitude: find(&config.columns.latitude)?,
            longitude: find(&config.columns.longitude)?,
            opening,
        })
    }
}

fn parse_coordinate(cell: Option<&str>) -> f64 {
    cell.and_then(|s| s.parse::<f64>().ok()).unwrap_or(f64::NAN)
}

/// Parses an opening year and month. Both empty means "always open".
fn parse_opening(year: Option<&str>, month: Option<&str>) -> Result<Option<YearMonth>, String> {
    let year = year.unwrap_or_default();
    let month = month.unwrap_or_default();

    match (year.is_empty(), month.is_empty()) {
        (true, true) => return Ok(None),
        (false, true) | (true, false) => {
            return Err(format!("incomplete opening date (year {year:?}, month {month:?})"));
        }
        (false, false) => {}
    }

    let year_value = parse_whole_number(year)
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| format!("invalid opening year {year:?}"))?;

    let month_value = parse_whole_number(month)
        .and_then(|m| u32::try_from(m).ok())
        .or_else(|| month.parse::<Month>().ok().map(|m| m.number_from_month()))
        .ok_or_else(|| format!("invalid opening month {month:?}"))?;

    YearMonth::new(year_value, month_value)
        .map(Some)
        .ok_or_else(|| format!("opening month {month_value} out of range"))
}

/// Parses `"2014"` or the float form `"2014.0"` that spreadsheet exports
/// produce.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn parse_whole_number(s: &str) -> Option<i64> {
    s.parse::<i64>().ok().or_else(|| {
        let value = s.parse::<f64>().ok()?;
        (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::all_categories;

    fn config(id: &str) -> CategoryConfig {
        all_categories()
            .into_iter()
            .find(|c| c.id == id)
            .unwrap()
    }

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    #[test]
    fn loads_plain_table_in_order() {
        let csv = "address,LATITUDE,LONGITUDE,POSTAL\n\
                   Junction 8,1.3501,103.8486,579837\n\
                   AMK Hub,1.3692,103.8483,569933\n";
        let category = load_from_reader(&config("malls"), csv.as_bytes()).unwrap();
        assert_eq!(category.id, "malls");
        assert!(!category.temporal);
        assert!((category.radius_km - 2.0).abs() < f64::EPSILON);
        let names: Vec<&str> = category.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Junction 8", "AMK Hub"]);
        assert!(category.records.iter().all(|r| r.opens.is_none()));
    }

    #[test]
    fn loads_opening_dates() {
        let csv = "Name,LATITUDE,LONGITUDE,Opening year,Opening month\n\
                   Bishan,1.3510,103.8485,1987,11\n\
                   Caldecott,1.3375,103.8394,2011.0,October\n\
                   Sentosa,1.2500,103.8200,,\n";
        let category = load_from_reader(&config("MRT_stations"), csv.as_bytes()).unwrap();
        assert!(category.temporal);
        assert_eq!(category.records[0].opens, Some(ym("1987-11")));
        assert_eq!(category.records[1].opens, Some(ym("2011-10")));
        assert_eq!(category.records[2].opens, None);
    }

    #[test]
    fn bad_coordinates_become_nan() {
        let csv = "address,LATITUDE,LONGITUDE\nNowhere,,103.8\nSomewhere,1.3,103.8\n";
        let category = load_from_reader(&config("parks"), csv.as_bytes()).unwrap();
        assert_eq!(category.records.len(), 2);
        assert!(category.records[0].latitude.is_nan());
        assert!(category.records[0].coordinates().is_none());
        assert!(category.records[1].coordinates().is_some());
    }

    #[test]
    fn missing_column_fails_fast() {
        let csv = "address,LAT,LONGITUDE\nSomewhere,1.3,103.8\n";
        let err = load_from_reader(&config("schools"), csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AmenityError::MissingColumn { column, .. } if column == "LATITUDE"));
    }

    #[test]
    fn temporal_table_needs_opening_columns() {
        let csv = "Name,LATITUDE,LONGITUDE\nBishan,1.3510,103.8485\n";
        let err = load_from_reader(&config("MRT_stations"), csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AmenityError::MissingColumn { .. }));
    }

    #[test]
    fn malformed_opening_date_fails_fast() {
        for (year, month) in [("1987", "13"), ("soon", "1"), ("1987", ""), ("1987", "Smarch")] {
            let csv = format!(
                "Name,LATITUDE,LONGITUDE,Opening year,Opening month\nX,1.3,103.8,{year},{month}\n"
            );
            let err = load_from_reader(&config("MRT_stations"), csv.as_bytes()).unwrap_err();
            assert!(
                matches!(err, AmenityError::InvalidOpeningDate { row: 1, .. }),
                "accepted {year}/{month}"
            );
        }
    }

    #[test]
    fn temporal_config_without_columns_is_rejected() {
        let mut cfg = config("MRT_stations");
        cfg.columns.opening_month = None;
        let csv = "Name,LATITUDE,LONGITUDE,Opening year\nX,1.3,103.8,1987\n";
        let err = load_from_reader(&cfg, csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AmenityError::MissingOpeningColumns { .. }));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = std::env::temp_dir().join("hdb_resale_amenities_missing");
        let err = load_category(&config("parks"), &dir).unwrap_err();
        assert!(err.to_string().contains("parks.csv"), "{err}");
        assert!(matches!(err, AmenityError::Io { path, .. } if path.ends_with("parks.csv")));
    }
}
