//! Operations shared by the subcommands and the interactive menu.

use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use hdb_resale_amenities::registry::{CategoryConfig, enabled_categories};
use hdb_resale_amenities::{loader, paths};
use hdb_resale_cli_utils::{IndicatifProgress, MultiProgress};
use hdb_resale_features::{
    FeatureSummary, RegionMap, WriteOptions, generate, read_transactions, write_features_to_path,
};
use hdb_resale_proximity::{IndexKind, ProximityFeatureEngine};
use hdb_resale_proximity_models::{
    AmenityCategory, Coordinates, ProximityResult, Transaction, YearMonth,
};
use serde::Serialize;

/// Inputs for a batch feature run.
pub struct FeaturesArgs {
    pub transactions: PathBuf,
    pub amenities_dir: PathBuf,
    pub output: PathBuf,
    pub categories: Option<String>,
    pub index: IndexKind,
    pub date_context: Option<String>,
    pub include_nearest: bool,
}

impl Default for FeaturesArgs {
    fn default() -> Self {
        Self {
            transactions: paths::transactions_path(),
            amenities_dir: paths::amenities_dir(),
            output: paths::features_path(),
            categories: None,
            index: IndexKind::default(),
            date_context: None,
            include_nearest: false,
        }
    }
}

/// Reads transactions, computes every feature, and writes the table.
///
/// # Errors
///
/// Returns an error if no category is selected, an input table is
/// unreadable or malformed, `date_context` is not a `YYYY-MM-DD` date, or
/// the output cannot be written.
pub fn features(
    multi: &MultiProgress,
    args: &FeaturesArgs,
) -> Result<FeatureSummary, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let date_context = match &args.date_context {
        Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| format!("Invalid --date-context {date:?}: {e}"))?,
        None => chrono::Local::now().date_naive(),
    };

    let engine = load_engine(args.categories.clone(), &args.amenities_dir, args.index)?;
    let transactions = read_transactions(&args.transactions)?;

    let progress = IndicatifProgress::transactions_bar(multi, "Computing features");
    let rows = generate(&engine, &RegionMap::singapore(), &transactions, &progress);

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        paths::ensure_dir(parent)?;
    }
    let categories: Vec<&AmenityCategory> = engine.categories().collect();
    let options = WriteOptions {
        date_context: Some(date_context.to_string()),
        include_nearest: args.include_nearest,
    };
    write_features_to_path(&args.output, &categories, &rows, &options)?;

    let summary = FeatureSummary::of(&rows);
    summary.log();
    log::info!("Feature generation finished in {:.1}s", start.elapsed().as_secs_f64());

    Ok(summary)
}

/// One category's answer for a single location.
#[derive(Debug, Serialize)]
pub struct CategoryProximity {
    pub category: String,
    pub radius_km: f64,
    #[serde(flatten)]
    pub result: ProximityResult,
}

/// Proximity features for one location and month against each selected
/// category.
///
/// # Errors
///
/// Returns an error if no category is selected or an amenity table cannot
/// be loaded.
pub fn nearest(
    categories: Option<String>,
    amenities_dir: &std::path::Path,
    latitude: f64,
    longitude: f64,
    month: YearMonth,
) -> Result<Vec<CategoryProximity>, Box<dyn std::error::Error>> {
    let engine = load_engine(categories, amenities_dir, IndexKind::Linear)?;
    let query = Transaction::new(
        "query",
        month,
        Coordinates::from_geocoded(latitude, longitude),
    );

    Ok(engine
        .categories()
        .zip(engine.compute_all(&query))
        .map(|(category, result)| CategoryProximity {
            category: category.id.clone(),
            radius_km: category.radius_km,
            result,
        })
        .collect())
}

/// Prints the category table.
pub fn print_categories(categories: &[CategoryConfig]) {
    println!(
        "{:<14} {:<24} {:>7} {:>9} {:>8}  FILE",
        "ID", "NAME", "RADIUS", "TEMPORAL", "ENABLED"
    );
    println!("{}", "-".repeat(82));
    for category in categories {
        let radius = format!("{} km", category.radius_km);
        println!(
            "{:<14} {:<24} {:>7} {:>9} {:>8}  {}",
            category.id,
            category.name,
            radius,
            category.temporal,
            category.enabled,
            category.file
        );
    }
}

fn load_engine(
    filter: Option<String>,
    amenities_dir: &std::path::Path,
    kind: IndexKind,
) -> Result<ProximityFeatureEngine, Box<dyn std::error::Error>> {
    let configs = enabled_categories(filter);
    if configs.is_empty() {
        return Err("No amenity categories selected".into());
    }

    log::info!(
        "Loading {} categor{}: {}",
        configs.len(),
        if configs.len() == 1 { "y" } else { "ies" },
        configs
            .iter()
            .map(|c| c.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let categories = loader::load_all(&configs, amenities_dir)?;
    Ok(ProximityFeatureEngine::build(categories, kind)?)
}

#[cfg(test)]
mod tests {
    use hdb_resale_cli_utils::ProgressDrawTarget;

    use super::*;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("hdb_resale_cli_{name}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("malls.csv"),
            "address,LATITUDE,LONGITUDE\nJunction 8,1.3501,103.8486\nAMK Hub,1.3692,103.8483\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("mrt_stations.csv"),
            "Name,LATITUDE,LONGITUDE,Opening year,Opening month\n\
             Bishan,1.3510,103.8485,1987,11\n\
             Bright Hill,1.3600,103.8400,2024,6\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn nearest_reports_each_selected_category() {
        let dir = fixture_dir("nearest");
        let results = nearest(
            Some("malls,mrt_stations".to_string()),
            &dir,
            1.3508,
            103.8480,
            "2015-06".parse().unwrap(),
        )
        .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(ids, ["malls", "MRT_stations"]);
        assert_eq!(results[0].result.nearest.as_ref().unwrap().name, "Junction 8");
        assert_eq!(results[1].result.count_within_radius, Some(1));

        let json = serde_json::to_value(&results[1]).unwrap();
        assert_eq!(json["category"], "MRT_stations");
        assert_eq!(json["count_within_radius"], 1);
    }

    #[test]
    fn unresolved_location_is_unknown() {
        let dir = fixture_dir("unresolved");
        let results = nearest(
            Some("malls".to_string()),
            &dir,
            f64::INFINITY,
            f64::INFINITY,
            "2015-06".parse().unwrap(),
        )
        .unwrap();
        assert!(results[0].result.is_unknown());
    }

    #[test]
    fn features_writes_output_table() {
        let dir = fixture_dir("features");
        let transactions = dir.join("transactions.csv");
        std::fs::write(
            &transactions,
            "month,town,lease_commence_date,latitude,longitude\n\
             2015-06,BISHAN,1988,1.3508,103.8480\n\
             2015-07,BISHAN,1988,inf,inf\n",
        )
        .unwrap();

        let args = FeaturesArgs {
            transactions,
            amenities_dir: dir.clone(),
            output: dir.join("generated").join("features.csv"),
            categories: Some("malls,MRT_stations".to_string()),
            index: IndexKind::RTree,
            date_context: Some("2024-01-15".to_string()),
            include_nearest: false,
        };
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let summary = features(&multi, &args).unwrap();

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.unresolved, 1);
        let written = std::fs::read_to_string(&args.output).unwrap();
        assert!(written.starts_with("id,year_month"));
        assert!(written.contains("no_of_MRT_stations_within_2_km"));
        assert_eq!(written.lines().count(), 3);
    }

    #[test]
    fn rejects_malformed_date_context() {
        let args = FeaturesArgs {
            date_context: Some("15/01/2024".to_string()),
            ..FeaturesArgs::default()
        };
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        assert!(features(&multi, &args).is_err());
    }

    #[test]
    fn empty_filter_is_an_error() {
        let dir = fixture_dir("empty");
        let err = nearest(
            Some("hawker_centres".to_string()),
            &dir,
            1.35,
            103.85,
            "2015-06".parse().unwrap(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("No amenity categories"));
    }
}
