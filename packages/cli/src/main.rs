#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for resale flat proximity features.
//!
//! Run without a subcommand for an interactive menu. Logging goes through
//! [`hdb_resale_cli_utils::init_logger`] so `RUST_LOG` output and progress
//! bars share the terminal cleanly.

mod interactive;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hdb_resale_amenities::registry::all_categories;
use hdb_resale_proximity::IndexKind;
use hdb_resale_proximity::haversine::haversine_km;
use hdb_resale_proximity_models::YearMonth;

#[derive(Parser)]
#[command(
    name = "hdb_resale_cli",
    about = "Amenity proximity features for HDB resale transactions"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the feature table for a transactions CSV
    Features {
        /// Cleaned transactions CSV (default: `data/transactions.csv`)
        #[arg(long)]
        transactions: Option<PathBuf>,
        /// Directory holding one CSV per amenity category (default: `data/amenities`)
        #[arg(long)]
        amenities_dir: Option<PathBuf>,
        /// Output CSV (default: `data/generated/features.csv`)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Comma-separated category IDs (overrides `HDB_RESALE_CATEGORIES` env var)
        #[arg(long)]
        categories: Option<String>,
        /// Spatial index: `linear` or `rtree`
        #[arg(long, default_value = "rtree", value_parser = parse_index_kind)]
        index: IndexKind,
        /// Value of the `date_context` column, `YYYY-MM-DD` (default: today)
        #[arg(long)]
        date_context: Option<String>,
        /// Also write the nearest amenity's name for each category
        #[arg(long)]
        with_nearest: bool,
    },
    /// List configured amenity categories
    Categories,
    /// Great-circle distance in kilometres between two points
    Distance {
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lon1: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
        #[arg(allow_negative_numbers = true)]
        lon2: f64,
    },
    /// Proximity features for a single location, as JSON
    Nearest {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Transaction month, `YYYY-MM`
        #[arg(long)]
        month: YearMonth,
        /// Comma-separated category IDs (overrides `HDB_RESALE_CATEGORIES` env var)
        #[arg(long)]
        category: Option<String>,
        /// Directory holding one CSV per amenity category (default: `data/amenities`)
        #[arg(long)]
        amenities_dir: Option<PathBuf>,
    },
}

fn parse_index_kind(value: &str) -> Result<IndexKind, String> {
    value
        .parse()
        .map_err(|_| format!("unknown index {value:?} (expected `linear` or `rtree`)"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = hdb_resale_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi);
    };

    match command {
        Commands::Features {
            transactions,
            amenities_dir,
            output,
            categories,
            index,
            date_context,
            with_nearest,
        } => {
            let defaults = run::FeaturesArgs::default();
            let args = run::FeaturesArgs {
                transactions: transactions.unwrap_or(defaults.transactions),
                amenities_dir: amenities_dir.unwrap_or(defaults.amenities_dir),
                output: output.unwrap_or(defaults.output),
                categories,
                index,
                date_context,
                include_nearest: with_nearest,
            };
            run::features(&multi, &args)?;
        }
        Commands::Categories => run::print_categories(&all_categories()),
        Commands::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
        } => println!("{:.6}", haversine_km(lat1, lon1, lat2, lon2)),
        Commands::Nearest {
            lat,
            lon,
            month,
            category,
            amenities_dir,
        } => {
            let amenities_dir =
                amenities_dir.unwrap_or_else(hdb_resale_amenities::paths::amenities_dir);
            let results = run::nearest(category, &amenities_dir, lat, lon, month)?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_features_flags() {
        let cli = Cli::try_parse_from([
            "hdb_resale_cli",
            "features",
            "--transactions",
            "tx.csv",
            "--index",
            "linear",
            "--categories",
            "malls,parks",
        ])
        .unwrap();
        let Some(Commands::Features {
            transactions,
            index,
            categories,
            output,
            ..
        }) = cli.command
        else {
            panic!("expected features command");
        };
        assert_eq!(transactions, Some(PathBuf::from("tx.csv")));
        assert_eq!(index, IndexKind::Linear);
        assert_eq!(categories.as_deref(), Some("malls,parks"));
        assert_eq!(output, None);
    }

    #[test]
    fn rejects_unknown_index() {
        let result = Cli::try_parse_from(["hdb_resale_cli", "features", "--index", "kd"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_nearest_month() {
        let cli = Cli::try_parse_from([
            "hdb_resale_cli",
            "nearest",
            "--lat",
            "1.35",
            "--lon",
            "103.85",
            "--month",
            "2015-06",
        ])
        .unwrap();
        let Some(Commands::Nearest { month, .. }) = cli.command else {
            panic!("expected nearest command");
        };
        assert_eq!(month, "2015-06".parse::<YearMonth>().unwrap());
    }

    #[test]
    fn distance_takes_four_positionals() {
        let cli = Cli::try_parse_from([
            "hdb_resale_cli",
            "distance",
            "1.30",
            "103.80",
            "1.35",
            "103.85",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Distance { .. })));
    }

    #[test]
    fn distance_accepts_southern_and_western_coordinates() {
        let cli = Cli::try_parse_from([
            "hdb_resale_cli",
            "distance",
            "-33.8688",
            "151.2093",
            "51.5074",
            "-0.1278",
        ])
        .unwrap();
        let Some(Commands::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
        }) = cli.command
        else {
            panic!("expected distance command");
        };
        assert_eq!((lat1, lon1, lat2, lon2), (-33.8688, 151.2093, 51.5074, -0.1278));
    }
}
