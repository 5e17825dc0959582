//! Menu-driven front end using `dialoguer`, for running the tools without
//! memorizing flags.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, MultiSelect, Select};
use hdb_resale_amenities::paths;
use hdb_resale_amenities::registry::all_categories;
use hdb_resale_cli_utils::MultiProgress;
use hdb_resale_proximity::IndexKind;
use hdb_resale_proximity::haversine::haversine_km;
use hdb_resale_proximity_models::YearMonth;

use crate::run::{self, FeaturesArgs};

enum Action {
    GenerateFeatures,
    LookUpLocation,
    MeasureDistance,
    ListCategories,
}

impl Action {
    const ALL: &[Self] = &[
        Self::GenerateFeatures,
        Self::LookUpLocation,
        Self::MeasureDistance,
        Self::ListCategories,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::GenerateFeatures => "Generate feature table",
            Self::LookUpLocation => "Look up amenities near a location",
            Self::MeasureDistance => "Measure distance between two points",
            Self::ListCategories => "List amenity categories",
        }
    }
}

/// Prompts for an action and runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected operation fails.
pub fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("HDB Resale Proximity Features");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::GenerateFeatures => generate_features(multi)?,
        Action::LookUpLocation => look_up_location()?,
        Action::MeasureDistance => measure_distance()?,
        Action::ListCategories => run::print_categories(&all_categories()),
    }

    Ok(())
}

fn generate_features(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let defaults = FeaturesArgs::default();

    let transactions = prompt_path("Transactions CSV", &defaults.transactions)?;
    let amenities_dir = prompt_path("Amenities directory", &defaults.amenities_dir)?;
    let output = prompt_path("Output CSV", &defaults.output)?;
    let categories = select_categories()?;
    if categories.is_none() {
        println!("No categories selected.");
        return Ok(());
    }

    let kinds = [IndexKind::RTree, IndexKind::Linear];
    let kind_labels: Vec<String> = kinds.iter().map(ToString::to_string).collect();
    let kind = Select::new()
        .with_prompt("Spatial index")
        .items(&kind_labels)
        .default(0)
        .interact()?;

    let include_nearest = Confirm::new()
        .with_prompt("Include nearest amenity names?")
        .default(false)
        .interact()?;

    let args = FeaturesArgs {
        transactions,
        amenities_dir,
        output,
        categories,
        index: kinds[kind],
        date_context: None,
        include_nearest,
    };
    let summary = run::features(multi, &args)?;

    println!(
        "Wrote {} rows to {} ({} without a location)",
        summary.rows,
        args.output.display(),
        summary.unresolved
    );
    Ok(())
}

fn look_up_location() -> Result<(), Box<dyn std::error::Error>> {
    let latitude: f64 = Input::new().with_prompt("Latitude").interact_text()?;
    let longitude: f64 = Input::new().with_prompt("Longitude").interact_text()?;
    let month: YearMonth = Input::new()
        .with_prompt("Transaction month (YYYY-MM)")
        .interact_text()?;

    let Some(categories) = select_categories()? else {
        println!("No categories selected.");
        return Ok(());
    };

    let results = run::nearest(
        Some(categories),
        &paths::amenities_dir(),
        latitude,
        longitude,
        month,
    )?;

    for entry in &results {
        let result = &entry.result;
        match (&result.nearest, result.distance_to_nearest_km) {
            (Some(nearest), Some(distance)) => println!(
                "{:<14} {} within {} km, nearest {} at {distance:.3} km",
                entry.category,
                result.count_within_radius.unwrap_or_default(),
                entry.radius_km,
                nearest.name
            ),
            _ if result.is_unknown() => println!("{:<14} location unknown", entry.category),
            _ => println!("{:<14} none open", entry.category),
        }
    }
    Ok(())
}

fn measure_distance() -> Result<(), Box<dyn std::error::Error>> {
    let lat1: f64 = Input::new().with_prompt("From latitude").interact_text()?;
    let lon1: f64 = Input::new().with_prompt("From longitude").interact_text()?;
    let lat2: f64 = Input::new().with_prompt("To latitude").interact_text()?;
    let lon2: f64 = Input::new().with_prompt("To longitude").interact_text()?;

    println!("{:.3} km", haversine_km(lat1, lon1, lat2, lon2));
    Ok(())
}

/// Checkbox list of enabled categories, all ticked. Returns a
/// comma-separated filter, or `None` if nothing was kept.
fn select_categories() -> Result<Option<String>, Box<dyn std::error::Error>> {
    let categories: Vec<_> = all_categories().into_iter().filter(|c| c.enabled).collect();
    let labels: Vec<String> = categories
        .iter()
        .map(|c| format!("{} ({}, {} km)", c.id, c.name, c.radius_km))
        .collect();
    let selected = MultiSelect::new()
        .with_prompt("Amenity categories (space=toggle, enter=confirm)")
        .items_checked(labels.iter().map(|label| (label, true)))
        .interact()?;

    if selected.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        selected
            .iter()
            .map(|&i| categories[i].id.as_str())
            .collect::<Vec<_>>()
            .join(","),
    ))
}

fn prompt_path(
    prompt: &str,
    default: &std::path::Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .default(default.display().to_string())
        .interact_text()?;
    Ok(PathBuf::from(value))
}
