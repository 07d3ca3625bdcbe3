use anyhow::{Result, bail};

use macrolog_core::models::{SettingsUpdate, UserSettings};
use macrolog_core::service::NutritionService;

fn print_settings(settings: &UserSettings) {
    let cal = settings.daily_calorie_target;
    let p = settings.daily_protein_target;
    let f = settings.daily_fiber_target;
    println!("Daily targets: {cal} kcal | Protein: {p}g | Fiber: {f}g");
}

pub(crate) fn cmd_settings_show(service: &NutritionService, json: bool) -> Result<()> {
    let settings = service.get_settings()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        print_settings(&settings);
    }
    Ok(())
}

fn merged_update(
    current: &UserSettings,
    calories: Option<i64>,
    protein: Option<i64>,
    fiber: Option<i64>,
) -> SettingsUpdate {
    SettingsUpdate::from_values(
        Some(calories.unwrap_or(current.daily_calorie_target)),
        Some(protein.unwrap_or(current.daily_protein_target)),
        Some(fiber.unwrap_or(current.daily_fiber_target)),
    )
}

/// Change only the targets that were passed; the rest keep their current value.
pub(crate) fn cmd_settings_set(
    service: &NutritionService,
    calories: Option<i64>,
    protein: Option<i64>,
    fiber: Option<i64>,
    json: bool,
) -> Result<()> {
    if calories.is_none() && protein.is_none() && fiber.is_none() {
        bail!("Nothing to change. Pass --calories, --protein and/or --fiber");
    }
    for (flag, value) in [("--calories", calories), ("--protein", protein), ("--fiber", fiber)] {
        if value.is_some_and(|v| v < 0) {
            bail!("{flag} must not be negative");
        }
    }

    let current = service.get_settings()?;
    let settings = service.update_settings(&merged_update(&current, calories, protein, fiber))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        print_settings(&settings);
    }
    Ok(())
}
