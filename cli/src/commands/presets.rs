use anyhow::Result;

use macrolog_core::models::{NewPreset, Nutrients};
use macrolog_core::service::NutritionService;

use super::helpers::print_preset_table;

pub(crate) fn cmd_preset_add(
    service: &NutritionService,
    name: &str,
    calories: Option<f64>,
    protein: Option<f64>,
    fiber: Option<f64>,
    json: bool,
) -> Result<()> {
    let nutrients = Nutrients::new(
        calories.unwrap_or(0.0),
        protein.unwrap_or(0.0),
        fiber.unwrap_or(0.0),
    );
    let preset = service.add_preset(&NewPreset::new(name, nutrients)?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&preset)?);
    } else {
        let (id, name, cal) = (preset.id, &preset.name, preset.calories);
        println!("Saved preset [{id}] {name} ({cal:.0} kcal)");
    }
    Ok(())
}

pub(crate) fn cmd_preset_list(service: &NutritionService, json: bool) -> Result<()> {
    let presets = service.list_presets()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&presets)?);
    } else if presets.is_empty() {
        eprintln!("No presets yet. Use `macrolog preset add <name>` to save one.");
    } else {
        print_preset_table(&presets);
    }
    Ok(())
}

pub(crate) fn cmd_preset_delete(service: &NutritionService, id: i64, json: bool) -> Result<()> {
    let existed = service.get_preset(id)?.is_some();
    service.delete_preset(id)?;

    if json {
        println!("{}", serde_json::json!({ "success": true, "deleted": existed }));
    } else if existed {
        println!("Deleted preset {id}");
    } else {
        eprintln!("No preset with id {id}");
    }
    Ok(())
}
