use anyhow::Result;

use macrolog_core::service::NutritionService;

pub(crate) async fn cmd_estimate(service: &NutritionService, description: &str, json: bool) -> Result<()> {
    let estimate = service.estimate(description).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else {
        let (cal, p, f) = (estimate.calories, estimate.protein, estimate.fiber);
        println!("{}: ~{cal} kcal | Protein: {p}g | Fiber: {f}g", description.trim());
    }
    Ok(())
}
