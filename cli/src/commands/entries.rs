use anyhow::{Context, Result};

use macrolog_core::models::{EntryType, NewEntry, Nutrients, NutritionEntry};
use macrolog_core::service::NutritionService;

use super::helpers::{local_time, no_neg_zero, print_entry_table};

pub(crate) fn cmd_entries(service: &NutritionService, date: Option<&str>, json: bool) -> Result<()> {
    let range = service.day_range(date)?;
    let entries = service.entries_in_range(&range)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let day = range.date;
    if entries.is_empty() {
        eprintln!("No entries for {day}");
        return Ok(());
    }

    println!("=== {day} ({}) ===\n", service.timezone());
    print_entry_table(&entries, service.timezone());

    let total = entries
        .iter()
        .fold(Nutrients::default(), |acc, e| acc.plus(e.nutrients()));
    let (cal, p, f) = (
        no_neg_zero(total.calories),
        no_neg_zero(total.protein),
        no_neg_zero(total.fiber),
    );
    println!("  TOTAL: {cal:.0} kcal | Protein: {p:.1}g | Fiber: {f:.1}g");
    Ok(())
}

pub(crate) fn cmd_add(
    service: &NutritionService,
    description: &str,
    calories: Option<f64>,
    protein: Option<f64>,
    fiber: Option<f64>,
    entry_type: Option<&str>,
    json: bool,
) -> Result<()> {
    let entry_type = match entry_type {
        Some(t) => t.parse::<EntryType>()?,
        None => EntryType::default(),
    };
    let nutrients = Nutrients::new(
        calories.unwrap_or(0.0),
        protein.unwrap_or(0.0),
        fiber.unwrap_or(0.0),
    );
    let entry = NewEntry::new(description, nutrients, entry_type)?;
    let created = service
        .add_entry(&entry)
        .context("Failed to save entry")?;
    print_created(service, &created, json)
}

pub(crate) async fn cmd_add_estimated(
    service: &NutritionService,
    description: &str,
    json: bool,
) -> Result<()> {
    let created = service.add_estimated_entry(description).await?;
    print_created(service, &created, json)
}

fn print_created(service: &NutritionService, e: &NutritionEntry, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(e)?);
    } else {
        let id = e.id;
        let time = local_time(e.created_at, service.timezone());
        let (desc, cal, p, f, kind) = (&e.description, e.calories, e.protein, e.fiber, e.entry_type);
        println!("Logged [{id}] {desc} at {time}: {cal:.0} kcal | Protein: {p:.1}g | Fiber: {f:.1}g ({kind})");
    }
    Ok(())
}

pub(crate) fn cmd_delete(service: &NutritionService, id: i64, json: bool) -> Result<()> {
    let existed = service.get_entry(id)?.is_some();
    service.delete_entry(id)?;

    if json {
        println!("{}", serde_json::json!({ "success": true, "deleted": existed }));
    } else if existed {
        println!("Deleted entry {id}");
    } else {
        eprintln!("No entry with id {id}");
    }
    Ok(())
}
