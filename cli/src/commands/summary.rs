use anyhow::Result;

use macrolog_core::service::NutritionService;

use super::helpers::{no_neg_zero, print_entry_table};

pub(crate) fn cmd_summary(service: &NutritionService, date: Option<&str>, json: bool) -> Result<()> {
    let (summary, entries) = service.daily_summary_with_entries(date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let date = summary.date;
    println!("=== {date} ===\n");

    if entries.is_empty() {
        println!("  No entries\n");
    } else {
        print_entry_table(&entries, service.timezone());
        println!();
    }

    let t = &summary.totals;
    let (cal, p, f) = (t.calories, t.protein, t.fiber);
    println!("  TOTAL:     {cal:>6.0} kcal | Protein: {p:>5.1}g | Fiber: {f:>5.1}g");

    let g = &summary.targets;
    let (tcal, tp, tf) = (
        g.daily_calorie_target,
        g.daily_protein_target,
        g.daily_fiber_target,
    );
    println!("  TARGET:    {tcal:>6} kcal | Protein: {tp:>5}g | Fiber: {tf:>5}g");

    let r = &summary.remaining;
    let (rcal, rp, rf) = (
        no_neg_zero(r.calories),
        no_neg_zero(r.protein),
        no_neg_zero(r.fiber),
    );
    println!("  REMAINING: {rcal:>6.0} kcal | Protein: {rp:>5.1}g | Fiber: {rf:>5.1}g");
    Ok(())
}
