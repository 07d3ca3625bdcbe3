use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use macrolog_core::models::{NutritionEntry, PresetFood};

pub(crate) fn print_entry_table(entries: &[NutritionEntry], tz: Tz) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Fiber")]
        fiber: String,
        #[tabled(rename = "Type")]
        entry_type: String,
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|e| EntryRow {
            id: e.id,
            time: local_time(e.created_at, tz),
            description: truncate(&e.description, 40),
            calories: format!("{:.0}", e.calories),
            protein: format!("{:.1}g", e.protein),
            fiber: format!("{:.1}g", e.fiber),
            entry_type: e.entry_type.to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..6)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_preset_table(presets: &[PresetFood]) {
    #[derive(Tabled)]
    struct PresetRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Fiber")]
        fiber: String,
    }

    let rows: Vec<PresetRow> = presets
        .iter()
        .map(|p| PresetRow {
            id: p.id,
            name: truncate(&p.name, 35),
            calories: format!("{:.0}", p.calories),
            protein: format!("{:.1}g", p.protein),
            fiber: format!("{:.1}g", p.fiber),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// Wall-clock `HH:MM` of an instant in the reference zone.
pub(crate) fn local_time(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%H:%M").to_string()
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
