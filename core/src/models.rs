use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub const DEFAULT_CALORIE_TARGET: i64 = 2000;
pub const DEFAULT_PROTEIN_TARGET: i64 = 150;
pub const DEFAULT_FIBER_TARGET: i64 = 30;

pub const ENTRY_TYPES: &[&str] = &["manual", "ai", "preset"];

/// Where an entry's numbers came from. Display and audit only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    Manual,
    Ai,
    Preset,
}

impl EntryType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Ai => "ai",
            Self::Preset => "preset",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "ai" => Ok(Self::Ai),
            "preset" => Ok(Self::Preset),
            _ => Err(Error::validation(format!(
                "Invalid entry type '{s}'. Use one of: {}",
                ENTRY_TYPES.join(", ")
            ))),
        }
    }
}

/// Calories (kcal), protein (g) and fiber (g).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    pub calories: f64,
    pub protein: f64,
    pub fiber: f64,
}

impl Nutrients {
    /// Build from raw numbers, replacing negative or non-finite values with zero.
    #[must_use]
    pub fn new(calories: f64, protein: f64, fiber: f64) -> Self {
        Self {
            calories: sanitize_amount(calories),
            protein: sanitize_amount(protein),
            fiber: sanitize_amount(fiber),
        }
    }

    /// Build from loosely typed JSON request fields. See [`coerce_nutrient`].
    #[must_use]
    pub fn from_json(calories: Option<&Value>, protein: Option<&Value>, fiber: Option<&Value>) -> Self {
        Self {
            calories: coerce_nutrient(calories),
            protein: coerce_nutrient(protein),
            fiber: coerce_nutrient(fiber),
        }
    }

    #[must_use]
    pub fn plus(self, other: Self) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            fiber: self.fiber + other.fiber,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionEntry {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub calories: f64,
    pub protein: f64,
    pub fiber: f64,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

impl NutritionEntry {
    #[must_use]
    pub fn nutrients(&self) -> Nutrients {
        Nutrients {
            calories: self.calories,
            protein: self.protein,
            fiber: self.fiber,
        }
    }
}

/// A validated entry ready to be stored. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub description: String,
    pub nutrients: Nutrients,
    pub entry_type: EntryType,
}

impl NewEntry {
    pub fn new(description: &str, nutrients: Nutrients, entry_type: EntryType) -> Result<Self> {
        Ok(Self {
            description: validate_description(description)?,
            nutrients: Nutrients::new(nutrients.calories, nutrients.protein, nutrients.fiber),
            entry_type,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetFood {
    pub id: i64,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub fiber: f64,
}

impl PresetFood {
    #[must_use]
    pub fn nutrients(&self) -> Nutrients {
        Nutrients {
            calories: self.calories,
            protein: self.protein,
            fiber: self.fiber,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPreset {
    pub name: String,
    pub nutrients: Nutrients,
}

impl NewPreset {
    pub fn new(name: &str, nutrients: Nutrients) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Name is required"));
        }
        Ok(Self {
            name: name.to_string(),
            nutrients: Nutrients::new(nutrients.calories, nutrients.protein, nutrients.fiber),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub id: i64,
    pub daily_calorie_target: i64,
    pub daily_protein_target: i64,
    pub daily_fiber_target: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub calorie_target: i64,
    pub protein_target: i64,
    pub fiber_target: i64,
}

impl Default for SettingsUpdate {
    fn default() -> Self {
        Self {
            calorie_target: DEFAULT_CALORIE_TARGET,
            protein_target: DEFAULT_PROTEIN_TARGET,
            fiber_target: DEFAULT_FIBER_TARGET,
        }
    }
}

impl SettingsUpdate {
    /// Build from loosely typed JSON request fields. See [`coerce_target`].
    #[must_use]
    pub fn from_json(calories: Option<&Value>, protein: Option<&Value>, fiber: Option<&Value>) -> Self {
        Self {
            calorie_target: coerce_target(calories, DEFAULT_CALORIE_TARGET),
            protein_target: coerce_target(protein, DEFAULT_PROTEIN_TARGET),
            fiber_target: coerce_target(fiber, DEFAULT_FIBER_TARGET),
        }
    }

    /// Same policy for already-typed values: negatives fall back to the defaults.
    #[must_use]
    pub fn from_values(calories: Option<i64>, protein: Option<i64>, fiber: Option<i64>) -> Self {
        let pick = |v: Option<i64>, default: i64| v.filter(|v| *v >= 0).unwrap_or(default);
        Self {
            calorie_target: pick(calories, DEFAULT_CALORIE_TARGET),
            protein_target: pick(protein, DEFAULT_PROTEIN_TARGET),
            fiber_target: pick(fiber, DEFAULT_FIBER_TARGET),
        }
    }
}

/// What the estimator hands back: whole kcal and grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutrientEstimate {
    pub calories: i64,
    pub protein: i64,
    pub fiber: i64,
}

impl From<NutrientEstimate> for Nutrients {
    #[allow(clippy::cast_precision_loss)]
    fn from(e: NutrientEstimate) -> Self {
        Nutrients::new(e.calories as f64, e.protein as f64, e.fiber as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub totals: Nutrients,
    pub targets: UserSettings,
    /// Target minus total; negative once a target is exceeded.
    pub remaining: Nutrients,
    pub entry_count: usize,
}

impl DailySummary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(date: NaiveDate, entries: &[NutritionEntry], targets: UserSettings) -> Self {
        let totals = entries
            .iter()
            .fold(Nutrients::default(), |acc, e| acc.plus(e.nutrients()));
        let remaining = Nutrients {
            calories: targets.daily_calorie_target as f64 - totals.calories,
            protein: targets.daily_protein_target as f64 - totals.protein,
            fiber: targets.daily_fiber_target as f64 - totals.fiber,
        };
        Self {
            date,
            totals,
            targets,
            remaining,
            entry_count: entries.len(),
        }
    }
}

pub fn validate_description(description: &str) -> Result<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Description is required"));
    }
    Ok(trimmed.to_string())
}

fn sanitize_amount(v: f64) -> f64 {
    if v.is_finite() && v >= 0.0 { v } else { 0.0 }
}

fn json_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

/// Lenient nutrient parsing: numbers and numeric strings are accepted,
/// anything missing, non-numeric or negative becomes zero.
#[must_use]
pub fn coerce_nutrient(value: Option<&Value>) -> f64 {
    json_number(value).map_or(0.0, sanitize_amount)
}

/// Lenient target parsing: numbers and numeric strings are rounded to the
/// nearest integer, anything missing, non-numeric or negative becomes `default`.
#[must_use]
pub fn coerce_target(value: Option<&Value>, default: i64) -> i64 {
    json_number(value)
        .filter(|v| *v >= 0.0)
        .map_or(default, |v| v.round() as i64)
}
