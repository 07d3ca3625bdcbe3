use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use tracing::info;

use crate::day_range::DayRange;
use crate::error::Result;
use crate::models::{
    DEFAULT_CALORIE_TARGET, DEFAULT_FIBER_TARGET, DEFAULT_PROTEIN_TARGET, EntryType, NewEntry,
    NewPreset, NutritionEntry, PresetFood, SettingsUpdate, UserSettings,
};

pub const TABLES: &[&str] = &["nutrition_entries", "preset_foods", "user_settings"];

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const ENTRY_COLUMNS: &str = "id, created_at, description, calories, protein, fiber, type";
const PRESET_COLUMNS: &str = "id, name, calories, protein, fiber";
const SETTINGS_COLUMNS: &str =
    "id, daily_calorie_target, daily_protein_target, daily_fiber_target";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.conn.busy_timeout(BUSY_TIMEOUT)?;
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Additive-only schema setup. Safe to run on every start: tables are
    /// created if missing and existing rows are never touched.
    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS nutrition_entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    created_at TEXT NOT NULL,
                    description TEXT NOT NULL,
                    calories REAL NOT NULL,
                    protein REAL NOT NULL,
                    fiber REAL NOT NULL,
                    type TEXT NOT NULL DEFAULT 'manual'
                );

                CREATE INDEX IF NOT EXISTS idx_nutrition_entries_created_at
                    ON nutrition_entries(created_at);

                CREATE TABLE IF NOT EXISTS preset_foods (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    calories REAL NOT NULL,
                    protein REAL NOT NULL,
                    fiber REAL NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_preset_foods_name ON preset_foods(name);

                CREATE TABLE IF NOT EXISTS user_settings (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    singleton INTEGER NOT NULL DEFAULT 1 UNIQUE CHECK (singleton = 1),
                    daily_calorie_target INTEGER NOT NULL DEFAULT 2000,
                    daily_protein_target INTEGER NOT NULL DEFAULT 150,
                    daily_fiber_target INTEGER NOT NULL DEFAULT 30
                );

                PRAGMA user_version = 1;",
            )?;
            info!(from = version, to = 1, "migrated database schema");
        }

        Ok(())
    }

    /// Row count per table, in [`TABLES`] order.
    pub fn table_counts(&self) -> Result<Vec<(&'static str, i64)>> {
        TABLES
            .iter()
            .map(|table| -> Result<(&'static str, i64)> {
                let count: i64 =
                    self.conn
                        .query_row(&format!("SELECT count(*) FROM {table}"), [], |row| {
                            row.get(0)
                        })?;
                Ok((*table, count))
            })
            .collect()
    }

    /// Cheap round-trip used by the health endpoint.
    pub fn ping(&self) -> Result<()> {
        self.conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    // --- Row mapping helpers ---

    fn entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<NutritionEntry> {
        let created_at: String = row.get(1)?;
        let entry_type: String = row.get(6)?;
        Ok(NutritionEntry {
            id: row.get(0)?,
            created_at: parse_instant(&created_at)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?,
            description: row.get(2)?,
            calories: row.get(3)?,
            protein: row.get(4)?,
            fiber: row.get(5)?,
            entry_type: entry_type
                .parse::<EntryType>()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?,
        })
    }

    fn preset_from_row(row: &rusqlite::Row) -> rusqlite::Result<PresetFood> {
        Ok(PresetFood {
            id: row.get(0)?,
            name: row.get(1)?,
            calories: row.get(2)?,
            protein: row.get(3)?,
            fiber: row.get(4)?,
        })
    }

    fn settings_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserSettings> {
        Ok(UserSettings {
            id: row.get(0)?,
            daily_calorie_target: row.get(1)?,
            daily_protein_target: row.get(2)?,
            daily_fiber_target: row.get(3)?,
        })
    }

    // --- Nutrition entries ---

    pub fn insert_entry(&self, entry: &NewEntry, created_at: DateTime<Utc>) -> Result<NutritionEntry> {
        self.conn.execute(
            "INSERT INTO nutrition_entries (created_at, description, calories, protein, fiber, type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                format_instant(created_at),
                entry.description,
                entry.nutrients.calories,
                entry.nutrients.protein,
                entry.nutrients.fiber,
                entry.entry_type.as_str(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        let entry = self.conn.query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM nutrition_entries WHERE id = ?1"),
            params![id],
            Self::entry_from_row,
        )?;
        Ok(entry)
    }

    pub fn get_entry(&self, id: i64) -> Result<Option<NutritionEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM nutrition_entries WHERE id = ?1"),
                params![id],
                Self::entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Entries created inside `range`, newest first.
    pub fn entries_in_range(&self, range: &DayRange) -> Result<Vec<NutritionEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM nutrition_entries
             WHERE created_at >= ?1 AND created_at < ?2
             ORDER BY created_at DESC, id DESC"
        ))?;
        let entries = stmt
            .query_map(
                params![format_instant(range.start), format_instant(range.end)],
                Self::entry_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Returns whether a row was removed.
    pub fn delete_entry(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM nutrition_entries WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Presets ---

    pub fn insert_preset(&self, preset: &NewPreset) -> Result<PresetFood> {
        self.conn.execute(
            "INSERT INTO preset_foods (name, calories, protein, fiber) VALUES (?1, ?2, ?3, ?4)",
            params![
                preset.name,
                preset.nutrients.calories,
                preset.nutrients.protein,
                preset.nutrients.fiber,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        let preset = self.conn.query_row(
            &format!("SELECT {PRESET_COLUMNS} FROM preset_foods WHERE id = ?1"),
            params![id],
            Self::preset_from_row,
        )?;
        Ok(preset)
    }

    pub fn get_preset(&self, id: i64) -> Result<Option<PresetFood>> {
        let preset = self
            .conn
            .query_row(
                &format!("SELECT {PRESET_COLUMNS} FROM preset_foods WHERE id = ?1"),
                params![id],
                Self::preset_from_row,
            )
            .optional()?;
        Ok(preset)
    }

    /// All presets by name, using SQLite's binary (case-sensitive) collation.
    pub fn list_presets(&self) -> Result<Vec<PresetFood>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PRESET_COLUMNS} FROM preset_foods ORDER BY name, id"
        ))?;
        let presets = stmt
            .query_map([], Self::preset_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(presets)
    }

    pub fn delete_preset(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM preset_foods WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- User settings ---

    /// Return the settings row, inserting the defaults first if there is none.
    ///
    /// Not a pure read: the first call on an empty store writes a row. The
    /// insert and the read share one `IMMEDIATE` transaction and the
    /// `singleton` column is `UNIQUE`, so callers racing on separate
    /// connections all end up reading the same single row.
    pub fn get_or_create_settings(&self) -> Result<UserSettings> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let created = tx.execute(
            "INSERT INTO user_settings (singleton, daily_calorie_target, daily_protein_target, daily_fiber_target)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(singleton) DO NOTHING",
            params![
                DEFAULT_CALORIE_TARGET,
                DEFAULT_PROTEIN_TARGET,
                DEFAULT_FIBER_TARGET
            ],
        )?;
        let settings = tx.query_row(
            &format!("SELECT {SETTINGS_COLUMNS} FROM user_settings WHERE singleton = 1"),
            [],
            Self::settings_from_row,
        )?;
        tx.commit()?;
        if created > 0 {
            info!(id = settings.id, "created default settings");
        }
        Ok(settings)
    }

    /// Overwrite the targets in place, creating the row if it does not exist yet.
    pub fn update_settings(&self, update: &SettingsUpdate) -> Result<UserSettings> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO user_settings (singleton, daily_calorie_target, daily_protein_target, daily_fiber_target)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(singleton) DO UPDATE SET
                daily_calorie_target = excluded.daily_calorie_target,
                daily_protein_target = excluded.daily_protein_target,
                daily_fiber_target = excluded.daily_fiber_target",
            params![
                update.calorie_target,
                update.protein_target,
                update.fiber_target
            ],
        )?;
        let settings = tx.query_row(
            &format!("SELECT {SETTINGS_COLUMNS} FROM user_settings WHERE singleton = 1"),
            [],
            Self::settings_from_row,
        )?;
        tx.commit()?;
        Ok(settings)
    }
}

/// Fixed-width UTC text, so string order in SQL matches time order.
#[must_use]
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_instant(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}
