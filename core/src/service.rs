use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono_tz::Tz;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::day_range::{DayRange, resolve_day_range};
use crate::db::Database;
use crate::error::Result;
use crate::estimator::{DEFAULT_ESTIMATE_TIMEOUT, FoodEstimator, estimate_with_timeout};
use crate::models::{
    DailySummary, EntryType, NewEntry, NewPreset, NutrientEstimate, NutritionEntry, PresetFood,
    SettingsUpdate, UserSettings,
};

/// Everything the HTTP layer and the CLI need, over one store.
///
/// The connection sits behind a mutex that is only held for the duration of a
/// single store call. Estimation awaits the provider with the lock released.
pub struct NutritionService {
    db: Mutex<Database>,
    timezone: Tz,
    clock: Arc<dyn Clock>,
    estimator: Arc<dyn FoodEstimator>,
    estimate_timeout: Duration,
}

impl NutritionService {
    pub fn new(db: Database, timezone: Tz, estimator: Arc<dyn FoodEstimator>) -> Self {
        Self {
            db: Mutex::new(db),
            timezone,
            clock: Arc::new(SystemClock),
            estimator,
            estimate_timeout: DEFAULT_ESTIMATE_TIMEOUT,
        }
    }

    pub fn open(path: &Path, timezone: Tz, estimator: Arc<dyn FoodEstimator>) -> Result<Self> {
        Ok(Self::new(Database::open(path)?, timezone, estimator))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_estimate_timeout(mut self, timeout: Duration) -> Self {
        self.estimate_timeout = timeout;
        self
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Days ---

    pub fn day_range(&self, date: Option<&str>) -> Result<DayRange> {
        resolve_day_range(date, self.timezone, self.clock.now())
    }

    pub fn list_entries_for_day(&self, date: Option<&str>) -> Result<Vec<NutritionEntry>> {
        let range = self.day_range(date)?;
        self.entries_in_range(&range)
    }

    /// Entries for a range the caller already resolved, so a header printed
    /// from `range.date` always matches the rows.
    pub fn entries_in_range(&self, range: &DayRange) -> Result<Vec<NutritionEntry>> {
        self.db().entries_in_range(range)
    }

    pub fn daily_summary(&self, date: Option<&str>) -> Result<DailySummary> {
        self.daily_summary_with_entries(date).map(|(summary, _)| summary)
    }

    /// The summary together with the entries it was computed from, read under
    /// one lock for one resolved day.
    pub fn daily_summary_with_entries(
        &self,
        date: Option<&str>,
    ) -> Result<(DailySummary, Vec<NutritionEntry>)> {
        let range = self.day_range(date)?;
        let db = self.db();
        let entries = db.entries_in_range(&range)?;
        let targets = db.get_or_create_settings()?;
        Ok((DailySummary::build(range.date, &entries, targets), entries))
    }

    // --- Entries ---

    pub fn add_entry(&self, entry: &NewEntry) -> Result<NutritionEntry> {
        let created = self.db().insert_entry(entry, self.clock.now())?;
        debug!(id = created.id, kind = %created.entry_type, "entry added");
        Ok(created)
    }

    /// Estimate `description` and store the result as an `ai` entry.
    ///
    /// Nothing is written unless the estimate succeeds.
    pub async fn add_estimated_entry(&self, description: &str) -> Result<NutritionEntry> {
        let estimate = self.estimate(description).await?;
        let entry = NewEntry::new(description, estimate.into(), EntryType::Ai)?;
        self.add_entry(&entry)
    }

    pub fn get_entry(&self, id: i64) -> Result<Option<NutritionEntry>> {
        self.db().get_entry(id)
    }

    /// Idempotent: deleting a missing id is not an error.
    pub fn delete_entry(&self, id: i64) -> Result<()> {
        if self.db().delete_entry(id)? {
            debug!(id, "entry deleted");
        }
        Ok(())
    }

    // --- Presets ---

    pub fn list_presets(&self) -> Result<Vec<PresetFood>> {
        self.db().list_presets()
    }

    pub fn get_preset(&self, id: i64) -> Result<Option<PresetFood>> {
        self.db().get_preset(id)
    }

    pub fn add_preset(&self, preset: &NewPreset) -> Result<PresetFood> {
        let created = self.db().insert_preset(preset)?;
        debug!(id = created.id, name = %created.name, "preset added");
        Ok(created)
    }

    pub fn delete_preset(&self, id: i64) -> Result<()> {
        if self.db().delete_preset(id)? {
            debug!(id, "preset deleted");
        }
        Ok(())
    }

    // --- Settings ---

    pub fn get_settings(&self) -> Result<UserSettings> {
        self.db().get_or_create_settings()
    }

    pub fn update_settings(&self, update: &SettingsUpdate) -> Result<UserSettings> {
        let settings = self.db().update_settings(update)?;
        info!(
            calories = settings.daily_calorie_target,
            protein = settings.daily_protein_target,
            fiber = settings.daily_fiber_target,
            "targets updated"
        );
        Ok(settings)
    }

    // --- Estimation ---

    pub async fn estimate(&self, description: &str) -> Result<NutrientEstimate> {
        estimate_with_timeout(self.estimator.as_ref(), description, self.estimate_timeout).await
    }

    // --- Diagnostics ---

    pub fn table_counts(&self) -> Result<Vec<(&'static str, i64)>> {
        self.db().table_counts()
    }

    pub fn ping(&self) -> Result<()> {
        self.db().ping()
    }
}
