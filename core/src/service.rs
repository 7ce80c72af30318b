use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use crate::day::build_day_view;
use crate::entries::EntryLedger;
use crate::models::{
    DayView, FoodEntry, MealType, NewFoodEntry, Product, Profile, WeightObservation,
    calculate_kcal,
};
use crate::profile::ProfileRepository;
use crate::store::{KeyValueStore, MemoryStore, SqliteStore};
use crate::weights::WeightLedger;

/// Food catalog lookup (search by text, lookup by barcode).
///
/// The CLI implements this over HTTP with reqwest. Called synchronously from Rust.
pub trait FoodLookupProvider: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<Product>>;
    fn lookup_barcode(&self, barcode: &str) -> Result<Option<Product>>;
}

pub(crate) fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{date}'. Use YYYY-MM-DD"))
}

pub struct FoodLog {
    profiles: ProfileRepository,
    entries: EntryLedger,
    weights: WeightLedger,
}

impl FoodLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            profiles: ProfileRepository::new(Arc::clone(&store)),
            entries: EntryLedger::new(Arc::clone(&store)),
            weights: WeightLedger::new(store),
        }
    }

    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self::new(Arc::new(SqliteStore::open(db_path)?)))
    }

    #[must_use]
    pub fn new_in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    // --- Profile ---

    pub fn profile(&self) -> Result<Option<Profile>> {
        self.profiles.load()
    }

    pub fn save_profile(&self, profile: &Profile) -> Result<()> {
        self.profiles.save(profile)
    }

    /// Save the profile and record its initial weight as `today`'s observation.
    pub fn onboard(&self, profile: &Profile, today: NaiveDate) -> Result<()> {
        self.profiles.save(profile)?;
        self.weights.set(today, profile.weight_kg_initial)?;
        tracing::info!(name = %profile.name, "profile created");
        Ok(())
    }

    // --- Entries ---

    pub fn log_entry(&self, entry: NewFoodEntry) -> Result<FoodEntry> {
        self.entries.add(entry)
    }

    /// Log `grams` of a catalog product, computing kcal from its per-100 g value.
    pub fn log_product(
        &self,
        date: &str,
        meal_type: MealType,
        product: &Product,
        grams: f64,
    ) -> Result<FoodEntry> {
        let date = parse_date(date)?;
        self.entries.add(NewFoodEntry {
            date,
            code: product.code.clone(),
            name: product.name.clone(),
            grams,
            kcal: calculate_kcal(grams, product.kcal_per_100g),
            meal_type,
        })
    }

    pub fn entries_for(&self, date: &str) -> Result<Vec<FoodEntry>> {
        self.entries.list_for_date(parse_date(date)?)
    }

    pub fn all_entries(&self) -> Result<Vec<FoodEntry>> {
        self.entries.all()
    }

    pub fn total_kcal(&self, date: &str) -> Result<i64> {
        self.entries.total_kcal(parse_date(date)?)
    }

    pub fn update_entry_at(
        &self,
        date: &str,
        rank: usize,
        new_value: NewFoodEntry,
    ) -> Result<FoodEntry> {
        self.entries.update_at(parse_date(date)?, rank, new_value)
    }

    pub fn remove_entry_at(&self, date: &str, rank: usize) -> Result<FoodEntry> {
        self.entries.remove_at(parse_date(date)?, rank)
    }

    /// Change the grams of the `rank`-th entry of `date`, scaling kcal so the
    /// kcal-per-gram ratio stays the same. The meal type may change too.
    pub fn rescale_entry_at(
        &self,
        date: &str,
        rank: usize,
        grams: Option<f64>,
        meal_type: Option<MealType>,
    ) -> Result<FoodEntry> {
        self.entries
            .rescale_at(parse_date(date)?, rank, grams, meal_type)
    }

    pub fn get_entry(&self, id: &str) -> Result<FoodEntry> {
        self.entries.get(id)
    }

    pub fn update_entry(&self, id: &str, new_value: NewFoodEntry) -> Result<FoodEntry> {
        self.entries.update(id, new_value)
    }

    pub fn remove_entry(&self, id: &str) -> Result<FoodEntry> {
        self.entries.remove(id)
    }

    // --- Weight ---

    pub fn set_weight(&self, date: &str, kg: f64) -> Result<()> {
        self.weights.set(parse_date(date)?, kg)
    }

    pub fn weight(&self, date: &str) -> Result<Option<f64>> {
        self.weights.get(parse_date(date)?)
    }

    pub fn resolve_weight(&self, date: &str) -> Result<Option<f64>> {
        let profile = self.profiles.load()?;
        self.weights.resolve(parse_date(date)?, profile.as_ref())
    }

    pub fn weight_history(&self, limit: Option<usize>) -> Result<Vec<WeightObservation>> {
        self.weights.history(limit)
    }

    // --- Day view ---

    pub fn day_view(&self, date: &str) -> Result<DayView> {
        self.day_view_as_of(date, Local::now().date_naive())
    }

    /// Day view with the profile's age taken on `today`.
    pub fn day_view_as_of(&self, date: &str, today: NaiveDate) -> Result<DayView> {
        build_day_view(
            &self.entries,
            &self.weights,
            &self.profiles,
            parse_date(date)?,
            today,
        )
    }

    // --- Food catalog ---

    pub fn search_products(
        &self,
        provider: &dyn FoodLookupProvider,
        query: &str,
    ) -> Result<Vec<Product>> {
        provider.search(query)
    }

    pub fn lookup_barcode(
        &self,
        provider: &dyn FoodLookupProvider,
        code: &str,
    ) -> Result<Option<Product>> {
        provider.lookup_barcode(code)
    }
}
