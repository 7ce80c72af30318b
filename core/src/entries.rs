use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::NaiveDate;

use crate::error::LedgerError;
use crate::models::{FoodEntry, MealType, NewFoodEntry, new_entry_id};
use crate::store::{ENTRIES_KEY, KeyValueStore, lock, read_json, write_json};

/// The global, insertion-ordered sequence of food entries.
///
/// Within a date an entry is addressed either by its rank (0-based position among
/// that date's entries, as returned by [`EntryLedger::list_for_date`]) or by its
/// stable id. Ranks shift whenever an earlier same-date entry is removed.
pub struct EntryLedger {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

fn validate(entry: &NewFoodEntry) -> Result<()> {
    if !entry.grams.is_finite() || entry.grams <= 0.0 {
        return Err(LedgerError::InvalidGrams(entry.grams).into());
    }
    if entry.kcal < 0 {
        return Err(LedgerError::InvalidKcal(entry.kcal).into());
    }
    Ok(())
}

/// Index into the global sequence of the `rank`-th entry dated `date`.
fn position_of_rank(entries: &[FoodEntry], date: NaiveDate, rank: usize) -> Result<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.date == date)
        .nth(rank)
        .map(|(i, _)| i)
        .ok_or_else(|| {
            let len = entries.iter().filter(|e| e.date == date).count();
            LedgerError::IndexOutOfRange { date, rank, len }.into()
        })
}

/// Give every id-less entry a fresh id. Returns how many were assigned.
fn assign_missing_ids(entries: &mut [FoodEntry]) -> usize {
    let mut assigned = 0;
    for entry in entries.iter_mut().filter(|e| e.id.is_empty()) {
        entry.id = new_entry_id();
        assigned += 1;
    }
    assigned
}

fn position_of_id(entries: &[FoodEntry], id: &str) -> Result<usize> {
    entries
        .iter()
        .position(|e| e.id == id)
        .ok_or_else(|| LedgerError::EntryNotFound(id.to_string()).into())
}

impl EntryLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Vec<FoodEntry>> {
        Ok(read_json(self.store.as_ref(), ENTRIES_KEY)?.unwrap_or_default())
    }

    /// The whole sequence in insertion order. Entries stored without an id get
    /// one here, and it is written back so later reads see the same id.
    pub fn all(&self) -> Result<Vec<FoodEntry>> {
        let entries = self.load()?;
        if entries.iter().all(|e| !e.id.is_empty()) {
            return Ok(entries);
        }
        self.mutate(|entries| Ok(entries.clone()))
    }

    fn save_all(&self, entries: &[FoodEntry]) -> Result<()> {
        write_json(self.store.as_ref(), ENTRIES_KEY, entries)
    }

    /// Apply `f` to the loaded sequence and write it back, holding the write lock
    /// for the whole span. Nothing is written when `f` fails.
    fn mutate<T>(&self, f: impl FnOnce(&mut Vec<FoodEntry>) -> Result<T>) -> Result<T> {
        let _guard = lock(&self.write_lock)?;
        let mut entries = self.load()?;
        let assigned = assign_missing_ids(&mut entries);
        if assigned > 0 {
            tracing::debug!(assigned, "assigned ids to stored entries");
        }
        let out = f(&mut entries)?;
        self.save_all(&entries)?;
        Ok(out)
    }

    pub fn add(&self, entry: NewFoodEntry) -> Result<FoodEntry> {
        validate(&entry)?;
        let entry = entry.into_entry(new_entry_id());
        self.mutate(|entries| {
            entries.push(entry.clone());
            Ok(())
        })?;
        tracing::debug!(id = %entry.id, date = %entry.date, kcal = entry.kcal, "entry added");
        Ok(entry)
    }

    pub fn list_for_date(&self, date: NaiveDate) -> Result<Vec<FoodEntry>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|e| e.date == date)
            .collect())
    }

    pub fn total_kcal(&self, date: NaiveDate) -> Result<i64> {
        Ok(self.list_for_date(date)?.iter().map(|e| e.kcal).sum())
    }

    pub fn get(&self, id: &str) -> Result<FoodEntry> {
        let entries = self.all()?;
        let pos = position_of_id(&entries, id)?;
        Ok(entries[pos].clone())
    }

    /// Replace the `rank`-th entry of `date` wholesale, keeping its id.
    pub fn update_at(
        &self,
        date: NaiveDate,
        rank: usize,
        new_value: NewFoodEntry,
    ) -> Result<FoodEntry> {
        validate(&new_value)?;
        let updated = self.mutate(|entries| {
            let pos = position_of_rank(entries, date, rank)?;
            let id = std::mem::take(&mut entries[pos].id);
            entries[pos] = new_value.into_entry(id);
            Ok(entries[pos].clone())
        })?;
        tracing::debug!(%date, rank, id = %updated.id, "entry updated");
        Ok(updated)
    }

    /// Drop the `rank`-th entry of `date`; later same-date ranks move down by one.
    pub fn remove_at(&self, date: NaiveDate, rank: usize) -> Result<FoodEntry> {
        let removed = self.mutate(|entries| {
            let pos = position_of_rank(entries, date, rank)?;
            Ok(entries.remove(pos))
        })?;
        tracing::debug!(%date, rank, id = %removed.id, "entry removed");
        Ok(removed)
    }

    /// Change the grams and/or meal of the `rank`-th entry of `date`. New grams
    /// scale kcal so the kcal-per-gram ratio stays the same.
    pub fn rescale_at(
        &self,
        date: NaiveDate,
        rank: usize,
        grams: Option<f64>,
        meal_type: Option<MealType>,
    ) -> Result<FoodEntry> {
        if let Some(grams) = grams {
            if !grams.is_finite() || grams <= 0.0 {
                return Err(LedgerError::InvalidGrams(grams).into());
            }
        }
        let updated = self.mutate(|entries| {
            let pos = position_of_rank(entries, date, rank)?;
            let entry = &mut entries[pos];
            if let Some(grams) = grams {
                #[allow(clippy::cast_precision_loss)]
                let kcal_per_gram = entry.kcal as f64 / entry.grams;
                entry.kcal = (kcal_per_gram * grams).round() as i64;
                entry.grams = grams;
            }
            if let Some(meal_type) = meal_type {
                entry.meal_type = meal_type;
            }
            Ok(entry.clone())
        })?;
        tracing::debug!(%date, rank, id = %updated.id, kcal = updated.kcal, "entry rescaled");
        Ok(updated)
    }

    pub fn update(&self, id: &str, new_value: NewFoodEntry) -> Result<FoodEntry> {
        validate(&new_value)?;
        self.mutate(|entries| {
            let pos = position_of_id(entries, id)?;
            entries[pos] = new_value.into_entry(id.to_string());
            Ok(entries[pos].clone())
        })
    }

    pub fn remove(&self, id: &str) -> Result<FoodEntry> {
        self.mutate(|entries| {
            let pos = position_of_id(entries, id)?;
            Ok(entries.remove(pos))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealType;
    use crate::store::MemoryStore;

    fn ledger() -> EntryLedger {
        EntryLedger::new(Arc::new(MemoryStore::new()))
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn food(date: NaiveDate, name: &str, kcal: i64) -> NewFoodEntry {
        NewFoodEntry {
            date,
            code: format!("code-{name}"),
            name: name.to_string(),
            grams: 100.0,
            kcal,
            meal_type: MealType::Snack,
        }
    }

    fn names(entries: &[FoodEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_list_empty() {
        let l = ledger();
        assert!(l.list_for_date(day(1)).unwrap().is_empty());
        assert_eq!(l.total_kcal(day(1)).unwrap(), 0);
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let l = ledger();
        l.add(food(day(1), "A", 10)).unwrap();
        l.add(food(day(1), "B", 20)).unwrap();
        l.add(food(day(1), "C", 30)).unwrap();
        assert_eq!(names(&l.list_for_date(day(1)).unwrap()), ["A", "B", "C"]);
    }

    #[test]
    fn test_list_is_idempotent() {
        let l = ledger();
        l.add(food(day(1), "A", 10)).unwrap();
        l.add(food(day(1), "B", 20)).unwrap();
        assert_eq!(
            l.list_for_date(day(1)).unwrap(),
            l.list_for_date(day(1)).unwrap()
        );
    }

    #[test]
    fn test_cross_date_isolation() {
        let l = ledger();
        l.add(food(day(1), "A", 10)).unwrap();
        l.add(food(day(2), "B", 20)).unwrap();
        l.add(food(day(1), "C", 30)).unwrap();
        assert_eq!(names(&l.list_for_date(day(1)).unwrap()), ["A", "C"]);
        assert_eq!(names(&l.list_for_date(day(2)).unwrap()), ["B"]);
        assert!(l.list_for_date(day(3)).unwrap().is_empty());
    }

    #[test]
    fn test_total_matches_listed_entries() {
        let l = ledger();
        l.add(food(day(1), "A", 10)).unwrap();
        l.add(food(day(2), "B", 200)).unwrap();
        l.add(food(day(1), "C", 35)).unwrap();
        for d in [day(1), day(2), day(3)] {
            let sum: i64 = l.list_for_date(d).unwrap().iter().map(|e| e.kcal).sum();
            assert_eq!(l.total_kcal(d).unwrap(), sum);
        }
        assert_eq!(l.total_kcal(day(1)).unwrap(), 45);
    }

    #[test]
    fn test_remove_at_closes_gap() {
        let l = ledger();
        l.add(food(day(1), "A", 10)).unwrap();
        l.add(food(day(1), "B", 20)).unwrap();
        l.add(food(day(1), "C", 30)).unwrap();

        let removed = l.remove_at(day(1), 1).unwrap();
        assert_eq!(removed.name, "B");
        assert_eq!(names(&l.list_for_date(day(1)).unwrap()), ["A", "C"]);
    }

    #[test]
    fn test_rank_counts_only_same_date() {
        let l = ledger();
        l.add(food(day(2), "X", 1)).unwrap();
        l.add(food(day(1), "A", 10)).unwrap();
        l.add(food(day(2), "Y", 2)).unwrap();
        l.add(food(day(1), "B", 20)).unwrap();

        l.remove_at(day(1), 1).unwrap();
        assert_eq!(names(&l.list_for_date(day(1)).unwrap()), ["A"]);
        assert_eq!(names(&l.list_for_date(day(2)).unwrap()), ["X", "Y"]);
    }

    #[test]
    fn test_update_at_replaces_payload_keeps_id() {
        let l = ledger();
        l.add(food(day(1), "A", 10)).unwrap();
        let b = l.add(food(day(1), "B", 20)).unwrap();

        let updated = l.update_at(day(1), 1, food(day(1), "B2", 25)).unwrap();
        assert_eq!(updated.id, b.id);
        assert_eq!(updated.name, "B2");
        assert_eq!(names(&l.list_for_date(day(1)).unwrap()), ["A", "B2"]);
        assert_eq!(l.total_kcal(day(1)).unwrap(), 35);
    }

    #[test]
    fn test_update_at_can_move_entry_to_another_date() {
        let l = ledger();
        l.add(food(day(1), "A", 10)).unwrap();
        l.update_at(day(1), 0, food(day(2), "A", 10)).unwrap();
        assert!(l.list_for_date(day(1)).unwrap().is_empty());
        assert_eq!(names(&l.list_for_date(day(2)).unwrap()), ["A"]);
    }

    #[test]
    fn test_out_of_range_rank_is_an_error_and_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let l = EntryLedger::new(store.clone());
        l.add(food(day(1), "A", 10)).unwrap();
        let before = store.get(ENTRIES_KEY).unwrap();

        let err = l.remove_at(day(1), 1).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LedgerError>(),
            Some(&LedgerError::IndexOutOfRange {
                date: day(1),
                rank: 1,
                len: 1
            })
        );

        let err = l.update_at(day(2), 0, food(day(2), "Z", 1)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::IndexOutOfRange { len: 0, .. })
        ));

        assert_eq!(store.get(ENTRIES_KEY).unwrap(), before);
    }

    #[test]
    fn test_add_rejects_invalid_numbers() {
        let l = ledger();
        let mut bad = food(day(1), "A", 10);
        bad.grams = 0.0;
        let err = l.add(bad).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::InvalidGrams(_))
        ));

        let mut bad = food(day(1), "A", 10);
        bad.grams = f64::NAN;
        assert!(l.add(bad).is_err());

        let bad = food(day(1), "A", -5);
        let err = l.add(bad).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LedgerError>(),
            Some(&LedgerError::InvalidKcal(-5))
        );
        assert!(l.all().unwrap().is_empty());
    }

    #[test]
    fn test_id_addressing_survives_rank_shift() {
        let l = ledger();
        let a = l.add(food(day(1), "A", 10)).unwrap();
        let c = l.add(food(day(1), "C", 30)).unwrap();

        // Removing A shifts C from rank 1 to rank 0; its id still finds it.
        l.remove(&a.id).unwrap();
        let updated = l.update(&c.id, food(day(1), "C2", 31)).unwrap();
        assert_eq!(updated.id, c.id);
        assert_eq!(l.get(&c.id).unwrap().name, "C2");
        assert_eq!(names(&l.list_for_date(day(1)).unwrap()), ["C2"]);
    }

    #[test]
    fn test_unknown_id() {
        let l = ledger();
        let err = l.remove("missing").unwrap_err();
        assert_eq!(
            err.downcast_ref::<LedgerError>(),
            Some(&LedgerError::EntryNotFound("missing".to_string()))
        );
        assert!(l.get("missing").is_err());
    }

    #[test]
    fn test_legacy_entries_without_ids_are_readable() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                ENTRIES_KEY,
                r#"[{"date":"2024-03-01","code":"X","name":"Apple","grams":150,"kcal":78}]"#,
            )
            .unwrap();
        let l = EntryLedger::new(store);
        let listed = l.list_for_date(day(1)).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].meal_type, MealType::Snack);
        assert!(!listed[0].id.is_empty());

        // The id handed out on the first read is the one stored.
        assert_eq!(l.all().unwrap()[0].id, listed[0].id);
        assert_eq!(l.get(&listed[0].id).unwrap().name, "Apple");
    }

    #[test]
    fn test_rescale_at_on_entries_without_ids() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                ENTRIES_KEY,
                r#"[{"date":"2024-03-01","code":"X","name":"Apple","grams":150,"kcal":78,"mealType":"snack"}]"#,
            )
            .unwrap();
        let l = EntryLedger::new(store);

        let updated = l.rescale_at(day(1), 0, Some(300.0), None).unwrap();
        assert_eq!(updated.kcal, 156);
        assert!((updated.grams - 300.0).abs() < f64::EPSILON);
        assert_eq!(l.get(&updated.id).unwrap(), updated);
    }

    #[test]
    fn test_rescale_at_keeps_ratio_and_id() {
        let l = ledger();
        let added = l.add(food(day(1), "A", 250)).unwrap();
        let updated = l
            .rescale_at(day(1), 0, Some(40.0), Some(MealType::Lunch))
            .unwrap();
        assert_eq!(updated.id, added.id);
        assert_eq!(updated.kcal, 100);
        assert_eq!(updated.meal_type, MealType::Lunch);

        let err = l.rescale_at(day(1), 1, Some(10.0), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::IndexOutOfRange { rank: 1, len: 1, .. })
        ));
        assert!(l.rescale_at(day(1), 0, Some(0.0), None).is_err());
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let l = Arc::new(ledger());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let l = Arc::clone(&l);
                std::thread::spawn(move || {
                    for j in 0..10 {
                        l.add(food(day(1), &format!("{i}-{j}"), 1)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(l.list_for_date(day(1)).unwrap().len(), 80);
        assert_eq!(l.total_kcal(day(1)).unwrap(), 80);
    }
}
