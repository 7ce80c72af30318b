use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{Duration, NaiveDate};

use crate::error::LedgerError;
use crate::models::{Profile, WeightObservation};
use crate::store::{KeyValueStore, WEIGHTS_KEY, lock, read_json, write_json};

/// How far back [`WeightLedger::resolve`] looks for a prior observation.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

/// Date-keyed body weight observations, at most one per date.
pub struct WeightLedger {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl WeightLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    fn all(&self) -> Result<BTreeMap<NaiveDate, f64>> {
        Ok(read_json(self.store.as_ref(), WEIGHTS_KEY)?.unwrap_or_default())
    }

    pub fn set(&self, date: NaiveDate, kg: f64) -> Result<()> {
        if !kg.is_finite() || kg <= 0.0 {
            return Err(LedgerError::InvalidWeight(kg).into());
        }
        let _guard = lock(&self.write_lock)?;
        let mut weights = self.all()?;
        weights.insert(date, kg);
        write_json(self.store.as_ref(), WEIGHTS_KEY, &weights)?;
        tracing::debug!(%date, kg, "weight recorded");
        Ok(())
    }

    pub fn get(&self, date: NaiveDate) -> Result<Option<f64>> {
        Ok(self.all()?.get(&date).copied())
    }

    /// The weight that applies on `date`: the observation on that date, else the
    /// nearest earlier one within [`MAX_LOOKBACK_DAYS`], else the profile's initial
    /// weight. `None` when none of those exist.
    pub fn resolve(&self, date: NaiveDate, profile: Option<&Profile>) -> Result<Option<f64>> {
        let weights = self.all()?;
        let floor = date - Duration::days(MAX_LOOKBACK_DAYS);

        // Walking the ordered map backwards from `date` visits dates in strictly
        // decreasing order, so the first hit is the nearest one.
        let mut prior = weights.range(..=date).rev();
        match prior.next() {
            Some((found, kg)) if *found >= floor => return Ok(Some(*kg)),
            Some((found, _)) => {
                tracing::warn!(
                    %date,
                    %found,
                    max_lookback_days = MAX_LOOKBACK_DAYS,
                    "nearest weight is outside the lookback window, ignoring it"
                );
            }
            None => {}
        }

        Ok(profile.map(|p| p.weight_kg_initial))
    }

    /// Observations newest first, optionally capped to `limit` entries.
    pub fn history(&self, limit: Option<usize>) -> Result<Vec<WeightObservation>> {
        let weights = self.all()?;
        let iter = weights
            .into_iter()
            .rev()
            .map(|(date, weight_kg)| WeightObservation { date, weight_kg });
        Ok(match limit {
            Some(n) => iter.take(n).collect(),
            None => iter.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use crate::store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn profile(initial: f64) -> Profile {
        Profile {
            name: "Alex".to_string(),
            gender: Gender::Other,
            height_cm: 165.0,
            weight_kg_initial: initial,
            birth_date: date(1985, 6, 1),
            goal_weight_kg: 60.0,
        }
    }

    fn ledger() -> WeightLedger {
        WeightLedger::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_get_exact_date_only() {
        let l = ledger();
        l.set(date(2024, 1, 1), 70.0).unwrap();
        assert_eq!(l.get(date(2024, 1, 1)).unwrap(), Some(70.0));
        assert_eq!(l.get(date(2024, 1, 2)).unwrap(), None);
    }

    #[test]
    fn test_set_overwrites_same_date() {
        let l = ledger();
        l.set(date(2024, 1, 1), 70.0).unwrap();
        l.set(date(2024, 1, 1), 69.5).unwrap();
        assert_eq!(l.get(date(2024, 1, 1)).unwrap(), Some(69.5));
        assert_eq!(l.history(None).unwrap().len(), 1);
    }

    #[test]
    fn test_set_rejects_invalid_weight() {
        let l = ledger();
        for kg in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(l.set(date(2024, 1, 1), kg).is_err());
        }
        assert!(l.history(None).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_falls_back_to_nearest_prior() {
        let l = ledger();
        l.set(date(2024, 1, 1), 70.0).unwrap();
        l.set(date(2024, 1, 10), 71.0).unwrap();
        let p = profile(65.0);

        assert_eq!(l.resolve(date(2024, 1, 1), Some(&p)).unwrap(), Some(70.0));
        assert_eq!(l.resolve(date(2024, 1, 5), Some(&p)).unwrap(), Some(70.0));
        assert_eq!(l.resolve(date(2024, 1, 10), Some(&p)).unwrap(), Some(71.0));
        assert_eq!(l.resolve(date(2024, 1, 15), Some(&p)).unwrap(), Some(71.0));
    }

    #[test]
    fn test_resolve_before_first_observation_uses_profile() {
        let l = ledger();
        l.set(date(2024, 1, 1), 70.0).unwrap();
        l.set(date(2024, 1, 10), 71.0).unwrap();

        let p = profile(65.0);
        assert_eq!(l.resolve(date(2023, 12, 31), Some(&p)).unwrap(), Some(65.0));
        assert_eq!(l.resolve(date(2023, 12, 31), None).unwrap(), None);
    }

    #[test]
    fn test_resolve_ignores_later_observations() {
        let l = ledger();
        l.set(date(2024, 2, 1), 80.0).unwrap();
        assert_eq!(l.resolve(date(2024, 1, 31), None).unwrap(), None);
    }

    #[test]
    fn test_resolve_respects_lookback_bound() {
        let l = ledger();
        let target = date(2024, 6, 1);
        let at_bound = target - Duration::days(MAX_LOOKBACK_DAYS);
        l.set(at_bound, 90.0).unwrap();
        assert_eq!(l.resolve(target, None).unwrap(), Some(90.0));

        let beyond = target + Duration::days(1);
        assert_eq!(l.resolve(beyond, None).unwrap(), None);
        assert_eq!(
            l.resolve(beyond, Some(&profile(65.0))).unwrap(),
            Some(65.0)
        );
    }

    #[test]
    fn test_history_newest_first_with_limit() {
        let l = ledger();
        for d in [10, 12, 11] {
            l.set(date(2025, 1, d), 80.0).unwrap();
        }
        let history = l.history(None).unwrap();
        let dates: Vec<_> = history.iter().map(|w| w.date).collect();
        assert_eq!(dates, [date(2025, 1, 12), date(2025, 1, 11), date(2025, 1, 10)]);

        let limited = l.history(Some(2)).unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].date, date(2025, 1, 12));
    }

    #[test]
    fn test_persisted_shape_is_date_map() {
        let store = Arc::new(MemoryStore::new());
        let l = WeightLedger::new(store.clone());
        l.set(date(2024, 1, 1), 70.0).unwrap();
        let raw = store.get(WEIGHTS_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"{"2024-01-01":70.0}"#);
    }
}
