use anyhow::Result;
use chrono::NaiveDate;

use crate::bmr::compute_bmr;
use crate::entries::EntryLedger;
use crate::models::{DayView, FoodEntry, MealGroup, MealType, RankedEntry};
use crate::profile::ProfileRepository;
use crate::weights::WeightLedger;

/// Group a date's entries by meal in breakfast, lunch, dinner, snack order.
/// Every meal gets a group, empty or not; ranks are positions in `entries`.
#[must_use]
pub fn group_by_meal(entries: &[FoodEntry]) -> Vec<MealGroup> {
    MealType::ALL
        .into_iter()
        .map(|meal_type| {
            let entries: Vec<RankedEntry> = entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.meal_type == meal_type)
                .map(|(rank, e)| RankedEntry {
                    rank,
                    entry: e.clone(),
                })
                .collect();
            let subtotal_kcal = entries.iter().map(|r| r.entry.kcal).sum();
            MealGroup {
                meal_type,
                entries,
                subtotal_kcal,
            }
        })
        .collect()
}

/// Assemble the view of one day. `age_on` is the date the profile's age is taken
/// on (normally today). A missing profile or weight leaves `bmr` empty and the
/// balance equal to the kcal eaten.
pub fn build_day_view(
    entries: &EntryLedger,
    weights: &WeightLedger,
    profiles: &ProfileRepository,
    date: NaiveDate,
    age_on: NaiveDate,
) -> Result<DayView> {
    let day_entries = entries.list_for_date(date)?;
    let total_kcal: i64 = day_entries.iter().map(|e| e.kcal).sum();
    let profile = profiles.load()?;
    let resolved_weight_kg = weights.resolve(date, profile.as_ref())?;

    let bmr = match (&profile, resolved_weight_kg) {
        (Some(p), Some(kg)) => Some(compute_bmr(p, kg, age_on)),
        _ => None,
    };
    let balance = total_kcal - bmr.unwrap_or(0);

    Ok(DayView {
        date: date.format("%Y-%m-%d").to_string(),
        meals: group_by_meal(&day_entries),
        entries: day_entries,
        total_kcal,
        resolved_weight_kg,
        bmr,
        balance,
    })
}
