use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Profile ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "m")]
    Male,
    #[serde(other)]
    Other,
}

impl FromStr for Gender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "other" | "female" | "f" | "o" => Ok(Gender::Other),
            _ => bail!("Invalid gender '{s}'. Must be one of: male, other"),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("male"),
            Gender::Other => f.write_str("other"),
        }
    }
}

/// The single user profile. Its absence means onboarding has not run yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub gender: Gender,
    pub height_cm: f64,
    pub weight_kg_initial: f64,
    pub birth_date: NaiveDate,
    pub goal_weight_kg: f64,
}

// --- Food entries ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    #[default]
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        validate_meal_type(s)
    }
}

pub const MEAL_TYPES: &[&str] = &["breakfast", "lunch", "dinner", "snack"];

pub fn validate_meal_type(meal: &str) -> Result<MealType> {
    let lower = meal.to_lowercase();
    MealType::ALL
        .into_iter()
        .find(|m| m.as_str() == lower)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid meal type '{meal}'. Must be one of: {}",
                MEAL_TYPES.join(", ")
            )
        })
}

pub(crate) fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

/// One logged food item.
///
/// Entries written before ids existed deserialize with an empty id; the ledger
/// assigns and persists one the first time it loads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    #[serde(default)]
    pub id: String,
    pub date: NaiveDate,
    pub code: String,
    pub name: String,
    pub grams: f64,
    pub kcal: i64,
    #[serde(default)]
    pub meal_type: MealType,
}

/// Caller-supplied payload for adding or replacing an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFoodEntry {
    pub date: NaiveDate,
    pub code: String,
    pub name: String,
    pub grams: f64,
    pub kcal: i64,
    pub meal_type: MealType,
}

impl NewFoodEntry {
    pub(crate) fn into_entry(self, id: String) -> FoodEntry {
        FoodEntry {
            id,
            date: self.date,
            code: self.code,
            name: self.name,
            grams: self.grams,
            kcal: self.kcal,
            meal_type: self.meal_type,
        }
    }
}

impl From<&FoodEntry> for NewFoodEntry {
    fn from(e: &FoodEntry) -> Self {
        Self {
            date: e.date,
            code: e.code.clone(),
            name: e.name.clone(),
            grams: e.grams,
            kcal: e.kcal,
            meal_type: e.meal_type,
        }
    }
}

// --- Weight ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightObservation {
    pub date: NaiveDate,
    pub weight_kg: f64,
}

// --- Day view ---

/// An entry together with its 0-based rank among same-date entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub entry: FoodEntry,
}

#[derive(Debug, Clone, Serialize)]
pub struct MealGroup {
    pub meal_type: MealType,
    pub entries: Vec<RankedEntry>,
    pub subtotal_kcal: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayView {
    pub date: String,
    pub entries: Vec<FoodEntry>,
    pub meals: Vec<MealGroup>,
    pub total_kcal: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_weight_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmr: Option<i64>,
    pub balance: i64,
}

// --- Food catalog ---

/// A product as returned by the food catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub code: String,
    pub name: String,
    pub kcal_per_100g: f64,
}

/// kcal for a serving, rounded to whole kcal.
#[must_use]
pub fn calculate_kcal(grams: f64, kcal_per_100g: f64) -> i64 {
    (grams * kcal_per_100g / 100.0).round() as i64
}

/// Convert a quantity with a unit to grams.
/// Volume-based conversions assume water density (1 ml = 1 g).
/// Returns `(grams, is_approximate)` where `is_approximate` is true for volume conversions.
#[must_use]
pub fn convert_to_grams(quantity: f64, unit: &str) -> Option<(f64, bool)> {
    let lower = unit.to_lowercase();
    match lower.as_str() {
        "g" | "gram" | "grams" => Some((quantity, false)),
        "kg" | "kilogram" | "kilograms" => Some((quantity * 1000.0, false)),
        "lb" | "lbs" | "pound" | "pounds" => Some((quantity * 454.0, false)),
        "oz" | "ounce" | "ounces" => Some((quantity * 28.35, false)),
        "tbsp" | "tablespoon" | "tablespoons" => Some((quantity * 15.0, true)),
        "tsp" | "teaspoon" | "teaspoons" => Some((quantity * 5.0, true)),
        "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
            Some((quantity, true))
        }
        "l" | "liter" | "liters" | "litre" | "litres" => Some((quantity * 1000.0, true)),
        _ => None,
    }
}
