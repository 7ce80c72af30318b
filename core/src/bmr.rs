//! Basal metabolic rate (Mifflin–St Jeor).

use chrono::{Datelike, Local, NaiveDate};

use crate::models::{Gender, Profile};

const WEIGHT_FACTOR: f64 = 10.0;
const HEIGHT_FACTOR: f64 = 6.25;
const AGE_FACTOR: f64 = 5.0;
const MALE_OFFSET: f64 = 5.0;
const OTHER_OFFSET: f64 = -161.0;

/// Whole years between `birth` and `on`, one less if the birthday hasn't come yet.
#[must_use]
pub fn age_on(birth: NaiveDate, on: NaiveDate) -> i32 {
    let mut age = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// BMR in kcal/day for `profile` at `weight_kg`, with age taken on `on`.
#[must_use]
pub fn compute_bmr(profile: &Profile, weight_kg: f64, on: NaiveDate) -> i64 {
    let age = f64::from(age_on(profile.birth_date, on));
    let offset = match profile.gender {
        Gender::Male => MALE_OFFSET,
        Gender::Other => OTHER_OFFSET,
    };
    let bmr = WEIGHT_FACTOR * weight_kg + HEIGHT_FACTOR * profile.height_cm - AGE_FACTOR * age
        + offset;
    bmr.round() as i64
}

#[must_use]
pub fn compute_bmr_today(profile: &Profile, weight_kg: f64) -> i64 {
    compute_bmr(profile, weight_kg, Local::now().date_naive())
}
