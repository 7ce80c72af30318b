use anyhow::{Result, bail};
use std::process;

use foodlog_core::error::LedgerError;
use foodlog_core::models::validate_meal_type;
use foodlog_core::service::FoodLog;

use super::helpers::{date_key, json_error, parse_date, parse_grams};

/// Print a "not found" message for out-of-range ranks and exit 2; anything else
/// is returned to `main`.
fn handle_missing(err: anyhow::Error, json: bool) -> Result<()> {
    match err.downcast_ref::<LedgerError>() {
        Some(e @ LedgerError::IndexOutOfRange { .. }) => {
            if json {
                println!("{}", json_error(&e.to_string()));
            } else {
                eprintln!("{e}");
            }
            process::exit(2);
        }
        _ => Err(err),
    }
}

pub(crate) fn cmd_delete(
    log: &FoodLog,
    rank: usize,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = date_key(parse_date(date)?);
    match log.remove_entry_at(&date, rank) {
        Ok(entry) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                println!("Deleted [{rank}] {} ({} kcal) from {date}", entry.name, entry.kcal);
            }
            Ok(())
        }
        Err(e) => handle_missing(e, json),
    }
}

pub(crate) fn cmd_update(
    log: &FoodLog,
    rank: usize,
    date: Option<String>,
    serving: Option<&String>,
    meal: Option<&String>,
    json: bool,
) -> Result<()> {
    if serving.is_none() && meal.is_none() {
        bail!("Nothing to update. Provide at least one of --serving or --meal");
    }

    let grams = serving.map(|s| parse_grams(s)).transpose()?;
    let meal_type = meal.map(|m| validate_meal_type(m)).transpose()?;
    let date = date_key(parse_date(date)?);

    match log.rescale_entry_at(&date, rank, grams, meal_type) {
        Ok(entry) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                let name = &entry.name;
                let grams = entry.grams;
                let meal = entry.meal_type;
                let kcal = entry.kcal;
                println!("Updated [{rank}]: {name} {grams:.0}g for {meal} — {kcal} kcal");
            }
            Ok(())
        }
        Err(e) => handle_missing(e, json),
    }
}
