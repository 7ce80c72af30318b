use anyhow::{Context, Result};
use std::process;

use foodlog_core::models::{FoodEntry, NewFoodEntry, validate_meal_type};
use foodlog_core::service::{FoodLog, FoodLookupProvider};

use super::helpers::{
    date_key, json_error, parse_date, parse_grams, print_product_table, prompt_choice,
};

fn print_logged(entry: &FoodEntry, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entry)?);
    } else {
        let name = &entry.name;
        let grams = entry.grams;
        let meal_type = entry.meal_type;
        let kcal = entry.kcal;
        println!("Logged: {name} {grams:.0}g for {meal_type} — {kcal} kcal");
    }
    Ok(())
}

pub(crate) fn cmd_log(
    log: &FoodLog,
    catalog: &dyn FoodLookupProvider,
    query: &str,
    serving: &str,
    meal: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let meal_type = validate_meal_type(meal)?;
    let grams = parse_grams(serving)?;
    let date = parse_date(date)?;

    let mut products = log.search_products(catalog, query)?;

    if products.is_empty() {
        if json {
            println!("{}", json_error(&format!("No food found for '{query}'")));
        } else {
            eprintln!("No food found for '{query}'");
        }
        process::exit(2);
    }

    let product = if products.len() == 1 {
        products.swap_remove(0)
    } else {
        print_product_table(&products);
        let idx = prompt_choice(products.len())?;
        products.swap_remove(idx)
    };

    let entry = log.log_product(&date_key(date), meal_type, &product, grams)?;
    print_logged(&entry, json)
}

pub(crate) fn cmd_barcode(
    log: &FoodLog,
    catalog: &dyn FoodLookupProvider,
    code: &str,
    serving: &str,
    meal: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let meal_type = validate_meal_type(meal)?;
    let grams = parse_grams(serving)?;
    let date = parse_date(date)?;

    let product = log
        .lookup_barcode(catalog, code)?
        .with_context(|| format!("No product found for barcode '{code}'"))?;

    let entry = log.log_product(&date_key(date), meal_type, &product, grams)?;
    print_logged(&entry, json)
}

pub(crate) struct AddArgs {
    pub name: String,
    pub serving: String,
    pub kcal: i64,
    pub code: Option<String>,
    pub meal: String,
    pub date: Option<String>,
}

/// Log an entry with hand-entered kcal, bypassing the catalog.
pub(crate) fn cmd_add(log: &FoodLog, args: AddArgs, json: bool) -> Result<()> {
    let entry = log.log_entry(NewFoodEntry {
        date: parse_date(args.date)?,
        code: args.code.unwrap_or_default(),
        name: args.name,
        grams: parse_grams(&args.serving)?,
        kcal: args.kcal,
        meal_type: validate_meal_type(&args.meal)?,
    })?;
    print_logged(&entry, json)
}
