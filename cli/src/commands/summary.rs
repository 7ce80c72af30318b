use anyhow::Result;
use chrono::Local;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use foodlog_core::service::FoodLog;

use super::helpers::{date_key, no_neg_zero, parse_date};

pub(crate) fn cmd_day(log: &FoodLog, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let view = log.day_view(&date_key(date))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let date = &view.date;
    println!("=== {date} ===\n");

    match view.resolved_weight_kg {
        Some(kg) => println!("  Weight: {kg:.1} kg"),
        None => println!("  Weight: --"),
    }
    println!();

    for meal in &view.meals {
        let meal_label = meal.meal_type.as_str().to_uppercase();
        let sub = meal.subtotal_kcal;
        println!("  {meal_label} ({sub} kcal)");
        for r in &meal.entries {
            let rank = r.rank;
            let name = &r.entry.name;
            let grams = r.entry.grams;
            let kcal = r.entry.kcal;
            println!("    [{rank}] {name} — {grams:.0}g — {kcal} kcal");
        }
        println!();
    }

    let total = view.total_kcal;
    match view.bmr {
        Some(bmr) => {
            let balance = view.balance;
            println!("  BMR:     {bmr} kcal");
            println!("  TOTAL:   {total} kcal");
            println!("  BALANCE: {balance:+} kcal");
        }
        None => {
            println!("  TOTAL:   {total} kcal");
            eprintln!("  (no profile yet, run `foodlog onboard` to see BMR and balance)");
        }
    }

    Ok(())
}

pub(crate) fn cmd_history(log: &FoodLog, days: u32, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Eaten")]
        eaten: String,
        #[tabled(rename = "BMR")]
        bmr: String,
        #[tabled(rename = "Balance")]
        balance: String,
        #[tabled(rename = "Weight")]
        weight: String,
    }

    let today = Local::now().date_naive();
    let mut views = Vec::new();

    for i in 0..days {
        let date = today - chrono::Duration::days(i64::from(i));
        views.push(log.day_view(&date_key(date))?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if views.iter().all(|v| v.entries.is_empty()) {
        eprintln!("No entries in the last {days} days");
        process::exit(2);
    }

    let rows: Vec<HistoryRow> = views
        .iter()
        .map(|v| HistoryRow {
            date: v.date.clone(),
            eaten: v.total_kcal.to_string(),
            bmr: v.bmr.map_or_else(|| "-".to_string(), |b| b.to_string()),
            balance: format!("{:+}", v.balance),
            weight: v
                .resolved_weight_kg
                .map_or_else(|| "-".to_string(), |kg| format!("{:.1}", no_neg_zero(kg))),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
