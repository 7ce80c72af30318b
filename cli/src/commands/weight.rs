use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use foodlog_core::service::FoodLog;

use super::helpers::{date_key, no_neg_zero, parse_date};

const LBS_PER_KG: f64 = 2.20462;
const KG_PER_LB: f64 = 0.453_592;

pub(crate) fn to_kg(value: f64, unit: &str) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        bail!("Weight must be greater than 0");
    }
    match unit.to_lowercase().as_str() {
        "kg" => Ok(value),
        "lbs" | "lb" => Ok(no_neg_zero(value * KG_PER_LB)),
        _ => bail!("Invalid unit '{unit}'. Use 'kg' or 'lbs'"),
    }
}

pub(crate) fn cmd_weight_set(
    log: &FoodLog,
    value: f64,
    unit: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let weight_kg = to_kg(value, unit)?;
    if !unit.eq_ignore_ascii_case("kg") {
        eprintln!("Converting {value:.1} lbs → {weight_kg:.2} kg");
    }

    let date = date_key(parse_date(date)?);
    log.set_weight(&date, weight_kg)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "date": date, "weight_kg": weight_kg })
        );
    } else {
        let lbs = weight_kg * LBS_PER_KG;
        println!("Logged {weight_kg:.1} kg ({lbs:.1} lbs) for {date}");
    }

    Ok(())
}

/// Show the weight that applies on a date; notes when it was carried over from an
/// earlier date or the profile.
pub(crate) fn cmd_weight_show(log: &FoodLog, date: Option<String>, json: bool) -> Result<()> {
    let date = date_key(parse_date(date)?);
    let exact = log.weight(&date)?;
    let resolved = log.resolve_weight(&date)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "date": date,
                "weight_kg": exact,
                "resolved_weight_kg": resolved,
            })
        );
        return Ok(());
    }

    match (exact, resolved) {
        (Some(kg), _) => {
            let lbs = kg * LBS_PER_KG;
            println!("{date}: {kg:.1} kg ({lbs:.1} lbs)");
        }
        (None, Some(kg)) => {
            println!("{date}: {kg:.1} kg (carried over, nothing logged that day)");
        }
        (None, None) => eprintln!("No weight known for {date}"),
    }

    Ok(())
}

pub(crate) fn cmd_weight_history(log: &FoodLog, days: Option<u32>, json: bool) -> Result<()> {
    let entries = log.weight_history(days.map(|d| d as usize))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        eprintln!("No weight entries found. Use `foodlog weight set` to record your weight.");
    } else {
        #[derive(Tabled)]
        struct WeightRow {
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Weight (kg)")]
            kg: String,
            #[tabled(rename = "Weight (lbs)")]
            lbs: String,
        }

        let rows: Vec<WeightRow> = entries
            .iter()
            .map(|e| WeightRow {
                date: date_key(e.date),
                kg: format!("{:.1}", e.weight_kg),
                lbs: format!("{:.1}", e.weight_kg * LBS_PER_KG),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }

    Ok(())
}
