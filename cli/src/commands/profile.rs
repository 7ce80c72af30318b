use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use std::process;

use foodlog_core::bmr::age_on;
use foodlog_core::models::{Gender, Profile};
use foodlog_core::service::FoodLog;

use super::helpers::json_error;

pub(crate) struct OnboardArgs {
    pub name: String,
    pub gender: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub birth_date: String,
    pub goal_weight_kg: f64,
}

pub(crate) fn cmd_onboard(log: &FoodLog, args: OnboardArgs, json: bool) -> Result<()> {
    let gender: Gender = args.gender.parse()?;
    let birth_date = NaiveDate::parse_from_str(&args.birth_date, "%Y-%m-%d")
        .with_context(|| format!("Invalid birth date '{}'. Use YYYY-MM-DD", args.birth_date))?;
    for (label, value) in [
        ("Height", args.height_cm),
        ("Weight", args.weight_kg),
        ("Goal weight", args.goal_weight_kg),
    ] {
        if !value.is_finite() || value <= 0.0 {
            bail!("{label} must be greater than 0");
        }
    }

    let today = Local::now().date_naive();
    if birth_date > today {
        bail!("Birth date cannot be in the future");
    }

    let profile = Profile {
        name: args.name,
        gender,
        height_cm: args.height_cm,
        weight_kg_initial: args.weight_kg,
        birth_date,
        goal_weight_kg: args.goal_weight_kg,
    };
    log.onboard(&profile, today)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!(
            "Saved profile for {} ({:.1} kg, goal {:.1} kg)",
            profile.name, profile.weight_kg_initial, profile.goal_weight_kg
        );
    }

    Ok(())
}

pub(crate) fn cmd_profile_show(log: &FoodLog, json: bool) -> Result<()> {
    let Some(profile) = log.profile()? else {
        if json {
            println!("{}", json_error("No profile yet"));
        } else {
            eprintln!("No profile yet. Run `foodlog onboard` first.");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    let age = age_on(profile.birth_date, Local::now().date_naive());
    println!("Name:        {}", profile.name);
    println!("Gender:      {}", profile.gender);
    println!("Height:      {:.0} cm", profile.height_cm);
    println!("Born:        {} (age {age})", profile.birth_date);
    println!("Start:       {:.1} kg", profile.weight_kg_initial);
    println!("Goal:        {:.1} kg", profile.goal_weight_kg);

    Ok(())
}
