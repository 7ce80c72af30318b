mod commands;
mod config;
mod logging;
mod openfoodfacts;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::commands::{
    AddArgs, OnboardArgs, cmd_add, cmd_barcode, cmd_day, cmd_delete, cmd_history, cmd_log,
    cmd_onboard, cmd_profile_show, cmd_search, cmd_update, cmd_weight_history, cmd_weight_set,
    cmd_weight_show,
};
use crate::config::Config;
use crate::openfoodfacts::OpenFoodFactsClient;
use foodlog_core::service::FoodLog;

#[derive(Parser)]
#[command(
    name = "foodlog",
    version,
    about = "Track food, body weight and daily energy balance"
)]
struct Cli {
    /// Database file (overrides FOODLOG_DB and the default data directory)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Verbose logging (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or replace your profile and record your starting weight
    Onboard {
        /// Your name
        #[arg(long)]
        name: String,
        /// Gender used by the BMR formula: male or other
        #[arg(long)]
        gender: String,
        /// Height in cm
        #[arg(long)]
        height: f64,
        /// Current weight in kg
        #[arg(long)]
        weight: f64,
        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: String,
        /// Goal weight in kg
        #[arg(long)]
        goal: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show your profile
    Profile {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a food entry by searching `OpenFoodFacts`
    Log {
        /// Food name to search for
        food: String,
        /// Serving size (e.g. "200g", "500ml", "2 tbsp", "1.5 oz")
        serving: String,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look up a food by barcode and log it
    Barcode {
        /// Barcode number
        code: String,
        /// Serving size (e.g. "200g", "500ml", "2 tbsp")
        serving: String,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a food entry with a known kcal value
    Add {
        /// Food name
        name: String,
        /// Serving size (e.g. "200g")
        serving: String,
        /// kcal for the whole serving
        #[arg(long)]
        kcal: i64,
        /// Catalog code or barcode
        #[arg(long)]
        code: Option<String>,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search `OpenFoodFacts` for a food
    Search {
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a day's entries, kcal total, BMR and balance (defaults to today)
    Day {
        /// Date to show (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the last N days
    History {
        /// Number of days to show
        #[arg(short, long, default_value = "7")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change an entry's serving (kcal scales with it) or meal type
    Update {
        /// Entry position as shown in `foodlog day` (e.g. 0 for [0])
        rank: usize,
        /// Date of the entry (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// New serving size (e.g. "300g")
        #[arg(short, long)]
        serving: Option<String>,
        /// New meal type: breakfast, lunch, dinner, snack
        #[arg(long)]
        meal: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an entry
    Delete {
        /// Entry position as shown in `foodlog day`
        rank: usize,
        /// Date of the entry (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Track body weight
    Weight {
        #[command(subcommand)]
        command: WeightCommands,
    },
}

#[derive(Subcommand)]
enum WeightCommands {
    /// Record the weight for a date
    Set {
        /// Weight value (number)
        value: f64,
        /// Unit: kg or lbs (default: kg)
        #[arg(short, long, default_value = "kg")]
        unit: String,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the weight that applies on a date (default: today)
    Show {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weight history, newest first
    History {
        /// Number of entries to show (default: all)
        #[arg(short, long)]
        days: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db)?;
    tracing::debug!(
        db = %config.db_path.display(),
        data_dir = %config.data_dir.display(),
        "opening database"
    );
    let log = FoodLog::open(&config.db_path)?;

    match cli.command {
        Commands::Onboard {
            name,
            gender,
            height,
            weight,
            birth_date,
            goal,
            json,
        } => cmd_onboard(
            &log,
            OnboardArgs {
                name,
                gender,
                height_cm: height,
                weight_kg: weight,
                birth_date,
                goal_weight_kg: goal,
            },
            json,
        ),
        Commands::Profile { json } => cmd_profile_show(&log, json),
        Commands::Log {
            food,
            serving,
            meal,
            date,
            json,
        } => {
            let off = OpenFoodFactsClient::new()?;
            cmd_log(&log, &off, &food, &serving, &meal, date, json)
        }
        Commands::Barcode {
            code,
            serving,
            meal,
            date,
            json,
        } => {
            let off = OpenFoodFactsClient::new()?;
            cmd_barcode(&log, &off, &code, &serving, &meal, date, json)
        }
        Commands::Add {
            name,
            serving,
            kcal,
            code,
            meal,
            date,
            json,
        } => cmd_add(
            &log,
            AddArgs {
                name,
                serving,
                kcal,
                code,
                meal,
                date,
            },
            json,
        ),
        Commands::Search { query, json } => {
            let off = OpenFoodFactsClient::new()?;
            cmd_search(&log, &off, &query, json)
        }
        Commands::Day { date, json } => cmd_day(&log, date, json),
        Commands::History { days, json } => cmd_history(&log, days, json),
        Commands::Update {
            rank,
            date,
            serving,
            meal,
            json,
        } => cmd_update(&log, rank, date, serving.as_ref(), meal.as_ref(), json),
        Commands::Delete { rank, date, json } => cmd_delete(&log, rank, date, json),
        Commands::Weight { command } => match command {
            WeightCommands::Set {
                value,
                unit,
                date,
                json,
            } => cmd_weight_set(&log, value, &unit, date, json),
            WeightCommands::Show { date, json } => cmd_weight_show(&log, date, json),
            WeightCommands::History { days, json } => cmd_weight_history(&log, days, json),
        },
    }
}
