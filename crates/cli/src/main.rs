mod form;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use expense_core::{
    FormBounds, RawSelection, FLIGHT_CLASS_SENTINEL, LOCATION_SENTINEL, PLACE_SENTINEL,
};
use expense_estimator::config::{
    DEFAULT_FLIGHTS_CSV, DEFAULT_HOTELS_CSV, DEFAULT_MODEL_PATH, DEFAULT_PREPROCESSOR_PATH,
};
use expense_estimator::{EstimatorConfig, ExpenseEstimator};
use expense_observability::{init_tracing, AppMetrics};

use crate::form::FormPrompter;

#[derive(Debug, Parser)]
#[command(name = "expense")]
#[command(about = "Total travel expense estimator")]
struct Cli {
    #[arg(long, env = "EXPENSE_FLIGHTS_CSV", default_value = DEFAULT_FLIGHTS_CSV)]
    flights: PathBuf,

    #[arg(long, env = "EXPENSE_HOTELS_CSV", default_value = DEFAULT_HOTELS_CSV)]
    hotels: PathBuf,

    #[arg(long, env = "EXPENSE_PREPROCESSOR_PATH", default_value = DEFAULT_PREPROCESSOR_PATH)]
    preprocessor: PathBuf,

    #[arg(long, env = "EXPENSE_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    #[arg(long, env = "EXPENSE_ENFORCE_BOUNDS", default_value_t = true, action = ArgAction::Set)]
    enforce_bounds: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Catalog,
    Estimate {
        #[arg(long, default_value_t = 0)]
        hotel_price: u32,
        #[arg(long, default_value_t = 0)]
        flight_price: u32,
        #[arg(long, default_value = LOCATION_SENTINEL)]
        from: String,
        #[arg(long, default_value = LOCATION_SENTINEL)]
        to: String,
        #[arg(long, default_value_t = 1)]
        days: u32,
        #[arg(long, default_value = FLIGHT_CLASS_SENTINEL)]
        flight_class: String,
        #[arg(long, default_value_t = 100)]
        distance: u32,
        #[arg(long, default_value = PLACE_SENTINEL)]
        place: String,
    },
    Form,
}

fn main() -> Result<()> {
    init_tracing("expense_cli");
    let cli = Cli::parse();

    let config = EstimatorConfig {
        flights_csv: cli.flights,
        hotels_csv: cli.hotels,
        preprocessor_path: cli.preprocessor,
        model_path: cli.model,
        enforce_bounds: cli.enforce_bounds,
        bounds: FormBounds::default(),
    };
    let estimator = ExpenseEstimator::load(&config, AppMetrics::shared());

    match cli.command {
        Command::Catalog => {
            println!("{}", serde_json::to_string_pretty(&estimator.form())?);
        }
        Command::Estimate {
            hotel_price,
            flight_price,
            from,
            to,
            days,
            flight_class,
            distance,
            place,
        } => {
            let response = estimator
                .submit(RawSelection {
                    hotel_nightly_price: hotel_price,
                    flight_price,
                    origin: from,
                    destination: to,
                    days,
                    flight_class_label: flight_class,
                    distance_km: distance,
                    stay_place: place,
                })
                .into_response();
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Form => {
            let stdin = io::stdin();
            let mut prompter = FormPrompter::new(stdin.lock(), io::stdout());
            prompter.run(&estimator)?;
        }
    }

    Ok(())
}
