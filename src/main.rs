use crate::argparse::{Commands, EntryAction, RemarksAction, StationAction, TrendKind};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::process::ExitCode;
use tankfarm::analytics::{self, numeric_field};
use tankfarm::database::{self, Pool};
use tankfarm::entries::request::SaveEntryRequest;
use tankfarm::entries::{self, DailyEntry, EntryReport};
use tankfarm::{logging, stations, trends};
use tracing::{error, info, Level};

// Command line front end only, the library holds the actual implementation
mod argparse;

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn station_command(pool: Pool, action: StationAction) -> Result<()> {
    let dao = stations::dao::Dao::new(pool);
    match action {
        StationAction::Add { name } => emit(&dao.create(&name).await?),
        StationAction::Rename { id, name } => emit(&dao.rename(id, &name).await?),
        StationAction::Delete { id } => {
            dao.delete(id).await?;
            Ok(())
        }
        StationAction::List {} => emit(&dao.list().await?),
    }
}

async fn entry_command(pool: Pool, action: EntryAction) -> Result<()> {
    let dao = entries::dao::Dao::new(pool);
    match action {
        EntryAction::Save { input } => {
            let text = fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let (station_id, submission) = SaveEntryRequest::from_json(&text)?.into_submission()?;
            let date = submission.date;
            let version = dao.upsert_entry(station_id, submission).await?;
            emit(&serde_json::json!({
                "stationId": station_id,
                "date": date,
                "version": version,
            }))
        }
        EntryAction::Show { key } => {
            let report = dao.entry(key.station, key.date).await?.map(DailyEntry::report);
            emit(&report)
        }
        EntryAction::History { station } => {
            let history: Vec<EntryReport> = dao
                .history(station)
                .await?
                .into_iter()
                .map(DailyEntry::report)
                .collect();
            emit(&history)
        }
        EntryAction::Delete { key } => {
            dao.delete_entry(key.station, key.date).await?;
            Ok(())
        }
    }
}

async fn remarks_command(pool: Pool, action: RemarksAction) -> Result<()> {
    let dao = entries::dao::Dao::new(pool);
    match action {
        RemarksAction::Get { key } => emit(&dao.remarks(key.station, key.date).await?),
        RemarksAction::Set { key, texts } => {
            let version = dao.save_remarks(key.station, key.date, texts).await?;
            emit(&serde_json::json!({
                "stationId": key.station,
                "date": key.date,
                "version": version,
            }))
        }
    }
}

async fn trend_command(pool: Pool, kind: TrendKind, key: argparse::EntryKey) -> Result<()> {
    let dao = trends::dao::Dao::new(pool);
    match kind {
        TrendKind::Inventory => emit(&serde_json::json!({
            "trends": dao.inventory_trend(key.station, key.date).await?,
        })),
        TrendKind::Quality => emit(&dao.quality_data(key.station, key.date).await?),
        TrendKind::Kpi => emit(&serde_json::json!({
            "trends": dao.kpi_series(key.station, key.date).await?,
        })),
    }
}

fn analyze(records: Vec<Value>, field: &str, threshold: f64) -> Result<()> {
    let analysis = analytics::analyze(records, numeric_field(field), threshold);
    if analysis.trend.is_flat() {
        info!("No usable trend for field {field}");
    }
    emit(&analysis)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = argparse::parse();

    let level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let _guards = logging::init(level, cli.console, Some(cli.log_file.as_path()));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            // Bad requests exit with 2 so scripts can tell them from failures
            let bad_request = e
                .downcast_ref::<tankfarm::Error>()
                .is_some_and(tankfarm::Error::is_client_error);
            if bad_request {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: argparse::Cli) -> Result<()> {
    let database_url = match cli.database {
        Some(url) => url,
        None => tankfarm::get_database_url()?,
    };
    let pool = database::init(&database_url, cli.pool_size)?;

    match cli.command {
        // Opening the database already applied them
        Commands::Migrate {} => Ok(()),
        Commands::Station { action } => station_command(pool, action).await,
        Commands::Entry { action } => entry_command(pool, action).await,
        Commands::Remarks { action } => remarks_command(pool, action).await,
        Commands::Trend { kind, key } => trend_command(pool, kind, key).await,
        Commands::Forecast {
            key,
            field,
            threshold,
        } => {
            let series = trends::dao::Dao::new(pool)
                .inventory_trend(key.station, key.date)
                .await?;
            let records = match serde_json::to_value(series)? {
                Value::Array(records) => records,
                _ => Vec::new(),
            };
            analyze(records, &field, threshold.threshold)
        }
        Commands::Analyze {
            input,
            field,
            threshold,
        } => {
            let text = fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let records: Vec<Value> = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a JSON array", input.display()))?;
            analyze(records, &field, threshold.threshold)
        }
    }
}
