mod cli;
mod render;

use std::path::Path;

use slm_core::model::{QuoteRequest, WorkOrderDraft};
use slm_services::{AppServices, Clock, QuoteConfig};
use tracing::{debug, info};

use crate::cli::{ArgsError, Cli, Command, Parsed, print_usage};

fn load_config(path: Option<&Path>) -> Result<QuoteConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(QuoteConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
    let config = QuoteConfig::from_toml_str(&raw)?;
    info!(path = %path.display(), "loaded quote configuration");
    Ok(config)
}

/// Creates the database file and its parent directory for file-backed URLs.
fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.contains("mode=memory") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

async fn execute(
    services: &AppServices,
    command: Command,
) -> Result<String, Box<dyn std::error::Error>> {
    let config = services.config();
    let currency = config.currency_symbol.as_str();

    let output = match command {
        Command::Quote(args) => {
            let request = QuoteRequest::new(args.material, args.weight_g)
                .with_difficulty(args.difficulty)
                .with_risk(args.risk)
                .with_post_process(args.post_hours, args.post_rate)
                .validate(&config)?;
            let breakdown = services.quotes().calculate_quote(&request).await?;
            render::quote(&breakdown, currency)
        }
        Command::Materials => {
            render::materials(&services.efficiency().all_materials_efficiency().await?)
        }
        Command::Stats => render::stats(&services.statistics().overview_stats().await?),
        Command::Costs => {
            render::cost_table(&services.cost_calculator().catalog_cost_table(), currency)
        }
        Command::Machine { select, years } => {
            if let Some(name) = select {
                let years = years.unwrap_or(config.default_depreciation_years);
                services.machines().select(&name, years).await?;
            }
            let current = services.machines().current().await?;
            render::machine(current.as_ref(), currency)
        }
        Command::Record(args) => {
            let draft = WorkOrderDraft::from_hours_minutes(
                args.material,
                args.weight_g,
                args.hours,
                args.minutes,
                args.lattice,
                args.note,
            );
            let recorded = services.work_orders().record(draft).await?;
            format!(
                "recorded work order #{} ({:.4} g/min)",
                recorded.id, recorded.efficiency
            )
        }
        Command::Orders { limit } => render::orders(&services.work_orders().recent(limit).await?),
        Command::Delete(id) => {
            if services.work_orders().delete(id).await? {
                format!("deleted work order #{id}")
            } else {
                format!("work order #{id} not found")
            }
        }
        Command::Seed => render::seed(services.seed_report()),
    };
    Ok(output)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = match Cli::parse() {
        Ok(Parsed::Run(cli)) => cli,
        Ok(Parsed::Help) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            return Err(e.into());
        }
    };

    let config = load_config(cli.config_path.as_deref())?;

    // Open + migrate + seed SQLite here so services stay storage-agnostic.
    prepare_sqlite_file(&cli.db_url)?;
    debug!(db_url = %cli.db_url, "opening store");
    let services = AppServices::new_sqlite(&cli.db_url, config, Clock::system()).await?;

    let output = execute(&services, cli.command).await?;
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
