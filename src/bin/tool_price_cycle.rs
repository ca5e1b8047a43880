use anyhow::{anyhow, Result};
use clap::Parser;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use indexboard::config::{read_config_file, Config};
use indexboard::logger::{self, LogTag};
use indexboard::pipeline::{CycleOutcome, CycleSummary};
use indexboard::run::build_components;
use std::path::PathBuf;

/// Run a single price-update cycle and print what changed.
///
/// Uses the same configuration and database as the main binary unless
/// overridden.
#[derive(Parser, Debug)]
#[command(name = "tool_price_cycle", about = "Run one price-update cycle")]
struct Args {
    /// Config file (defaults to <data>/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite database to update instead of the configured one
    #[arg(long)]
    db: Option<PathBuf>,

    /// Pause between oracle batches in milliseconds
    #[arg(long)]
    batch_delay_ms: Option<u64>,

    /// Print the raw JSON summary instead of tables
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    indexboard::paths::ensure_all_directories().map_err(|e| anyhow!(e))?;
    logger::init();
    dotenv::dotenv().ok();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(indexboard::paths::get_config_path);
    let mut config: Config = read_config_file(&config_path).map_err(|e| anyhow!(e))?;

    if let Some(db) = &args.db {
        config.database.path = db.display().to_string();
    }
    if let Some(delay) = args.batch_delay_ms {
        config.oracle.batch_delay_ms = delay;
    }

    logger::info(
        LogTag::System,
        &format!(
            "Running price cycle against {}",
            indexboard::run::resolve_database_path(&config).display()
        ),
    );

    let components = build_components(&config)?;
    let outcome = components.updater.run_cycle().await?;
    logger::flush();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        CycleOutcome::NoTokens { message, .. } => println!("{}", message),
        CycleOutcome::Completed(summary) => print_summary(&summary),
    }
    Ok(())
}

fn print_summary(summary: &CycleSummary) {
    println!(
        "\nUpdated {} tokens, {} bundles, {} errors in {} ms\n",
        summary.updated,
        summary.updated_bundles.len(),
        summary.errors,
        summary.duration_ms
    );

    if !summary.updated_tokens.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(["#", "Symbol", "Address", "Price USD"]);
        for (i, token) in summary.updated_tokens.iter().enumerate() {
            table.add_row([
                Cell::new(i + 1),
                Cell::new(&token.symbol),
                Cell::new(token.address.as_str()),
                Cell::new(format!("{:.8}", token.price)),
            ]);
        }
        println!("{}", table);
    }

    if !summary.updated_bundles.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(["Bundle", "Title", "Current USD", "Change %"]);
        for bundle in &summary.updated_bundles {
            table.add_row([
                Cell::new(&bundle.id),
                Cell::new(&bundle.title),
                Cell::new(format!("{:.6}", bundle.current_price)),
                Cell::new(format!("{:+.2}", bundle.price_change_percent)),
            ]);
        }
        println!("{}", table);
    }

    if !summary.error_details.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(["Scope", "Error"]);
        for detail in &summary.error_details {
            let scope = match (&detail.address, &detail.bundle_id) {
                (Some(address), _) => format!("token {}", address),
                (None, Some(bundle_id)) => format!("bundle {}", bundle_id),
                (None, None) => "batch".to_string(),
            };
            table.add_row([Cell::new(scope), Cell::new(&detail.error)]);
        }
        println!("{}", table);
    }
}
