//! # Asset Reporter CLI
//!
//! One-shot reporting front end for the Aptos Asset SDK. Each subcommand
//! builds the services it needs, runs a single report, prints it, and
//! exits; nothing here runs in the background.
//!
//! ## Overview
//!
//! Three reports are available:
//! - `supplies <class>` aggregates circulating supplies for one asset
//!   class (`btc`, `stablecoins`, `lst` or `rwa`)
//! - `positions <wallet>` scans a wallet's resources and reports its
//!   protocol positions
//! - `classify <type-id>` resolves a Move type identifier against the
//!   protocol registry and the phantom-asset heuristics
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin asset_reporter -- supplies btc
//! cargo run --bin asset_reporter -- positions 0x42c5...
//! cargo run --bin asset_reporter -- classify "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>" --symbol APT
//! cargo run --bin asset_reporter -- --json supplies stablecoins
//! ```
//!
//! `--json` prints the raw report and suppresses the status banner, so
//! the output can be piped straight into `jq`.

use aptos_asset_sdk::{
    metrics, token_registry, BitcoinSupply, LedgerQuery, LiquidStakingSupply, NodeClient,
    PositionTracker, ProtocolRegistry, RwaRegistry, Settings, StablecoinSupply, SupplyResponse,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "asset_reporter", version, about = "Supply, position and classification reports for Aptos assets", long_about = None)]
struct Cli {
    /// Print the raw JSON report instead of the summary view.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate circulating supplies for one asset class.
    Supplies {
        /// Asset class: btc, stablecoins, lst or rwa.
        class: String,
    },
    /// Scan a wallet's resources and report its protocol positions.
    Positions {
        /// Wallet address, 0x-prefixed hex.
        wallet: String,
    },
    /// Classify a Move type identifier against the protocol registry.
    Classify {
        /// Full type identifier, e.g. `0x…::stapt_token::StakedApt`.
        type_id: String,

        /// Display symbol; feeds the phantom-asset heuristics.
        #[arg(short, long)]
        symbol: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    env_logger::init();

    let cli = Cli::parse();

    if !cli.json {
        println!("🚀 Aptos Asset Reporter");
        println!("═══════════════════════════════════════════════════════════════════\n");
    }

    // 1. Load settings
    let settings = Settings::new()?;
    if !cli.json {
        println!("✅ Settings loaded");
    }

    // 2. Register metric descriptions once per process
    if settings.metrics.enabled {
        metrics::describe_metrics();
        if !cli.json {
            println!("✅ Metric descriptions registered");
        }
    }

    if !cli.json {
        println!("\n📊 Reporter configuration:");
        println!("   Fullnode REST: {}", settings.node.rest_url);
        println!("   Indexer GraphQL: {}", settings.node.indexer_url);
        println!(
            "   Supply cache TTL: {} seconds",
            settings.cache.supply_ttl_seconds
        );
        println!("   Retry attempts: {}", settings.retry.max_attempts);
        if settings.metrics.enabled {
            println!("   Metrics: enabled (port {})", settings.metrics.port);
        } else {
            println!("   Metrics: disabled");
        }
        println!("   Log level: {}\n", settings.log.level);
    }

    let started = Instant::now();
    match cli.command {
        Commands::Supplies { class } => run_supplies(&settings, &class, cli.json).await?,
        Commands::Positions { wallet } => run_positions(&settings, &wallet, cli.json).await?,
        Commands::Classify { type_id, symbol } => {
            run_classify(&type_id, symbol.as_deref(), cli.json)?
        }
    }

    if !cli.json {
        println!("\n⏱️  Report completed in {:?}", started.elapsed());
    }

    Ok(())
}

async fn run_supplies(settings: &Settings, class: &str, json: bool) -> Result<()> {
    // El registro RWA no toca el fullnode, se atiende antes de armar el cliente.
    if class.eq_ignore_ascii_case("rwa") {
        let registry = RwaRegistry::new(settings)?;
        if !json {
            println!("✅ RWA registry client ready\n");
        }
        let report = registry.snapshot().await;

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        let headline = format!(
            "{} RWA assets on Aptos, {} total",
            report.asset_count, report.total_value_formatted
        );
        if report.success {
            println!("{}", headline.green().bold());
        } else {
            println!("{}", headline.red().bold());
        }
        for asset in &report.assets {
            println!(
                "   {:<32} {:>8}  [{}]",
                asset.name,
                format!("${:.1}M", asset.total_value / 1_000_000.0),
                asset.asset_class
            );
        }
        if let Some(error) = &report.error {
            println!("⚠️  {error}");
        }
        println!("\n📡 Source: {}", report.data_source);
        return Ok(());
    }

    let client: Arc<dyn LedgerQuery> = Arc::new(NodeClient::new(&settings.node)?);
    if !json {
        println!("✅ Node client ready\n");
    }

    let report = match class.to_ascii_lowercase().as_str() {
        "btc" | "bitcoin" => BitcoinSupply::new(client, settings).supplies().await,
        "stablecoins" | "stables" => StablecoinSupply::new(client, settings).supplies().await,
        "lst" | "liquid-staking" => LiquidStakingSupply::new(client, settings).supplies().await,
        other => anyhow::bail!(
            "unknown asset class '{other}', expected btc, stablecoins, lst or rwa"
        ),
    };

    print_supply_report(&report, json)
}

fn print_supply_report(report: &SupplyResponse, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let headline = format!(
        "Total supply: {} across {} records",
        report.total_supply_formatted,
        report.supplies.len()
    );
    if report.success {
        println!("{}", headline.green().bold());
    } else {
        println!("{}", headline.red().bold());
    }

    for record in &report.supplies {
        let share = record
            .percentage
            .map(|p| format!(" ({p:.1}%)"))
            .unwrap_or_default();
        println!("   {:<16} {}{}", record.symbol, record.formatted_supply, share);
        if let Some(breakdown) = &record.token_breakdown {
            for token in breakdown {
                println!("      └─ {:<12} {}", token.symbol, token.formatted_supply);
            }
        }
    }

    if let Some(error) = &report.error {
        println!("⚠️  {error}");
    }

    Ok(())
}

async fn run_positions(settings: &Settings, wallet: &str, json: bool) -> Result<()> {
    let client: Arc<dyn LedgerQuery> = Arc::new(NodeClient::new(&settings.node)?);
    if !json {
        println!("✅ Node client ready\n");
    }

    let tracker = PositionTracker::new(client, settings);
    let summary = tracker.position_summary(wallet).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{}: {} positions, {} active across {} protocols",
            summary.wallet_address,
            summary.positions.len(),
            summary.total_active_positions,
            summary.total_protocols
        )
        .bold()
    );

    for position in &summary.positions {
        let marker = if position.is_active { "🟢" } else { "⚪" };
        println!("{} {} ({})", marker, position.protocol, position.description);
        for token in &position.tokens {
            println!("     {} = {}", token.symbol, token.balance);
        }
        for lp in &position.lp_tokens {
            println!(
                "     {} [{}] = {}",
                lp.pool_tokens.join(" / "),
                lp.pool_type,
                lp.balance
            );
        }
    }

    if !summary.protocol_breakdown.is_empty() {
        println!("\n📊 Active positions by protocol:");
        for (protocol, count) in &summary.protocol_breakdown {
            println!("   {protocol}: {count}");
        }
    }

    Ok(())
}

fn run_classify(type_id: &str, symbol: Option<&str>, json: bool) -> Result<()> {
    let registry = ProtocolRegistry::default();
    let classification = registry.classification(type_id, symbol);
    let resolved_symbol = symbol
        .map(str::to_string)
        .unwrap_or_else(|| token_registry::symbol_for_asset_type(type_id));
    let suspicious = token_registry::is_suspicious_asset(type_id, symbol);

    if json {
        let report = serde_json::json!({
            "typeId": type_id,
            "symbol": resolved_symbol,
            "classification": classification,
            "isSuspicious": suspicious,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match &classification.protocol {
        Some(protocol) => println!("🏷️  Protocol: {}", protocol.green().bold()),
        None => println!("🏷️  Protocol: {}", "unknown".yellow()),
    }
    if let Some(label) = &classification.label {
        println!("   Label: {label}");
    }
    println!("   Symbol: {resolved_symbol}");
    if classification.is_phantom {
        println!(
            "   {} {}",
            "Phantom:".red().bold(),
            classification.phantom_reason.as_deref().unwrap_or("-")
        );
    }
    if suspicious {
        println!("   {}", "⚠️  Symbol pattern looks like a scam token".yellow());
    }

    Ok(())
}
