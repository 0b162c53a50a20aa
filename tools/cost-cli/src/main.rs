//! Court cost CLI
//!
//! Loads a roster and pricing parameters, runs the allocation engine and
//! prints per-attendee amounts with the event statistics:
//! - allocate: per-attendee split with redistribution and override
//! - breakdown: per-card-type statistics calculator
//! - defaults: pricing defaults for a player count
//! - init-config: write the default engine configuration as TOML

mod logging;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use tracing::debug;

use cost_allocator::money::format_amount;
use cost_allocator::pricing::courts_for_players;
use cost_allocator::roster::{card_type_counts, embedded_usage, parse_roster_json, parse_usage_json, sorted_by_card_type};
use cost_allocator::{
    calculate_breakdown, Allocation, Attendee, CardType, CardTypeBreakdown, CardTypeInput, CostAllocator,
    EngineConfig, PricingConfig, UsageMap,
};

#[derive(Parser)]
#[command(name = "cost-cli")]
#[command(about = "Split court rental costs across event attendees")]
#[command(version)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-attendee allocation
    Allocate {
        #[command(flatten)]
        event: EventArgs,

        /// JSON object of attendee id to usage count; overrides embedded usage
        #[arg(long)]
        usage: Option<PathBuf>,

        /// Engine configuration (TOML); environment variables otherwise
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the allocation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Per-card-type statistics
    Breakdown {
        #[command(flatten)]
        event: EventArgs,

        /// JSON object of attendee id to usage count; overrides embedded usage
        #[arg(long)]
        usage: Option<PathBuf>,

        /// Discount per card usage
        #[arg(long)]
        rate: Option<Decimal>,

        /// Print the breakdown as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show pricing defaults for a player count
    Defaults {
        #[arg(short, long)]
        players: usize,
    },

    /// Write the default engine configuration
    InitConfig {
        #[arg(short, long, default_value = "cost-allocator.toml")]
        output: PathBuf,
    },
}

/// Roster and stored event fields. Missing fields fall back to the defaults.
#[derive(Args)]
struct EventArgs {
    /// JSON array of attendees
    #[arg(short, long)]
    roster: PathBuf,

    #[arg(long)]
    courts: Option<u32>,

    #[arg(long)]
    hours: Option<Decimal>,

    #[arg(long)]
    price_per_hour: Option<Decimal>,

    /// Negotiated total for the whole event
    #[arg(long)]
    fame_total: Option<Decimal>,
}

impl EventArgs {
    fn load(&self) -> Result<(Vec<Attendee>, PricingConfig)> {
        let content = read(&self.roster)?;
        let roster = parse_roster_json(&content)
            .with_context(|| format!("Failed to parse roster {}", self.roster.display()))?;

        let pricing =
            PricingConfig::from_stored(roster.len(), self.courts, self.hours, self.price_per_hour, self.fame_total);
        pricing.validate().context("Invalid pricing")?;
        debug!(?pricing, attendees = roster.len(), "loaded event");
        Ok((roster, pricing))
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_usage(roster: &[Attendee], path: Option<&Path>) -> Result<UsageMap> {
    let mut usage = embedded_usage(roster);
    if let Some(path) = path {
        let recorded =
            parse_usage_json(&read(path)?).with_context(|| format!("Failed to parse usage {}", path.display()))?;
        usage.extend(recorded);
    }
    Ok(usage)
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load engine config {}", path.display())),
        None => EngineConfig::from_env().context("Invalid engine configuration in environment"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize_logging(&cli.log_level, cli.json_logs)?;

    match cli.command {
        Commands::Allocate { event, usage, config, json } => {
            let (roster, pricing) = event.load()?;
            let usage = load_usage(&roster, usage.as_deref())?;
            let allocator = CostAllocator::new(load_config(config.as_deref())?);
            let allocation = allocator.allocate(&roster, &pricing, &usage);

            if json {
                println!("{}", serde_json::to_string_pretty(&allocation)?);
            } else {
                print_allocation(&roster, &usage, &pricing, &allocation);
            }
        }
        Commands::Breakdown { event, usage, rate, json } => {
            let (roster, pricing) = event.load()?;
            let usage = load_usage(&roster, usage.as_deref())?;
            let rate = rate.unwrap_or_else(|| Decimal::from(cost_allocator::DISCOUNT_PER_USAGE));
            let input = CardTypeInput::from_roster(&roster, &usage, &pricing);
            let breakdown = calculate_breakdown(&input, rate);

            if json {
                println!("{}", serde_json::to_string_pretty(&breakdown)?);
            } else {
                print_breakdown(&roster, &breakdown);
            }
        }
        Commands::Defaults { players } => print_defaults(players),
        Commands::InitConfig { output } => {
            EngineConfig::default()
                .to_file(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{} {}", "Wrote".green().bold(), output.display());
        }
    }

    Ok(())
}

fn print_pricing(pricing: &PricingConfig) {
    println!(
        "  {} courts × {}/h × {}h = {}",
        pricing.courts_booked,
        pricing.price_per_hour,
        pricing.hours_booked,
        pricing.base_total().to_string().yellow().bold()
    );
    if let Some(total) = pricing.override_total() {
        println!("  {} {}", "Negotiated total:".bold(), total.to_string().magenta());
    }
}

fn print_allocation(roster: &[Attendee], usage: &UsageMap, pricing: &PricingConfig, allocation: &Allocation) {
    println!("{}", "Court cost allocation".cyan().bold());
    print_pricing(pricing);
    println!();

    let amounts = allocation.formatted_amounts();
    println!("  {:<20} {:<4} {:>5} {:>10}", "Attendee".bold(), "Card".bold(), "Uses".bold(), "Amount".bold());
    for attendee in sorted_by_card_type(roster) {
        let uses = usage.get(&attendee.id).copied().unwrap_or(attendee.metered_usage);
        let amount = amounts.get(&attendee.id).map(String::as_str).unwrap_or("0.00");
        println!(
            "  {:<20} {:<4} {:>5} {:>10}",
            attendee.id,
            attendee.card_type.short_label(),
            uses,
            amount.green()
        );
    }

    println!();
    for (card_type, subtotal) in &allocation.card_type_subtotals {
        println!("  {:<20} {:>21}", card_type.display_name(), format_amount(*subtotal));
    }

    let display = allocation.display();
    println!();
    println!("  {:<22} {}", "Total price:".bold(), display.total_price);
    println!("  {:<22} {}", "Discount:".bold(), display.discount);
    println!("  {:<22} {}", "Fame discount:".bold(), display.fame_discount);
    println!("  {:<22} {}", "Price after discount:".bold(), display.price_after_discount.yellow().bold());
}

fn print_breakdown(roster: &[Attendee], breakdown: &CardTypeBreakdown) {
    println!("{}", "Card type breakdown".cyan().bold());
    let counts: BTreeMap<CardType, usize> = card_type_counts(roster).into_iter().collect();

    println!("  {:<18} {:>7} {:>10}", "Card".bold(), "Players".bold(), "Share".bold());
    for card_type in CardType::ALL {
        let share = breakdown.share(card_type).unwrap_or("-");
        println!("  {:<18} {:>7} {:>10}", card_type.display_name(), counts[&card_type], share.green());
    }

    println!();
    println!("  {:<22} {}", "Total price:".bold(), breakdown.total_price);
    println!("  {:<22} {}", "Discount:".bold(), breakdown.discount);
    println!("  {:<22} {}", "Fame discount:".bold(), breakdown.fame_discount);
    println!("  {:<22} {}", "Price after discount:".bold(), breakdown.price_after_discount.yellow().bold());
}

fn print_defaults(players: usize) {
    let pricing = PricingConfig::from_stored(players, None, None, None, None);
    println!("{}", format!("Defaults for {} players", players).cyan().bold());
    println!("  {:<22} {}", "Courts:".bold(), courts_for_players(players));
    println!("  {:<22} {}", "Hours:".bold(), pricing.hours_booked);
    println!("  {:<22} {}", "Price per hour:".bold(), pricing.price_per_hour);
    println!("  {:<22} {}", "Discount per usage:".bold(), cost_allocator::DISCOUNT_PER_USAGE);
    println!("  {:<22} {}", "Base total:".bold(), pricing.base_total().to_string().yellow());
}
