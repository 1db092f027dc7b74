//! Headless driver: load a mod and bookmark, run the simulation for a
//! number of days, print an economy summary.

mod loader;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use vicsim_core::{Fixed, Scheduler, SimConfig, World};

#[derive(Parser, Debug)]
#[command(name = "vicsim", about = "Victorian-era simulation driver")]
struct Args {
    /// Path to the mod's declarative data (JSON).
    #[arg(long, requires = "bookmark")]
    data: Option<PathBuf>,

    /// Path to the starting bookmark (JSON).
    #[arg(long, requires = "data")]
    bookmark: Option<PathBuf>,

    /// Run the built-in demo world instead of loading files.
    #[arg(long, conflicts_with = "data")]
    demo: bool,

    /// Number of days to simulate.
    #[arg(long, default_value_t = 365)]
    days: u64,

    /// PRNG seed; identical seeds reproduce identical runs.
    #[arg(long, default_value_t = 1836)]
    seed: u64,

    /// Use the exponential price band instead of the legacy flat step.
    #[arg(long)]
    exponential_prices: bool,

    /// Print the economy summary every N days (0 = only at the end).
    #[arg(long, default_value_t = 30)]
    report_interval: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = SimConfig {
        exponential_price_changes: args.exponential_prices,
        ..SimConfig::default()
    };

    let mut world = match (&args.data, &args.bookmark) {
        (Some(data_path), Some(bookmark_path)) => {
            let data = loader::load_mod_data(data_path)?;
            let bookmark = loader::load_bookmark(bookmark_path)?;
            loader::build_world(&data, &bookmark, config, args.seed)?
        }
        _ => {
            log::info!("no mod data given, running the built-in demo world");
            vicsim_core::testing::WorldBuilder::new()
                .seed(args.seed)
                .config(config)
                .build()
        }
    };

    log::info!(
        "world ready: {} goods, {} provinces, {} countries, start {}",
        world.market.goods().len(),
        world.provinces.len(),
        world.countries.len(),
        world.date
    );

    let mut scheduler = Scheduler::new();
    for day in 1..=args.days {
        if !scheduler.try_tick(&mut world) {
            log::warn!("stop requested, halting after {} days", day - 1);
            break;
        }
        if args.report_interval > 0 && day % args.report_interval == 0 {
            report(&world);
        }
    }

    log::info!("finished at {}", world.date);
    report(&world);
    Ok(())
}

fn report(world: &World) {
    log::info!("--- {} ---", world.date);
    for (good_index, definition) in world.defs().goods.iter() {
        let instance = world.market.good(good_index);
        if !instance.is_available() {
            continue;
        }
        log::info!(
            "  {:<12} price {:>8} traded {:>10} (demand {}, supply {})",
            definition.identifier,
            instance.price().to_string(),
            instance.quantity_traded_yesterday().to_string(),
            instance.total_demand_yesterday(),
            instance.total_supply_yesterday()
        );
    }
    for (country_index, definition) in world.defs().countries.iter() {
        let country = world.country(country_index);
        if country.owned_provinces.is_empty() {
            continue;
        }
        let pop_cash: Fixed = country
            .owned_provinces
            .iter()
            .flat_map(|province| world.province(*province).pops.iter())
            .map(|pop| pop.cash)
            .sum();
        log::info!(
            "  {}: treasury {} (tax {} tariff {}), pops {} holding {}",
            definition.identifier,
            country.treasury,
            country.tax_income_today,
            country.tariff_income_today,
            country.total_population,
            pop_cash
        );
    }
}
