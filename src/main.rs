//! Riftweave - Entry Point
//!
//! Loads a generation config, builds a world from the command line
//! blueprint and prints a summary. The full world can be written as JSON.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use riftweave::error::WorldGenError;
use riftweave::{generate_world, GenerationConfig, RoomBounds, World, WorldBlueprint};

#[derive(Parser, Debug)]
#[command(name = "riftweave")]
#[command(about = "Generate a seeded metroidvania world")]
struct Args {
    /// World seed
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// RON generation config (defaults are used if missing)
    #[arg(short, long, default_value = "riftweave.ron")]
    config: PathBuf,

    /// Write the default config to this path and exit
    #[arg(long)]
    export_config: Option<PathBuf>,

    /// Number of stacked regions
    #[arg(short, long, default_value = "2")]
    regions: u32,

    /// Districts per region
    #[arg(short, long, default_value = "6")]
    districts: u32,

    /// Rooms per sector
    #[arg(long, default_value = "3")]
    rooms: u32,

    /// Minimum room width in tiles
    #[arg(long, default_value = "40")]
    room_width: i32,

    /// Minimum room height in tiles
    #[arg(long, default_value = "28")]
    room_height: i32,

    /// Re-seed this many times when districts contradict
    #[arg(long, default_value = "3")]
    retries: u32,

    /// Write the generated world as JSON
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting Riftweave v{}", env!("CARGO_PKG_VERSION"));

    if let Some(path) = &args.export_config {
        GenerationConfig::export_default(path)
            .with_context(|| format!("exporting config to {}", path.display()))?;
        log::info!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let config = GenerationConfig::load_or_default(&args.config);
    let blueprint = WorldBlueprint {
        seed: args.seed,
        regions: args.regions,
        districts_per_region: args.districts,
        rooms_per_sector: args.rooms,
        room_bounds: RoomBounds::new(args.room_width, args.room_height),
        ..WorldBlueprint::default()
    };

    let world = generate_with_retries(blueprint, &config, args.retries)?;
    print_summary(&world);

    if let Some(path) = &args.out {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &world)
            .with_context(|| format!("writing world to {}", path.display()))?;
        log::info!("Wrote world to {}", path.display());
    }

    Ok(())
}

/// District contradictions are re-seeded; anything else is fatal
fn generate_with_retries(blueprint: WorldBlueprint, config: &GenerationConfig, retries: u32) -> Result<World> {
    let base_seed = blueprint.seed;
    let mut attempt = 0;
    loop {
        let seed = base_seed.wrapping_add(attempt as u64);
        match generate_world(&blueprint.clone().with_seed(seed), config) {
            Ok(world) => return Ok(world),
            Err(WorldGenError::Contradiction(report)) if attempt < retries => {
                log::warn!("{}", report);
                log::warn!("Re-seeding with {}", seed.wrapping_add(1));
                attempt += 1;
            }
            Err(e) => return Err(e).context("world generation failed"),
        }
    }
}

fn print_summary(world: &World) {
    println!("World seed {} ({} solve passes)", world.seed, world.solve_passes);
    println!("Districts:");
    for (district_type, count) in world.district_counts() {
        println!("  {:<10} {}", district_type.name(), count);
    }
    println!("Biomes:");
    for (biome, count) in world.biome_counts() {
        println!("  {:<10} {}", biome.name(), count);
    }
    println!(
        "Rooms: {} generated, {} failed, {} with unreachable features, {} features total",
        world.rooms.len(),
        world.failures.len(),
        world.rooms_with_unreachable(),
        world.feature_count()
    );
    for failure in &world.failures {
        println!("  {}", failure);
    }
}
