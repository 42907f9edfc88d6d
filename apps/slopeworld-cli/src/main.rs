use std::path::PathBuf;

use clap::{Parser, Subcommand};
use glam::Vec3;
use slopeworld_common::{MaterialHandle, ObstacleCategory};
use slopeworld_kernel::ObstacleTemplates;
use slopeworld_stream::{FaultSupervisor, StreamingConfig, StreamingManager, resolve_seed};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slopeworld-cli", about = "Drive the slopeworld streaming engine")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Simulate a run downhill and print streaming stats
    Run {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "300")]
        ticks: u64,
        /// Run seed; 0 uses today's date
        #[arg(short, long)]
        seed: Option<u64>,
        /// Downhill distance covered per tick
        #[arg(long, default_value = "25.0")]
        speed: f32,
        /// JSON streaming config
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Check that two engines on the same trajectory stream the same world,
    /// one of them recovering and replaying midway
    Verify {
        #[arg(short, long, default_value = "100")]
        ticks: u64,
        #[arg(short, long, default_value = "42")]
        seed: u64,
        #[arg(long, default_value = "25.0")]
        speed: f32,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the effective seed for today
    Seed,
}

fn load_config(path: Option<PathBuf>, seed: Option<u64>) -> anyhow::Result<StreamingConfig> {
    let mut config = match path {
        Some(path) => StreamingConfig::load(&path)
            .map_err(|e| anyhow::anyhow!("loading {}: {e}", path.display()))?,
        None => StreamingConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    Ok(config)
}

fn build(config: StreamingConfig) -> anyhow::Result<StreamingManager> {
    Ok(StreamingManager::with_world(
        config,
        ObstacleTemplates::basic(),
        MaterialHandle(1),
    )?)
}

/// Reference position after `tick` ticks: straight down the fall line.
fn trajectory(tick: u64, speed: f32, slope: f32) -> Vec3 {
    let z = tick as f32 * speed;
    Vec3::new(0.0, -z * slope, z)
}

fn descend(manager: &mut StreamingManager, sup: &mut FaultSupervisor, ticks: u64, speed: f32) {
    let slope = manager.config().downhill_slope;
    for t in 0..ticks {
        manager.set_reference_position(trajectory(t, speed, slope));
        sup.tick(manager);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("slopeworld-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("noise: {}", slopeworld_noise::crate_info());
            println!("kernel: {}", slopeworld_kernel::crate_info());
            println!("chunk: {}", slopeworld_chunk::crate_info());
            println!("stream: {}", slopeworld_stream::crate_info());
        }
        Commands::Run {
            ticks,
            seed,
            speed,
            config,
        } => {
            let config = load_config(config, seed)?;
            let mut manager = build(config)?;
            let mut sup = FaultSupervisor::default();
            println!(
                "Run: seed={}, ticks={ticks}, speed={speed}",
                manager.seed()
            );

            descend(&mut manager, &mut sup, ticks, speed);

            let stats = manager.stats();
            let timer = manager.frame_timer();
            println!(
                "Chunks: resident={}, pending={}, generated={}, evicted={}",
                stats.total_resident_chunks,
                stats.total_pending_chunks,
                stats.total_generated,
                stats.total_evicted
            );
            let host = manager.host();
            println!(
                "Obstacles: total={}, trees={}, rocks={}, ramps={}",
                host.len(),
                host.count_by_category(ObstacleCategory::Tree),
                host.count_by_category(ObstacleCategory::Rock),
                host.count_by_category(ObstacleCategory::Ramp)
            );
            println!(
                "Tick time: avg={:?}, max={:?} (last {} ticks)",
                timer.average(),
                timer.max(),
                timer.count()
            );
            println!("Recoveries: {}", sup.recoveries());
            println!("Content hash: {:#018x}", manager.content_hash());
        }
        Commands::Verify {
            ticks,
            seed,
            speed,
            config,
        } => {
            let config = load_config(config, Some(seed))?;
            println!("Determinism check: seed={seed}, ticks={ticks}");

            let mut a = build(config.clone())?;
            let mut b = build(config)?;
            let mut sup_a = FaultSupervisor::default();
            let mut sup_b = FaultSupervisor::default();

            descend(&mut a, &mut sup_a, ticks, speed);

            // Second engine: run halfway, recover, replay the whole trajectory.
            descend(&mut b, &mut sup_b, ticks / 2, speed);
            b.recover_to_safe_state();
            descend(&mut b, &mut sup_b, ticks, speed);

            let (ha, hb) = (a.content_hash(), b.content_hash());
            println!("Engine A: resident={}, hash={ha:#018x}", a.resident_count());
            println!("Engine B: resident={}, hash={hb:#018x}", b.resident_count());
            if ha != hb {
                anyhow::bail!("content hashes diverged");
            }
            println!("Match: OK");
        }
        Commands::Seed => {
            println!("{}", resolve_seed(0));
        }
    }

    Ok(())
}
