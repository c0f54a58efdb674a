//! Strata Walker
//!
//! Walks an observer east across procedurally generated terrain and streams
//! chunks around it, logging what each tick loads, unloads and meshes.
//! Useful for watching the streaming pipeline without a renderer.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p strata-walker --release -- [OPTIONS]
//! ```
//!
//! ## Options
//!
//! - `--radius <N>`: View radius in chunks (default: 8)
//! - `--seed <N>`: Terrain seed (default: 42)
//! - `--ticks <N>`: Number of ticks to simulate (default: 64)
//! - `--speed <BLOCKS>`: Distance walked per tick (default: 4)
//! - `--tree-seed <per-run|N>`: Tree seeding (default: the terrain seed)
//! - `-h, --help`: Print help message
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

use std::time::Instant;

use anyhow::{bail, Context};
use glam::Vec3;
use strata_core::constants::CHUNK_WIDTH;
use strata_world::{
    update_chunks, ChunkManager, ChunkStreamer, StreamingConfig, TerrainGenerator, TreeConfig,
    TreeGenerator, TreeSeeding,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Height of the observer above the terrain surface.
const EYE_HEIGHT: f32 = 2.0;

/// Walk parameters (from CLI or defaults).
#[derive(Debug, Clone)]
struct WalkParams {
    radius: i32,
    seed: u64,
    ticks: u32,
    speed: f32,
    tree_seeding: Option<TreeSeeding>,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            radius: StreamingConfig::default().view_radius,
            seed: 42,
            ticks: 64,
            speed: CHUNK_WIDTH as f32 / 4.0,
            tree_seeding: None,
        }
    }
}

impl WalkParams {
    /// Parse walk parameters from command line arguments.
    fn from_args(args: &[String]) -> anyhow::Result<Self> {
        let mut params = Self::default();

        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            let mut value = || {
                iter.next()
                    .with_context(|| format!("{arg} expects a value"))
            };
            match arg.as_str() {
                "--radius" => {
                    params.radius = value()?.parse().context("--radius expects an integer")?;
                    if params.radius < 0 {
                        bail!("--radius must not be negative");
                    }
                }
                "--seed" => params.seed = value()?.parse().context("--seed expects an integer")?,
                "--ticks" => params.ticks = value()?.parse().context("--ticks expects an integer")?,
                "--speed" => params.speed = value()?.parse().context("--speed expects a number")?,
                "--tree-seed" => {
                    let raw = value()?;
                    params.tree_seeding = Some(if raw == "per-run" {
                        TreeSeeding::PerRun
                    } else {
                        TreeSeeding::PerWorld(
                            raw.parse()
                                .context("--tree-seed expects `per-run` or an integer")?,
                        )
                    });
                }
                other => bail!("unknown option `{other}` (see --help)"),
            }
        }

        Ok(params)
    }

    fn tree_seeding(&self) -> TreeSeeding {
        self.tree_seeding.unwrap_or(TreeSeeding::PerWorld(self.seed))
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return Ok(());
    }
    let params = WalkParams::from_args(&args)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(
        seed = params.seed,
        radius = params.radius,
        ticks = params.ticks,
        speed = params.speed,
        "Strata walker starting"
    );

    let terrain = TerrainGenerator::with_seed(params.seed);
    let trees = TreeGenerator::new(TreeConfig {
        seeding: params.tree_seeding(),
        ..TreeConfig::default()
    })?;
    debug!(tree_seed = trees.seed(), "tree generator ready");

    let config = StreamingConfig {
        view_radius: params.radius,
        ..StreamingConfig::default()
    };
    let mut streamer = ChunkStreamer::new(config, terrain, trees)?;
    let mut manager = ChunkManager::new();

    let started = Instant::now();
    let mut x = 0.0_f32;
    let z = 0.0_f32;
    for tick in 0..params.ticks {
        let ground = streamer.terrain().height_at(x.floor() as i32, z.floor() as i32);
        let observer = Vec3::new(x, ground as f32 + 1.0 + EYE_HEIGHT, z);

        let tick_start = Instant::now();
        let update = update_chunks(&mut streamer, &mut manager, observer, params.radius);
        let elapsed = tick_start.elapsed();

        if !update.is_idle() {
            info!(
                tick,
                center_x = update.center.x,
                center_z = update.center.z,
                created = update.created.len(),
                unloaded = update.unloaded.len(),
                structures = update.structures_generated.len(),
                meshed = update.meshed.len(),
                ms = elapsed.as_secs_f64() * 1000.0,
                "tick"
            );
        }

        x += params.speed;
    }

    let faces: usize = manager
        .iter()
        .filter_map(|chunk| chunk.mesh())
        .map(|mesh| mesh.face_count())
        .sum();
    info!(
        loaded = manager.len(),
        faces,
        memory_mib = manager.memory_usage() as f64 / (1024.0 * 1024.0),
        total_ms = started.elapsed().as_secs_f64() * 1000.0,
        "walk finished"
    );

    Ok(())
}

fn print_help() {
    eprintln!(
        "Strata Walker: stream terrain around an observer walking east

USAGE:
    cargo run -p strata-walker --release -- [OPTIONS]

OPTIONS:
    --radius <N>              View radius in chunks (default: 8)
    --seed <N>                Terrain seed (default: 42)
    --ticks <N>               Number of ticks to simulate (default: 64)
    --speed <BLOCKS>          Distance walked per tick (default: 4)
    --tree-seed <per-run|N>   Tree seeding; per-run draws a fresh seed
                              (default: the terrain seed)
    -h, --help                Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                  Set log level (e.g., info, debug, trace)"
    );
}
