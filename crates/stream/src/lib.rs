//! Streaming: load window, generation budget, eviction, obstacle placement.
//!
//! # Invariants
//! - A coordinate is never both resident and pending, and never pending twice.
//! - At most `chunks_per_tick` chunks are generated per tick.
//! - A resident chunk is evicted only once it has left the load window and
//!   its horizontal distance exceeds `unload_distance`, which is always
//!   greater than `load_distance`.
//! - Same effective seed + same reference trajectory = same world.
//! - Recovery rewinds the generator to the effective seed; regeneration after
//!   recovery reproduces the same content.

mod budget;
mod config;
mod grid;
mod manager;
mod placement;
mod seed;
mod supervisor;
mod zone;

pub use budget::{FrameTimer, StreamStats, TickReport};
pub use config::{
    CategoryPlacement, ConfigError, DEFAULT_CHUNKS_PER_TICK, PlacementConfig, StreamingConfig,
};
pub use grid::{LoadWindow, horizontal_distance};
pub use manager::StreamingManager;
pub use placement::PlacementSummary;
pub use seed::{date_seed, resolve_seed};
pub use supervisor::{DEFAULT_FAULT_THRESHOLD, FaultSupervisor};
pub use zone::{CategoryDensity, Zone, ZoneConfig};

use slopeworld_chunk::ChunkError;
use slopeworld_common::ChunkCoord;

/// A chunk could not be produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("mesh generation failed for chunk {coord}: {source}")]
    Mesh {
        coord: ChunkCoord,
        #[source]
        source: ChunkError,
    },
}

impl GenerationError {
    pub fn coord(&self) -> ChunkCoord {
        match self {
            Self::Mesh { coord, .. } => *coord,
        }
    }
}

/// Errors from configuring or persisting the streamer.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("invalid streaming config: {0}")]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn crate_info() -> &'static str {
    "slopeworld-stream v0.1.0"
}
