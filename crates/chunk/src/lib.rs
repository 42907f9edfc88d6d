//! Terrain chunks: ground geometry built once from a heightmap, plus the
//! obstacle handles placed on the tile.
//!
//! # Invariants
//! - Mesh and obstacles are built exactly once per chunk lifetime.
//! - A chunk owns its obstacle handles; clearing it destroys them all.
//! - Geometry is plain data, exposed through [`SurfaceGeometry`].

mod chunk;
mod mesh;

pub use chunk::{Chunk, ChunkState, SpawnedObstacle};
pub use mesh::{Aabb, ChunkMesh, CollisionShape, DownhillBias, HeightCurve, SurfaceGeometry};

/// Errors raised while building chunk geometry. These indicate a programming
/// error upstream and are surfaced as generation faults, never repaired.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChunkError {
    #[error("heightmap is {width}x{height}, chunk resolution is {expected}")]
    ResolutionMismatch {
        expected: usize,
        width: usize,
        height: usize,
    },
    #[error("heightmap must be square and at least 2x2, got {width}x{height}")]
    InvalidHeightMap { width: usize, height: usize },
    #[error("non-finite vertex height at grid cell ({x}, {y})")]
    NonFiniteHeight { x: usize, y: usize },
}

pub fn crate_info() -> &'static str {
    "slopeworld-chunk v0.1.0"
}
