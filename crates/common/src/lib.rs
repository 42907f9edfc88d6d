//! Shared value types for the slopeworld engine.

mod types;

pub use types::{ChunkCoord, MaterialHandle, ObstacleCategory, ObstacleHandle, Transform};
