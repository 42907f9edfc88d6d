//! Obstacle kernel: the host that owns live obstacle instances.
//!
//! # Invariants
//! - Every instance is created and destroyed through [`ObstacleHost`].
//! - Instances carry their category tag for downstream collision and scoring.
//! - All mutations are recorded in an append-only event log.

pub mod host;
pub mod world;

pub use host::{ObstacleHost, ObstacleTemplate, ObstacleTemplates, SpawnError, SpawnRequest};
pub use world::{ObstacleEvent, ObstacleInstance, ObstacleWorld};

pub fn crate_info() -> &'static str {
    "slopeworld-kernel v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("kernel"));
    }
}
