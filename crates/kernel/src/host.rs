use serde::{Deserialize, Serialize};
use slopeworld_common::{ChunkCoord, ObstacleCategory, ObstacleHandle, Transform};

/// An external obstacle prefab supplied by the template registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObstacleTemplate {
    pub name: String,
    pub category: ObstacleCategory,
}

impl ObstacleTemplate {
    pub fn new(name: impl Into<String>, category: ObstacleCategory) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

/// Per-category template sets. An empty set disables that category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleTemplates {
    pub trees: Vec<ObstacleTemplate>,
    pub rocks: Vec<ObstacleTemplate>,
    pub ramps: Vec<ObstacleTemplate>,
}

impl ObstacleTemplates {
    pub fn for_category(&self, category: ObstacleCategory) -> &[ObstacleTemplate] {
        match category {
            ObstacleCategory::Tree => &self.trees,
            ObstacleCategory::Rock => &self.rocks,
            ObstacleCategory::Ramp => &self.ramps,
        }
    }

    /// Small default set: two trees, a boulder and a kicker ramp.
    pub fn basic() -> Self {
        Self {
            trees: vec![
                ObstacleTemplate::new("pine", ObstacleCategory::Tree),
                ObstacleTemplate::new("fir", ObstacleCategory::Tree),
            ],
            rocks: vec![ObstacleTemplate::new("boulder", ObstacleCategory::Rock)],
            ramps: vec![ObstacleTemplate::new("kicker", ObstacleCategory::Ramp)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty() && self.rocks.is_empty() && self.ramps.is_empty()
    }
}

/// Everything a host needs to instantiate one obstacle.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest<'a> {
    pub template: &'a ObstacleTemplate,
    /// Chunk the obstacle belongs to.
    pub chunk: ChunkCoord,
    /// Transform relative to the chunk origin.
    pub local: Transform,
    /// Transform in world space.
    pub world: Transform,
}

/// Errors raised by an obstacle host when it cannot instantiate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpawnError {
    #[error("obstacle capacity of {limit} reached")]
    CapacityExceeded { limit: usize },
    #[error("template rejected by host: {0}")]
    Rejected(String),
}

/// The instantiate/destroy seam between the streaming core and whatever layer
/// owns live obstacle objects (renderer, collision, gameplay).
pub trait ObstacleHost {
    /// Instantiate an obstacle and return a handle the caller will later destroy.
    fn spawn(&mut self, request: &SpawnRequest<'_>) -> Result<ObstacleHandle, SpawnError>;

    /// Destroy a previously spawned obstacle. Returns false for unknown handles.
    fn destroy(&mut self, handle: ObstacleHandle) -> bool;
}
