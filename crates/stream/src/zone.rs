use serde::{Deserialize, Serialize};
use slopeworld_common::{ChunkCoord, ObstacleCategory};

use crate::config::ConfigError;

/// Distance band along the slope that drives obstacle density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Near,
    Mid,
    Far,
}

/// Obstacles per square world unit for each category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryDensity {
    pub trees: f32,
    pub rocks: f32,
    pub ramps: f32,
}

impl CategoryDensity {
    pub fn get(&self, category: ObstacleCategory) -> f32 {
        match category {
            ObstacleCategory::Tree => self.trees,
            ObstacleCategory::Rock => self.rocks,
            ObstacleCategory::Ramp => self.ramps,
        }
    }
}

/// Zone cutoffs and the zone→density lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Downhill distance below which a chunk is `Near`.
    pub near_cutoff: f32,
    /// Downhill distance below which a chunk is `Mid`; at or beyond it, `Far`.
    pub far_cutoff: f32,
    pub near: CategoryDensity,
    pub mid: CategoryDensity,
    pub far: CategoryDensity,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            near_cutoff: 1500.0,
            far_cutoff: 4000.0,
            near: CategoryDensity {
                trees: 0.0003,
                rocks: 0.00012,
                ramps: 0.00004,
            },
            mid: CategoryDensity {
                trees: 0.0004,
                rocks: 0.00018,
                ramps: 0.00006,
            },
            far: CategoryDensity {
                trees: 0.0005,
                rocks: 0.00025,
                ramps: 0.00008,
            },
        }
    }
}

impl ZoneConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.near_cutoff < 0.0 || self.near_cutoff > self.far_cutoff {
            return Err(ConfigError::ZoneCutoffs {
                near: self.near_cutoff,
                far: self.far_cutoff,
            });
        }
        Ok(())
    }

    /// Classify a chunk by how far downhill (+Z) its origin lies.
    pub fn classify(&self, coord: ChunkCoord, chunk_size: f32) -> Zone {
        let downhill = (coord.z as f32 * chunk_size).max(0.0);
        if downhill < self.near_cutoff {
            Zone::Near
        } else if downhill < self.far_cutoff {
            Zone::Mid
        } else {
            Zone::Far
        }
    }

    pub fn density(&self, zone: Zone, category: ObstacleCategory) -> f32 {
        let table = match zone {
            Zone::Near => &self.near,
            Zone::Mid => &self.mid,
            Zone::Far => &self.far,
        };
        table.get(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_downhill_distance() {
        let zones = ZoneConfig::default();
        assert_eq!(zones.classify(ChunkCoord::new(0, 0), 256.0), Zone::Near);
        assert_eq!(zones.classify(ChunkCoord::new(5, -10), 256.0), Zone::Near);
        assert_eq!(zones.classify(ChunkCoord::new(0, 6), 256.0), Zone::Mid);
        assert_eq!(zones.classify(ChunkCoord::new(0, 15), 256.0), Zone::Mid);
        assert_eq!(zones.classify(ChunkCoord::new(0, 16), 256.0), Zone::Far);
    }

    #[test]
    fn density_increases_downhill() {
        let zones = ZoneConfig::default();
        for category in ObstacleCategory::ALL {
            let near = zones.density(Zone::Near, category);
            let mid = zones.density(Zone::Mid, category);
            let far = zones.density(Zone::Far, category);
            assert!(near < mid && mid < far, "{category}");
        }
    }

    #[test]
    fn inverted_cutoffs_rejected() {
        let zones = ZoneConfig {
            near_cutoff: 5000.0,
            far_cutoff: 100.0,
            ..ZoneConfig::default()
        };
        assert!(zones.validate().is_err());
    }
}
