use serde::{Deserialize, Serialize};
use slopeworld_chunk::HeightCurve;
use slopeworld_noise::NoiseSettings;
use std::path::Path;

use crate::StreamError;
use crate::zone::ZoneConfig;

/// Default number of chunks generated per tick.
pub const DEFAULT_CHUNKS_PER_TICK: usize = 2;

/// Streaming configuration: window radii, per-tick budget, terrain shaping,
/// and obstacle placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Run seed. Zero derives a seed from the current UTC date.
    pub seed: u64,
    /// Edge length of a chunk in world units.
    pub chunk_size: f32,
    /// Heightmap samples per chunk side.
    pub resolution: usize,
    /// Radius (world units) inside which chunks are requested.
    pub load_distance: f32,
    /// Distance beyond which resident chunks are destroyed. Must exceed `load_distance`.
    pub unload_distance: f32,
    /// Maximum chunks generated per tick.
    pub chunks_per_tick: usize,
    /// Rows behind the reference chunk that are still requested.
    pub trailing_margin: i32,
    pub noise: NoiseSettings,
    pub height_multiplier: f32,
    pub height_curve: HeightCurve,
    /// Elevation lost per world unit downhill (+Z).
    pub downhill_slope: f32,
    pub zones: ZoneConfig,
    pub placement: PlacementConfig,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            chunk_size: 256.0,
            resolution: 65,
            load_distance: 2000.0,
            unload_distance: 2500.0,
            chunks_per_tick: DEFAULT_CHUNKS_PER_TICK,
            trailing_margin: 2,
            noise: NoiseSettings::default(),
            height_multiplier: 30.0,
            height_curve: HeightCurve::Identity,
            downhill_slope: 0.3,
            zones: ZoneConfig::default(),
            placement: PlacementConfig::default(),
        }
    }
}

/// Validation failures for [`StreamingConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("chunk size must be positive, got {0}")]
    ChunkSize(f32),
    #[error("resolution must be at least 2, got {0}")]
    Resolution(usize),
    #[error("load distance must be positive, got {0}")]
    LoadDistance(f32),
    #[error("unload distance {unload} must exceed load distance {load}")]
    Hysteresis { load: f32, unload: f32 },
    #[error("chunks per tick must be at least 1")]
    ChunksPerTick,
    #[error("trailing margin must be non-negative, got {0}")]
    TrailingMargin(i32),
    #[error("zone cutoffs must satisfy 0 <= near ({near}) <= far ({far})")]
    ZoneCutoffs { near: f32, far: f32 },
    #[error("{field} must be within [0, 1], got {value}")]
    Probability { field: &'static str, value: f32 },
    #[error("{category} scale range is inverted or negative: [{min}, {max}]")]
    ScaleRange {
        category: &'static str,
        min: f32,
        max: f32,
    },
}

impl StreamingConfig {
    /// Check caller-supplied values. Noise scale is clamped, not rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size.is_nan() || self.chunk_size <= 0.0 {
            return Err(ConfigError::ChunkSize(self.chunk_size));
        }
        if self.resolution < 2 {
            return Err(ConfigError::Resolution(self.resolution));
        }
        if self.load_distance.is_nan() || self.load_distance <= 0.0 {
            return Err(ConfigError::LoadDistance(self.load_distance));
        }
        if self.unload_distance.is_nan() || self.unload_distance <= self.load_distance {
            return Err(ConfigError::Hysteresis {
                load: self.load_distance,
                unload: self.unload_distance,
            });
        }
        if self.chunks_per_tick == 0 {
            return Err(ConfigError::ChunksPerTick);
        }
        if self.trailing_margin < 0 {
            return Err(ConfigError::TrailingMargin(self.trailing_margin));
        }
        self.zones.validate()?;
        self.placement.validate()
    }

    /// Load a JSON config. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StreamError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Chunk window radius (in chunks) covering `load_distance`.
    pub fn window_radius(&self) -> i32 {
        (self.load_distance / self.chunk_size).ceil() as i32
    }
}

/// Scale and size bounds for one obstacle category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryPlacement {
    /// Multiplier on `density × chunk_area` when computing the candidate count.
    pub count_scale: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl CategoryPlacement {
    fn validate(&self, category: &'static str) -> Result<(), ConfigError> {
        if self.min_scale < 0.0 || self.min_scale > self.max_scale {
            return Err(ConfigError::ScaleRange {
                category,
                min: self.min_scale,
                max: self.max_scale,
            });
        }
        Ok(())
    }
}

/// Obstacle placement tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub trees: CategoryPlacement,
    pub rocks: CategoryPlacement,
    pub ramps: CategoryPlacement,
    /// World-space frequency of the cluster noise.
    pub cluster_frequency: f32,
    /// Candidates where the cluster noise (in `[0, 1]`) falls below this are skipped.
    pub cluster_threshold: f32,
    /// Chance that a ramp candidate surviving the cluster test is spawned.
    pub ramp_probability: f32,
    /// Half-angle of the downhill-facing cone ramps are rotated within.
    pub ramp_cone_degrees: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            trees: CategoryPlacement {
                count_scale: 1.0,
                min_scale: 0.8,
                max_scale: 1.6,
            },
            rocks: CategoryPlacement {
                count_scale: 1.0,
                min_scale: 0.5,
                max_scale: 1.4,
            },
            ramps: CategoryPlacement {
                count_scale: 1.0,
                min_scale: 0.9,
                max_scale: 1.2,
            },
            cluster_frequency: 0.01,
            cluster_threshold: 0.45,
            ramp_probability: 0.6,
            ramp_cone_degrees: 15.0,
        }
    }
}

impl PlacementConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.trees.validate("tree")?;
        self.rocks.validate("rock")?;
        self.ramps.validate("ramp")?;
        if !(0.0..=1.0).contains(&self.ramp_probability) {
            return Err(ConfigError::Probability {
                field: "ramp_probability",
                value: self.ramp_probability,
            });
        }
        if !(0.0..=1.0).contains(&self.cluster_threshold) {
            return Err(ConfigError::Probability {
                field: "cluster_threshold",
                value: self.cluster_threshold,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = StreamingConfig::default();
        assert_eq!(config.chunks_per_tick, 2);
        assert_eq!(config.load_distance, 2000.0);
        assert_eq!(config.unload_distance, 2500.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn window_radius_rounds_up() {
        let config = StreamingConfig::default();
        assert_eq!(config.window_radius(), 8);

        let config = StreamingConfig {
            load_distance: 256.0,
            ..StreamingConfig::default()
        };
        assert_eq!(config.window_radius(), 1);
    }

    #[test]
    fn unload_must_exceed_load() {
        let config = StreamingConfig {
            load_distance: 2000.0,
            unload_distance: 2000.0,
            ..StreamingConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Hysteresis {
                load: 2000.0,
                unload: 2000.0
            })
        );
    }

    #[test]
    fn non_positive_chunk_size_rejected() {
        let config = StreamingConfig {
            chunk_size: 0.0,
            ..StreamingConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ChunkSize(0.0)));
    }

    #[test]
    fn tiny_resolution_rejected() {
        let config = StreamingConfig {
            resolution: 1,
            ..StreamingConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Resolution(1)));
    }

    #[test]
    fn zero_budget_rejected() {
        let config = StreamingConfig {
            chunks_per_tick: 0,
            ..StreamingConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ChunksPerTick));
    }

    #[test]
    fn negative_noise_scale_is_not_a_config_error() {
        let mut config = StreamingConfig::default();
        config.noise.scale = -1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_ramp_probability_rejected() {
        let mut config = StreamingConfig::default();
        config.placement.ramp_probability = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Probability {
                field: "ramp_probability",
                ..
            })
        ));
    }

    #[test]
    fn inverted_scale_range_rejected() {
        let mut config = StreamingConfig::default();
        config.placement.rocks.min_scale = 2.0;
        config.placement.rocks.max_scale = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ScaleRange {
                category: "rock",
                ..
            })
        ));
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let config = StreamingConfig {
            seed: 99,
            height_curve: HeightCurve::Keyframes(vec![[0.0, 0.0], [1.0, 1.0]]),
            ..StreamingConfig::default()
        };
        config.save(tmp.path()).unwrap();

        let loaded = StreamingConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), r#"{ "seed": 7, "chunk_size": 128.0 }"#).unwrap();
        let loaded = StreamingConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded.seed, 7);
        assert_eq!(loaded.chunk_size, 128.0);
        assert_eq!(loaded.resolution, 65);
    }

    #[test]
    fn invalid_json_config_is_rejected_on_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), r#"{ "unload_distance": 10.0 }"#).unwrap();
        assert!(matches!(
            StreamingConfig::load(tmp.path()),
            Err(StreamError::Config(ConfigError::Hysteresis { .. }))
        ));
    }
}
