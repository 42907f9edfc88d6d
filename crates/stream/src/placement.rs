use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use noise::{NoiseFn, Perlin};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use slopeworld_chunk::{Chunk, DownhillBias};
use slopeworld_common::ObstacleCategory;
use slopeworld_kernel::{ObstacleHost, ObstacleTemplates};
use slopeworld_noise::HeightMap;

use crate::config::{CategoryPlacement, PlacementConfig, StreamingConfig};
use crate::zone::Zone;

/// Salt mixed into the run seed for the cluster noise lattice.
const CLUSTER_SEED_SALT: u32 = 0x5eed_c105;

/// Cluster noise for a run. Distinct from the terrain lattice so obstacle
/// groups do not simply track elevation.
pub(crate) fn cluster_noise(seed: u64) -> Perlin {
    Perlin::new((seed as u32) ^ ((seed >> 32) as u32) ^ CLUSTER_SEED_SALT)
}

impl PlacementConfig {
    pub fn for_category(&self, category: ObstacleCategory) -> &CategoryPlacement {
        match category {
            ObstacleCategory::Tree => &self.trees,
            ObstacleCategory::Rock => &self.rocks,
            ObstacleCategory::Ramp => &self.ramps,
        }
    }
}

/// Outcome of placing obstacles on one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementSummary {
    pub zone: Zone,
    /// Candidates drawn across all categories.
    pub candidates: usize,
    pub spawned: usize,
    /// Candidates dropped by the cluster noise test.
    pub clustered_out: usize,
    /// Ramp candidates dropped by the probability gate.
    pub gated_out: usize,
    /// Spawns the host refused.
    pub failed: usize,
}

impl PlacementSummary {
    fn new(zone: Zone) -> Self {
        Self {
            zone,
            candidates: 0,
            spawned: 0,
            clustered_out: 0,
            gated_out: 0,
            failed: 0,
        }
    }
}

/// Read-only inputs for placement, borrowed from the manager.
pub(crate) struct PlacementContext<'a> {
    pub config: &'a StreamingConfig,
    pub templates: &'a ObstacleTemplates,
    pub cluster: &'a Perlin,
}

/// Scatter obstacles over a freshly meshed chunk.
///
/// Every draw comes from `rng`, in a fixed order per candidate: local x,
/// local z, ramp gate (ramps only), template index, yaw, scale. Candidates
/// rejected by the cluster test consume only their position draws.
pub(crate) fn place_obstacles<H: ObstacleHost + ?Sized>(
    ctx: &PlacementContext<'_>,
    rng: &mut ChaCha8Rng,
    host: &mut H,
    chunk: &mut Chunk,
    heightmap: &HeightMap,
) -> PlacementSummary {
    let config = ctx.config;
    let size = chunk.size();
    let half = size / 2.0;
    let area = size * size;
    let origin = chunk.origin();
    let bias = DownhillBias::new(config.downhill_slope);
    let zone = config.zones.classify(chunk.coord(), size);
    let mut summary = PlacementSummary::new(zone);

    for category in ObstacleCategory::ALL {
        let templates = ctx.templates.for_category(category);
        if templates.is_empty() {
            tracing::debug!(%category, "no templates registered, skipping category");
            continue;
        }
        let tuning = config.placement.for_category(category);
        let target = (config.zones.density(zone, category) * area * tuning.count_scale)
            .floor()
            .max(0.0) as usize;

        for _ in 0..target {
            summary.candidates += 1;
            let x = rng.random_range(-half..half);
            let z = rng.random_range(-half..half);

            let h = heightmap.sample_nearest((x + half) / size, (z + half) / size);
            let y = config.height_curve.evaluate(h) * config.height_multiplier
                - bias.drop_at(origin.z + z);

            let density = cluster_density(
                ctx.cluster,
                origin.x + x,
                origin.z + z,
                config.placement.cluster_frequency,
            );
            if density < config.placement.cluster_threshold {
                summary.clustered_out += 1;
                continue;
            }

            if category == ObstacleCategory::Ramp
                && !rng.random_bool(config.placement.ramp_probability as f64)
            {
                summary.gated_out += 1;
                continue;
            }

            let template = &templates[rng.random_range(0..templates.len())];
            let yaw = match category {
                ObstacleCategory::Ramp => {
                    let cone = config.placement.ramp_cone_degrees.abs().to_radians();
                    rng.random_range(-cone..=cone)
                }
                ObstacleCategory::Tree | ObstacleCategory::Rock => rng.random_range(0.0..TAU),
            };
            let scale = rng.random_range(tuning.min_scale..=tuning.max_scale);

            match chunk.spawn_obstacle(
                host,
                template,
                Vec3::new(x, y, z),
                Quat::from_rotation_y(yaw),
                Vec3::splat(scale),
            ) {
                Ok(_) => summary.spawned += 1,
                Err(err) => {
                    tracing::warn!(
                        coord = %chunk.coord(),
                        template = %template.name,
                        %err,
                        "obstacle spawn failed"
                    );
                    summary.failed += 1;
                }
            }
        }
    }

    summary
}

/// Cluster noise remapped to `[0, 1]` at a world position.
fn cluster_density(cluster: &Perlin, world_x: f32, world_z: f32, frequency: f32) -> f32 {
    let f = frequency as f64;
    let v = cluster.get([world_x as f64 * f, world_z as f64 * f]);
    ((v + 1.0) * 0.5).clamp(0.0, 1.0) as f32
}
