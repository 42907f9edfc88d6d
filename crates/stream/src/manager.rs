use std::collections::{BTreeMap, HashSet, VecDeque};
use std::time::Instant;

use glam::Vec3;
use noise::Perlin;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use slopeworld_chunk::{Chunk, DownhillBias};
use slopeworld_common::{ChunkCoord, MaterialHandle};
use slopeworld_kernel::{ObstacleHost, ObstacleTemplates, ObstacleWorld};
use slopeworld_noise::{HeightMap, generate_height_map};

use crate::budget::{FrameTimer, StreamStats, TickReport};
use crate::config::StreamingConfig;
use crate::grid::{LoadWindow, horizontal_distance};
use crate::placement::{PlacementContext, PlacementSummary, cluster_noise, place_obstacles};
use crate::seed::resolve_seed;
use crate::{GenerationError, StreamError};

const FRAME_HISTORY: usize = 120;

/// Keeps terrain resident around a moving reference point.
///
/// Owns the chunk registry, the pending-generation queue, the obstacle host,
/// and the run's single placement generator. Every draw happens inside
/// [`tick`](Self::tick) / [`generate`](Self::generate), in window order, so
/// the same seed and trajectory reproduce the same world.
pub struct StreamingManager<H: ObstacleHost = ObstacleWorld> {
    config: StreamingConfig,
    seed: u64,
    templates: ObstacleTemplates,
    material: MaterialHandle,
    host: H,
    rng: ChaCha8Rng,
    cluster: Perlin,
    reference: Option<Vec3>,
    chunks: BTreeMap<ChunkCoord, Chunk>,
    pending: VecDeque<ChunkCoord>,
    /// Mirrors `pending` for O(1) membership checks.
    pending_set: HashSet<ChunkCoord>,
    stats: StreamStats,
    timer: FrameTimer,
}

impl StreamingManager<ObstacleWorld> {
    /// Manager backed by the in-process [`ObstacleWorld`].
    pub fn with_world(
        config: StreamingConfig,
        templates: ObstacleTemplates,
        material: MaterialHandle,
    ) -> Result<Self, StreamError> {
        Self::new(config, templates, material, ObstacleWorld::new())
    }
}

impl<H: ObstacleHost> StreamingManager<H> {
    /// Validate the config, resolve the effective seed, and seed the generator.
    pub fn new(
        config: StreamingConfig,
        templates: ObstacleTemplates,
        material: MaterialHandle,
        host: H,
    ) -> Result<Self, StreamError> {
        config.validate()?;
        let seed = resolve_seed(config.seed);
        tracing::info!(seed, from_date = (config.seed == 0), "streaming manager seeded");

        Ok(Self {
            seed,
            templates,
            material,
            host,
            rng: ChaCha8Rng::seed_from_u64(seed),
            cluster: cluster_noise(seed),
            reference: None,
            chunks: BTreeMap::new(),
            pending: VecDeque::new(),
            pending_set: HashSet::new(),
            stats: StreamStats::default(),
            timer: FrameTimer::new(FRAME_HISTORY),
            config,
        })
    }

    /// Effective seed of this run (derived from the date when configured as zero).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    pub fn templates(&self) -> &ObstacleTemplates {
        &self.templates
    }

    pub fn reference(&self) -> Option<Vec3> {
        self.reference
    }

    /// Update the tracked moving point.
    pub fn set_reference_position(&mut self, point: Vec3) {
        self.reference = Some(point);
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Resident chunks in coordinate order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn is_resident(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn resident_count(&self) -> usize {
        self.chunks.len()
    }

    /// Queued coordinates in the order they will be generated.
    pub fn pending(&self) -> impl Iterator<Item = &ChunkCoord> {
        self.pending.iter()
    }

    pub fn is_pending(&self, coord: ChunkCoord) -> bool {
        self.pending_set.contains(&coord)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Statistics from the last tick.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn frame_timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// The load window around the current reference, if one is set.
    pub fn load_window(&self) -> Option<LoadWindow> {
        self.reference.map(|r| {
            LoadWindow::new(
                ChunkCoord::from_world(r, self.config.chunk_size),
                self.config.window_radius(),
                self.config.trailing_margin,
            )
        })
    }

    /// Advance streaming by one step: request the window, generate up to the
    /// per-tick budget, evict chunks past the unload distance.
    ///
    /// A no-op until a reference position has been set.
    pub fn tick(&mut self) -> TickReport {
        let Some(reference) = self.reference else {
            return TickReport::default();
        };
        let Some(window) = self.load_window() else {
            return TickReport::default();
        };
        let _span = tracing::info_span!("stream_tick", center = %window.center).entered();
        let tick_start = Instant::now();
        let mut report = TickReport::default();

        // Request the window.
        for coord in window.coords() {
            if let Some(chunk) = self.chunks.get_mut(&coord) {
                chunk.set_active(true);
            } else if self.pending_set.insert(coord) {
                tracing::debug!(%coord, "enqueue chunk");
                self.pending.push_back(coord);
                report.enqueued.push(coord);
            }
        }
        for chunk in self.chunks.values_mut() {
            if !window.contains(chunk.coord()) {
                chunk.set_active(false);
            }
        }

        // Generate within budget.
        for _ in 0..self.config.chunks_per_tick {
            let Some(coord) = self.pending.pop_front() else {
                break;
            };
            self.pending_set.remove(&coord);
            match self.generate(coord) {
                Ok(()) => report.generated.push(coord),
                Err(err) => {
                    tracing::error!(%coord, %err, "chunk generation failed");
                    report.faults.push((coord, err));
                }
            }
        }

        // Evict past the unload distance. Window corners can lie beyond it, so
        // anything the window still requests stays.
        let unload = self.config.unload_distance;
        let size = self.config.chunk_size;
        let far: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .filter(|c| !window.contains(**c) && horizontal_distance(reference, **c, size) > unload)
            .copied()
            .collect();
        for coord in far {
            if let Some(mut chunk) = self.chunks.remove(&coord) {
                let released = chunk.clear(&mut self.host);
                tracing::debug!(%coord, released, "evict chunk");
                report.evicted.push(coord);
            }
        }

        let elapsed = tick_start.elapsed();
        self.timer.record(elapsed);
        self.stats = StreamStats {
            ticks: self.stats.ticks + 1,
            chunks_enqueued_this_tick: report.enqueued.len(),
            chunks_generated_this_tick: report.generated.len(),
            chunks_evicted_this_tick: report.evicted.len(),
            faults_this_tick: report.faults.len(),
            total_resident_chunks: self.chunks.len(),
            total_pending_chunks: self.pending.len(),
            total_generated: self.stats.total_generated + report.generated.len() as u64,
            total_evicted: self.stats.total_evicted + report.evicted.len() as u64,
            tick_time: elapsed,
        };

        tracing::trace!(
            enqueued = report.enqueued.len(),
            generated = report.generated.len(),
            evicted = report.evicted.len(),
            resident = self.chunks.len(),
            pending = self.pending.len(),
            "stream tick complete"
        );

        report
    }

    /// Heightmap for a coordinate. Pure: does not touch the placement generator.
    pub fn height_map_for(&self, coord: ChunkCoord) -> HeightMap {
        let size = self.config.chunk_size;
        generate_height_map(
            self.config.resolution,
            self.config.resolution,
            self.seed,
            &self.config.noise,
            [coord.x as f32 * size, coord.z as f32 * size],
        )
    }

    /// Build and register the chunk at `coord`. Resident coordinates are left
    /// untouched; a queued coordinate is taken off the queue.
    ///
    /// On failure the partial chunk is cleared and nothing is registered.
    pub fn generate(&mut self, coord: ChunkCoord) -> Result<(), GenerationError> {
        if self.pending_set.remove(&coord) {
            self.pending.retain(|c| *c != coord);
        }
        if self.chunks.contains_key(&coord) {
            return Ok(());
        }

        let heightmap = self.height_map_for(coord);
        let mut chunk = Chunk::initialize(
            coord,
            self.config.chunk_size,
            self.config.resolution,
            self.material,
        );
        if let Err(source) = chunk.generate_mesh(
            &heightmap,
            self.config.height_multiplier,
            &self.config.height_curve,
            DownhillBias::new(self.config.downhill_slope),
        ) {
            chunk.clear(&mut self.host);
            return Err(GenerationError::Mesh { coord, source });
        }

        let summary = self.place_obstacles(&mut chunk, &heightmap);
        tracing::debug!(
            %coord,
            zone = ?summary.zone,
            spawned = summary.spawned,
            failed = summary.failed,
            "chunk generated"
        );

        self.chunks.insert(coord, chunk);
        Ok(())
    }

    /// Scatter obstacles over `chunk` using the run's generator.
    pub fn place_obstacles(&mut self, chunk: &mut Chunk, heightmap: &HeightMap) -> PlacementSummary {
        let ctx = PlacementContext {
            config: &self.config,
            templates: &self.templates,
            cluster: &self.cluster,
        };
        place_obstacles(&ctx, &mut self.rng, &mut self.host, chunk, heightmap)
    }

    /// Drop all queued work, destroy every resident chunk, and rewind the
    /// generator to the run seed. The reference position is kept.
    pub fn recover_to_safe_state(&mut self) {
        let dropped = self.pending.len();
        self.pending.clear();
        self.pending_set.clear();

        let mut released = 0;
        for (_, mut chunk) in std::mem::take(&mut self.chunks) {
            released += chunk.clear(&mut self.host);
        }

        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.stats = StreamStats::default();
        self.timer.reset();

        tracing::error!(
            seed = self.seed,
            dropped,
            released,
            "streaming recovered to safe state"
        );
    }

    /// FNV-1a digest of every resident chunk's geometry and obstacle layout,
    /// in coordinate order. Equal digests mean equal streamed content.
    pub fn content_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        for (coord, chunk) in &self.chunks {
            mix(&mut h, &coord.x.to_le_bytes());
            mix(&mut h, &coord.z.to_le_bytes());
            if let Some(mesh) = chunk.mesh() {
                for p in &mesh.positions {
                    mix(&mut h, &p.y.to_le_bytes());
                }
            }
            for o in chunk.obstacles() {
                mix(&mut h, o.category.tag().as_bytes());
                mix(&mut h, o.template.as_bytes());
                let t = o.local;
                for v in t.position.to_array() {
                    mix(&mut h, &v.to_le_bytes());
                }
                for v in t.rotation.to_array() {
                    mix(&mut h, &v.to_le_bytes());
                }
                for v in t.scale.to_array() {
                    mix(&mut h, &v.to_le_bytes());
                }
            }
        }
        h
    }
}
