use glam::{Quat, Vec3};
use slopeworld_common::{ChunkCoord, MaterialHandle, ObstacleCategory, ObstacleHandle, Transform};
use slopeworld_kernel::{ObstacleHost, ObstacleTemplate, SpawnError, SpawnRequest};
use slopeworld_noise::HeightMap;

use crate::ChunkError;
use crate::mesh::{ChunkMesh, DownhillBias, HeightCurve};

/// Lifecycle of a chunk as seen by the streaming layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// No geometry: freshly initialized or already cleared.
    Unloaded,
    /// Mesh and obstacles ready and visible.
    Built,
    /// Hidden, content retained.
    Inactive,
}

/// Record of an obstacle spawned on this chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedObstacle {
    pub handle: ObstacleHandle,
    pub category: ObstacleCategory,
    pub template: String,
    /// Chunk-local transform.
    pub local: Transform,
}

/// One square terrain tile: its ground mesh and the obstacles placed on it.
///
/// The chunk is the sole owner of its obstacle handles and must be
/// [`clear`](Chunk::clear)ed against the same host before it is dropped.
#[derive(Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    size: f32,
    resolution: usize,
    material: MaterialHandle,
    mesh: Option<ChunkMesh>,
    obstacles: Vec<SpawnedObstacle>,
    active: bool,
}

impl Chunk {
    /// Bind a tile to its coordinate, extent, and the shared surface material.
    ///
    /// Non-positive size or a resolution below 2 is caller misuse.
    pub fn initialize(
        coord: ChunkCoord,
        size: f32,
        resolution: usize,
        material: MaterialHandle,
    ) -> Self {
        assert!(size > 0.0, "chunk size must be positive");
        assert!(resolution >= 2, "chunk resolution must be at least 2");
        Self {
            coord,
            size,
            resolution,
            material,
            mesh: None,
            obstacles: Vec::new(),
            active: false,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn material(&self) -> MaterialHandle {
        self.material
    }

    /// World-space center of the tile.
    pub fn origin(&self) -> Vec3 {
        self.coord.world_origin(self.size)
    }

    pub fn mesh(&self) -> Option<&ChunkMesh> {
        self.mesh.as_ref()
    }

    pub fn obstacles(&self) -> &[SpawnedObstacle] {
        &self.obstacles
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn state(&self) -> ChunkState {
        match (&self.mesh, self.active) {
            (None, _) => ChunkState::Unloaded,
            (Some(_), true) => ChunkState::Built,
            (Some(_), false) => ChunkState::Inactive,
        }
    }

    /// Build the ground mesh from a heightmap and mark the chunk active.
    pub fn generate_mesh(
        &mut self,
        heightmap: &HeightMap,
        height_multiplier: f32,
        curve: &HeightCurve,
        bias: DownhillBias,
    ) -> Result<(), ChunkError> {
        if heightmap.width() != self.resolution || heightmap.height() != self.resolution {
            return Err(ChunkError::ResolutionMismatch {
                expected: self.resolution,
                width: heightmap.width(),
                height: heightmap.height(),
            });
        }
        let mesh = ChunkMesh::build(
            heightmap,
            self.size,
            self.origin().z,
            height_multiplier,
            curve,
            bias,
        )?;
        tracing::trace!(
            coord = %self.coord,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "chunk mesh built"
        );
        self.mesh = Some(mesh);
        self.active = true;
        Ok(())
    }

    /// Instantiate an obstacle at a chunk-local transform and track its handle.
    pub fn spawn_obstacle<H: ObstacleHost + ?Sized>(
        &mut self,
        host: &mut H,
        template: &ObstacleTemplate,
        local_position: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) -> Result<ObstacleHandle, SpawnError> {
        let local = Transform {
            position: local_position,
            rotation,
            scale,
        };
        let request = SpawnRequest {
            template,
            chunk: self.coord,
            local,
            world: local.translated(self.origin()),
        };
        let handle = host.spawn(&request)?;
        self.obstacles.push(SpawnedObstacle {
            handle,
            category: template.category,
            template: template.name.clone(),
            local,
        });
        Ok(handle)
    }

    /// Destroy every tracked obstacle and release the mesh.
    /// Returns the number of handles the host acknowledged.
    pub fn clear<H: ObstacleHost + ?Sized>(&mut self, host: &mut H) -> usize {
        let destroyed = self
            .obstacles
            .drain(..)
            .filter(|o| host.destroy(o.handle))
            .count();
        self.mesh = None;
        self.active = false;
        destroyed
    }
}
