use glam::{Vec2, Vec3};
use slopeworld_common::ChunkCoord;

/// The square window of chunk coordinates requested around a reference chunk.
///
/// Rows more than `trailing_margin` behind the reference (lower Z) are left
/// out: travel is one-directional, and a full trailing window would keep
/// growing memory behind the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadWindow {
    pub center: ChunkCoord,
    pub radius: i32,
    pub trailing_margin: i32,
}

impl LoadWindow {
    pub fn new(center: ChunkCoord, radius: i32, trailing_margin: i32) -> Self {
        Self {
            center,
            radius,
            trailing_margin,
        }
    }

    /// Whether a coordinate falls inside the window.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        let dx = (coord.x - self.center.x).abs();
        let dz = (coord.z - self.center.z).abs();
        dx <= self.radius && dz <= self.radius && !self.is_trailing(coord)
    }

    fn is_trailing(&self, coord: ChunkCoord) -> bool {
        coord.z < self.center.z - self.trailing_margin
    }

    /// Window coordinates in enqueue order: X ascending, then Z ascending.
    ///
    /// The order is part of the determinism contract: it fixes which chunks
    /// are generated first and therefore the generator's draw sequence.
    pub fn coords(&self) -> Vec<ChunkCoord> {
        let mut out = Vec::new();
        for dx in -self.radius..=self.radius {
            for dz in -self.radius..=self.radius {
                let coord = ChunkCoord::new(self.center.x + dx, self.center.z + dz);
                if !self.is_trailing(coord) {
                    out.push(coord);
                }
            }
        }
        out
    }
}

/// Distance on the XZ plane between a reference point and a chunk's origin.
pub fn horizontal_distance(reference: Vec3, coord: ChunkCoord, chunk_size: f32) -> f32 {
    let origin = coord.world_origin(chunk_size);
    Vec2::new(reference.x - origin.x, reference.z - origin.z).length()
}
