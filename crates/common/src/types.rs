use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A 2D chunk coordinate on the infinite terrain grid (Y is ignored for partitioning).
///
/// `Ord` is derived so registries keyed by coordinate iterate in a stable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const ORIGIN: Self = Self { x: 0, z: 0 };

    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing a world position for the given chunk size.
    pub fn from_world(pos: Vec3, chunk_size: f32) -> Self {
        Self {
            x: (pos.x / chunk_size).floor() as i32,
            z: (pos.z / chunk_size).floor() as i32,
        }
    }

    /// World-space origin of this chunk (the center of its mesh).
    pub fn world_origin(self, chunk_size: f32) -> Vec3 {
        Vec3::new(self.x as f32 * chunk_size, 0.0, self.z as f32 * chunk_size)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Same rotation and scale, translated by `offset`.
    pub fn translated(self, offset: Vec3) -> Self {
        Self {
            position: self.position + offset,
            ..self
        }
    }
}

/// Obstacle families placed on the slope. Downstream collision and scoring
/// logic recognizes instances by [`ObstacleCategory::tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObstacleCategory {
    Tree,
    Rock,
    Ramp,
}

impl ObstacleCategory {
    /// Placement order. Changing it changes every seeded layout.
    pub const ALL: [Self; 3] = [Self::Tree, Self::Rock, Self::Ramp];

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Tree => "Tree",
            Self::Rock => "Rock",
            Self::Ramp => "Ramp",
        }
    }
}

impl std::fmt::Display for ObstacleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Handle to a spawned obstacle instance, issued by an obstacle host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleHandle(pub u64);

/// A handle referencing the shared surface material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MaterialHandle(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn from_world_floors_negative_positions() {
        let coord = ChunkCoord::from_world(Vec3::new(10.0, 0.0, 10.0), 16.0);
        assert_eq!(coord, ChunkCoord::new(0, 0));

        let coord = ChunkCoord::from_world(Vec3::new(20.0, 5.0, -5.0), 16.0);
        assert_eq!(coord, ChunkCoord::new(1, -1));
    }

    #[test]
    fn world_origin_scales_by_chunk_size() {
        let origin = ChunkCoord::new(2, -3).world_origin(256.0);
        assert_eq!(origin, Vec3::new(512.0, 0.0, -768.0));
    }

    #[test]
    fn coords_order_by_x_then_z() {
        let mut coords = vec![
            ChunkCoord::new(1, 0),
            ChunkCoord::new(0, 1),
            ChunkCoord::new(0, -1),
        ];
        coords.sort();
        assert_eq!(
            coords,
            vec![
                ChunkCoord::new(0, -1),
                ChunkCoord::new(0, 1),
                ChunkCoord::new(1, 0)
            ]
        );
    }

    #[test]
    fn category_tags() {
        assert_eq!(ObstacleCategory::Tree.tag(), "Tree");
        assert_eq!(ObstacleCategory::Rock.to_string(), "Rock");
        assert_eq!(ObstacleCategory::Ramp.tag(), "Ramp");
    }
}
