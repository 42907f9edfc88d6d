use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use slopeworld_noise::HeightMap;

use crate::ChunkError;

/// Remaps a normalized height sample before the height multiplier is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "keys", rename_all = "snake_case")]
pub enum HeightCurve {
    /// `f(h) = h`.
    #[default]
    Identity,
    /// Piecewise-linear through `(input, output)` keys sorted by input.
    /// Inputs outside the key range take the nearest end value.
    Keyframes(Vec<[f32; 2]>),
}

impl HeightCurve {
    pub fn evaluate(&self, h: f32) -> f32 {
        let keys = match self {
            Self::Identity => return h,
            Self::Keyframes(keys) if keys.is_empty() => return h,
            Self::Keyframes(keys) => keys,
        };
        let first = keys[0];
        let last = keys[keys.len() - 1];
        if h <= first[0] {
            return first[1];
        }
        if h >= last[0] {
            return last[1];
        }
        for pair in keys.windows(2) {
            let [t0, v0] = pair[0];
            let [t1, v1] = pair[1];
            if h <= t1 {
                let span = t1 - t0;
                if span <= 0.0 {
                    return v1;
                }
                return v0 + (v1 - v0) * ((h - t0) / span);
            }
        }
        last[1]
    }
}

/// Lowers terrain proportionally to downhill distance so the slope trends
/// consistently downward regardless of local noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DownhillBias {
    /// Elevation lost per world unit travelled along +Z.
    pub slope: f32,
}

impl DownhillBias {
    pub const NONE: Self = Self { slope: 0.0 };

    pub fn new(slope: f32) -> Self {
        Self { slope }
    }

    /// Elevation drop at world Z. Positions uphill of the start never rise.
    pub fn drop_at(&self, world_z: f32) -> f32 {
        self.slope * world_z.max(0.0)
    }
}

/// Axis-aligned bounding box in chunk-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    fn from_points(points: &[Vec3]) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self { min, max }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Triangle soup handed to the collision layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionShape {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub bounds: Aabb,
}

/// Narrow, engine-agnostic view of renderable/collidable ground geometry.
pub trait SurfaceGeometry {
    fn vertices(&self) -> &[Vec3];
    fn indices(&self) -> &[u32];
    fn collision_shape(&self) -> &CollisionShape;
}

/// Regular grid mesh of one chunk, in chunk-local space.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub bounds: Aabb,
    collision: CollisionShape,
}

impl ChunkMesh {
    /// Build a `(R-1) × (R-1)` quad grid spanning `[-size/2, size/2]` on X/Z.
    ///
    /// `origin_z` is the chunk's world Z, used to evaluate the downhill bias
    /// per vertex.
    pub fn build(
        heightmap: &HeightMap,
        size: f32,
        origin_z: f32,
        height_multiplier: f32,
        curve: &HeightCurve,
        bias: DownhillBias,
    ) -> Result<Self, ChunkError> {
        let res = heightmap.width();
        if res < 2 || heightmap.height() != res {
            return Err(ChunkError::InvalidHeightMap {
                width: heightmap.width(),
                height: heightmap.height(),
            });
        }

        let half = size / 2.0;
        let step = size / (res - 1) as f32;
        let mut positions = Vec::with_capacity(res * res);
        let mut uvs = Vec::with_capacity(res * res);

        for y in 0..res {
            for x in 0..res {
                let px = -half + x as f32 * step;
                let pz = -half + y as f32 * step;
                let py = curve.evaluate(heightmap.get(x, y)) * height_multiplier
                    - bias.drop_at(origin_z + pz);
                if !py.is_finite() {
                    return Err(ChunkError::NonFiniteHeight { x, y });
                }
                positions.push(Vec3::new(px, py, pz));
                uvs.push(Vec2::new(
                    x as f32 / (res - 1) as f32,
                    y as f32 / (res - 1) as f32,
                ));
            }
        }

        let mut indices = Vec::with_capacity((res - 1) * (res - 1) * 6);
        for y in 0..res - 1 {
            for x in 0..res - 1 {
                let top_left = (y * res + x) as u32;
                let top_right = top_left + 1;
                let bottom_left = ((y + 1) * res + x) as u32;
                let bottom_right = bottom_left + 1;

                indices.extend([top_left, bottom_left, top_right]);
                indices.extend([top_right, bottom_left, bottom_right]);
            }
        }

        let normals = compute_normals(&positions, &indices);
        let bounds = Aabb::from_points(&positions);
        let collision = CollisionShape {
            vertices: positions.clone(),
            triangles: indices
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .collect(),
            bounds,
        };

        Ok(Self {
            positions,
            normals,
            uvs,
            indices,
            bounds,
            collision,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

impl SurfaceGeometry for ChunkMesh {
    fn vertices(&self) -> &[Vec3] {
        &self.positions
    }

    fn indices(&self) -> &[u32] {
        &self.indices
    }

    fn collision_shape(&self) -> &CollisionShape {
        &self.collision
    }
}

/// Area-weighted vertex normals accumulated from face normals.
fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    for n in &mut normals {
        *n = n.normalize_or_zero();
    }
    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(res: usize, value: f32) -> HeightMap {
        HeightMap::from_values(res, res, vec![value; res * res])
    }

    #[test]
    fn grid_counts() {
        let mesh = ChunkMesh::build(
            &flat(5, 0.5),
            64.0,
            0.0,
            10.0,
            &HeightCurve::Identity,
            DownhillBias::NONE,
        )
        .unwrap();
        assert_eq!(mesh.vertex_count(), 25);
        assert_eq!(mesh.triangle_count(), 4 * 4 * 2);
        assert_eq!(mesh.uvs.len(), 25);
        assert_eq!(mesh.collision_shape().triangles.len(), 32);
    }

    #[test]
    fn spans_half_size_on_both_axes() {
        let mesh = ChunkMesh::build(
            &flat(3, 0.0),
            100.0,
            0.0,
            1.0,
            &HeightCurve::Identity,
            DownhillBias::NONE,
        )
        .unwrap();
        assert_eq!(mesh.bounds.min, Vec3::new(-50.0, 0.0, -50.0));
        assert_eq!(mesh.bounds.max, Vec3::new(50.0, 0.0, 50.0));
        assert_eq!(mesh.uvs[0], Vec2::ZERO);
        assert_eq!(mesh.uvs[8], Vec2::ONE);
    }

    #[test]
    fn flat_map_has_upward_normals() {
        let mesh = ChunkMesh::build(
            &flat(4, 0.3),
            30.0,
            0.0,
            5.0,
            &HeightCurve::Identity,
            DownhillBias::NONE,
        )
        .unwrap();
        for n in &mesh.normals {
            assert!((*n - Vec3::Y).length() < 1e-5, "normal {n:?}");
        }
        assert!(mesh.positions.iter().all(|p| (p.y - 1.5).abs() < 1e-6));
    }

    #[test]
    fn height_curve_and_multiplier_shape_elevation() {
        let map = HeightMap::from_values(2, 2, vec![0.0, 0.5, 0.75, 1.0]);
        let curve = HeightCurve::Keyframes(vec![[0.0, 0.0], [0.5, 0.0], [1.0, 1.0]]);
        let mesh =
            ChunkMesh::build(&map, 10.0, 0.0, 20.0, &curve, DownhillBias::NONE).unwrap();
        let ys: Vec<f32> = mesh.positions.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.0, 0.0, 10.0, 20.0]);
    }

    #[test]
    fn downhill_bias_lowers_far_rows() {
        let mesh = ChunkMesh::build(
            &flat(2, 0.0),
            100.0,
            1000.0,
            0.0,
            &HeightCurve::Identity,
            DownhillBias::new(0.5),
        )
        .unwrap();
        // Rows sit at world z 950 and 1050.
        assert_eq!(mesh.positions[0].y, -475.0);
        assert_eq!(mesh.positions[2].y, -525.0);
    }

    #[test]
    fn bias_is_clamped_uphill_of_start() {
        let bias = DownhillBias::new(2.0);
        assert_eq!(bias.drop_at(-100.0), 0.0);
        assert_eq!(bias.drop_at(10.0), 20.0);
    }

    #[test]
    fn non_square_map_is_rejected() {
        let map = HeightMap::from_values(3, 2, vec![0.0; 6]);
        let err = ChunkMesh::build(
            &map,
            10.0,
            0.0,
            1.0,
            &HeightCurve::Identity,
            DownhillBias::NONE,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ChunkError::InvalidHeightMap {
                width: 3,
                height: 2
            }
        );
    }

    #[test]
    fn non_finite_heights_are_reported() {
        let err = ChunkMesh::build(
            &flat(3, 0.5),
            10.0,
            0.0,
            f32::INFINITY,
            &HeightCurve::Identity,
            DownhillBias::NONE,
        )
        .unwrap_err();
        assert_eq!(err, ChunkError::NonFiniteHeight { x: 0, y: 0 });
    }

    #[test]
    fn curve_clamps_outside_key_range() {
        let curve = HeightCurve::Keyframes(vec![[0.2, 0.1], [0.8, 0.9]]);
        assert_eq!(curve.evaluate(0.0), 0.1);
        assert_eq!(curve.evaluate(1.0), 0.9);
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(HeightCurve::Keyframes(vec![]).evaluate(0.3), 0.3);
    }
}
