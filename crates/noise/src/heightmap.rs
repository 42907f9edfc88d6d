use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Smallest usable noise scale; non-positive scales are clamped to this.
pub const MIN_SCALE: f32 = 0.0001;

/// Range of the per-octave offsets drawn from the seeded generator.
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// The lattice itself is fixed; all seed variation comes from octave offsets.
const LATTICE_SEED: u32 = 0;

/// Fractal noise parameters shared by every chunk of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Sample-space divisor. Larger values give broader features.
    pub scale: f32,
    pub octaves: u32,
    /// Amplitude multiplier applied after each octave.
    pub persistence: f32,
    /// Frequency multiplier applied after each octave.
    pub lacunarity: f32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            scale: 60.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

impl NoiseSettings {
    /// Scale with non-positive values clamped to [`MIN_SCALE`].
    pub fn effective_scale(&self) -> f32 {
        if self.scale <= 0.0 { MIN_SCALE } else { self.scale }
    }
}

/// A `width × height` grid of elevation samples.
///
/// Maps produced by [`generate_height_map`] are normalized to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMap {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl HeightMap {
    /// Build a map from raw row-major values (`values[y * width + x]`).
    pub fn from_values(width: usize, height: usize, values: Vec<f32>) -> Self {
        assert_eq!(values.len(), width * height, "value count must match dimensions");
        Self {
            width,
            height,
            values,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Sample at grid cell `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }

    /// Nearest-cell sample for normalized coordinates `u, v` in `[0, 1]`.
    /// Out-of-range inputs are clamped to the border.
    pub fn sample_nearest(&self, u: f32, v: f32) -> f32 {
        let x = nearest_index(u, self.width);
        let y = nearest_index(v, self.height);
        self.get(x, y)
    }

    pub fn min(&self) -> f32 {
        self.values.iter().copied().fold(f32::INFINITY, f32::min)
    }

    pub fn max(&self) -> f32 {
        self.values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// True when every sample lies in `[0, 1]`.
    pub fn is_normalized(&self) -> bool {
        self.values.iter().all(|v| (0.0..=1.0).contains(v))
    }
}

fn nearest_index(t: f32, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let max = (len - 1) as f32;
    (t.clamp(0.0, 1.0) * max).round() as usize
}

/// Per-octave sample offsets derived from `seed`, shifted by the caller offset.
///
/// Drawing them from a seeded generator decorrelates stacked frequencies so
/// the summed result is not visibly aligned along seed-dependent axes.
fn octave_offsets(seed: u64, octaves: u32, offset: [f32; 2]) -> Vec<[f64; 2]> {
    let mut prng = ChaCha8Rng::seed_from_u64(seed);
    (0..octaves)
        .map(|_| {
            let ox = prng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64;
            let oy = prng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64;
            [ox + offset[0] as f64, oy + offset[1] as f64]
        })
        .collect()
}

/// Generate a normalized fractal heightmap.
///
/// Each cell accumulates `amplitude * perlin(sample)` across octaves, with
/// `amplitude *= persistence` and `frequency *= lacunarity` per octave. The
/// raw sums are remapped through inverse-lerp(min, max), so a non-constant map
/// spans exactly `[0, 1]` and a constant map is all zeros.
pub fn generate_height_map(
    width: usize,
    height: usize,
    seed: u64,
    settings: &NoiseSettings,
    offset: [f32; 2],
) -> HeightMap {
    let perlin = Perlin::new(LATTICE_SEED);
    let offsets = octave_offsets(seed, settings.octaves, offset);
    let persistence = settings.persistence as f64;
    let lacunarity = settings.lacunarity as f64;

    let scale = settings.effective_scale() as f64;

    sample_grid(width, height, |x, y| {
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut total = 0.0;
        for o in &offsets {
            let sx = (x + o[0]) / scale * frequency;
            let sy = (y + o[1]) / scale * frequency;
            total += perlin.get([sx, sy]) * amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }
        total
    })
}

/// Ridged variant of [`generate_height_map`] for sharp crest features.
///
/// Each octave contributes `1 - |perlin01 * 2 - 1|` with amplitude halving and
/// frequency doubling; `persistence` and `lacunarity` are ignored. Output is
/// normalized the same way.
pub fn generate_ridged_height_map(
    width: usize,
    height: usize,
    seed: u64,
    settings: &NoiseSettings,
    offset: [f32; 2],
) -> HeightMap {
    let perlin = Perlin::new(LATTICE_SEED);
    let offsets = octave_offsets(seed, 1, offset);
    let origin = offsets.first().copied().unwrap_or([0.0, 0.0]);
    let octaves = settings.octaves;
    let scale = settings.effective_scale() as f64;

    sample_grid(width, height, |x, y| {
        ridged_noise(
            &perlin,
            (x + origin[0]) / scale,
            (y + origin[1]) / scale,
            octaves,
        )
    })
}

/// Ridged multi-octave noise at a single point.
pub fn ridged_noise(perlin: &Perlin, x: f64, y: f64, octaves: u32) -> f64 {
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut total = 0.0;
    for _ in 0..octaves {
        let p01 = (perlin.get([x * frequency, y * frequency]) + 1.0) * 0.5;
        total += (1.0 - (p01 * 2.0 - 1.0).abs()) * amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    total
}

/// Evaluate `sample(x, y)` with coordinates centered on the grid midpoint,
/// then normalize to `[0, 1]`.
fn sample_grid(width: usize, height: usize, sample: impl Fn(f64, f64) -> f64) -> HeightMap {
    let half_w = width as f64 / 2.0;
    let half_h = height as f64 / 2.0;
    let mut raw = Vec::with_capacity(width * height);
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for y in 0..height {
        for x in 0..width {
            let v = sample(x as f64 - half_w, y as f64 - half_h);
            min = min.min(v);
            max = max.max(v);
            raw.push(v);
        }
    }

    let values = raw
        .into_iter()
        .map(|v| inverse_lerp(min, max, v).clamp(0.0, 1.0) as f32)
        .collect();

    tracing::trace!(width, height, min, max, "height map sampled");

    HeightMap {
        width,
        height,
        values,
    }
}

fn inverse_lerp(a: f64, b: f64, v: f64) -> f64 {
    if a == b { 0.0 } else { (v - a) / (b - a) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> NoiseSettings {
        NoiseSettings::default()
    }

    #[test]
    fn output_is_normalized() {
        let map = generate_height_map(33, 33, 42, &settings(), [0.0, 0.0]);
        assert!(map.is_normalized());
        assert_eq!(map.min(), 0.0);
        assert_eq!(map.max(), 1.0);
    }

    #[test]
    fn same_inputs_same_map() {
        let a = generate_height_map(17, 17, 7, &settings(), [256.0, 512.0]);
        let b = generate_height_map(17, 17, 7, &settings(), [256.0, 512.0]);
        assert_eq!(a.values(), b.values());
    }

    #[test]
    fn different_seeds_diverge() {
        let a = generate_height_map(17, 17, 1, &settings(), [0.0, 0.0]);
        let b = generate_height_map(17, 17, 2, &settings(), [0.0, 0.0]);
        assert_ne!(a.values(), b.values());
    }

    #[test]
    fn offset_shifts_the_map() {
        let a = generate_height_map(17, 17, 9, &settings(), [0.0, 0.0]);
        let b = generate_height_map(17, 17, 9, &settings(), [256.0, 0.0]);
        assert_ne!(a.values(), b.values());
    }

    #[test]
    fn non_positive_scale_is_clamped() {
        let s = NoiseSettings {
            scale: -3.0,
            ..settings()
        };
        assert_eq!(s.effective_scale(), MIN_SCALE);
        let map = generate_height_map(9, 9, 3, &s, [0.0, 0.0]);
        assert!(map.values().iter().all(|v| v.is_finite()));
        assert!(map.is_normalized());
    }

    #[test]
    fn zero_octaves_gives_constant_zero_map() {
        let s = NoiseSettings {
            octaves: 0,
            ..settings()
        };
        let map = generate_height_map(8, 8, 3, &s, [0.0, 0.0]);
        assert!(map.values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn dimensions_are_respected() {
        let map = generate_height_map(12, 5, 3, &settings(), [0.0, 0.0]);
        assert_eq!(map.width(), 12);
        assert_eq!(map.height(), 5);
        assert_eq!(map.values().len(), 60);
    }

    #[test]
    fn ridged_map_is_normalized() {
        let map = generate_ridged_height_map(33, 33, 11, &settings(), [0.0, 0.0]);
        assert!(map.is_normalized());
        assert_eq!(map.max(), 1.0);
        assert_eq!(map.min(), 0.0);
    }

    #[test]
    fn ridged_noise_is_bounded_by_amplitude_sum() {
        let perlin = Perlin::new(LATTICE_SEED);
        for i in 0..50 {
            let v = ridged_noise(&perlin, i as f64 * 0.37, i as f64 * 0.11, 4);
            assert!(v.is_finite());
            assert!(v <= 1.875 + 1e-9);
        }
    }

    #[test]
    fn sample_nearest_clamps_to_border() {
        let map = HeightMap::from_values(2, 2, vec![0.0, 0.25, 0.5, 1.0]);
        assert_eq!(map.sample_nearest(0.0, 0.0), 0.0);
        assert_eq!(map.sample_nearest(1.0, 0.0), 0.25);
        assert_eq!(map.sample_nearest(0.0, 1.0), 0.5);
        assert_eq!(map.sample_nearest(5.0, 5.0), 1.0);
        assert_eq!(map.sample_nearest(-1.0, 0.9), 0.5);
    }
}
