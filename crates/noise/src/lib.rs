//! Noise synthesis: seeded multi-octave heightmaps for terrain chunks.
//!
//! # Invariants
//! - Output maps are normalized to `[0, 1]` before any height shaping.
//! - Same seed + settings + offset yields a bit-identical map.
//! - Nothing here touches the run's shared placement generator; octave
//!   offsets come from a generator local to each call.

mod heightmap;

pub use heightmap::{
    HeightMap, MIN_SCALE, NoiseSettings, generate_height_map, generate_ridged_height_map,
    ridged_noise,
};

pub fn crate_info() -> &'static str {
    "slopeworld-noise v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("noise"));
    }
}
