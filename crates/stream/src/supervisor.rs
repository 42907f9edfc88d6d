use slopeworld_kernel::ObstacleHost;

use crate::budget::TickReport;
use crate::manager::StreamingManager;

/// Consecutive generation faults tolerated before recovery.
pub const DEFAULT_FAULT_THRESHOLD: u32 = 3;

/// Drives a [`StreamingManager`] and puts it back into a safe state after a
/// run of generation faults.
///
/// Any successful generation resets the count.
#[derive(Debug, Clone)]
pub struct FaultSupervisor {
    threshold: u32,
    consecutive: u32,
    recoveries: u32,
}

impl Default for FaultSupervisor {
    fn default() -> Self {
        Self::new(DEFAULT_FAULT_THRESHOLD)
    }
}

impl FaultSupervisor {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive: 0,
            recoveries: 0,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn consecutive_faults(&self) -> u32 {
        self.consecutive
    }

    /// Number of times the supervisor has triggered recovery.
    pub fn recoveries(&self) -> u32 {
        self.recoveries
    }

    /// Tick the manager, then recover if the fault run reached the threshold.
    pub fn tick<H: ObstacleHost>(&mut self, manager: &mut StreamingManager<H>) -> TickReport {
        let report = manager.tick();
        self.observe(&report);
        if self.consecutive >= self.threshold {
            tracing::error!(
                faults = self.consecutive,
                threshold = self.threshold,
                "fault threshold reached, recovering"
            );
            manager.recover_to_safe_state();
            self.consecutive = 0;
            self.recoveries += 1;
        }
        report
    }

    fn observe(&mut self, report: &TickReport) {
        if !report.generated.is_empty() {
            self.consecutive = 0;
        }
        self.consecutive += report.faults.len() as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamingConfig;
    use glam::Vec3;
    use slopeworld_common::MaterialHandle;
    use slopeworld_kernel::ObstacleTemplates;

    fn faulty_manager() -> StreamingManager {
        let config = StreamingConfig {
            seed: 7,
            resolution: 9,
            height_multiplier: f32::INFINITY,
            ..StreamingConfig::default()
        };
        StreamingManager::with_world(config, ObstacleTemplates::basic(), MaterialHandle(0)).unwrap()
    }

    #[test]
    fn recovers_after_threshold() {
        let mut m = faulty_manager();
        m.set_reference_position(Vec3::ZERO);
        let mut sup = FaultSupervisor::new(3);

        // 2 faults per tick: 2 after the first tick, 4 >= 3 after the second.
        sup.tick(&mut m);
        assert_eq!(sup.consecutive_faults(), 2);
        assert_eq!(sup.recoveries(), 0);

        sup.tick(&mut m);
        assert_eq!(sup.recoveries(), 1);
        assert_eq!(sup.consecutive_faults(), 0);
        assert_eq!(m.pending_count(), 0);
        assert_eq!(m.resident_count(), 0);
        assert_eq!(m.reference(), Some(Vec3::ZERO));
    }

    #[test]
    fn healthy_streaming_never_recovers() {
        let config = StreamingConfig {
            seed: 7,
            resolution: 9,
            ..StreamingConfig::default()
        };
        let mut m =
            StreamingManager::with_world(config, ObstacleTemplates::basic(), MaterialHandle(0))
                .unwrap();
        m.set_reference_position(Vec3::ZERO);
        let mut sup = FaultSupervisor::default();
        for _ in 0..10 {
            sup.tick(&mut m);
        }
        assert_eq!(sup.recoveries(), 0);
        assert_eq!(m.resident_count(), 20);
    }

    #[test]
    fn success_resets_fault_count() {
        let mut sup = FaultSupervisor::new(5);
        let err = crate::GenerationError::Mesh {
            coord: slopeworld_common::ChunkCoord::ORIGIN,
            source: slopeworld_chunk::ChunkError::NonFiniteHeight { x: 0, y: 0 },
        };
        sup.observe(&TickReport {
            faults: vec![(slopeworld_common::ChunkCoord::ORIGIN, err)],
            ..TickReport::default()
        });
        assert_eq!(sup.consecutive_faults(), 1);
        sup.observe(&TickReport {
            generated: vec![slopeworld_common::ChunkCoord::new(0, 1)],
            ..TickReport::default()
        });
        assert_eq!(sup.consecutive_faults(), 0);
    }

    #[test]
    fn zero_threshold_is_clamped() {
        assert_eq!(FaultSupervisor::new(0).threshold(), 1);
    }
}
