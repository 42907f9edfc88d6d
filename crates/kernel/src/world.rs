use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use slopeworld_common::{ChunkCoord, ObstacleCategory, ObstacleHandle, Transform};

use crate::host::{ObstacleHost, SpawnError, SpawnRequest};

/// An event record produced by every mutation of the obstacle world.
///
/// Downstream layers drain these to mirror spawns and teardowns into their own
/// representation (colliders, render instances).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObstacleEvent {
    Spawned {
        handle: ObstacleHandle,
        category: ObstacleCategory,
        chunk: ChunkCoord,
        transform: Transform,
    },
    Destroyed {
        handle: ObstacleHandle,
        category: ObstacleCategory,
        chunk: ChunkCoord,
    },
}

/// A live obstacle instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleInstance {
    pub template: String,
    pub category: ObstacleCategory,
    pub chunk: ChunkCoord,
    /// World-space transform.
    pub transform: Transform,
}

impl ObstacleInstance {
    /// Tag used by collision response and scoring to recognize the instance.
    pub fn tag(&self) -> &'static str {
        self.category.tag()
    }
}

/// In-process obstacle host.
///
/// Handles are issued sequentially, so two worlds fed the same spawn sequence
/// hand out the same handles. BTreeMap keeps iteration order deterministic.
#[derive(Debug, Clone, Default)]
pub struct ObstacleWorld {
    instances: BTreeMap<ObstacleHandle, ObstacleInstance>,
    next_handle: u64,
    capacity: Option<usize>,
    /// Append-only log of spawns and teardowns.
    event_log: Vec<ObstacleEvent>,
}

impl ObstacleWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// A world that refuses spawns once `limit` instances are live.
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            capacity: Some(limit),
            ..Default::default()
        }
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn get(&self, handle: ObstacleHandle) -> Option<&ObstacleInstance> {
        self.instances.get(&handle)
    }

    /// All live instances in handle order.
    pub fn instances(&self) -> &BTreeMap<ObstacleHandle, ObstacleInstance> {
        &self.instances
    }

    /// Live instances carrying the given tag (`"Tree"`, `"Rock"`, `"Ramp"`).
    pub fn tagged<'a>(
        &'a self,
        tag: &'a str,
    ) -> impl Iterator<Item = (ObstacleHandle, &'a ObstacleInstance)> + 'a {
        self.instances
            .iter()
            .filter(move |(_, inst)| inst.tag() == tag)
            .map(|(h, inst)| (*h, inst))
    }

    /// Live instances owned by one chunk.
    pub fn in_chunk(&self, chunk: ChunkCoord) -> Vec<ObstacleHandle> {
        self.instances
            .iter()
            .filter(|(_, inst)| inst.chunk == chunk)
            .map(|(h, _)| *h)
            .collect()
    }

    pub fn count_by_category(&self, category: ObstacleCategory) -> usize {
        self.instances
            .values()
            .filter(|inst| inst.category == category)
            .count()
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[ObstacleEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<ObstacleEvent> {
        std::mem::take(&mut self.event_log)
    }
}

impl ObstacleHost for ObstacleWorld {
    fn spawn(&mut self, request: &SpawnRequest<'_>) -> Result<ObstacleHandle, SpawnError> {
        if let Some(limit) = self.capacity {
            if self.instances.len() >= limit {
                return Err(SpawnError::CapacityExceeded { limit });
            }
        }
        if request.template.name.is_empty() {
            return Err(SpawnError::Rejected("template has no name".into()));
        }

        let handle = ObstacleHandle(self.next_handle);
        self.next_handle += 1;

        let instance = ObstacleInstance {
            template: request.template.name.clone(),
            category: request.template.category,
            chunk: request.chunk,
            transform: request.world,
        };
        self.event_log.push(ObstacleEvent::Spawned {
            handle,
            category: instance.category,
            chunk: instance.chunk,
            transform: instance.transform,
        });
        self.instances.insert(handle, instance);
        Ok(handle)
    }

    fn destroy(&mut self, handle: ObstacleHandle) -> bool {
        match self.instances.remove(&handle) {
            Some(inst) => {
                self.event_log.push(ObstacleEvent::Destroyed {
                    handle,
                    category: inst.category,
                    chunk: inst.chunk,
                });
                true
            }
            None => {
                tracing::debug!(?handle, "destroy of unknown obstacle handle");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ObstacleTemplate;
    use glam::Vec3;

    fn request(template: &ObstacleTemplate, chunk: ChunkCoord) -> SpawnRequest<'_> {
        let local = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            ..Transform::default()
        };
        SpawnRequest {
            template,
            chunk,
            local,
            world: local.translated(chunk.world_origin(256.0)),
        }
    }

    #[test]
    fn world_starts_empty() {
        let w = ObstacleWorld::new();
        assert!(w.is_empty());
        assert!(w.events().is_empty());
    }

    #[test]
    fn spawn_and_destroy() {
        let mut w = ObstacleWorld::new();
        let tree = ObstacleTemplate::new("pine", ObstacleCategory::Tree);
        let handle = w.spawn(&request(&tree, ChunkCoord::new(1, 2))).unwrap();
        assert_eq!(w.len(), 1);
        let inst = w.get(handle).unwrap();
        assert_eq!(inst.tag(), "Tree");
        assert_eq!(inst.transform.position, Vec3::new(257.0, 2.0, 515.0));

        assert!(w.destroy(handle));
        assert!(w.is_empty());
        assert!(!w.destroy(handle));
    }

    #[test]
    fn handles_are_sequential() {
        let mut a = ObstacleWorld::new();
        let mut b = ObstacleWorld::new();
        let rock = ObstacleTemplate::new("boulder", ObstacleCategory::Rock);
        for _ in 0..5 {
            let ha = a.spawn(&request(&rock, ChunkCoord::ORIGIN)).unwrap();
            let hb = b.spawn(&request(&rock, ChunkCoord::ORIGIN)).unwrap();
            assert_eq!(ha, hb);
        }
        assert_eq!(a.instances().keys().last(), Some(&ObstacleHandle(4)));
    }

    #[test]
    fn capacity_limit_rejects_spawns() {
        let mut w = ObstacleWorld::with_capacity_limit(1);
        let ramp = ObstacleTemplate::new("kicker", ObstacleCategory::Ramp);
        assert!(w.spawn(&request(&ramp, ChunkCoord::ORIGIN)).is_ok());
        assert_eq!(
            w.spawn(&request(&ramp, ChunkCoord::ORIGIN)),
            Err(SpawnError::CapacityExceeded { limit: 1 })
        );
    }

    #[test]
    fn unnamed_template_is_rejected() {
        let mut w = ObstacleWorld::new();
        let bad = ObstacleTemplate::new("", ObstacleCategory::Rock);
        assert!(matches!(
            w.spawn(&request(&bad, ChunkCoord::ORIGIN)),
            Err(SpawnError::Rejected(_))
        ));
    }

    #[test]
    fn tagged_and_chunk_queries() {
        let mut w = ObstacleWorld::new();
        let tree = ObstacleTemplate::new("pine", ObstacleCategory::Tree);
        let rock = ObstacleTemplate::new("boulder", ObstacleCategory::Rock);
        w.spawn(&request(&tree, ChunkCoord::new(0, 0))).unwrap();
        w.spawn(&request(&rock, ChunkCoord::new(0, 1))).unwrap();
        w.spawn(&request(&tree, ChunkCoord::new(0, 1))).unwrap();

        assert_eq!(w.tagged("Tree").count(), 2);
        assert_eq!(w.count_by_category(ObstacleCategory::Rock), 1);
        assert_eq!(w.in_chunk(ChunkCoord::new(0, 1)).len(), 2);
    }

    #[test]
    fn events_are_recorded_and_drained() {
        let mut w = ObstacleWorld::new();
        let tree = ObstacleTemplate::new("pine", ObstacleCategory::Tree);
        let h = w.spawn(&request(&tree, ChunkCoord::ORIGIN)).unwrap();
        w.destroy(h);
        assert_eq!(w.events().len(), 2);
        assert!(matches!(w.events()[1], ObstacleEvent::Destroyed { .. }));

        let drained = w.drain_events();
        assert_eq!(drained.len(), 2);
        assert!(w.events().is_empty());
    }
}
