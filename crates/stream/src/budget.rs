use std::time::Duration;

use slopeworld_common::ChunkCoord;

use crate::GenerationError;

/// What one `tick()` did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Coordinates newly added to the pending queue.
    pub enqueued: Vec<ChunkCoord>,
    /// Coordinates generated and registered this tick (at most the per-tick budget).
    pub generated: Vec<ChunkCoord>,
    /// Coordinates destroyed for exceeding the unload distance.
    pub evicted: Vec<ChunkCoord>,
    /// Coordinates whose generation failed; they were dropped from the queue.
    pub faults: Vec<(ChunkCoord, GenerationError)>,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.enqueued.is_empty()
            && self.generated.is_empty()
            && self.evicted.is_empty()
            && self.faults.is_empty()
    }
}

/// Per-tick streaming statistics for instrumentation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamStats {
    pub ticks: u64,
    pub chunks_enqueued_this_tick: usize,
    pub chunks_generated_this_tick: usize,
    pub chunks_evicted_this_tick: usize,
    pub faults_this_tick: usize,
    pub total_resident_chunks: usize,
    pub total_pending_chunks: usize,
    pub total_generated: u64,
    pub total_evicted: u64,
    pub tick_time: Duration,
}

/// Tick time tracker for instrumentation.
#[derive(Debug)]
pub struct FrameTimer {
    history: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "frame timer capacity must be positive");
        Self {
            history: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    fn recorded(&self) -> &[Duration] {
        &self.history[..self.count()]
    }

    pub fn average(&self) -> Duration {
        let samples = self.recorded();
        if samples.is_empty() {
            return Duration::ZERO;
        }
        samples.iter().sum::<Duration>() / samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.recorded().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn count(&self) -> usize {
        if self.filled {
            self.capacity
        } else {
            self.index
        }
    }

    pub fn reset(&mut self) {
        self.history.fill(Duration::ZERO);
        self.index = 0;
        self.filled = false;
    }
}
