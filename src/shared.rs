//! State shared between camera workers and the fusion coordinator.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::core::types::Pose2D;

/// Snapshot of one detection slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotReading {
    /// Latest stitched global pose, `None` when the camera saw nothing
    pub pose: Option<Pose2D>,
    /// Write counter; the coordinator uses it to spot stalled workers
    pub sequence: u64,
    /// Wall-clock time of the write, microseconds since the epoch
    pub timestamp_us: u64,
}

#[derive(Debug, Default)]
struct SlotCell {
    pose: Option<Pose2D>,
    sequence: u64,
    timestamp_us: u64,
}

/// One single-entry mailbox per camera worker.
///
/// Each slot has its own lock, so a worker only ever contends with the
/// coordinator's copy-out, never with its sibling workers. Writers
/// overwrite unconditionally; only the newest detection matters.
#[derive(Debug)]
pub struct DetectionSlots {
    slots: Vec<Mutex<SlotCell>>,
}

impl DetectionSlots {
    pub fn new(count: usize) -> Self {
        Self {
            slots: (0..count).map(|_| Mutex::new(SlotCell::default())).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Overwrite slot `index` with this cycle's result. Called every
    /// worker cycle, detection or not, so the sequence always advances
    /// while the worker is alive.
    pub fn write(&self, index: usize, pose: Option<Pose2D>, timestamp_us: u64) {
        let mut cell = self.slots[index].lock();
        cell.pose = pose;
        cell.sequence = cell.sequence.wrapping_add(1);
        cell.timestamp_us = timestamp_us;
    }

    /// Copy out slot `index`. The lock is held only for the copy.
    pub fn read(&self, index: usize) -> SlotReading {
        let cell = self.slots[index].lock();
        SlotReading {
            pose: cell.pose,
            sequence: cell.sequence,
            timestamp_us: cell.timestamp_us,
        }
    }
}

/// Cross-thread coordination flags.
#[derive(Debug)]
pub struct SharedState {
    shutdown: AtomicBool,
    workers_ready: AtomicUsize,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            shutdown: AtomicBool::new(false),
            workers_ready: AtomicUsize::new(0),
        }
    }

    /// Ask every thread to wind down.
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn should_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Called once by each camera worker before its first iteration.
    pub fn mark_worker_ready(&self) {
        self.workers_ready.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn workers_ready(&self) -> usize {
        self.workers_ready.load(Ordering::SeqCst)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_slot_starts_empty() {
        let slots = DetectionSlots::new(3);
        let reading = slots.read(1);
        assert_eq!(reading.pose, None);
        assert_eq!(reading.sequence, 0);
    }

    #[test]
    fn test_write_advances_sequence() {
        let slots = DetectionSlots::new(1);
        slots.write(0, Some(Pose2D::new(1.0, 2.0, 0.5)), 100);
        slots.write(0, None, 200);

        let reading = slots.read(0);
        assert_eq!(reading.pose, None);
        assert_eq!(reading.sequence, 2);
        assert_eq!(reading.timestamp_us, 200);
    }

    #[test]
    fn test_slots_are_independent() {
        let slots = DetectionSlots::new(2);
        slots.write(0, Some(Pose2D::identity()), 1);
        assert!(slots.read(0).pose.is_some());
        assert!(slots.read(1).pose.is_none());
        assert_eq!(slots.read(1).sequence, 0);
    }

    #[test]
    fn test_concurrent_writers() {
        let slots = Arc::new(DetectionSlots::new(4));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let slots = Arc::clone(&slots);
                thread::spawn(move || {
                    for n in 0..1000u64 {
                        slots.write(i, Some(Pose2D::new(i as f32, n as f32, 0.0)), n);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..4 {
            let reading = slots.read(i);
            assert_eq!(reading.sequence, 1000);
            assert_eq!(reading.pose.unwrap().x, i as f32);
        }
    }

    #[test]
    fn test_shutdown_flag() {
        let state = SharedState::new();
        assert!(!state.should_shutdown());
        state.signal_shutdown();
        assert!(state.should_shutdown());
    }

    #[test]
    fn test_worker_ready_counter() {
        let state = SharedState::new();
        state.mark_worker_ready();
        state.mark_worker_ready();
        assert_eq!(state.workers_ready(), 2);
    }
}
