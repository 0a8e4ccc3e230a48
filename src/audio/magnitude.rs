//! Single-slot exchange between the capture pipeline and snapshot readers.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Shared slot state, only touched under the buffer's lock
#[derive(Debug, Default)]
struct Slot {
    /// Session currently allowed to publish; bumped on arm and disarm
    generation: u64,

    /// Whether the current generation has published at least once
    ready: bool,

    /// Number of publishes accepted in the current generation
    publishes: u64,

    values: Vec<f32>,
}

/// Latest magnitude spectrum, replaced wholesale on every publish
///
/// `snapshot()` blocks until the current session has published once, so each
/// session start is a fresh rendezvous for readers.
#[derive(Debug, Default)]
pub struct MagnitudeBuffer {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl MagnitudeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // Slot is always left consistent, so a poisoned lock is still usable
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a new session expecting `len` values per publish
    ///
    /// Readers block again until the returned publisher delivers its first
    /// spectrum. Publishers from earlier sessions become inert.
    pub fn arm(self: &Arc<Self>, len: usize) -> Publisher {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.ready = false;
        slot.publishes = 0;
        slot.values.clear();
        slot.values.resize(len, 0.0);
        Publisher {
            buffer: Arc::clone(self),
            generation: slot.generation,
        }
    }

    /// End the current session; readers block until the next `arm` publishes
    pub fn disarm(&self) {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.ready = false;
    }

    /// Copy of the latest spectrum, waiting for the session's first publish
    pub fn snapshot(&self) -> Vec<f32> {
        let slot = self
            .ready
            .wait_while(self.lock(), |slot| !slot.ready)
            .unwrap_or_else(|e| e.into_inner());
        slot.values.clone()
    }

    /// Copy of the latest spectrum if the current session has published
    pub fn try_snapshot(&self) -> Option<Vec<f32>> {
        let slot = self.lock();
        slot.ready.then(|| slot.values.clone())
    }

    /// Publishes accepted since the current session was armed
    pub fn publish_count(&self) -> u64 {
        self.lock().publishes
    }

    fn publish(&self, generation: u64, values: &[f32]) -> bool {
        let mut slot = self.lock();
        if slot.generation != generation {
            return false;
        }
        if slot.values.len() == values.len() {
            slot.values.copy_from_slice(values);
        } else {
            slot.values.clear();
            slot.values.extend_from_slice(values);
        }
        slot.ready = true;
        slot.publishes += 1;
        drop(slot);
        self.ready.notify_all();
        true
    }
}

/// Write handle held by one session's processing pipeline
#[derive(Debug, Clone)]
pub struct Publisher {
    buffer: Arc<MagnitudeBuffer>,
    generation: u64,
}

impl Publisher {
    /// Replace the shared spectrum; returns false once the session has ended
    pub fn publish(&self, values: &[f32]) -> bool {
        self.buffer.publish(self.generation, values)
    }
}
