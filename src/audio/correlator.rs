//! Pilot search that locates the chirp's phase alignment in the capture stream.

use log::info;

use super::sweep::PilotTemplate;

/// Similarity a window must strictly exceed to count as the pilot
pub const SYNC_THRESHOLD: f32 = 0.5;

/// Synchronization state of one capture session
///
/// Only ever moves from `Unsynced` to `Synced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Unsynced,
    /// Pilot start index within the block in which it was found
    Synced(usize),
}

/// Best pilot match within one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PilotMatch {
    pub offset: usize,
    pub similarity: f32,
}

/// Scans incoming blocks for the pilot until it is found once
#[derive(Debug, Clone)]
pub struct PilotCorrelator {
    pilot: PilotTemplate,
    state: SyncState,
}

impl PilotCorrelator {
    pub fn new(pilot: PilotTemplate) -> Self {
        Self {
            pilot,
            state: SyncState::Unsynced,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn pilot(&self) -> &PilotTemplate {
        &self.pilot
    }

    /// Try to acquire sync on `block`
    ///
    /// While unsynced, the block is scanned from scratch and the state moves to
    /// `Synced(offset)` when the best match strictly exceeds [`SYNC_THRESHOLD`].
    /// Once synced the stored state is returned unchanged; alignment is never
    /// re-verified.
    pub fn acquire(&mut self, block: &[f32]) -> SyncState {
        if let SyncState::Unsynced = self.state {
            if let Some(best) = self.best_match(block) {
                if best.similarity > SYNC_THRESHOLD {
                    info!(
                        "Pilot sync acquired at offset {} (similarity {:.3})",
                        best.offset, best.similarity
                    );
                    self.state = SyncState::Synced(best.offset);
                }
            }
        }
        self.state
    }

    /// Highest-similarity window start in `[0, len - pilot_width)`
    ///
    /// Ties keep the lowest index. Returns `None` when the block is too short
    /// to hold any candidate window.
    pub fn best_match(&self, block: &[f32]) -> Option<PilotMatch> {
        let width = self.pilot.len();
        let candidates = block.len().saturating_sub(width);
        if width == 0 || candidates == 0 {
            return None;
        }

        let mut best = PilotMatch {
            offset: 0,
            similarity: f32::NEG_INFINITY,
        };
        for offset in 0..candidates {
            let similarity = self.pilot.similarity(&block[offset..offset + width]);
            if similarity > best.similarity {
                best = PilotMatch { offset, similarity };
            }
        }
        Some(best)
    }
}
