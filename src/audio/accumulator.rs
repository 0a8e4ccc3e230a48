//! Sweep-period buffering of synchronized capture samples.

/// Collects exactly one sweep of samples at a time
///
/// Tracks its own active/rest toggle, independent of the transmit generator;
/// the two stay in lockstep only because sync is asserted once. The period
/// that completes first after sync counts as resting, so `N` complete
/// periods yield `N / 2` analyzed sweeps.
#[derive(Debug, Clone)]
pub struct SweepAccumulator {
    buffer: Vec<f32>,
    filled: usize,
    active: bool,
}

impl SweepAccumulator {
    /// Create an empty accumulator whose first completed period is discarded
    pub fn new(duration_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; duration_samples],
            filled: 0,
            active: false,
        }
    }

    /// Samples collected toward the current sweep
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Whether the sweep currently being filled is an active one
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Append `samples`, calling `on_sweep` for every completed active sweep
    ///
    /// Any number of sweep boundaries may fall inside `samples`; leftover
    /// samples start the next sweep with no gap. Completed rest sweeps are
    /// discarded. Returns the number of sweeps handed to `on_sweep`.
    pub fn push<F>(&mut self, mut samples: &[f32], mut on_sweep: F) -> usize
    where
        F: FnMut(&[f32]),
    {
        let mut analyzed = 0;
        while !samples.is_empty() {
            let take = (self.buffer.len() - self.filled).min(samples.len());
            self.buffer[self.filled..self.filled + take].copy_from_slice(&samples[..take]);
            self.filled += take;
            samples = &samples[take..];

            if self.filled == self.buffer.len() {
                if self.active {
                    on_sweep(&self.buffer);
                    analyzed += 1;
                }
                self.filled = 0;
                self.active = !self.active;
            }
        }
        analyzed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_active_sweeps_are_emitted() {
        let mut acc = SweepAccumulator::new(4);
        assert!(!acc.is_active());
        let stream: Vec<f32> = (0..16).map(|i| i as f32).collect();

        let mut sweeps = Vec::new();
        let analyzed = acc.push(&stream, |s| sweeps.push(s.to_vec()));

        assert_eq!(analyzed, 2);
        assert_eq!(sweeps, vec![vec![4.0, 5.0, 6.0, 7.0], vec![12.0, 13.0, 14.0, 15.0]]);
        assert_eq!(acc.filled(), 0);
        assert!(!acc.is_active());
    }

    #[test]
    fn test_sweep_spans_several_pushes() {
        let mut acc = SweepAccumulator::new(5);
        let mut count = 0;

        let chunks = [&[1.0f32, 2.0][..], &[3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0, 10.0, 11.0]];
        for chunk in chunks {
            count += acc.push(chunk, |s| assert_eq!(s, &[6.0, 7.0, 8.0, 9.0, 10.0]));
        }

        assert_eq!(count, 1);
        assert_eq!(acc.filled(), 1);
        assert!(!acc.is_active());
    }

    #[test]
    fn test_block_longer_than_several_sweeps() {
        let mut acc = SweepAccumulator::new(3);
        let block = vec![1.0f32; 3 * 7 + 2];
        assert_eq!(acc.push(&block, |_| {}), 3);
        assert_eq!(acc.filled(), 2);
        assert!(acc.is_active());
    }

    #[test]
    fn test_single_period_is_discarded() {
        let mut acc = SweepAccumulator::new(8);
        assert_eq!(acc.push(&[0.5; 8], |_| panic!("rest period analyzed")), 0);
        assert!(acc.is_active());
    }
}
