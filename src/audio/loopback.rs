//! In-memory transport that routes playback into capture through a simulated room.

use log::debug;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use super::transport::{CaptureCallback, PlaybackCallback, StreamHandle, Transport};
use crate::error::AudioError;
use crate::params::StreamSettings;

/// One propagation path from speaker to microphone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EchoTap {
    /// Propagation delay (samples)
    pub delay_samples: usize,

    /// Linear amplitude gain
    pub gain: f32,
}

/// Multi-tap delay line applied to the played-back signal
#[derive(Debug, Clone)]
pub struct EchoPath {
    taps: Vec<EchoTap>,
    history: VecDeque<f32>,
    max_delay: usize,
}

impl Default for EchoPath {
    /// Direct speaker-to-mic path plus one reflection ~0.34 m away
    fn default() -> Self {
        Self::new(vec![
            EchoTap {
                delay_samples: 0,
                gain: 0.5,
            },
            EchoTap {
                delay_samples: 96,
                gain: 0.2,
            },
        ])
    }
}

impl EchoPath {
    pub fn new(taps: Vec<EchoTap>) -> Self {
        let max_delay = taps.iter().map(|t| t.delay_samples).max().unwrap_or(0);
        Self {
            taps,
            history: VecDeque::from(vec![0.0; max_delay]),
            max_delay,
        }
    }

    /// Unit-gain wire with no delay
    pub fn direct() -> Self {
        Self::new(vec![EchoTap {
            delay_samples: 0,
            gain: 1.0,
        }])
    }

    pub fn taps(&self) -> &[EchoTap] {
        &self.taps
    }

    /// Same taps with an empty delay line
    pub fn fresh(&self) -> Self {
        Self::new(self.taps.clone())
    }

    /// Propagate `tx` through every tap into `rx`, clamped to [-1, 1]
    pub fn apply(&mut self, tx: &[f32], rx: &mut [f32]) {
        for (&x, out) in tx.iter().zip(rx.iter_mut()) {
            self.history.push_back(x);
            let mut acc = 0.0;
            for tap in &self.taps {
                acc += tap.gain * self.history[self.max_delay - tap.delay_samples];
            }
            self.history.pop_front();
            *out = acc.clamp(-1.0, 1.0);
        }
    }
}

struct Registered {
    id: u64,
    fill_block: PlaybackCallback,
}

/// One open capture stream hearing the room through its own echo path
struct Listener {
    id: u64,
    on_block: CaptureCallback,
    echo: EchoPath,
    rx: Vec<f32>,
}

/// Everything the room clock touches on a tick
#[derive(Default)]
struct Room {
    playback: Option<Registered>,
    listeners: Vec<Listener>,
    /// Settings of the running clock; `None` while no capture is open
    clock: Option<StreamSettings>,
}

#[derive(Default)]
struct Shared {
    room: Mutex<Room>,
    next_id: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Room> {
        self.room.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a capture to the room, starting the clock if it is the first one
    fn join(
        self: &Arc<Self>,
        settings: StreamSettings,
        listener: Listener,
        paced: bool,
    ) -> Result<(), AudioError> {
        let mut room = self.lock();
        match room.clock {
            Some(clock) if clock != settings => {
                return Err(AudioError::Device(format!(
                    "Loopback room already runs at {}Hz with {}-sample blocks",
                    clock.sample_rate_hz, clock.block_size
                )));
            }
            Some(_) => {}
            None => {
                let shared = Arc::clone(self);
                thread::Builder::new()
                    .name("loopback-room".to_string())
                    .spawn(move || shared.run_clock(settings, paced))?;
                room.clock = Some(settings);
            }
        }
        room.listeners.push(listener);
        Ok(())
    }

    fn leave(&self, id: u64) {
        self.lock().listeners.retain(|l| l.id != id);
    }

    /// Tick until the last capture leaves
    ///
    /// Each tick pulls exactly one playback block and hands it to every
    /// listener, so concurrent captures hear the same signal.
    fn run_clock(&self, settings: StreamSettings, paced: bool) {
        let mut tx = vec![0.0f32; settings.block_size];
        let block_duration = settings.block_duration();
        let mut next_tick = Instant::now();

        loop {
            {
                let mut guard = self.lock();
                let room = &mut *guard;
                if room.listeners.is_empty() {
                    room.clock = None;
                    debug!("Loopback room idle");
                    return;
                }

                match room.playback.as_mut() {
                    Some(registered) => (registered.fill_block)(&mut tx),
                    None => tx.fill(0.0),
                }
                for listener in room.listeners.iter_mut() {
                    listener.echo.apply(&tx, &mut listener.rx);
                    (listener.on_block)(&listener.rx);
                }
            }

            if paced {
                next_tick += block_duration;
                thread::sleep(next_tick.saturating_duration_since(Instant::now()));
            } else {
                thread::yield_now();
            }
        }
    }
}

/// Hardware-free transport: every capture tick pulls one playback block
///
/// A single room clock serves all open captures, which must share the same
/// stream settings. With no capture open the playback side is never
/// advanced.
#[derive(Clone)]
pub struct LoopbackTransport {
    shared: Arc<Shared>,
    echo: EchoPath,
    paced: bool,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new(EchoPath::default())
    }
}

impl LoopbackTransport {
    /// Real-time paced loopback through `echo`
    pub fn new(echo: EchoPath) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            echo,
            paced: true,
        }
    }

    /// Deliver blocks as fast as the consumers accept them
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }
}

impl Transport for LoopbackTransport {
    fn open_capture(
        &self,
        settings: StreamSettings,
        on_block: CaptureCallback,
    ) -> Result<StreamHandle, AudioError> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let listener = Listener {
            id,
            on_block,
            echo: self.echo.fresh(),
            rx: vec![0.0; settings.block_size],
        };
        let shared = Arc::clone(&self.shared);
        let paced = self.paced;

        StreamHandle::spawn("loopback-capture", move |ready, stop| {
            if let Err(e) = shared.join(settings, listener, paced) {
                let _ = ready.send(Err(e));
                return;
            }
            let _ = ready.send(Ok(()));
            let _ = stop.recv();
            shared.leave(id);
        })
    }

    fn open_playback(
        &self,
        _settings: StreamSettings,
        fill_block: PlaybackCallback,
    ) -> Result<StreamHandle, AudioError> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared.lock().playback = Some(Registered { id, fill_block });

        let shared = Arc::clone(&self.shared);
        StreamHandle::spawn("loopback-playback", move |ready, stop| {
            let _ = ready.send(Ok(()));
            let _ = stop.recv();

            let mut room = shared.lock();
            if room.playback.as_ref().is_some_and(|r| r.id == id) {
                room.playback = None;
            }
        })
    }
}
