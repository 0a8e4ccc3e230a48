//! Audio transport seam and the cpal-backed device implementation.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{error, info};
use std::thread;

use crate::error::AudioError;
use crate::params::StreamSettings;

/// Called with every captured mono block
pub type CaptureCallback = Box<dyn FnMut(&[f32]) + Send + 'static>;

/// Called to fill every requested mono playback block
pub type PlaybackCallback = Box<dyn FnMut(&mut [f32]) + Send + 'static>;

/// Source of capture and playback callbacks at a fixed cadence
pub trait Transport: Send + Sync {
    /// Start delivering captured blocks to `on_block`
    fn open_capture(
        &self,
        settings: StreamSettings,
        on_block: CaptureCallback,
    ) -> Result<StreamHandle, AudioError>;

    /// Start requesting playback blocks from `fill_block`
    fn open_playback(
        &self,
        settings: StreamSettings,
        fill_block: PlaybackCallback,
    ) -> Result<StreamHandle, AudioError>;
}

/// Keeps one running stream alive on a dedicated worker thread
///
/// Dropping the handle (or calling [`StreamHandle::stop`]) ends the stream;
/// a block already inside its callback runs to completion first.
#[derive(Debug)]
pub struct StreamHandle {
    stop: Option<Sender<()>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl StreamHandle {
    /// Run `run` on a named worker thread and wait for its setup result
    ///
    /// `run` reports setup through `ready`, then keeps the stream alive until
    /// `stop` disconnects.
    pub fn spawn<F>(name: &str, run: F) -> Result<Self, AudioError>
    where
        F: FnOnce(Sender<Result<(), AudioError>>, Receiver<()>) + Send + 'static,
    {
        let (ready_tx, ready_rx) = bounded(1);
        let (stop_tx, stop_rx) = bounded(1);
        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(ready_tx, stop_rx))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                stop: Some(stop_tx),
                worker: Some(worker),
            }),
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(AudioError::WorkerLost)
            }
        }
    }

    /// End the stream and wait for its worker to exit
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        // Disconnecting the channel wakes the worker
        self.stop.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Audio stream worker panicked");
            }
        }
    }
}

/// Default host input/output devices via cpal
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalTransport;

impl CpalTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for CpalTransport {
    fn open_capture(
        &self,
        settings: StreamSettings,
        mut on_block: CaptureCallback,
    ) -> Result<StreamHandle, AudioError> {
        StreamHandle::spawn("audio-capture", move |ready, stop| {
            let built = build_input_stream(settings, move |data: &[f32]| on_block(data));
            keep_alive(built, ready, stop);
        })
    }

    fn open_playback(
        &self,
        settings: StreamSettings,
        mut fill_block: PlaybackCallback,
    ) -> Result<StreamHandle, AudioError> {
        StreamHandle::spawn("audio-playback", move |ready, stop| {
            let built = build_output_stream(settings, move |data: &mut [f32]| fill_block(data));
            keep_alive(built, ready, stop);
        })
    }
}

/// Report setup, then hold the stream until stop is requested
fn keep_alive(
    built: Result<cpal::Stream, AudioError>,
    ready: Sender<Result<(), AudioError>>,
    stop: Receiver<()>,
) {
    match built {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            let _ = stop.recv();
            drop(stream);
        }
        Err(e) => {
            let _ = ready.send(Err(e));
        }
    }
}

fn stream_config(settings: StreamSettings) -> cpal::StreamConfig {
    cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(settings.sample_rate_hz),
        buffer_size: cpal::BufferSize::Fixed(settings.block_size as u32),
    }
}

fn build_input_stream<D>(settings: StreamSettings, mut on_block: D) -> Result<cpal::Stream, AudioError>
where
    D: FnMut(&[f32]) + Send + 'static,
{
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(AudioError::NoDevice("input"))?;

    info!(
        "Audio input: {} @ {}Hz, {} samples/block",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        settings.sample_rate_hz,
        settings.block_size
    );

    let stream = device.build_input_stream(
        &stream_config(settings),
        move |data: &[f32], _: &cpal::InputCallbackInfo| on_block(data),
        |err| error!("Audio input stream error: {}", err),
        None,
    )?;
    stream.play()?;
    Ok(stream)
}

fn build_output_stream<D>(
    settings: StreamSettings,
    mut fill_block: D,
) -> Result<cpal::Stream, AudioError>
where
    D: FnMut(&mut [f32]) + Send + 'static,
{
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(AudioError::NoDevice("output"))?;

    info!(
        "Audio output: {} @ {}Hz, {} samples/block",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        settings.sample_rate_hz,
        settings.block_size
    );

    let stream = device.build_output_stream(
        &stream_config(settings),
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| fill_block(data),
        |err| error!("Audio output stream error: {}", err),
        None,
    )?;
    stream.play()?;
    Ok(stream)
}

/// Print the default host's input and output devices with their default configs
pub fn list_devices() -> Result<(), AudioError> {
    let host = cpal::default_host();
    println!("Audio host: {:?}", host.id());

    println!("\n--- Output Devices ---");
    for (i, device) in host.output_devices()?.enumerate() {
        println!("  [{}] {}", i, device.name().unwrap_or_else(|_| "Unknown".into()));
        if let Ok(config) = device.default_output_config() {
            println!("      Default config: {:?}", config);
        }
    }

    println!("\n--- Input Devices ---");
    for (i, device) in host.input_devices()?.enumerate() {
        println!("  [{}] {}", i, device.name().unwrap_or_else(|_| "Unknown".into()));
        if let Ok(config) = device.default_input_config() {
            println!("      Default config: {:?}", config);
        }
    }

    Ok(())
}
