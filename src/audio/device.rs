// src/audio/device.rs

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Split};
use ringbuf::HeapRb;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::audio::feed::{self, ErrorSlot, FeedParams};
use crate::audio::{AudioOutput, OutputNode};
use crate::buffer::SampleBuffer;
use crate::config::OutputSettings;
use crate::decoder::dsp;
use crate::error::PlaybackError;
use crate::gain::GainHandle;

/// Helper struct to hold output device info
pub struct OutputConfig {
    pub device: Device,
    pub config: StreamConfig,
    pub sample_format: SampleFormat,
    pub output_channels: usize,
    pub output_sample_rate: u32,
}

/// Finds the default audio output device and its config.
pub fn setup_output_device() -> Result<OutputConfig, PlaybackError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(PlaybackError::NoOutputDevice)?;
    let supported_config = device
        .default_output_config()
        .map_err(|e| PlaybackError::Device(e.to_string()))?;
    let sample_format = supported_config.sample_format();
    let config = supported_config.config();
    let output_channels = config.channels as usize;
    let output_sample_rate = config.sample_rate.0;

    log::info!(
        "output device: {} ({} ch @ {} Hz, {:?})",
        device.name().unwrap_or_else(|_| "unknown".into()),
        output_channels,
        output_sample_rate,
        sample_format
    );

    Ok(OutputConfig {
        device,
        config,
        sample_format,
        output_channels,
        output_sample_rate,
    })
}

/// Build a CPAL output stream that drains `consumer`, scales by the live
/// gain and advances the shared frame clock by every frame it hands the
/// device, silent or not.
fn build_stream<T, C, E>(
    device: &Device,
    config: &StreamConfig,
    gain: GainHandle,
    frames_played: Arc<AtomicU64>,
    mut consumer: C,
    err_fn: E,
) -> Result<Stream, PlaybackError>
where
    T: cpal::Sample + cpal::FromSample<f32> + SizedSample,
    C: Consumer<Item = f32> + Send + 'static,
    E: FnMut(cpal::StreamError) + Send + 'static,
{
    let channels = (config.channels as usize).max(1);
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let vol = gain.level();
                for out in data.iter_mut() {
                    let s = consumer.try_pop().unwrap_or(0.0);
                    *out = T::from_sample(s * vol);
                }
                frames_played.fetch_add((data.len() / channels) as u64, Ordering::Relaxed);
            },
            err_fn,
            None,
        )
        .map_err(|e| PlaybackError::Device(e.to_string()))
}

/// The default cpal device as a playback backend.
///
/// The hardware clock is the number of frames the device has pulled, across
/// every node this output has started.
pub struct CpalOutput {
    output: OutputConfig,
    settings: OutputSettings,
    frames_played: Arc<AtomicU64>,
}

impl CpalOutput {
    pub fn open_default(settings: OutputSettings) -> Result<Self, PlaybackError> {
        Ok(Self {
            output: setup_output_device()?,
            settings,
            frames_played: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.output.output_sample_rate
    }

    pub fn channels(&self) -> usize {
        self.output.output_channels
    }
}

impl AudioOutput for CpalOutput {
    type Node = CpalNode;

    fn now(&self) -> f64 {
        self.frames_played.load(Ordering::Relaxed) as f64 / self.output.output_sample_rate as f64
    }

    fn start(
        &mut self,
        buffer: Arc<SampleBuffer>,
        offset: f64,
        gain: GainHandle,
    ) -> Result<CpalNode, PlaybackError> {
        let (producer, consumer) = HeapRb::<f32>::new(self.settings.ring_capacity.max(1024)).split();
        let stop = Arc::new(AtomicBool::new(false));
        let errors = ErrorSlot::default();

        let params = FeedParams {
            output_channels: self.output.output_channels,
            output_sample_rate: self.output.output_sample_rate,
            chunk_frames: self.settings.feed_chunk_frames,
            fade_samples: dsp::fade_samples_ms(
                self.output.output_sample_rate,
                self.settings.post_seek_fade_ms,
            ),
        };
        let start_frame = buffer.frame_at(offset);

        // The node owns everything from here on, so an early return below
        // still stops and joins the feeder.
        let mut node = CpalNode {
            stream: None,
            feeder: None,
            stop: stop.clone(),
            errors: errors.clone(),
        };
        node.feeder = Some(feed::spawn_feeder(
            buffer,
            start_frame,
            producer,
            stop,
            errors.clone(),
            params,
        )?);

        let err_slot = errors.clone();
        let err_fn = move |err: cpal::StreamError| {
            log::error!("output stream error: {err}");
            feed::report(&err_slot, PlaybackError::Stream(err.to_string()));
        };
        let device = &self.output.device;
        let config = &self.output.config;
        let clock = self.frames_played.clone();

        let stream = match self.output.sample_format {
            SampleFormat::F32 => build_stream::<f32, _, _>(device, config, gain, clock, consumer, err_fn)?,
            SampleFormat::I16 => build_stream::<i16, _, _>(device, config, gain, clock, consumer, err_fn)?,
            SampleFormat::U16 => build_stream::<u16, _, _>(device, config, gain, clock, consumer, err_fn)?,
            other => return Err(PlaybackError::UnsupportedFormat(format!("{other:?}"))),
        };
        stream
            .play()
            .map_err(|e| PlaybackError::Device(e.to_string()))?;
        node.stream = Some(stream);

        log::debug!("output node started at {offset:.3}s (frame {start_frame})");
        Ok(node)
    }
}

/// One cpal play segment: the stream plus the thread feeding it.
pub struct CpalNode {
    stream: Option<Stream>,
    feeder: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    errors: ErrorSlot,
}

impl OutputNode for CpalNode {
    fn take_error(&mut self) -> Option<PlaybackError> {
        self.errors.lock().ok().and_then(|mut guard| guard.take())
    }
}

impl Drop for CpalNode {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
        }
        if let Some(handle) = self.feeder.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
        log::debug!("output node released");
    }
}
