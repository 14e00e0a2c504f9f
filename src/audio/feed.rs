// src/audio/feed.rs

use ringbuf::traits::Producer as RbProducer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::buffer::SampleBuffer;
use crate::decoder::{dsp, resample};
use crate::error::PlaybackError;

/// Error reported by the device callback or the feeder, picked up by the
/// owning node on the next `take_error`.
pub type ErrorSlot = Arc<Mutex<Option<PlaybackError>>>;

pub fn report(slot: &ErrorSlot, err: PlaybackError) {
    if let Ok(mut guard) = slot.lock() {
        guard.get_or_insert(err);
    }
}

/// Linear fade-in applied to the first samples after a (re)start.
#[derive(Debug, Clone, Copy)]
pub struct Fade {
    len: usize,
    remaining: usize,
}

impl Fade {
    pub fn new(len: usize) -> Self {
        Self { len, remaining: len }
    }

    #[inline]
    fn next_gain(&mut self) -> f32 {
        if self.remaining == 0 {
            return 1.0;
        }
        let done = self.len - self.remaining;
        self.remaining -= 1;
        done as f32 / self.len as f32
    }
}

/// Pushes `data` into the ring, blocking politely while it is full.
///
/// Returns `false` if `stop` was raised before everything was pushed.
pub fn push_with_fade<P: RbProducer<Item = f32>>(
    producer: &mut P,
    data: &[f32],
    fade: &mut Fade,
    stop: &AtomicBool,
) -> bool {
    for &sample in data {
        let s = sample * fade.next_gain();
        loop {
            if stop.load(Ordering::Relaxed) {
                return false;
            }
            match producer.try_push(s) {
                Ok(()) => break,
                Err(_) => thread::park_timeout(Duration::from_micros(200)),
            }
        }
    }
    true
}

#[derive(Debug, Clone, Copy)]
pub struct FeedParams {
    pub output_channels: usize,
    pub output_sample_rate: u32,
    pub chunk_frames: usize,
    pub fade_samples: usize,
}

/// Spawns the thread that streams `buffer` from `start_frame` into the ring,
/// converting channel layout and sample rate to the device's.
pub fn spawn_feeder<P>(
    buffer: Arc<SampleBuffer>,
    start_frame: usize,
    producer: P,
    stop: Arc<AtomicBool>,
    errors: ErrorSlot,
    params: FeedParams,
) -> Result<JoinHandle<()>, PlaybackError>
where
    P: RbProducer<Item = f32> + Send + 'static,
{
    thread::Builder::new()
        .name("waveplay-feeder".into())
        .spawn(move || {
            if let Err(e) = run_feeder(&buffer, start_frame, producer, &stop, params) {
                log::error!("feeder thread error: {e}");
                report(&errors, e);
            }
        })
        .map_err(|e| PlaybackError::Device(format!("failed to spawn feeder: {e}")))
}

fn run_feeder<P: RbProducer<Item = f32>>(
    buffer: &SampleBuffer,
    start_frame: usize,
    mut producer: P,
    stop: &AtomicBool,
    params: FeedParams,
) -> Result<(), PlaybackError> {
    let in_ch = buffer.channel_count();
    let out_ch = params.output_channels;
    let chunk = params.chunk_frames.max(1);
    let mut resampler =
        resample::build_resampler(buffer.sample_rate(), params.output_sample_rate, out_ch, chunk)?;
    let mut stage_planar: Vec<Vec<f32>> = vec![Vec::with_capacity(chunk * 2); out_ch];
    let mut fade = Fade::new(params.fade_samples * out_ch);

    let total = buffer.frame_count();
    let mut pos = start_frame.min(total);

    while pos < total {
        if stop.load(Ordering::Relaxed) {
            return Ok(());
        }
        let end = (pos + chunk).min(total);
        let slices: Vec<&[f32]> = buffer.channels().iter().map(|c| &c[pos..end]).collect();
        let mixed = dsp::updown_mix_interleaved(&dsp::interleave(&slices), in_ch, out_ch);
        pos = end;

        match resampler.as_mut() {
            Some(r) => {
                dsp::append_interleaved_to_planar(&mixed, &mut stage_planar, out_ch);
                while let Some(block) = resample::try_process_exact(r, &mut stage_planar)? {
                    if !push_with_fade(&mut producer, &dsp::interleave(&block), &mut fade, stop) {
                        return Ok(());
                    }
                }
            }
            None => {
                if !push_with_fade(&mut producer, &mixed, &mut fade, stop) {
                    return Ok(());
                }
            }
        }
    }

    if let Some(r) = resampler.as_mut() {
        for block in resample::flush(r, &mut stage_planar)? {
            if !push_with_fade(&mut producer, &dsp::interleave(&block), &mut fade, stop) {
                break;
            }
        }
    }
    Ok(())
}
