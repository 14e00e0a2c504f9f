// src/decoder/resample.rs

use rubato::{
    calculate_cutoff, Resampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use crate::decoder::dsp;
use crate::error::PlaybackError;

/// Builds a sinc resampler from the buffer rate to the device rate, or
/// `None` when no conversion is needed.
pub fn build_resampler(
    src_rate: u32,
    dst_rate: u32,
    channels: usize,
    chunk_size: usize,
) -> Result<Option<SincFixedIn<f32>>, PlaybackError> {
    if src_rate == dst_rate {
        return Ok(None);
    }
    let ratio = dst_rate as f64 / src_rate as f64;
    let sinc_len = 256usize;
    let window = WindowFunction::BlackmanHarris2;
    let f_cutoff = calculate_cutoff(sinc_len, window);
    let params = SincInterpolationParameters {
        sinc_len,
        f_cutoff,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window,
    };
    SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, channels)
        .map(Some)
        .map_err(|e| PlaybackError::Device(format!("resampler setup failed: {e}")))
}

/// Runs one full resampler block if enough frames are staged.
///
/// The staged frames are consumed either way; a rubato failure is returned
/// rather than dropping them silently.
pub fn try_process_exact(
    resampler: &mut SincFixedIn<f32>,
    stage_planar: &mut [Vec<f32>],
) -> Result<Option<Vec<Vec<f32>>>, PlaybackError> {
    let need = resampler.input_frames_next();
    if dsp::planar_len(stage_planar) < need {
        return Ok(None);
    }
    let in_block = dsp::take_from_planar(stage_planar, need);
    resampler
        .process(&in_block, None)
        .map(Some)
        .map_err(|e| PlaybackError::Device(format!("resampling failed: {e}")))
}

/// Flushes whatever is staged plus the resampler's internal delay line.
pub fn flush(
    resampler: &mut SincFixedIn<f32>,
    stage_planar: &mut [Vec<f32>],
) -> Result<Vec<Vec<Vec<f32>>>, PlaybackError> {
    let mut blocks = Vec::new();
    let have = dsp::planar_len(stage_planar);
    if have > 0 {
        let rest = dsp::take_from_planar(stage_planar, have);
        let out = resampler
            .process_partial(Some(rest.as_slice()), None)
            .map_err(|e| PlaybackError::Device(format!("resampling failed: {e}")))?;
        blocks.push(out);
    }
    let tail = resampler
        .process_partial::<Vec<f32>>(None, None)
        .map_err(|e| PlaybackError::Device(format!("resampling failed: {e}")))?;
    if tail.first().is_some_and(|ch| !ch.is_empty()) {
        blocks.push(tail);
    }
    Ok(blocks)
}
