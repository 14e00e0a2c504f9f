// src/waveform/mod.rs
pub mod terminal;

use crate::buffer::SampleBuffer;

/// Min/max of the samples behind one pixel column.
///
/// A column whose slice held no samples keeps the scan's starting values
/// (`min = 1.0`, `max = -1.0`); see [`WaveformColumn::is_empty`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveformColumn {
    pub min: f32,
    pub max: f32,
}

impl WaveformColumn {
    pub const EMPTY: WaveformColumn = WaveformColumn { min: 1.0, max: -1.0 };

    /// True for a column with no backing samples (inverted sentinel).
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

/// Reduces channel 0 of `buffer` to exactly `width` min/max columns.
///
/// Column `i` covers frames `[i * step, (i + 1) * step)` with
/// `step = ceil(frames / width)`, cut off at the end of the buffer. Other
/// channels are not mixed in.
pub fn downsample(buffer: &SampleBuffer, width: usize) -> Vec<WaveformColumn> {
    let data = buffer.channel(0).unwrap_or(&[]);
    downsample_channel(data, width)
}

pub fn downsample_channel(data: &[f32], width: usize) -> Vec<WaveformColumn> {
    if width == 0 {
        return Vec::new();
    }
    let frames = data.len();
    let step = frames.div_ceil(width);

    (0..width)
        .map(|i| {
            let start = (i * step).min(frames);
            let end = ((i + 1) * step).min(frames);
            data[start..end]
                .iter()
                .fold(WaveformColumn::EMPTY, |col, &s| WaveformColumn {
                    min: col.min.min(s),
                    max: col.max.max(s),
                })
        })
        .collect()
}

/// Holds the columns for the last (buffer, width) pair it was asked for.
///
/// Buffers are identified by a generation number the owner bumps whenever it
/// installs or drops a buffer.
#[derive(Debug, Default)]
pub struct WaveformCache {
    key: Option<(u64, usize)>,
    columns: Vec<WaveformColumn>,
}

impl WaveformCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns_for(
        &mut self,
        generation: u64,
        buffer: &SampleBuffer,
        width: usize,
    ) -> &[WaveformColumn] {
        if self.key != Some((generation, width)) {
            self.columns = downsample(buffer, width);
            self.key = Some((generation, width));
            log::debug!(
                "waveform recomputed: {} frames -> {} columns",
                buffer.frame_count(),
                width
            );
        }
        &self.columns
    }

    pub fn clear(&mut self) {
        self.key = None;
        self.columns.clear();
    }

    pub fn is_cached(&self, generation: u64, width: usize) -> bool {
        self.key == Some((generation, width))
    }
}
