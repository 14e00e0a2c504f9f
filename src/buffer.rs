// src/buffer.rs

/// Decoded, channel-separated audio.
///
/// Immutable once built. All channels have the same length; the duration is
/// always derived from that length and the sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl SampleBuffer {
    /// Builds a buffer from planar channel data.
    ///
    /// Returns `None` if the sample rate is zero, there are no channels, or
    /// the channels disagree in length.
    pub fn from_planar(sample_rate: u32, channels: Vec<Vec<f32>>) -> Option<Self> {
        if sample_rate == 0 || channels.is_empty() {
            return None;
        }
        let frames = channels[0].len();
        if channels.iter().any(|ch| ch.len() != frames) {
            return None;
        }
        Some(Self {
            sample_rate,
            channels,
        })
    }

    /// Convenience for a single-channel buffer.
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Option<Self> {
        Self::from_planar(sample_rate, vec![samples])
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    /// Length in seconds (`frame_count / sample_rate`).
    pub fn duration(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Frame index for a playback time, clamped to the buffer.
    pub fn frame_at(&self, seconds: f64) -> usize {
        let frame = (seconds.max(0.0) * self.sample_rate as f64).round() as usize;
        frame.min(self.frame_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_derived_from_frames() {
        let buf = SampleBuffer::mono(4, vec![0.0; 10]).unwrap();
        assert_eq!(buf.frame_count(), 10);
        assert!((buf.duration() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_ragged_channels_and_zero_rate() {
        assert!(SampleBuffer::from_planar(44_100, vec![vec![0.0; 3], vec![0.0; 2]]).is_none());
        assert!(SampleBuffer::mono(0, vec![0.0]).is_none());
        assert!(SampleBuffer::from_planar(44_100, Vec::new()).is_none());
    }

    #[test]
    fn frame_at_clamps_to_length() {
        let buf = SampleBuffer::mono(10, vec![0.0; 20]).unwrap();
        assert_eq!(buf.frame_at(-1.0), 0);
        assert_eq!(buf.frame_at(0.55), 6);
        assert_eq!(buf.frame_at(99.0), 20);
    }
}
