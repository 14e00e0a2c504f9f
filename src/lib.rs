// src/lib.rs

pub mod audio;
pub mod buffer;
pub mod clock;
pub mod config;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod gain;
pub mod render;
pub mod time;
pub mod waveform;

pub use buffer::SampleBuffer;
pub use clock::{PlaybackClock, PlaybackState};
pub use config::EngineConfig;
pub use controller::{PlaybackController, PlaybackStatus};
pub use decoder::decode;
pub use error::{DecodeError, PlaybackError};
pub use render::{PixelCanvas, Renderer, Surface};
pub use waveform::{downsample, WaveformColumn};
