// src/error.rs

use thiserror::Error;

/// Why an upload could not be turned into a `SampleBuffer`.
///
/// Returned by the decoder and by `PlaybackController::load_buffer`; the
/// previously loaded buffer (if any) is left installed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("audio data is empty")]
    Empty,

    /// Container or codec not recognised.
    #[error("unsupported audio format: {0}")]
    Unsupported(String),

    /// Recognised container, but the stream is truncated or corrupt.
    #[error("malformed audio stream: {0}")]
    Malformed(String),

    #[error("no decodable audio frames found")]
    NoAudio,
}

/// Failures of the audio output path.
///
/// Any of these forces the playback clock back to `Idle` at time 0 with its
/// output node released.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("audio output device error: {0}")]
    Device(String),

    #[error("unsupported output sample format: {0}")]
    UnsupportedFormat(String),

    /// The running output stream reported an error mid-playback.
    #[error("audio stream error: {0}")]
    Stream(String),
}

impl From<symphonia::core::errors::Error> for DecodeError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        use symphonia::core::errors::Error as SymphoniaError;
        match err {
            SymphoniaError::Unsupported(what) => DecodeError::Unsupported(what.to_string()),
            SymphoniaError::IoError(e) => DecodeError::Malformed(e.to_string()),
            SymphoniaError::DecodeError(what) => DecodeError::Malformed(what.to_string()),
            other => DecodeError::Malformed(other.to_string()),
        }
    }
}
