// src/audio/mod.rs

pub mod device;
pub mod feed;
pub mod sim;

pub use device::{CpalNode, CpalOutput};
pub use sim::{SimulatedNode, SimulatedOutput};

use std::sync::Arc;

use crate::buffer::SampleBuffer;
use crate::error::PlaybackError;
use crate::gain::GainHandle;

/// An audio sink that runs on its own clock.
///
/// The playback clock only ever reads `now()`; it never waits on the device.
pub trait AudioOutput {
    type Node: OutputNode;

    /// Hardware clock reading in seconds. Monotonic, but only meaningful as a
    /// difference between two reads.
    fn now(&self) -> f64;

    /// Starts driving `buffer` from `offset` seconds through a fresh node.
    /// Dropping the node stops the sound and releases everything it holds.
    fn start(
        &mut self,
        buffer: Arc<SampleBuffer>,
        offset: f64,
        gain: GainHandle,
    ) -> Result<Self::Node, PlaybackError>;
}

/// A running play segment. Released by drop.
pub trait OutputNode {
    /// Returns (and clears) an error the device reported since the last call.
    fn take_error(&mut self) -> Option<PlaybackError>;
}
