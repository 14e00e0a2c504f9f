// src/audio/sim.rs

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::audio::{AudioOutput, OutputNode};
use crate::buffer::SampleBuffer;
use crate::error::PlaybackError;
use crate::gain::GainHandle;

#[derive(Debug, Default)]
struct SimState {
    now: f64,
    live_nodes: usize,
    nodes_started: usize,
    start_offsets: Vec<f64>,
    fail_next_start: Option<PlaybackError>,
    device_error: Option<PlaybackError>,
    last_gain: Option<GainHandle>,
}

/// Output backend with a hand-cranked clock and no sound.
///
/// Clones share state, so a host can keep one clone to drive time and
/// inspect node bookkeeping while the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct SimulatedOutput {
    state: Rc<RefCell<SimState>>,
}

impl SimulatedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the hardware clock forward.
    pub fn advance(&self, secs: f64) {
        self.state.borrow_mut().now += secs.max(0.0);
    }

    /// Nodes started but not yet dropped.
    pub fn live_nodes(&self) -> usize {
        self.state.borrow().live_nodes
    }

    pub fn nodes_started(&self) -> usize {
        self.state.borrow().nodes_started
    }

    /// Offsets (seconds) every node was started from, oldest first.
    pub fn start_offsets(&self) -> Vec<f64> {
        self.state.borrow().start_offsets.clone()
    }

    /// Level the most recent node would currently scale its output by.
    pub fn node_gain(&self) -> Option<f32> {
        self.state.borrow().last_gain.as_ref().map(GainHandle::level)
    }

    /// Makes the next `start` fail with `err`.
    pub fn fail_next_start(&self, err: PlaybackError) {
        self.state.borrow_mut().fail_next_start = Some(err);
    }

    /// Simulates the device going away under a running node.
    pub fn fail_device(&self, message: &str) {
        self.state.borrow_mut().device_error = Some(PlaybackError::Stream(message.to_string()));
    }
}

impl AudioOutput for SimulatedOutput {
    type Node = SimulatedNode;

    fn now(&self) -> f64 {
        self.state.borrow().now
    }

    fn start(
        &mut self,
        _buffer: Arc<SampleBuffer>,
        offset: f64,
        gain: GainHandle,
    ) -> Result<SimulatedNode, PlaybackError> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = state.fail_next_start.take() {
            return Err(err);
        }
        state.live_nodes += 1;
        state.nodes_started += 1;
        state.start_offsets.push(offset);
        state.last_gain = Some(gain);
        Ok(SimulatedNode {
            state: self.state.clone(),
        })
    }
}

pub struct SimulatedNode {
    state: Rc<RefCell<SimState>>,
}

impl OutputNode for SimulatedNode {
    fn take_error(&mut self) -> Option<PlaybackError> {
        self.state.borrow_mut().device_error.take()
    }
}

impl Drop for SimulatedNode {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.live_nodes = state.live_nodes.saturating_sub(1);
    }
}
