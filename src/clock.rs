// src/clock.rs

use std::sync::Arc;

use serde::Serialize;

use crate::audio::{AudioOutput, OutputNode};
use crate::buffer::SampleBuffer;
use crate::error::PlaybackError;
use crate::gain::GainHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

/// What a `tick` observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockEvent {
    /// Playback ran off the end of the buffer; the clock is back at Idle, 0.
    Finished,
}

/// Hardware clock reading and playback time at the start of a play segment.
#[derive(Clone, Copy, Debug)]
struct Anchor {
    real: f64,
    playback: f64,
}

/// Play/pause/seek state machine over an external hardware clock.
///
/// While Playing, time is never stored: it is derived from the anchor and the
/// device clock on every read. The output node for the current segment lives
/// in `node`, so leaving Playing by any path drops (releases) it.
pub struct PlaybackClock<O: AudioOutput> {
    output: O,
    state: PlaybackState,
    duration: f64,
    frozen: f64,
    anchor: Anchor,
    node: Option<O::Node>,
}

impl<O: AudioOutput> PlaybackClock<O> {
    pub fn new(output: O) -> Self {
        Self {
            output,
            state: PlaybackState::Idle,
            duration: 0.0,
            frozen: 0.0,
            anchor: Anchor {
                real: 0.0,
                playback: 0.0,
            },
            node: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// True while an output node is held.
    pub fn has_output(&self) -> bool {
        self.node.is_some()
    }

    /// Current playback position in seconds, always within `[0, duration]`.
    pub fn current_time(&self) -> f64 {
        match self.state {
            PlaybackState::Playing => {
                let elapsed = self.output.now() - self.anchor.real;
                (self.anchor.playback + elapsed).clamp(0.0, self.duration)
            }
            PlaybackState::Idle | PlaybackState::Paused => self.frozen,
        }
    }

    /// Stops everything and installs a new duration (0 when unloaded).
    pub fn reset(&mut self, duration: f64) {
        self.stop();
        self.duration = duration.max(0.0);
    }

    /// Releases any output and returns to Idle at 0.
    pub fn stop(&mut self) {
        self.node = None;
        self.state = PlaybackState::Idle;
        self.frozen = 0.0;
    }

    /// Starts playback from `from` seconds (clamped). No-op while Playing.
    ///
    /// If the output cannot be started the clock ends up Idle at 0.
    pub fn play(
        &mut self,
        buffer: &Arc<SampleBuffer>,
        from: f64,
        gain: &GainHandle,
    ) -> Result<(), PlaybackError> {
        if self.state == PlaybackState::Playing {
            return Ok(());
        }
        let from = self.clamp_time(from);
        self.start_segment(buffer, from, gain)?;
        log::debug!("playing from {from:.3}s");
        Ok(())
    }

    /// Freezes the current position and releases the output. Only acts while
    /// Playing.
    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let t = self.current_time();
        self.node = None;
        if t >= self.duration {
            self.stop();
            log::debug!("pause at end of buffer, back to idle");
            return;
        }
        self.frozen = t;
        self.state = PlaybackState::Paused;
        log::debug!("paused at {t:.3}s");
    }

    /// Moves the playhead to `time` (clamped).
    ///
    /// While Playing the old node is released and a new one started at the
    /// target inside this one call, so the state never reads Paused. The
    /// restart is audible as a short discontinuity, softened by whatever
    /// fade-in the output applies to a fresh node.
    pub fn seek(
        &mut self,
        buffer: &Arc<SampleBuffer>,
        time: f64,
        gain: &GainHandle,
    ) -> Result<(), PlaybackError> {
        let time = self.clamp_time(time);
        match self.state {
            PlaybackState::Playing => {
                self.node = None;
                self.start_segment(buffer, time, gain)?;
                log::debug!("seek while playing to {time:.3}s");
            }
            PlaybackState::Idle | PlaybackState::Paused => {
                self.frozen = time;
            }
        }
        Ok(())
    }

    /// Per-frame bookkeeping: surfaces device errors and detects the natural
    /// end of the buffer. Both leave the clock Idle at 0 with no output held.
    pub fn tick(&mut self) -> Result<Option<ClockEvent>, PlaybackError> {
        if self.state != PlaybackState::Playing {
            return Ok(None);
        }
        if let Some(err) = self.node.as_mut().and_then(|node| node.take_error()) {
            log::error!("playback aborted: {err}");
            self.stop();
            return Err(err);
        }
        let elapsed = self.output.now() - self.anchor.real + self.anchor.playback;
        if elapsed >= self.duration {
            self.stop();
            log::debug!("reached end of buffer");
            return Ok(Some(ClockEvent::Finished));
        }
        Ok(None)
    }

    fn start_segment(
        &mut self,
        buffer: &Arc<SampleBuffer>,
        from: f64,
        gain: &GainHandle,
    ) -> Result<(), PlaybackError> {
        match self.output.start(buffer.clone(), from, gain.clone()) {
            Ok(node) => {
                self.node = Some(node);
                self.anchor = Anchor {
                    real: self.output.now(),
                    playback: from,
                };
                self.state = PlaybackState::Playing;
                Ok(())
            }
            Err(err) => {
                log::error!("could not start output: {err}");
                self.stop();
                Err(err)
            }
        }
    }

    fn clamp_time(&self, t: f64) -> f64 {
        if t.is_nan() {
            return 0.0;
        }
        t.clamp(0.0, self.duration)
    }
}
