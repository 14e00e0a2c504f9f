// src/frame.rs

/// Handle for one scheduled display refresh.
///
/// Only valid for the generation it was issued in; `FrameScheduler::cancel`
/// turns every outstanding token stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameToken {
    generation: u64,
}

/// Cooperative frame scheduling with explicit cancellation.
///
/// At most one frame is pending. The host asks for it with `take_pending`
/// and hands the token back when the display refreshes; a token cancelled in
/// between is rejected by `is_live`.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    generation: u64,
    pending: Option<FrameToken>,
    continuous: bool,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a single frame (a still-frame refresh).
    pub fn request_once(&mut self) -> FrameToken {
        let token = FrameToken {
            generation: self.generation,
        };
        self.pending = Some(token);
        token
    }

    /// Schedules the next frame and keeps rescheduling after each one until
    /// cancelled.
    pub fn start_loop(&mut self) -> FrameToken {
        self.continuous = true;
        self.request_once()
    }

    pub fn is_looping(&self) -> bool {
        self.continuous
    }

    /// Invalidates the pending frame and any token already handed out.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.pending = None;
        self.continuous = false;
    }

    /// Hands the pending frame to the host, if any.
    pub fn take_pending(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_live(&self, token: FrameToken) -> bool {
        token.generation == self.generation
    }

    /// Called after a live frame ran; queues the follow-up while looping.
    pub fn frame_done(&mut self) {
        if self.continuous && self.pending.is_none() {
            self.request_once();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_makes_outstanding_tokens_stale() {
        let mut frames = FrameScheduler::new();
        frames.start_loop();
        let token = frames.take_pending().unwrap();
        assert!(frames.is_live(token));
        frames.cancel();
        assert!(!frames.is_live(token));
        assert!(!frames.has_pending());
        assert!(!frames.is_looping());
    }

    #[test]
    fn loop_reschedules_but_once_does_not() {
        let mut frames = FrameScheduler::new();
        frames.request_once();
        frames.take_pending();
        frames.frame_done();
        assert!(!frames.has_pending());

        frames.start_loop();
        frames.take_pending();
        frames.frame_done();
        assert!(frames.has_pending());
    }

    #[test]
    fn at_most_one_frame_pending() {
        let mut frames = FrameScheduler::new();
        frames.request_once();
        frames.request_once();
        assert!(frames.take_pending().is_some());
        assert!(frames.take_pending().is_none());
    }
}
