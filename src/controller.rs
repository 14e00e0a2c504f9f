// src/controller.rs

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::audio::AudioOutput;
use crate::buffer::SampleBuffer;
use crate::clock::{ClockEvent, PlaybackClock, PlaybackState};
use crate::config::EngineConfig;
use crate::decoder;
use crate::error::{DecodeError, PlaybackError};
use crate::frame::{FrameScheduler, FrameToken};
use crate::gain::GainController;
use crate::render::{Renderer, Surface};
use crate::waveform::{WaveformCache, WaveformColumn};

/// Snapshot of everything a UI shows about the transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub current_time: f64,
    pub duration: f64,
    pub volume: f32,
    pub source_name: Option<String>,
}

/// Single owner of the loaded audio and all playback state.
///
/// UI code issues commands and queries here and drives rendering through
/// `next_frame` / `run_frame`. Nothing in here is shared across threads;
/// the only concurrency is inside the output backend.
pub struct PlaybackController<O: AudioOutput> {
    config: EngineConfig,
    renderer: Renderer,
    buffer: Option<Arc<SampleBuffer>>,
    source_name: Option<String>,
    // Bumped on every install/unload; keys the waveform cache.
    generation: u64,
    waveform: WaveformCache,
    gain: GainController,
    clock: PlaybackClock<O>,
    frames: FrameScheduler,
}

impl<O: AudioOutput> PlaybackController<O> {
    pub fn new(output: O, config: EngineConfig) -> Self {
        let gain = GainController::new(config.playback.initial_volume);
        let renderer = Renderer::from_config(&config.canvas);
        let mut frames = FrameScheduler::new();
        frames.request_once();
        Self {
            config,
            renderer,
            buffer: None,
            source_name: None,
            generation: 0,
            waveform: WaveformCache::new(),
            gain,
            clock: PlaybackClock::new(output),
            frames,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Commands ---

    /// Decodes `bytes` and installs the result, replacing any loaded buffer.
    ///
    /// On failure nothing changes: the old buffer stays loaded (and keeps
    /// playing if it was).
    pub fn load_buffer(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        self.load(None, bytes)
    }

    /// Like [`load_buffer`](Self::load_buffer), remembering the file name and
    /// using its extension as a format hint.
    pub fn load_named(&mut self, name: &str, bytes: &[u8]) -> Result<(), DecodeError> {
        self.load(Some(name), bytes)
    }

    fn load(&mut self, name: Option<&str>, bytes: &[u8]) -> Result<(), DecodeError> {
        let ext = name
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str());
        let buffer = decoder::decode_with_hint(bytes, ext).inspect_err(|e| {
            log::warn!("rejected upload {}: {e}", name.unwrap_or("<bytes>"));
        })?;
        self.install_buffer(buffer, name.map(str::to_string));
        Ok(())
    }

    /// Installs an already decoded buffer. Playback stops and the playhead
    /// returns to 0.
    pub fn install_buffer(&mut self, buffer: SampleBuffer, name: Option<String>) {
        self.clock.reset(buffer.duration());
        self.generation += 1;
        self.waveform.clear();
        log::info!(
            "loaded {}: {} Hz, {} ch, {:.2}s",
            name.as_deref().unwrap_or("<bytes>"),
            buffer.sample_rate(),
            buffer.channel_count(),
            buffer.duration()
        );
        self.buffer = Some(Arc::new(buffer));
        self.source_name = name;
        self.state_changed();
    }

    /// Drops the loaded audio ("delete"): stops playback and clears the
    /// buffer, name, duration and time.
    pub fn unload(&mut self) {
        if self.buffer.is_none() {
            return;
        }
        self.clock.reset(0.0);
        self.generation += 1;
        self.waveform.clear();
        self.buffer = None;
        self.source_name = None;
        log::info!("buffer unloaded");
        self.state_changed();
    }

    /// Plays from the current position. Without a buffer this does nothing.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        self.sync()?;
        let Some(buffer) = self.buffer.clone() else {
            return Ok(());
        };
        if self.clock.state() == PlaybackState::Playing {
            return Ok(());
        }
        let from = self.clock.current_time();
        if let Err(err) = self.clock.play(&buffer, from, &self.gain.handle()) {
            self.state_changed();
            return Err(err);
        }
        self.frames.cancel();
        self.frames.start_loop();
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.clock.state() != PlaybackState::Playing {
            return;
        }
        self.clock.pause();
        self.state_changed();
    }

    /// The single play/pause button.
    pub fn toggle_playback(&mut self) -> Result<(), PlaybackError> {
        if self.clock.state() == PlaybackState::Playing {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Jumps to `time` seconds, clamped to the buffer.
    ///
    /// While playing, the output is restarted at the target in one step and
    /// the state stays Playing throughout.
    pub fn seek(&mut self, time: f64) -> Result<(), PlaybackError> {
        self.sync()?;
        let Some(buffer) = self.buffer.clone() else {
            return Ok(());
        };
        if let Err(err) = self.clock.seek(&buffer, time, &self.gain.handle()) {
            self.state_changed();
            return Err(err);
        }
        self.request_still_frame();
        Ok(())
    }

    /// Relative seek in seconds (signed).
    pub fn seek_by(&mut self, delta: f64) -> Result<(), PlaybackError> {
        self.sync()?;
        let target = self.clock.current_time() + delta;
        self.seek(target)
    }

    /// Sets the volume (clamped to `[0, 1]`) and returns the level in effect.
    pub fn set_volume(&mut self, v: f32) -> f32 {
        let level = self.gain.set_volume(v);
        self.request_still_frame();
        level
    }

    // --- Queries ---

    /// Queries do not advance the clock. Once playback passes the end it
    /// still reads Playing, with the time held at `duration`, until the next
    /// frame or command observes the end and returns to Idle at 0.
    pub fn state(&self) -> PlaybackState {
        self.clock.state()
    }

    pub fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    pub fn duration(&self) -> f64 {
        self.buffer.as_ref().map_or(0.0, |b| b.duration())
    }

    pub fn volume(&self) -> f32 {
        self.gain.volume()
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn buffer(&self) -> Option<&Arc<SampleBuffer>> {
        self.buffer.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.buffer.is_some()
    }

    /// True while an output node is held.
    pub fn has_output(&self) -> bool {
        self.clock.has_output()
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state(),
            current_time: self.current_time(),
            duration: self.duration(),
            volume: self.volume(),
            source_name: self.source_name.clone(),
        }
    }

    /// Columns of the loaded buffer at `width`, computed once per
    /// (buffer, width).
    pub fn waveform(&mut self, width: usize) -> Option<&[WaveformColumn]> {
        let buffer = self.buffer.as_ref()?;
        Some(self.waveform.columns_for(self.generation, buffer, width))
    }

    // --- Frames ---

    /// The frame the host should run on its next display refresh, if any.
    pub fn next_frame(&mut self) -> Option<FrameToken> {
        self.frames.take_pending()
    }

    /// Runs a scheduled frame: advances the clock, then paints.
    ///
    /// A token cancelled since it was handed out does nothing and returns
    /// `Ok(false)`. A device failure is still painted (as Idle) before the
    /// error is returned.
    pub fn run_frame<S: Surface + ?Sized>(
        &mut self,
        token: FrameToken,
        surface: &mut S,
    ) -> Result<bool, PlaybackError> {
        if !self.frames.is_live(token) {
            return Ok(false);
        }
        let synced = self.sync();
        self.render(surface);
        self.frames.frame_done();
        synced.map(|()| true)
    }

    /// Paints the current state onto `surface`.
    pub fn render<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        let current = self.clock.current_time();
        let duration = self.duration();
        match &self.buffer {
            Some(buffer) => {
                let columns = self
                    .waveform
                    .columns_for(self.generation, buffer, surface.width());
                self.renderer.render(surface, columns, current, duration);
            }
            None => self.renderer.render(surface, &[], 0.0, 0.0),
        }
    }

    /// Advances the clock's own transitions (end of buffer, device loss).
    fn sync(&mut self) -> Result<(), PlaybackError> {
        match self.clock.tick() {
            Ok(None) => Ok(()),
            Ok(Some(ClockEvent::Finished)) => {
                log::info!("playback finished");
                self.state_changed();
                Ok(())
            }
            Err(err) => {
                self.state_changed();
                Err(err)
            }
        }
    }

    /// Stops any frame loop and schedules one still frame.
    fn state_changed(&mut self) {
        self.frames.cancel();
        self.frames.request_once();
    }

    fn request_still_frame(&mut self) {
        if !self.frames.is_looping() {
            self.frames.request_once();
        }
    }
}

impl<O: AudioOutput> Drop for PlaybackController<O> {
    fn drop(&mut self) {
        self.frames.cancel();
        self.clock.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SimulatedOutput;
    use crate::render::PixelCanvas;

    fn controller_with(seconds: f64) -> (PlaybackController<SimulatedOutput>, SimulatedOutput) {
        let sim = SimulatedOutput::new();
        let mut ctl = PlaybackController::new(sim.clone(), EngineConfig::default());
        let frames = (seconds * 1_000.0) as usize;
        let buffer = SampleBuffer::mono(1_000, vec![0.25; frames]).unwrap();
        ctl.install_buffer(buffer, Some("tone.wav".into()));
        (ctl, sim)
    }

    #[test]
    fn play_without_buffer_is_a_no_op() {
        let sim = SimulatedOutput::new();
        let mut ctl = PlaybackController::new(sim.clone(), EngineConfig::default());
        ctl.play().unwrap();
        assert_eq!(ctl.state(), PlaybackState::Idle);
        assert_eq!(sim.nodes_started(), 0);
        assert_eq!(ctl.duration(), 0.0);
    }

    #[test]
    fn toggle_resumes_where_it_paused() {
        let (mut ctl, sim) = controller_with(5.0);
        ctl.toggle_playback().unwrap();
        sim.advance(2.0);
        ctl.toggle_playback().unwrap();
        assert_eq!(ctl.state(), PlaybackState::Paused);
        assert!((ctl.current_time() - 2.0).abs() < 1e-9);

        ctl.toggle_playback().unwrap();
        assert_eq!(sim.start_offsets().last().copied(), Some(ctl.current_time()));
        assert_eq!(ctl.state(), PlaybackState::Playing);
    }

    #[test]
    fn seek_by_clamps_at_both_ends() {
        let (mut ctl, _sim) = controller_with(5.0);
        ctl.seek_by(-10.0).unwrap();
        assert_eq!(ctl.current_time(), 0.0);
        ctl.seek_by(3.0).unwrap();
        ctl.seek_by(30.0).unwrap();
        assert_eq!(ctl.current_time(), 5.0);
    }

    #[test]
    fn relative_seek_after_the_end_starts_from_zero() {
        let (mut ctl, sim) = controller_with(5.0);
        ctl.play().unwrap();
        sim.advance(5.1);
        assert_eq!(ctl.state(), PlaybackState::Playing);
        assert_eq!(ctl.current_time(), 5.0);

        ctl.seek_by(-2.0).unwrap();
        assert_eq!(ctl.state(), PlaybackState::Idle);
        assert_eq!(ctl.current_time(), 0.0);
        assert_eq!(sim.live_nodes(), 0);
    }

    #[test]
    fn volume_reaches_the_live_node() {
        let (mut ctl, sim) = controller_with(5.0);
        ctl.play().unwrap();
        assert_eq!(ctl.set_volume(0.3), 0.3);
        assert_eq!(sim.node_gain(), Some(0.3));
        assert_eq!(ctl.set_volume(7.0), 1.0);
        assert_eq!(sim.node_gain(), Some(1.0));
    }

    #[test]
    fn unload_releases_and_clears() {
        let (mut ctl, sim) = controller_with(5.0);
        ctl.play().unwrap();
        sim.advance(1.0);
        ctl.unload();
        assert_eq!(sim.live_nodes(), 0);
        assert!(!ctl.is_loaded());
        assert_eq!(ctl.source_name(), None);
        assert_eq!(ctl.duration(), 0.0);
        assert_eq!(ctl.current_time(), 0.0);
        assert_eq!(ctl.state(), PlaybackState::Idle);
    }

    #[test]
    fn playing_frames_keep_coming_until_pause() {
        let (mut ctl, sim) = controller_with(5.0);
        let mut canvas = PixelCanvas::new(100, 20);
        while let Some(token) = ctl.next_frame() {
            ctl.run_frame(token, &mut canvas).unwrap();
        }

        ctl.play().unwrap();
        for _ in 0..3 {
            let token = ctl.next_frame().expect("frame while playing");
            sim.advance(0.016);
            assert!(ctl.run_frame(token, &mut canvas).unwrap());
        }

        let stale = ctl.next_frame().unwrap();
        ctl.pause();
        assert!(!ctl.run_frame(stale, &mut canvas).unwrap());

        let still = ctl.next_frame().expect("one still frame after pause");
        assert!(ctl.run_frame(still, &mut canvas).unwrap());
        assert!(ctl.next_frame().is_none());
    }

    #[test]
    fn frame_after_device_loss_reports_and_idles() {
        let (mut ctl, sim) = controller_with(5.0);
        let mut canvas = PixelCanvas::new(100, 20);
        ctl.play().unwrap();
        let token = ctl.next_frame().unwrap();
        sim.fail_device("gone");
        assert!(ctl.run_frame(token, &mut canvas).is_err());
        assert_eq!(ctl.state(), PlaybackState::Idle);
        assert_eq!(ctl.current_time(), 0.0);
        assert!(!ctl.has_output());
    }

    #[test]
    fn status_serializes_for_the_ui() {
        let (ctl, _sim) = controller_with(2.0);
        let json = serde_json::to_value(ctl.status()).unwrap();
        assert_eq!(json["state"], "Idle");
        assert_eq!(json["duration"], 2.0);
        assert_eq!(json["sourceName"], "tone.wav");
    }
}
