// src/gain.rs

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Owns the playback volume.
///
/// The level lives in an atomic so the output callback can read it on every
/// block without locking; a change is heard on the next block of whatever
/// node is currently running.
#[derive(Debug)]
pub struct GainController {
    level: Arc<AtomicU32>,
}

/// Read side of the volume, handed to output nodes.
#[derive(Debug, Clone)]
pub struct GainHandle {
    level: Arc<AtomicU32>,
}

impl GainController {
    pub fn new(initial: f32) -> Self {
        let level = if initial.is_nan() { 1.0 } else { initial.clamp(0.0, 1.0) };
        Self {
            level: Arc::new(AtomicU32::new(level.to_bits())),
        }
    }

    /// Sets the volume, clamped to `[0.0, 1.0]`, and returns the level now in
    /// effect. NaN is ignored.
    pub fn set_volume(&self, v: f32) -> f32 {
        if v.is_nan() {
            return self.volume();
        }
        let new_level = v.clamp(0.0, 1.0);
        self.level.store(new_level.to_bits(), Ordering::Relaxed);
        log::debug!("volume: {:.0}%", new_level * 100.0);
        new_level
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.level.load(Ordering::Relaxed))
    }

    pub fn handle(&self) -> GainHandle {
        GainHandle {
            level: self.level.clone(),
        }
    }
}

impl Default for GainController {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl GainHandle {
    #[inline]
    pub fn level(&self) -> f32 {
        f32::from_bits(self.level.load(Ordering::Relaxed))
    }
}
