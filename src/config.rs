// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::render::Rgba;

/// Drawing surface size and palette.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: usize,
    pub height: usize,
    pub background: Rgba,
    pub waveform: Rgba,
    pub playhead: Rgba,
    pub playhead_width: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 200,
            background: Rgba::rgb(0x1A, 0x1B, 0x1E),
            waveform: Rgba::rgb(0x00, 0xFF, 0x00),
            playhead: Rgba::WHITE,
            playhead_width: 2,
        }
    }
}

/// Host-side pacing and key steps.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PlaybackSettings {
    pub frame_interval_ms: u64,
    pub seek_step_secs: f64,
    pub volume_step: f32,
    pub initial_volume: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            seek_step_secs: 5.0,
            volume_step: 0.1,
            initial_volume: 1.0,
        }
    }
}

/// Tuning for the cpal output path.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
    /// Ring buffer size in samples (all channels).
    pub ring_capacity: usize,
    pub post_seek_fade_ms: u32,
    pub feed_chunk_frames: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            ring_capacity: 131_072,
            post_seek_fade_ms: 10,
            feed_chunk_frames: 1024,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub canvas: CanvasConfig,
    pub playback: PlaybackSettings,
    pub output: OutputSettings,
}

impl EngineConfig {
    /// Reads a JSON config; absent fields keep their defaults.
    pub fn load_from_disk<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_canvas() {
        let cfg = EngineConfig::default();
        assert_eq!((cfg.canvas.width, cfg.canvas.height), (800, 200));
        assert_eq!(cfg.canvas.playhead_width, 2);
        assert_eq!(cfg.canvas.background.to_string(), "#1A1B1E");
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let cfg = EngineConfig::from_json(r##"{ "canvas": { "width": 1200, "waveform": "#FF8800" } }"##)
            .unwrap();
        assert_eq!(cfg.canvas.width, 1200);
        assert_eq!(cfg.canvas.height, 200);
        assert_eq!(cfg.canvas.waveform, Rgba::rgb(0xFF, 0x88, 0x00));
        assert_eq!(cfg.output, OutputSettings::default());
    }

    #[test]
    fn bad_colour_is_rejected() {
        assert!(EngineConfig::from_json(r#"{ "canvas": { "playhead": "red" } }"#).is_err());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("waveplay-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        let mut cfg = EngineConfig::default();
        cfg.playback.frame_interval_ms = 33;
        std::fs::write(&path, serde_json::to_string_pretty(&cfg).unwrap()).unwrap();

        assert_eq!(EngineConfig::load_from_disk(&path).unwrap(), cfg);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(EngineConfig::load_from_disk("/definitely/not/here.json").is_err());
    }
}
