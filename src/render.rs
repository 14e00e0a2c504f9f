// src/render.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;
use crate::waveform::WaveformColumn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }
}

impl FromStr for Rgba {
    type Err = String;

    /// Accepts `#RRGGBB`, `#RRGGBBAA` and `white`/`black`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => return Ok(Rgba::WHITE),
            "black" => return Ok(Rgba::rgb(0, 0, 0)),
            _ => {}
        }
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| format!("colour must start with '#': {s}"))?;
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return Err(format!("expected #RRGGBB or #RRGGBBAA: {s}"));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("bad colour {s}: {e}"))
        };
        let a = if hex.len() == 8 { byte(6)? } else { 0xFF };
        Ok(Rgba {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a,
        })
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.a != 0xFF {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

/// A fixed-size 2D surface the renderer can fill rectangles on.
///
/// Implementations clip; callers may pass rectangles that hang off any edge.
pub trait Surface {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn fill_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: Rgba);

    fn clear(&mut self, color: Rgba) {
        let (w, h) = (self.width() as i64, self.height() as i64);
        self.fill_rect(0, 0, w, h, color);
    }
}

/// In-memory RGBA surface, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelCanvas {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl PixelCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::rgb(0, 0, 0); width * height],
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }
}

impl Surface for PixelCanvas {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn fill_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: Rgba) {
        let x0 = x.max(0) as usize;
        let y0 = y.max(0) as usize;
        let x1 = (x.saturating_add(w)).clamp(0, self.width as i64) as usize;
        let y1 = (y.saturating_add(h)).clamp(0, self.height as i64) as usize;
        for row in y0..y1 {
            let base = row * self.width;
            self.pixels[base + x0.min(x1)..base + x1].fill(color);
        }
    }
}

/// Projects waveform columns and the playhead onto a surface.
///
/// Stateless apart from its palette; it never touches playback state.
#[derive(Clone, Debug)]
pub struct Renderer {
    pub background: Rgba,
    pub waveform: Rgba,
    pub playhead: Rgba,
    pub playhead_width: u32,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::from_config(&CanvasConfig::default())
    }
}

impl Renderer {
    pub fn from_config(canvas: &CanvasConfig) -> Self {
        Self {
            background: canvas.background,
            waveform: canvas.waveform,
            playhead: canvas.playhead,
            playhead_width: canvas.playhead_width,
        }
    }

    /// Full frame: background, waveform layer, then playhead on top.
    pub fn render<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        columns: &[WaveformColumn],
        current_time: f64,
        duration: f64,
    ) {
        surface.clear(self.background);
        self.draw_waveform(surface, columns);
        self.draw_playhead(surface, current_time, duration);
    }

    /// One 1-px column per entry, spanning `y = (1 + v) / 2 * height` from
    /// `min` to `max`. Empty (sentinel) columns draw nothing.
    pub fn draw_waveform<S: Surface + ?Sized>(&self, surface: &mut S, columns: &[WaveformColumn]) {
        let height = surface.height() as f64;
        for (i, col) in columns.iter().enumerate() {
            if col.is_empty() {
                continue;
            }
            let y1 = (1.0 + col.min as f64) / 2.0 * height;
            let y2 = (1.0 + col.max as f64) / 2.0 * height;
            let top = y1.floor() as i64;
            let bottom = y2.ceil() as i64;
            if bottom > top {
                surface.fill_rect(i as i64, top, 1, bottom - top, self.waveform);
            }
        }
    }

    pub fn draw_playhead<S: Surface + ?Sized>(&self, surface: &mut S, current_time: f64, duration: f64) {
        if duration <= 0.0 || !current_time.is_finite() {
            return;
        }
        let x = (current_time / duration * surface.width() as f64).floor() as i64;
        let h = surface.height() as i64;
        surface.fill_rect(x, 0, self.playhead_width as i64, h, self.playhead);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Rgba = Rgba::rgb(0x1A, 0x1B, 0x1E);
    const GREEN: Rgba = Rgba::rgb(0, 0xFF, 0);

    fn column_pixels(canvas: &PixelCanvas, x: usize, color: Rgba) -> Vec<usize> {
        (0..canvas.height())
            .filter(|&y| canvas.pixel(x, y) == Some(color))
            .collect()
    }

    #[test]
    fn parses_and_prints_colours() {
        assert_eq!("#1A1B1E".parse::<Rgba>(), Ok(BG));
        assert_eq!("white".parse::<Rgba>(), Ok(Rgba::WHITE));
        assert_eq!(BG.to_string(), "#1A1B1E");
        assert!("1A1B1E".parse::<Rgba>().is_err());
        assert!("#12345".parse::<Rgba>().is_err());
    }

    #[test]
    fn fill_rect_clips_to_canvas() {
        let mut canvas = PixelCanvas::new(4, 3);
        canvas.fill_rect(-2, 2, 10, 5, GREEN);
        assert_eq!(canvas.pixel(0, 2), Some(GREEN));
        assert_eq!(canvas.pixel(3, 2), Some(GREEN));
        assert_eq!(canvas.pixel(0, 1), Some(Rgba::rgb(0, 0, 0)));
        canvas.fill_rect(10, 0, 2, 2, GREEN);
        canvas.fill_rect(0, 0, -1, 2, GREEN);
        assert_eq!(canvas.pixel(0, 0), Some(Rgba::rgb(0, 0, 0)));
    }

    #[test]
    fn column_maps_values_to_rows() {
        let renderer = Renderer::default();
        let mut canvas = PixelCanvas::new(2, 200);
        let cols = [
            WaveformColumn { min: -1.0, max: 0.5 },
            WaveformColumn { min: 0.0, max: 1.0 },
        ];
        renderer.render(&mut canvas, &cols, 0.0, 0.0);

        // y = (1 + v) / 2 * 200
        assert_eq!(column_pixels(&canvas, 0, GREEN), (0..150).collect::<Vec<_>>());
        assert_eq!(column_pixels(&canvas, 1, GREEN), (100..200).collect::<Vec<_>>());
    }

    #[test]
    fn sentinel_columns_draw_nothing() {
        let renderer = Renderer::default();
        let mut canvas = PixelCanvas::new(1, 10);
        renderer.render(&mut canvas, &[WaveformColumn::EMPTY], 0.0, 0.0);
        assert!(canvas.pixels().iter().all(|&p| p == BG));
    }

    #[test]
    fn playhead_is_two_pixels_on_top() {
        let renderer = Renderer::default();
        let mut canvas = PixelCanvas::new(800, 200);
        let cols = vec![WaveformColumn { min: -1.0, max: 1.0 }; 800];
        renderer.render(&mut canvas, &cols, 2.5, 10.0);

        assert_eq!(column_pixels(&canvas, 200, Rgba::WHITE).len(), 200);
        assert_eq!(column_pixels(&canvas, 201, Rgba::WHITE).len(), 200);
        assert_eq!(column_pixels(&canvas, 199, GREEN).len(), 200);
        assert_eq!(column_pixels(&canvas, 202, GREEN).len(), 200);
    }

    #[test]
    fn no_playhead_without_duration() {
        let renderer = Renderer::default();
        let mut canvas = PixelCanvas::new(10, 10);
        renderer.render(&mut canvas, &[], 1.0, 0.0);
        assert!(canvas.pixels().iter().all(|&p| p == BG));
    }
}
