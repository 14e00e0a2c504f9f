// src/waveform/terminal.rs

use crate::render::{PixelCanvas, Rgba, Surface};

/// Projects a rendered canvas onto `cols` x `rows` character cells.
///
/// A cell shows the playhead if any pixel in it has the playhead colour,
/// otherwise a block if any pixel differs from the background.
pub fn canvas_to_ascii(
    canvas: &PixelCanvas,
    cols: usize,
    rows: usize,
    background: Rgba,
    playhead: Rgba,
) -> Vec<String> {
    let (w, h) = (canvas.width(), canvas.height());
    if cols == 0 || rows == 0 || w == 0 || h == 0 {
        return Vec::new();
    }

    (0..rows)
        .map(|row| {
            let y0 = row * h / rows;
            let y1 = ((row + 1) * h / rows).max(y0 + 1).min(h);
            (0..cols)
                .map(|col| {
                    let x0 = col * w / cols;
                    let x1 = ((col + 1) * w / cols).max(x0 + 1).min(w);
                    let mut lit = false;
                    for y in y0..y1 {
                        for x in x0..x1 {
                            match canvas.pixel(x, y) {
                                Some(p) if p == playhead => return '|',
                                Some(p) if p != background => lit = true,
                                _ => {}
                            }
                        }
                    }
                    if lit { '█' } else { ' ' }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_reflect_waveform_and_playhead() {
        let bg = Rgba::rgb(0, 0, 0);
        let wave = Rgba::rgb(0, 255, 0);
        let mut canvas = PixelCanvas::new(8, 4);
        canvas.clear(bg);
        canvas.fill_rect(0, 2, 4, 2, wave);
        canvas.fill_rect(6, 0, 1, 4, Rgba::WHITE);

        let lines = canvas_to_ascii(&canvas, 4, 2, bg, Rgba::WHITE);
        assert_eq!(lines, vec!["   |".to_string(), "██ |".to_string()]);
    }
}
