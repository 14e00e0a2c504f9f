// src/decoder/dsp.rs

/// Splits interleaved frames into per-channel vectors, appending.
pub fn append_interleaved_to_planar(
    interleaved: &[f32],
    planar: &mut [Vec<f32>],
    channels: usize,
) {
    if channels == 0 {
        return;
    }
    for row in interleaved.chunks_exact(channels) {
        for (ch, &s) in row.iter().enumerate() {
            planar[ch].push(s);
        }
    }
}

pub fn planar_len(planar: &[Vec<f32>]) -> usize {
    planar.iter().map(|v| v.len()).min().unwrap_or(0)
}

/// Removes and returns the first `frames` frames of every channel.
pub fn take_from_planar(planar: &mut [Vec<f32>], frames: usize) -> Vec<Vec<f32>> {
    planar
        .iter_mut()
        .map(|ch| {
            let n = frames.min(ch.len());
            let tail = ch.split_off(n);
            std::mem::replace(ch, tail)
        })
        .collect()
}

/// Interleaves equally long channel slices.
pub fn interleave<S: AsRef<[f32]>>(planar: &[S]) -> Vec<f32> {
    let channels = planar.len();
    if channels == 0 {
        return Vec::new();
    }
    let frames = planar.iter().map(|c| c.as_ref().len()).min().unwrap_or(0);
    let mut out = vec![0.0f32; frames * channels];
    for (ch, data) in planar.iter().enumerate() {
        for (f, &s) in data.as_ref()[..frames].iter().enumerate() {
            out[f * channels + ch] = s;
        }
    }
    out
}

/// Maps interleaved audio from `in_ch` to `out_ch` channels.
///
/// Mono is duplicated to stereo, stereo averaged to mono; other downmixes
/// average neighbouring groups and upmixes repeat channels cyclically.
pub fn updown_mix_interleaved(input: &[f32], in_ch: usize, out_ch: usize) -> Vec<f32> {
    if in_ch == out_ch || in_ch == 0 || out_ch == 0 {
        return input.to_vec();
    }
    let frames = input.len() / in_ch;
    let mut out = vec![0.0f32; frames * out_ch];

    match (in_ch, out_ch) {
        (1, 2) => {
            for f in 0..frames {
                let m = input[f];
                out[f * 2] = m;
                out[f * 2 + 1] = m;
            }
        }
        (2, 1) => {
            for f in 0..frames {
                out[f] = 0.5 * (input[f * 2] + input[f * 2 + 1]);
            }
        }
        _ if out_ch < in_ch => {
            let factor = in_ch as f32 / out_ch as f32;
            for f in 0..frames {
                for oc in 0..out_ch {
                    let start = (oc as f32 * factor).floor() as usize;
                    let end = (((oc + 1) as f32 * factor).ceil() as usize).min(in_ch);
                    let group = &input[f * in_ch + start..f * in_ch + end];
                    out[f * out_ch + oc] = if group.is_empty() {
                        0.0
                    } else {
                        group.iter().sum::<f32>() / group.len() as f32
                    };
                }
            }
        }
        _ => {
            for f in 0..frames {
                for oc in 0..out_ch {
                    out[f * out_ch + oc] = input[f * in_ch + oc % in_ch];
                }
            }
        }
    }

    out
}

#[inline]
pub fn fade_samples_ms(sample_rate: u32, ms: u32) -> usize {
    ((sample_rate as u64 * ms as u64) / 1000) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_split_and_interleave_agree() {
        let interleaved = [1.0, -1.0, 2.0, -2.0, 3.0, -3.0];
        let mut planar = vec![Vec::new(), Vec::new()];
        append_interleaved_to_planar(&interleaved, &mut planar, 2);
        assert_eq!(planar, vec![vec![1.0, 2.0, 3.0], vec![-1.0, -2.0, -3.0]]);
        assert_eq!(interleave(&planar), interleaved.to_vec());
    }

    #[test]
    fn take_from_planar_keeps_the_tail() {
        let mut planar = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let head = take_from_planar(&mut planar, 2);
        assert_eq!(head, vec![vec![1.0, 2.0], vec![4.0, 5.0]]);
        assert_eq!(planar_len(&planar), 1);
    }

    #[test]
    fn mono_stereo_mixing() {
        assert_eq!(updown_mix_interleaved(&[0.5, 0.25], 1, 2), vec![0.5, 0.5, 0.25, 0.25]);
        assert_eq!(updown_mix_interleaved(&[1.0, 0.0, 0.5, 0.5], 2, 1), vec![0.5, 0.5]);
    }

    #[test]
    fn fade_length_in_samples() {
        assert_eq!(fade_samples_ms(48_000, 10), 480);
    }
}
