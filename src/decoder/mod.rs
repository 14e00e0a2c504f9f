// src/decoder/mod.rs

pub mod dsp;
pub mod resample;

use std::io::{Cursor, ErrorKind};

use symphonia::core::audio::SampleBuffer as InterleavedBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::buffer::SampleBuffer;
use crate::error::DecodeError;

/// Decodes a complete audio file held in memory.
pub fn decode(bytes: &[u8]) -> Result<SampleBuffer, DecodeError> {
    decode_with_hint(bytes, None)
}

/// Same as [`decode`], with the file extension (e.g. `"mp3"`) passed to the
/// format probe.
///
/// Pure: nothing is retained between calls, and a failure never yields a
/// partial buffer.
pub fn decode_with_hint(bytes: &[u8], extension: Option<&str>) -> Result<SampleBuffer, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|err| match err {
            // Probe failures on a non-empty stream mean "no known container".
            SymphoniaError::IoError(_) => DecodeError::Unsupported("unrecognised container".into()),
            other => other.into(),
        })?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::Unsupported("no supported audio tracks found".into()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channel_count = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);
    // Frame count the container header promises, when it states one.
    let expected_frames = track.codec_params.n_frames;

    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut planar: Vec<Vec<f32>> = Vec::new();
    let mut sample_buf: Option<InterleavedBuffer<f32>> = None;
    let mut decode_failures = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(err.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if decoded.frames() == 0 {
                    continue;
                }
                let spec = *decoded.spec();
                if planar.is_empty() {
                    sample_rate = spec.rate;
                    channel_count = spec.channels.count();
                    planar = vec![Vec::new(); channel_count];
                }
                if spec.channels.count() != channel_count {
                    return Err(DecodeError::Malformed(
                        "channel layout changed mid-stream".into(),
                    ));
                }

                let needs_alloc = sample_buf
                    .as_ref()
                    .map_or(true, |buf| buf.capacity() < decoded.capacity() * channel_count);
                if needs_alloc {
                    sample_buf = Some(InterleavedBuffer::<f32>::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    dsp::append_interleaved_to_planar(buf.samples(), &mut planar, channel_count);
                }
            }
            Err(SymphoniaError::DecodeError(what)) => {
                decode_failures += 1;
                log::debug!("skipping undecodable packet: {what}");
            }
            Err(err) => return Err(err.into()),
        }
    }

    let decoded_frames = planar.first().map_or(0, Vec::len) as u64;
    if let Some(expected) = expected_frames {
        if decoded_frames < expected {
            return Err(DecodeError::Malformed(format!(
                "truncated stream: {decoded_frames} of {expected} frames"
            )));
        }
    }

    if decoded_frames == 0 {
        if decode_failures > 0 {
            return Err(DecodeError::Malformed(format!(
                "{decode_failures} packets failed to decode"
            )));
        }
        return Err(DecodeError::NoAudio);
    }

    SampleBuffer::from_planar(sample_rate, planar)
        .ok_or_else(|| DecodeError::Malformed("missing sample rate".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes(channels: u16, sample_rate: u32, frames: &[Vec<i16>]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut bytes = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
            for frame in frames {
                for &s in frame {
                    writer.write_sample(s).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        bytes
    }

    #[test]
    fn empty_bytes_are_rejected() {
        assert_eq!(decode(&[]), Err(DecodeError::Empty));
    }

    #[test]
    fn garbage_is_not_a_container() {
        let err = decode(b"definitely not audio, just some text bytes").unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported(_) | DecodeError::Malformed(_)));
    }

    #[test]
    fn decodes_stereo_wav_into_planar_channels() {
        let frames: Vec<Vec<i16>> = (0..800).map(|i| vec![i as i16, -(i as i16)]).collect();
        let bytes = wav_bytes(2, 8_000, &frames);

        let buf = decode_with_hint(&bytes, Some("wav")).unwrap();
        assert_eq!(buf.sample_rate(), 8_000);
        assert_eq!(buf.channel_count(), 2);
        assert_eq!(buf.frame_count(), 800);
        assert!((buf.duration() - 0.1).abs() < 1e-9);

        let left = buf.channel(0).unwrap();
        let right = buf.channel(1).unwrap();
        assert!(left[10] > 0.0);
        assert!(right[10] < 0.0);
        assert!(left.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn truncated_header_fails() {
        let frames: Vec<Vec<i16>> = (0..100).map(|_| vec![0]).collect();
        let bytes = wav_bytes(1, 8_000, &frames);
        assert!(decode(&bytes[..20]).is_err());
    }

    #[test]
    fn data_cut_short_is_malformed() {
        let frames: Vec<Vec<i16>> = (0..8_000).map(|i| vec![(i % 100) as i16]).collect();
        let bytes = wav_bytes(1, 8_000, &frames);
        let cut = &bytes[..bytes.len() / 2];
        assert!(matches!(decode(cut), Err(DecodeError::Malformed(_))));
    }
}
