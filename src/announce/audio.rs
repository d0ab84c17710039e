//! Conversion of synthesized speech into the robot's playback format
//!
//! The speaker expects 16-bit mono WAV at 16 kHz. TTS providers return MP3
//! (or occasionally WAV at another rate), so clips are decoded, downmixed,
//! resampled and re-encoded before playback.

use std::io::{Cursor, Write};

use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Sample rate expected by the robot speaker
pub const PLAYBACK_SAMPLE_RATE: u32 = 16000;

/// Frames fed to the resampler per call
const RESAMPLE_CHUNK: usize = 1024;

/// Mono PCM clip
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    /// Samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Samples per second
    pub sample_rate: u32,
}

/// Decode MP3 or WAV bytes to a mono clip
///
/// # Errors
///
/// Returns error if the bytes are not decodable audio
pub fn decode(audio: &[u8]) -> Result<Clip> {
    if audio.starts_with(b"RIFF") {
        decode_wav(audio)
    } else {
        decode_mp3(audio)
    }
}

/// Decode MP3 bytes, averaging stereo frames to mono
fn decode_mp3(mp3_data: &[u8]) -> Result<Clip> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = 0;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                sample_rate = u32::try_from(frame.sample_rate)
                    .map_err(|_| Error::Audio(format!("bad MP3 sample rate {}", frame.sample_rate)))?;
                let channels = frame.channels.max(1);
                let normalized: Vec<f32> =
                    frame.data.iter().map(|&s| f32::from(s) / 32768.0).collect();
                samples.extend(normalized.chunks(channels).map(mean));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    if samples.is_empty() {
        return Err(Error::Audio("no audio frames decoded".to_string()));
    }

    Ok(Clip {
        samples,
        sample_rate,
    })
}

/// Decode WAV bytes, averaging channels to mono
fn decode_wav(wav_data: &[u8]) -> Result<Clip> {
    let mut reader =
        hound::WavReader::new(Cursor::new(wav_data)).map_err(|e| Error::Audio(e.to_string()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Audio(e.to_string()))?,
        hound::SampleFormat::Int => {
            #[allow(clippy::cast_precision_loss)]
            let scale = (1_i64 << spec.bits_per_sample.saturating_sub(1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| int_to_f32(v, scale)))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Audio(e.to_string()))?
        }
    };

    let samples = interleaved.chunks(channels).map(mean).collect();

    Ok(Clip {
        samples,
        sample_rate: spec.sample_rate,
    })
}

#[allow(clippy::cast_precision_loss)]
fn int_to_f32(value: i32, scale: f32) -> f32 {
    value as f32 / scale
}

/// Average of one interleaved frame
#[allow(clippy::cast_precision_loss)]
fn mean(frame: &[f32]) -> f32 {
    frame.iter().sum::<f32>() / frame.len() as f32
}

/// Resample a clip to `target_rate`
///
/// # Errors
///
/// Returns error if the resampler rejects the rate pair
pub fn resample(clip: &Clip, target_rate: u32) -> Result<Clip> {
    if clip.sample_rate == target_rate || clip.samples.is_empty() {
        return Ok(Clip {
            samples: clip.samples.clone(),
            sample_rate: target_rate,
        });
    }
    if clip.sample_rate == 0 {
        return Err(Error::Audio("clip has no sample rate".to_string()));
    }

    let ratio = f64::from(target_rate) / f64::from(clip.sample_rate);
    let mut resampler =
        FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Cubic, RESAMPLE_CHUNK, 1)
            .map_err(|e| Error::Audio(e.to_string()))?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let expected = (clip.samples.len() as f64 * ratio).round() as usize;
    let delay = resampler.output_delay();
    let mut out = Vec::with_capacity(expected + delay + 2 * RESAMPLE_CHUNK);
    let mut pos = 0;

    while clip.samples.len() - pos >= resampler.input_frames_next() {
        let end = pos + resampler.input_frames_next();
        let chunk: [&[f32]; 1] = [&clip.samples[pos..end]];
        let processed = resampler
            .process(&chunk[..], None)
            .map_err(|e| Error::Audio(e.to_string()))?;
        out.extend_from_slice(&processed[0]);
        pos = end;
    }

    if pos < clip.samples.len() {
        let tail: [&[f32]; 1] = [&clip.samples[pos..]];
        let processed = resampler
            .process_partial(Some(&tail[..]), None)
            .map_err(|e| Error::Audio(e.to_string()))?;
        out.extend_from_slice(&processed[0]);
    }

    // Push zeros through until the delayed tail has come out
    while out.len() < expected + delay {
        let processed = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| Error::Audio(e.to_string()))?;
        if processed[0].is_empty() {
            break;
        }
        out.extend_from_slice(&processed[0]);
    }

    out.drain(..delay.min(out.len()));
    out.truncate(expected);

    Ok(Clip {
        samples: out,
        sample_rate: target_rate,
    })
}

/// Encode a clip as 16-bit mono WAV bytes
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn encode_wav(clip: &Clip) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in &clip.samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Convert synthesized speech into a playback-ready WAV temp file
///
/// The file is removed when the returned handle is dropped.
///
/// # Errors
///
/// Returns error if decoding, resampling or writing fails
pub fn to_playback_file(audio: &[u8]) -> Result<NamedTempFile> {
    let clip = decode(audio)?;
    let clip = resample(&clip, PLAYBACK_SAMPLE_RATE)?;
    let wav = encode_wav(&clip)?;

    let mut file = tempfile::Builder::new()
        .prefix("reachy-announce-")
        .suffix(".wav")
        .tempfile()?;
    file.write_all(&wav)?;
    file.flush()?;

    tracing::trace!(
        path = %file.path().display(),
        samples = clip.samples.len(),
        "prepared playback file"
    );
    Ok(file)
}
