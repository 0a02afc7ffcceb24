//! PCM16 audio input.
//!
//! Loads a WAV file, brings it to 24kHz mono PCM16 and streams it to the
//! realtime service in fixed-size chunks, paced at real time.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use super::realtime::RealtimeSender;
use super::realtime::config::PCM16_SAMPLE_RATE;

/// Samples per `input_audio_buffer.append` frame.
pub const CHUNK_SAMPLES: usize = 4096;

/// Errors that can occur while loading audio.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to decode WAV: {0}")]
    Decode(#[from] hound::Error),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),
}

/// Convert one float sample in `[-1.0, 1.0]` to PCM16.
///
/// Negative samples scale by 0x8000 and positive ones by 0x7FFF so both
/// ends of the range map exactly.
#[inline]
pub fn f32_to_pcm16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Decode WAV data into 24kHz mono PCM16 samples.
pub fn decode_wav<R: Read>(reader: R) -> Result<Vec<i16>, AudioError> {
    let reader = hound::WavReader::new(reader)?;
    let spec = reader.spec();
    tracing::debug!(
        "WAV format: {} Hz, {} channels, {} bits",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample
    );

    if spec.channels == 0 {
        return Err(AudioError::UnsupportedFormat("no channels".to_string()));
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioError::UnsupportedFormat(format!(
                    "{}-bit integer samples",
                    spec.bits_per_sample
                )));
            }
            let max_val = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_val))
                .collect::<Result<_, _>>()?
        }
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
    };

    let channels = spec.channels as usize;
    let mono: Vec<f32> = if channels == 1 {
        samples
    } else {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    let resampled = resample(&mono, spec.sample_rate, PCM16_SAMPLE_RATE);
    Ok(resampled.into_iter().map(f32_to_pcm16).collect())
}

/// Load a WAV file as 24kHz mono PCM16 samples.
pub fn load_wav(path: impl AsRef<Path>) -> Result<Vec<i16>, AudioError> {
    let file = std::fs::File::open(path.as_ref()).map_err(hound::Error::IoError)?;
    decode_wav(std::io::BufReader::new(file))
}

/// Linear interpolation resampler.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let new_len = (samples.len() as f64 / ratio) as usize;

    (0..new_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos as usize;
            let frac = (pos - idx as f64) as f32;
            let a = samples[idx.min(samples.len() - 1)];
            let b = samples[(idx + 1).min(samples.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}

/// Duration of a chunk at the PCM16 sample rate.
pub fn chunk_duration(samples: usize) -> Duration {
    Duration::from_secs_f64(samples as f64 / PCM16_SAMPLE_RATE as f64)
}

/// Stream samples to the service, one chunk per chunk duration.
///
/// Stops early when the connection is no longer open. Returns the number of
/// chunks queued.
pub async fn stream_pcm16(sender: &RealtimeSender, samples: &[i16]) -> usize {
    let mut sent = 0;
    let mut ticker = tokio::time::interval(chunk_duration(CHUNK_SAMPLES));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    for chunk in samples.chunks(CHUNK_SAMPLES) {
        ticker.tick().await;
        if !sender.is_open() {
            tracing::warn!("Connection closed while streaming audio");
            break;
        }
        if sender.send_audio(chunk) {
            sent += 1;
        }
    }

    tracing::info!(
        "Streamed {} audio chunks ({:.1}s)",
        sent,
        samples.len() as f64 / PCM16_SAMPLE_RATE as f64
    );
    sent
}
