//! Decoding and conditioning: anything symphonia reads comes out as
//! canonical mono samples at the engine's 11 kHz rate.

use anyhow::{Context, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::io::{Cursor, Write};
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use libhum_audio::SAMPLE_RATE;

/// Read an audio file and return (samples, sample_rate, channels).
/// Samples are interleaved f32 in range [-1.0, 1.0].
pub fn read_audio_file(path: &Path) -> Result<(Vec<f32>, u32, usize)> {
    let file = std::fs::File::open(path).context("Failed to open audio file")?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    read_from_source(mss, path.extension().and_then(|e| e.to_str()))
}

/// Read audio from in-memory bytes.
pub fn read_audio_from_bytes(bytes: &[u8]) -> Result<(Vec<f32>, u32, usize)> {
    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());
    read_from_source(mss, None)
}

fn read_from_source(
    mss: MediaSourceStream,
    extension: Option<&str>,
) -> Result<(Vec<f32>, u32, usize)> {
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Unsupported audio format")?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found")?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Unknown sample rate")?;
    let channels = track
        .codec_params
        .channels
        .context("Unknown channel count")?
        .count();

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(e) => return Err(e).context("Error reading packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e).context("Error decoding packet"),
        };

        append_samples(&decoded, &mut samples, channels);
    }

    Ok((samples, sample_rate, channels))
}

fn append_samples(buffer: &AudioBufferRef, samples: &mut Vec<f32>, channels: usize) {
    match buffer {
        AudioBufferRef::F32(buf) => {
            for frame in 0..buf.frames() {
                for ch in 0..channels {
                    samples.push(buf.chan(ch)[frame]);
                }
            }
        }
        AudioBufferRef::S16(buf) => {
            for frame in 0..buf.frames() {
                for ch in 0..channels {
                    samples.push(buf.chan(ch)[frame] as f32 / 32_768.0);
                }
            }
        }
        AudioBufferRef::S32(buf) => {
            for frame in 0..buf.frames() {
                for ch in 0..channels {
                    samples.push(buf.chan(ch)[frame] as f32 / 2_147_483_648.0);
                }
            }
        }
        AudioBufferRef::U8(buf) => {
            for frame in 0..buf.frames() {
                for ch in 0..channels {
                    samples.push((buf.chan(ch)[frame] as f32 - 128.0) / 128.0);
                }
            }
        }
        _ => {}
    }
}

/// Mean-downmix interleaved samples to mono.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Sinc-resample mono samples to the canonical rate. Pass-through when the
/// source already matches.
pub fn resample_to_canonical(samples: &[f32], source_rate: u32) -> Result<Vec<f32>> {
    if source_rate == SAMPLE_RATE {
        return Ok(samples.to_vec());
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let ratio = SAMPLE_RATE as f64 / source_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, 1024, 1)
        .context("Failed to build resampler")?;

    let mut out = Vec::with_capacity((samples.len() as f64 * ratio) as usize + 1024);
    let mut pos = 0;
    while pos < samples.len() {
        let needed = resampler.input_frames_next();
        if samples.len() - pos >= needed {
            let chunk = [&samples[pos..pos + needed]];
            let mut blocks = resampler.process(&chunk, None).context("Resampling failed")?;
            out.append(&mut blocks[0]);
            pos += needed;
        } else {
            let chunk = [&samples[pos..]];
            let mut blocks = resampler
                .process_partial(Some(&chunk), None)
                .context("Resampling failed")?;
            out.append(&mut blocks[0]);
            pos = samples.len();
        }
    }

    // Drain the sinc filter's tail
    let mut tail = resampler
        .process_partial::<&[f32]>(None, None)
        .context("Resampling failed")?;
    out.append(&mut tail[0]);

    Ok(out)
}

/// Decode an audio file all the way to canonical mono 11 kHz samples.
pub fn decode_file_to_canonical(path: &Path) -> Result<Vec<f32>> {
    let (samples, sample_rate, channels) = read_audio_file(path)?;
    let mono = downmix_to_mono(&samples, channels);
    resample_to_canonical(&mono, sample_rate)
}

/// Decode in-memory audio bytes to canonical mono 11 kHz samples.
pub fn decode_bytes_to_canonical(bytes: &[u8]) -> Result<Vec<f32>> {
    let (samples, sample_rate, channels) = read_audio_from_bytes(bytes)?;
    let mono = downmix_to_mono(&samples, channels);
    resample_to_canonical(&mono, sample_rate)
}

/// Write samples to a WAV file.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32, channels: usize) -> Result<()> {
    let bytes = write_wav_to_bytes(samples, sample_rate, channels)?;
    std::fs::write(path, bytes).context("Failed to write WAV file")
}

/// Write samples to 32-bit float WAV format in memory.
pub fn write_wav_to_bytes(samples: &[f32], sample_rate: u32, channels: usize) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    let bytes_per_sample = 4; // IEEE float
    let data_size = samples.len() * bytes_per_sample;
    let file_size = 36 + data_size;

    // RIFF header
    buffer.write_all(b"RIFF")?;
    buffer.write_all(&(file_size as u32).to_le_bytes())?;
    buffer.write_all(b"WAVE")?;

    // fmt chunk
    buffer.write_all(b"fmt ")?;
    buffer.write_all(&16u32.to_le_bytes())?;
    buffer.write_all(&3u16.to_le_bytes())?; // format = IEEE float
    buffer.write_all(&(channels as u16).to_le_bytes())?;
    buffer.write_all(&sample_rate.to_le_bytes())?;
    let byte_rate = sample_rate * channels as u32 * bytes_per_sample as u32;
    buffer.write_all(&byte_rate.to_le_bytes())?;
    let block_align = channels as u16 * bytes_per_sample as u16;
    buffer.write_all(&block_align.to_le_bytes())?;
    buffer.write_all(&32u16.to_le_bytes())?; // bits per sample

    // data chunk
    buffer.write_all(b"data")?;
    buffer.write_all(&(data_size as u32).to_le_bytes())?;
    for &sample in samples {
        buffer.write_all(&sample.to_le_bytes())?;
    }

    Ok(buffer)
}
