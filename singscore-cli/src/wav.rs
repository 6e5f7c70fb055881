//! WAV decoding for reference stems, backing tracks and recorded takes.

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;

use singscore_core::MonoAudio;

/// Reads a WAV file as mono f32 at its native sample rate.
pub fn read_mono(path: &Path) -> Result<MonoAudio> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let audio = from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    log::info!(
        "Loaded {}: {:.1}s at {} Hz",
        path.display(),
        audio.duration_secs(),
        audio.sample_rate
    );
    Ok(audio)
}

/// Decodes integer or float PCM from any reader, averaging all channels.
pub fn from_reader<R: Read>(reader: R) -> Result<MonoAudio> {
    let mut wav_reader = hound::WavReader::new(reader).context("Failed to parse WAV header")?;
    let spec = wav_reader.spec();
    if spec.channels == 0 {
        bail!("WAV file declares no channels");
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => wav_reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .context("Failed to read WAV samples")?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
            wav_reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .context("Failed to read WAV samples")?
        }
    };

    let channels = spec.channels as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(MonoAudio::new(samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn mono_int_samples_are_scaled() {
        let data = make_wav_data(22050, 1, &[0, 16384, -32768]);
        let audio = from_reader(Cursor::new(data)).unwrap();
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.samples, vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn stereo_is_averaged_to_mono() {
        let data = make_wav_data(44100, 2, &[16384, 0, -16384, -16384]);
        let audio = from_reader(Cursor::new(data)).unwrap();
        assert_eq!(audio.samples, vec![0.25, -0.5]);
    }

    #[test]
    fn float_files_are_read_directly() {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for s in [0.25_f32, -0.75] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let audio = from_reader(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(audio.samples, vec![0.25, -0.75]);
        assert_eq!(audio.sample_rate, 48000);
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        std::fs::write(&path, make_wav_data(16000, 1, &[100; 1600])).unwrap();
        let audio = read_mono(&path).unwrap();
        assert_eq!(audio.samples.len(), 1600);
        assert!((audio.duration_secs() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(from_reader(Cursor::new(b"not a wav".to_vec())).is_err());
    }
}
