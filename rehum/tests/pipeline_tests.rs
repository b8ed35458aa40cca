#[cfg(test)]
mod tests {
    use rehum::audio::{
        decode_bytes_to_canonical, downmix_to_mono, read_audio_from_bytes, resample_to_canonical,
        write_wav_to_bytes,
    };
    use rehum::Library;
    use std::path::PathBuf;

    const SAMPLE_RATE: u32 = 11_000;
    const HOP_LENGTH: usize = 512;

    fn sine(freq: f32, sample_rate: u32, secs: f32, amp: f32) -> Vec<f32> {
        let len = (secs * sample_rate as f32) as usize;
        (0..len)
            .map(|n| {
                amp * (2.0 * std::f32::consts::PI * freq * n as f32 / sample_rate as f32).sin()
            })
            .collect()
    }

    // Phase-continuous stepped melody at the canonical rate, hop-aligned
    fn melody(scale: &[f32], secs: f32) -> Vec<f32> {
        let len = (secs * SAMPLE_RATE as f32) as usize;
        let len = (len + HOP_LENGTH - 1) / HOP_LENGTH * HOP_LENGTH;
        let step_len = SAMPLE_RATE as usize / 2;

        let mut phase = 0.0f32;
        let mut out = Vec::with_capacity(len);
        for n in 0..len {
            let note = scale[(n / step_len) % scale.len()];
            phase += 2.0 * std::f32::consts::PI * note / SAMPLE_RATE as f32;
            if phase > 2.0 * std::f32::consts::PI {
                phase -= 2.0 * std::f32::consts::PI;
            }
            out.push(0.6 * phase.sin());
        }
        out
    }

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("rehum-test-{}-{}", std::process::id(), name));
        path
    }

    #[test]
    fn test_wav_round_trip() {
        let sample_rate = 44_100;
        let channels = 2;
        let mono = sine(440.0, sample_rate, 0.5, 0.5);
        let interleaved: Vec<f32> = mono.iter().flat_map(|&s| [s, s]).collect();

        let wav = write_wav_to_bytes(&interleaved, sample_rate, channels).unwrap();
        let (decoded, decoded_rate, decoded_channels) = read_audio_from_bytes(&wav).unwrap();

        assert_eq!(decoded_rate, sample_rate);
        assert_eq!(decoded_channels, channels);
        assert_eq!(decoded.len(), interleaved.len());
        for (original, decoded) in interleaved.iter().zip(decoded.iter()) {
            assert!((original - decoded).abs() < 1e-6);
        }
    }

    #[test]
    fn test_downmix_averages_channels() {
        let interleaved = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix_to_mono(&interleaved, 2), vec![0.5, 0.5, 0.0]);

        // Mono passes through untouched
        let mono = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&mono, 1), mono);
    }

    #[test]
    fn test_resample_passthrough_at_canonical_rate() {
        let samples = sine(440.0, SAMPLE_RATE, 1.0, 0.5);
        let resampled = resample_to_canonical(&samples, SAMPLE_RATE).unwrap();
        assert_eq!(resampled, samples);
    }

    #[test]
    fn test_resample_halves_a_double_rate_signal() {
        let samples = sine(440.0, 22_000, 1.0, 0.5);
        let resampled = resample_to_canonical(&samples, 22_000).unwrap();
        let expected = samples.len() / 2;
        assert!(
            resampled.len().abs_diff(expected) < 600,
            "expected ~{} samples, got {}",
            expected,
            resampled.len()
        );
    }

    #[test]
    fn test_resample_empty_input() {
        assert!(resample_to_canonical(&[], 44_100).unwrap().is_empty());
    }

    #[test]
    fn test_decode_bytes_to_canonical_conditions_everything() {
        // 44.1 kHz stereo in, canonical mono out
        let sample_rate = 44_100;
        let mono = sine(880.0, sample_rate, 1.0, 0.5);
        let interleaved: Vec<f32> = mono.iter().flat_map(|&s| [s, s]).collect();
        let wav = write_wav_to_bytes(&interleaved, sample_rate, 2).unwrap();

        let canonical = decode_bytes_to_canonical(&wav).unwrap();
        assert!(
            canonical.len().abs_diff(SAMPLE_RATE as usize) < 600,
            "expected ~1s at 11 kHz, got {} samples",
            canonical.len()
        );
    }

    #[test]
    fn test_library_file_round_trip_and_identify() {
        const SCALE_A: [f32; 8] = [440.0, 523.25, 587.33, 659.25, 783.99, 880.0, 987.77, 1174.66];
        const SCALE_B: [f32; 8] = [392.0, 466.16, 554.37, 622.25, 698.46, 830.61, 932.33, 1046.5];

        let ref_a = melody(&SCALE_A, 12.0);
        let ref_b = melody(&SCALE_B, 12.0);
        let clip = ref_a[107 * HOP_LENGTH..].to_vec();

        let path_a = temp_path("ref-a.wav");
        let path_b = temp_path("ref-b.wav");
        let path_clip = temp_path("clip.wav");
        let path_library = temp_path("library.hum");

        std::fs::write(&path_a, write_wav_to_bytes(&ref_a, SAMPLE_RATE, 1).unwrap()).unwrap();
        std::fs::write(&path_b, write_wav_to_bytes(&ref_b, SAMPLE_RATE, 1).unwrap()).unwrap();
        std::fs::write(
            &path_clip,
            write_wav_to_bytes(&clip, SAMPLE_RATE, 1).unwrap(),
        )
        .unwrap();

        // Build and save the library
        let mut library = Library::open_or_new(&path_library).unwrap();
        library.index_file(&path_a, None).unwrap();
        library.index_file(&path_b, None).unwrap();
        library.save(&path_library).unwrap();

        // Re-open from disk and identify the clip
        let reopened = Library::open(&path_library).unwrap();
        assert_eq!(reopened.session.reference_count(), 2);

        let report = reopened.identify_file(&path_clip, 3).unwrap();
        let matches = report.matches.expect("clip of an indexed melody must match");
        assert_eq!(
            matches[0].reference_id,
            path_a.file_name().unwrap().to_string_lossy()
        );

        for path in [&path_a, &path_b, &path_clip, &path_library] {
            let _ = std::fs::remove_file(path);
        }
    }
}
