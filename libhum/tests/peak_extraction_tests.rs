use libhum_audio::peaks::extract_peaks;
use libhum_audio::spectrum::compute_spectrogram;
use libhum_audio::{Peak, FREQ_RESOLUTION, HOP_LENGTH, MAX_PEAKS_PER_FRAME, SAMPLE_RATE};

// Hop-aligned length keeps the final analysis frame fully populated, so no
// frame picks up truncation splatter.
fn aligned_len(secs: f32) -> usize {
    let len = (secs * SAMPLE_RATE as f32) as usize;
    (len + HOP_LENGTH - 1) / HOP_LENGTH * HOP_LENGTH
}

fn sine(freq: f32, secs: f32, amp: f32) -> Vec<f32> {
    (0..aligned_len(secs))
        .map(|n| {
            amp * (2.0 * std::f32::consts::PI * freq * n as f32 / SAMPLE_RATE as f32).sin()
        })
        .collect()
}

fn peaks_of(samples: &[f32]) -> Vec<Peak> {
    extract_peaks(&compute_spectrogram(samples))
}

#[test]
fn test_silence_yields_no_peaks() {
    assert!(peaks_of(&vec![0.0; 10 * SAMPLE_RATE as usize]).is_empty());
    assert!(peaks_of(&[]).is_empty());
}

#[test]
fn test_peaks_stay_below_nyquist_and_start_at_zero() {
    let peaks = peaks_of(&sine(1000.0, 3.0, 0.8));
    assert!(!peaks.is_empty());
    for p in &peaks {
        assert!((p.freq_hz as u32) < SAMPLE_RATE / 2);
        assert!(p.time_secs >= 0.0);
    }
}

#[test]
fn test_sine_peaks_concentrate_at_its_bin() {
    let freq = 1000.0;
    let expected_bin = (freq / FREQ_RESOLUTION).round() as i64;
    let peaks = peaks_of(&sine(freq, 3.0, 0.8));
    assert!(!peaks.is_empty());

    let lo = ((expected_bin - 1) as f32 * FREQ_RESOLUTION) as u16;
    let hi = ((expected_bin + 1) as f32 * FREQ_RESOLUTION) as u16;
    for p in &peaks {
        assert!(
            p.freq_hz >= lo && p.freq_hz <= hi,
            "peak at {} Hz outside ±1 bin of {} Hz",
            p.freq_hz,
            freq
        );
    }
}

#[test]
fn test_output_is_sorted_by_time_then_frequency() {
    let mixed: Vec<f32> = sine(500.0, 3.0, 0.5)
        .iter()
        .zip(sine(2000.0, 3.0, 0.5))
        .map(|(a, b)| a + b)
        .collect();
    let peaks = peaks_of(&mixed);
    assert!(peaks.len() >= 2);

    for pair in peaks.windows(2) {
        let earlier = (pair[0].time_secs, pair[0].freq_hz);
        let later = (pair[1].time_secs, pair[1].freq_hz);
        assert!(
            earlier <= later,
            "constellation out of order: {:?} before {:?}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_two_tones_both_survive_banding() {
    // One tone per band; neither should starve the other
    let mixed: Vec<f32> = sine(500.0, 3.0, 0.7)
        .iter()
        .zip(sine(2000.0, 3.0, 0.3))
        .map(|(a, b)| a + b)
        .collect();
    let peaks = peaks_of(&mixed);

    let near = |target: f32| {
        peaks
            .iter()
            .any(|p| (p.freq_hz as f32 - target).abs() < 2.0 * FREQ_RESOLUTION)
    };
    assert!(near(500.0), "500 Hz tone missing from constellation");
    assert!(near(2000.0), "2000 Hz tone missing from constellation");
}

#[test]
fn test_per_frame_cap_holds() {
    // Ten simultaneous tones spread across bands, amplitudes staggered ~6 dB
    // apart so the strongest ones clear the band-winner median gate
    let tones = [
        (60.0, 0.8),
        (150.0, 0.4),
        (320.0, 0.2),
        (640.0, 0.1),
        (1000.0, 0.05),
        (1500.0, 0.025),
        (2100.0, 0.012),
        (2800.0, 0.006),
        (3700.0, 0.003),
        (4700.0, 0.0015),
    ];
    let mut samples = vec![0.0f32; aligned_len(3.0)];
    for &(f, amp) in &tones {
        for (n, s) in samples.iter_mut().enumerate() {
            *s += amp * (2.0 * std::f32::consts::PI * f * n as f32 / SAMPLE_RATE as f32).sin();
        }
    }

    let peaks = peaks_of(&samples);
    assert!(!peaks.is_empty());

    let mut current_time = f32::NEG_INFINITY;
    let mut in_frame = 0usize;
    for p in &peaks {
        if p.time_secs > current_time {
            current_time = p.time_secs;
            in_frame = 0;
        }
        in_frame += 1;
        assert!(in_frame <= MAX_PEAKS_PER_FRAME);
    }
}

#[test]
fn test_constellation_is_volume_invariant() {
    // dB is referenced to the global maximum, so pure gain changes nothing
    let loud = peaks_of(&sine(880.0, 2.0, 0.8));
    let quiet = peaks_of(&sine(880.0, 2.0, 0.2));
    assert_eq!(loud, quiet);
}

#[test]
fn test_extraction_is_deterministic() {
    let samples = sine(660.0, 2.0, 0.5);
    assert_eq!(peaks_of(&samples), peaks_of(&samples));
}
