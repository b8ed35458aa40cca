//! Spectral analysis: mono waveform in, magnitude spectrogram out.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

use crate::core::{FREQ_BINS, HOP_LENGTH, N_FFT};

/// Magnitude spectrogram of a canonical-format signal.
///
/// `frames[t][f]` holds the linear magnitude of frequency bin `f` in analysis
/// frame `t`; every frame has [`FREQ_BINS`] bins.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    pub frames: Vec<Vec<f32>>,
}

impl Spectrogram {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Largest magnitude anywhere in the spectrogram. Zero for silence.
    pub fn global_max(&self) -> f32 {
        self.frames
            .iter()
            .flat_map(|frame| frame.iter().copied())
            .fold(0.0f32, f32::max)
    }
}

/// Number of frames produced for a signal of `len` samples.
///
/// `⌈(len − N_FFT) / HOP_LENGTH⌉ + 1` once the signal reaches into the first
/// hop; anything no longer than `N_FFT − HOP_LENGTH` yields zero frames. The
/// final frame is zero-padded past the end of the signal.
pub fn frame_count_for(len: usize) -> usize {
    if len + HOP_LENGTH <= N_FFT {
        return 0;
    }
    (len + HOP_LENGTH - 1 - N_FFT) / HOP_LENGTH + 1
}

/// Periodic Hann window of length [`N_FFT`].
fn hann_window() -> Vec<f32> {
    (0..N_FFT)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / N_FFT as f32).cos()))
        .collect()
}

/// Compute the magnitude spectrogram of mono samples at the canonical rate.
///
/// Inputs shorter than one window still produce a valid (possibly empty)
/// spectrogram rather than an error.
pub fn compute_spectrogram(samples: &[f32]) -> Spectrogram {
    let n_frames = frame_count_for(samples.len());
    let mut frames = Vec::with_capacity(n_frames);
    if n_frames == 0 {
        return Spectrogram { frames };
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(N_FFT);
    let window = hann_window();
    let mut buffer = vec![Complex::new(0.0f32, 0.0); N_FFT];

    for t in 0..n_frames {
        let start = t * HOP_LENGTH;
        let end = (start + N_FFT).min(samples.len());

        for (i, slot) in buffer.iter_mut().enumerate() {
            let sample = if start + i < end { samples[start + i] } else { 0.0 };
            *slot = Complex::new(sample * window[i], 0.0);
        }

        fft.process(&mut buffer);

        // Positive frequencies only: DC through Nyquist.
        frames.push(buffer.iter().take(FREQ_BINS).map(|c| c.norm()).collect());
    }

    Spectrogram { frames }
}
