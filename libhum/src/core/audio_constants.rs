//! Canonical analysis parameters for the fingerprinting pipeline.
//!
//! All recognition happens at one sample rate and one FFT geometry; upstream
//! collaborators are responsible for delivering audio in this format.

/// Canonical sample rate in Hz. The engine never resamples.
pub const SAMPLE_RATE: u32 = 11_000;

/// FFT window length in samples.
pub const N_FFT: usize = 1024;

/// Hop between successive analysis frames in samples.
pub const HOP_LENGTH: usize = 512;

/// Number of frequency bins in a magnitude frame (DC through Nyquist).
pub const FREQ_BINS: usize = N_FFT / 2 + 1;

/// Hz covered by one FFT bin (~10.742 Hz).
pub const FREQ_RESOLUTION: f32 = SAMPLE_RATE as f32 / N_FFT as f32;

/// Frequency-band partition used by the peak extractor, as half-open bin
/// ranges. The Nyquist bin (512) is excluded from the top band.
pub const BANDS: [(usize, usize); 11] = [
    (0, 10),
    (10, 20),
    (20, 40),
    (40, 80),
    (80, 120),
    (120, 160),
    (160, 210),
    (210, 270),
    (270, 340),
    (340, 420),
    (420, 512),
];

/// Clipping floor of the dB spectrogram, relative to the global maximum.
pub const DB_FLOOR: f32 = -80.0;

/// Absolute admission floor for a peak candidate, in dB re global max.
pub const MIN_AMP_DB: f32 = -60.0;

/// A candidate must clear the per-frame band-winner median by this much.
pub const PEAK_DELTA_DB: f32 = 15.0;

/// Hard cap on peaks admitted from a single frame.
pub const MAX_PEAKS_PER_FRAME: usize = 10;

/// Index gap between an anchor and the start of its target zone. Adjacent
/// peaks make near-duplicate pairs that carry almost no information.
pub const ANCHOR_GAP: usize = 3;

/// Maximum number of target peaks paired with each anchor.
pub const FAN_OUT: usize = 15;

/// Width of one offset-histogram bucket in milliseconds.
pub const OFFSET_BUCKET_MS: i64 = 100;

/// Center frequency of an FFT bin in Hz.
#[inline]
pub fn bin_to_hz(bin: usize) -> f32 {
    bin as f32 * FREQ_RESOLUTION
}

/// Truncated integer frequency of an FFT bin, as stored on a peak.
#[inline]
pub fn bin_to_peak_hz(bin: usize) -> u16 {
    (bin as f32 * FREQ_RESOLUTION) as u16
}

/// Start time of an analysis frame in seconds.
#[inline]
pub fn frame_to_secs(frame: usize) -> f32 {
    frame as f32 * HOP_LENGTH as f32 / SAMPLE_RATE as f32
}
