//! Constellation extraction: sparse, noise-robust spectrogram maxima.
//!
//! Each frame is reduced to at most one candidate per frequency band (so a
//! dominant bass line cannot starve the treble), then gated against the
//! median of those band winners. The median of the winners, not of the whole
//! frame, is the stronger silence filter: a flat frame fails the gate even
//! when its winners are locally maximal.

use crate::core::{
    bin_to_peak_hz, frame_to_secs, Peak, BANDS, DB_FLOOR, FREQ_BINS, MAX_PEAKS_PER_FRAME,
    MIN_AMP_DB, PEAK_DELTA_DB,
};
use crate::spectrum::Spectrogram;

/// Extract the peak constellation of a magnitude spectrogram.
///
/// The result is sorted by time ascending, frequency ascending on ties. A
/// silent or empty spectrogram yields an empty constellation, not an error.
pub fn extract_peaks(spectrogram: &Spectrogram) -> Vec<Peak> {
    if spectrogram.is_empty() {
        return Vec::new();
    }

    // dB values are referenced to the global maximum so the absolute
    // thresholds mean the same thing across recordings of different volume.
    let global_max = spectrogram.global_max();
    if global_max <= 0.0 {
        return Vec::new();
    }

    let mut peaks = Vec::new();
    let mut candidates: Vec<(f32, usize)> = Vec::with_capacity(BANDS.len());

    for (t, frame) in spectrogram.frames.iter().enumerate() {
        candidates.clear();

        for &(lo, hi) in BANDS.iter() {
            let hi = hi.min(frame.len());
            if lo >= hi {
                continue;
            }
            // Strict `>` keeps the lowest bin on magnitude ties.
            let mut best_bin = lo;
            let mut best_mag = frame[lo];
            for bin in lo + 1..hi {
                if frame[bin] > best_mag {
                    best_mag = frame[bin];
                    best_bin = bin;
                }
            }
            candidates.push((to_db(best_mag, global_max), best_bin));
        }

        if candidates.is_empty() {
            continue;
        }

        let threshold = median_db(&candidates) + PEAK_DELTA_DB;
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut admitted = 0;
        for &(mag_db, bin) in candidates.iter() {
            if admitted >= MAX_PEAKS_PER_FRAME {
                break;
            }
            if mag_db > threshold && mag_db > MIN_AMP_DB {
                debug_assert!(bin < FREQ_BINS, "peak bin {} out of range", bin);
                peaks.push(Peak::new(frame_to_secs(t), bin_to_peak_hz(bin)));
                admitted += 1;
            }
        }
    }

    peaks.sort_by(|a, b| {
        a.time_secs
            .total_cmp(&b.time_secs)
            .then(a.freq_hz.cmp(&b.freq_hz))
    });
    peaks
}

/// Magnitude to dB relative to `reference`, clipped at [`DB_FLOOR`].
fn to_db(magnitude: f32, reference: f32) -> f32 {
    (20.0 * (magnitude / reference).log10()).max(DB_FLOOR)
}

/// Median of the candidate magnitudes; even counts average the middle pair.
fn median_db(candidates: &[(f32, usize)]) -> f32 {
    let mut mags: Vec<f32> = candidates.iter().map(|c| c.0).collect();
    mags.sort_by(|a, b| a.total_cmp(b));
    let mid = mags.len() / 2;
    if mags.len() % 2 == 1 {
        mags[mid]
    } else {
        (mags[mid - 1] + mags[mid]) / 2.0
    }
}
