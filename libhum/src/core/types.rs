//! common types for the hum engine

use serde::{Deserialize, Serialize};

/// result type for engine operations
pub type HumResult<T> = Result<T, String>;

/// A constellation point: one robust spectrogram maximum.
///
/// Peaks are produced once by the extractor, sorted by time ascending
/// (frequency ascending on ties), and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Frame start time in seconds.
    pub time_secs: f32,
    /// Truncated bin center frequency in Hz. Always below Nyquist (5500 Hz).
    pub freq_hz: u16,
}

impl Peak {
    pub fn new(time_secs: f32, freq_hz: u16) -> Self {
        Peak { time_secs, freq_hz }
    }

    /// Anchor time in rounded milliseconds, as stored in postings.
    #[inline]
    pub fn time_ms(&self) -> u32 {
        (self.time_secs * 1000.0).round() as u32
    }
}

/// One entry of a ranked match list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub reference_id: String,
    /// Height of the tallest offset-histogram bucket: the number of
    /// time-coherent landmark votes. Raw count, no normalization.
    pub score: u32,
}

/// Per-reference bookkeeping kept by a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceInfo {
    pub id: String,
    /// blake3 digest of the indexed content, when the reference was added
    /// from raw samples. References added from bare peak lists carry the
    /// digest of the peak sequence instead.
    pub digest: [u8; 32],
    /// Constellation size at last (re-)indexing.
    pub peak_count: usize,
    /// Total landmarks this reference has contributed, across re-indexings.
    pub landmark_count: usize,
    /// Caller-supplied wall-clock stamp; the engine never reads a clock.
    pub indexed_at: Option<String>,
}

impl ReferenceInfo {
    /// Short hex form of the content digest, for display.
    pub fn digest_hex(&self) -> String {
        self.digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
    }
}
