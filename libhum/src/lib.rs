//! hum: landmark-based acoustic fingerprinting.
//!
//! Identifies short audio snippets against a library of indexed recordings.
//! The pipeline: mono 11 kHz samples → magnitude spectrogram → peak
//! constellation → 41-bit landmark hashes → inverted index. A query runs the
//! same pipeline and ranks references by the tallest bucket of its
//! time-offset histogram.
//!
//! The engine is pure and in-memory: no I/O, no logging, no clock. Decoding,
//! resampling, and persistence live with the caller (see the `rehum` crate).

use wasm_bindgen::prelude::*;

pub mod core;
pub mod index;
pub mod landmark;
pub mod peaks;
pub mod spectrum;

pub use crate::core::audio_constants::*;
pub use crate::core::types::{HumResult, Peak, RankedMatch, ReferenceInfo};
pub use crate::index::{Session, SessionSnapshot, SNAPSHOT_VERSION};
pub use crate::landmark::{fingerprint_peaks, landmarks, pack, unpack, Landmark, QueryFingerprint};
pub use crate::peaks::extract_peaks;
pub use crate::spectrum::{compute_spectrogram, frame_count_for, Spectrogram};

/// Full analysis front half: canonical mono samples to peak constellation.
pub fn fingerprint_samples(samples: &[f32]) -> Vec<Peak> {
    extract_peaks(&compute_spectrogram(samples))
}

/// get lib version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// install the console panic hook, call once from the browser host
#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

// wasm session api

/// Browser-facing wrapper over [`Session`]. The host supplies canonical
/// mono 11 kHz samples; capture and decoding stay on the JS side.
#[wasm_bindgen]
pub struct WasmSession {
    inner: Session,
}

#[wasm_bindgen]
impl WasmSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: Session::new(),
        }
    }

    /// Index a reference recording. Returns the number of landmarks added.
    pub fn add_reference(&mut self, id: &str, samples: &[f32]) -> Result<usize, JsValue> {
        self.inner
            .add_reference(id, samples)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Identify a snippet. Returns ranked `{reference_id, score}` objects,
    /// or `null` when nothing in the index collided.
    pub fn identify(&self, samples: &[f32]) -> Result<JsValue, JsValue> {
        let outcome = self.inner.query(samples).map_err(|e| JsValue::from_str(&e))?;
        match outcome {
            Some(matches) => serde_wasm_bindgen::to_value(&matches)
                .map_err(|e| JsValue::from_str(&e.to_string())),
            None => Ok(JsValue::NULL),
        }
    }

    /// Constellation of an indexed reference as flat `[t0, f0, t1, f1, …]`,
    /// ready for a canvas scatter plot.
    pub fn peaks_flat(&self, id: &str) -> Option<Vec<f32>> {
        self.inner.peaks(id).map(|constellation| {
            let mut flat = Vec::with_capacity(constellation.len() * 2);
            for peak in constellation {
                flat.push(peak.time_secs);
                flat.push(peak.freq_hz as f32);
            }
            flat
        })
    }

    pub fn reference_count(&self) -> usize {
        self.inner.reference_count()
    }

    /// Serialize the session to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, JsValue> {
        self.inner
            .snapshot()
            .to_msgpack()
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Restore a session from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<WasmSession, JsValue> {
        let snapshot = SessionSnapshot::from_msgpack(bytes).map_err(|e| JsValue::from_str(&e))?;
        let inner = Session::restore(&snapshot).map_err(|e| JsValue::from_str(&e))?;
        Ok(WasmSession { inner })
    }
}

impl Default for WasmSession {
    fn default() -> Self {
        Self::new()
    }
}

// tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_address_round_trip() {
        let address = pack(93, 186, 512);
        assert_eq!(unpack(address), (93, 186, 512));
    }

    #[test]
    fn test_fingerprint_samples_silence() {
        assert!(fingerprint_samples(&vec![0.0; 22_000]).is_empty());
    }
}
