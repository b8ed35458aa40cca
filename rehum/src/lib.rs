//! rehum - recognition frontend for the hum fingerprinting engine
//!
//! Decodes real-world media to the engine's canonical format, keeps a
//! persistent fingerprint library on disk, and reports ranked matches.

pub mod audio;
pub mod plot;

use anyhow::{Context, Result};
use std::path::Path;

pub use libhum_audio::{Peak, RankedMatch, ReferenceInfo, Session, SessionSnapshot};

/// A fingerprint library: a recognition session that lives in a file.
#[derive(Default)]
pub struct Library {
    pub session: Session,
}

/// Result of indexing one media file.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IndexReport {
    pub reference_id: String,
    pub seconds: f32,
    pub peak_count: usize,
    pub landmark_count: usize,
}

/// Result of identifying one snippet. `matches` is `None` when nothing in
/// the library collided with the query.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IdentifyReport {
    pub query: String,
    pub seconds: f32,
    pub peak_count: usize,
    pub matches: Option<Vec<RankedMatch>>,
}

impl Library {
    pub fn new() -> Self {
        Library {
            session: Session::new(),
        }
    }

    /// Load a library file, or start fresh when none exists yet.
    pub fn open_or_new(path: &Path) -> Result<Library> {
        if path.exists() {
            Library::open(path)
        } else {
            Ok(Library::new())
        }
    }

    pub fn open(path: &Path) -> Result<Library> {
        let bytes = std::fs::read(path).context("Failed to read library file")?;
        let snapshot = SessionSnapshot::from_msgpack(&bytes)
            .map_err(|e| anyhow::anyhow!("Invalid library file: {}", e))?;
        let session = Session::restore(&snapshot)
            .map_err(|e| anyhow::anyhow!("Invalid library file: {}", e))?;
        Ok(Library { session })
    }

    /// Save the library, stamped with the writer version and wall-clock time.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut snapshot = self.session.snapshot();
        snapshot.created_by = Some(format!("rehum {}", env!("CARGO_PKG_VERSION")));
        snapshot.created_at = Some(utc_stamp());
        let bytes = snapshot
            .to_msgpack()
            .map_err(|e| anyhow::anyhow!("Failed to serialize library: {}", e))?;
        std::fs::write(path, bytes).context("Failed to write library file")
    }

    /// Decode, fingerprint, and index one media file. The file name becomes
    /// the reference id unless `id` overrides it.
    pub fn index_file(&mut self, input: &Path, id: Option<String>) -> Result<IndexReport> {
        let reference_id = id.unwrap_or_else(|| default_reference_id(input));
        let samples = audio::decode_file_to_canonical(input)
            .with_context(|| format!("Failed to decode {}", input.display()))?;

        let landmark_count = self
            .session
            .add_reference(&reference_id, &samples)
            .map_err(|e| anyhow::anyhow!("Failed to index {}: {}", reference_id, e))?;
        self.session.set_indexed_at(&reference_id, utc_stamp());

        Ok(IndexReport {
            seconds: seconds_of(&samples),
            peak_count: self
                .session
                .peaks(&reference_id)
                .map(|p| p.len())
                .unwrap_or(0),
            reference_id,
            landmark_count,
        })
    }

    /// Decode a snippet and rank it against the library, keeping the best
    /// `top` candidates.
    pub fn identify_file(&self, input: &Path, top: usize) -> Result<IdentifyReport> {
        let samples = audio::decode_file_to_canonical(input)
            .with_context(|| format!("Failed to decode {}", input.display()))?;
        let constellation = libhum_audio::fingerprint_samples(&samples);

        let matches = self.session.query_peaks(&constellation).map(|mut ranked| {
            ranked.truncate(top);
            ranked
        });

        Ok(IdentifyReport {
            query: default_reference_id(input),
            seconds: seconds_of(&samples),
            peak_count: constellation.len(),
            matches,
        })
    }
}

/// Decode a media file and extract its peak constellation.
pub fn fingerprint_file(input: &Path) -> Result<Vec<Peak>> {
    let samples = audio::decode_file_to_canonical(input)
        .with_context(|| format!("Failed to decode {}", input.display()))?;
    Ok(libhum_audio::fingerprint_samples(&samples))
}

fn default_reference_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn seconds_of(samples: &[f32]) -> f32 {
    samples.len() as f32 / libhum_audio::SAMPLE_RATE as f32
}

fn utc_stamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
