//! Inverted landmark index, offset-histogram matcher, and session state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::{HumResult, Peak, RankedMatch, ReferenceInfo, OFFSET_BUCKET_MS};
use crate::landmark::{self, Landmark, QueryFingerprint};
use crate::{peaks, spectrum};

/// Interned reference handle; index into the session's reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RefHandle(u32);

/// Who emitted a landmark, and when its anchor fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Posting {
    reference: RefHandle,
    anchor_ms: u32,
}

/// The inverted index: address → unordered multiset of postings.
///
/// The same address showing up many times per reference is expected and
/// wanted; collisions are what the matcher votes with. Postings are only
/// ever appended, never removed.
#[derive(Debug, Default)]
struct LandmarkIndex {
    buckets: HashMap<u64, Vec<Posting>>,
}

impl LandmarkIndex {
    fn insert(&mut self, reference: RefHandle, landmarks: &[Landmark]) {
        for lm in landmarks {
            self.buckets.entry(lm.address).or_default().push(Posting {
                reference,
                anchor_ms: lm.anchor_ms,
            });
        }
    }

    fn address_count(&self) -> usize {
        self.buckets.len()
    }

    fn posting_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

/// A recognition session: the shared index plus everything the caller has
/// indexed into it. Grows monotonically; nothing is ever evicted.
#[derive(Debug, Default)]
pub struct Session {
    index: LandmarkIndex,
    references: Vec<ReferenceInfo>,
    handles: HashMap<String, RefHandle>,
    peak_cache: Vec<Vec<Peak>>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    /// Run the full pipeline on canonical mono samples and index the result.
    ///
    /// Returns the number of landmarks added. Re-adding an id appends more
    /// postings for it; they keep voting independently.
    pub fn add_reference(&mut self, id: &str, samples: &[f32]) -> HumResult<usize> {
        if id.is_empty() {
            return Err("reference id must not be empty".to_string());
        }
        check_finite(samples)?;
        let spectrogram = spectrum::compute_spectrogram(samples);
        let constellation = peaks::extract_peaks(&spectrogram);
        self.add_entry(id, &constellation, digest_samples(samples))
    }

    /// Index an already-extracted peak constellation under `id`.
    pub fn add_peaks(&mut self, id: &str, constellation: &[Peak]) -> HumResult<usize> {
        if id.is_empty() {
            return Err("reference id must not be empty".to_string());
        }
        self.add_entry(id, constellation, digest_peaks(constellation))
    }

    fn add_entry(
        &mut self,
        id: &str,
        constellation: &[Peak],
        digest: [u8; 32],
    ) -> HumResult<usize> {
        let lms = landmark::landmarks(constellation);
        let handle = match self.handles.get(id) {
            Some(&handle) => handle,
            None => {
                let handle = RefHandle(self.references.len() as u32);
                self.handles.insert(id.to_string(), handle);
                self.references.push(ReferenceInfo {
                    id: id.to_string(),
                    digest,
                    peak_count: 0,
                    landmark_count: 0,
                    indexed_at: None,
                });
                self.peak_cache.push(Vec::new());
                handle
            }
        };

        self.index.insert(handle, &lms);

        let info = &mut self.references[handle.0 as usize];
        info.digest = digest;
        info.peak_count = constellation.len();
        info.landmark_count += lms.len();
        self.peak_cache[handle.0 as usize] = constellation.to_vec();

        Ok(lms.len())
    }

    /// Identify canonical mono samples against the index.
    pub fn query(&self, samples: &[f32]) -> HumResult<Option<Vec<RankedMatch>>> {
        check_finite(samples)?;
        let spectrogram = spectrum::compute_spectrogram(samples);
        let constellation = peaks::extract_peaks(&spectrogram);
        Ok(self.query_peaks(&constellation))
    }

    /// Match a query constellation against the index.
    ///
    /// Returns matches ranked by score descending (reference id ascending on
    /// ties), or `None` when no query address collides with the index: the
    /// no-match signal. An empty constellation always yields `None`.
    pub fn query_peaks(&self, constellation: &[Peak]) -> Option<Vec<RankedMatch>> {
        let fingerprint = landmark::fingerprint_peaks(constellation);
        self.match_fingerprint(&fingerprint)
    }

    /// Offset-histogram voting over the addresses common to query and index.
    ///
    /// Every (query anchor, posting) pair under a shared address votes for
    /// `(reference, ⌊(posting_ms − query_ms) / 100⌋)`; a reference's score is
    /// its tallest bucket. Spurious collisions scatter across buckets while a
    /// true alignment stacks in one, wherever the query starts.
    fn match_fingerprint(&self, fingerprint: &QueryFingerprint) -> Option<Vec<RankedMatch>> {
        let mut votes: HashMap<(RefHandle, i64), u32> = HashMap::new();

        for (address, query_anchors) in &fingerprint.anchors {
            if let Some(postings) = self.index.buckets.get(address) {
                for &query_ms in query_anchors {
                    for posting in postings {
                        let bucket = (posting.anchor_ms as i64 - query_ms as i64)
                            .div_euclid(OFFSET_BUCKET_MS);
                        *votes.entry((posting.reference, bucket)).or_insert(0) += 1;
                    }
                }
            }
        }

        if votes.is_empty() {
            return None;
        }

        let mut best: HashMap<RefHandle, u32> = HashMap::new();
        for ((handle, _), count) in votes {
            let entry = best.entry(handle).or_insert(0);
            if count > *entry {
                *entry = count;
            }
        }

        let mut ranked: Vec<RankedMatch> = best
            .into_iter()
            .map(|(handle, score)| RankedMatch {
                reference_id: self.references[handle.0 as usize].id.clone(),
                score,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.reference_id.cmp(&b.reference_id))
        });
        Some(ranked)
    }

    /// Cached constellation of an indexed reference, for diagnostics.
    pub fn peaks(&self, id: &str) -> Option<&[Peak]> {
        self.handles
            .get(id)
            .map(|handle| self.peak_cache[handle.0 as usize].as_slice())
    }

    /// Attach a caller-supplied wall-clock stamp to a reference.
    pub fn set_indexed_at(&mut self, id: &str, stamp: String) -> bool {
        match self.handles.get(id) {
            Some(&handle) => {
                self.references[handle.0 as usize].indexed_at = Some(stamp);
                true
            }
            None => false,
        }
    }

    pub fn references(&self) -> &[ReferenceInfo] {
        &self.references
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Number of distinct addresses in the index.
    pub fn address_count(&self) -> usize {
        self.index.address_count()
    }

    /// Total postings across all buckets.
    pub fn posting_count(&self) -> usize {
        self.index.posting_count()
    }

    /// Capture the whole session for serialization.
    pub fn snapshot(&self) -> SessionSnapshot {
        let mut postings = Vec::with_capacity(self.index.posting_count());
        for (&address, bucket) in &self.index.buckets {
            for posting in bucket {
                postings.push((address, posting.reference.0, posting.anchor_ms));
            }
        }
        // Deterministic output regardless of hash-map iteration order.
        postings.sort_unstable();

        SessionSnapshot {
            format_version: SNAPSHOT_VERSION,
            created_by: None,
            created_at: None,
            references: self.references.clone(),
            peaks: self.peak_cache.clone(),
            postings,
        }
    }

    /// Rebuild a session from a snapshot. The result ranks identically to
    /// the session the snapshot was taken from.
    pub fn restore(snapshot: &SessionSnapshot) -> HumResult<Session> {
        if snapshot.format_version != SNAPSHOT_VERSION {
            return Err(format!(
                "unsupported snapshot version {}",
                snapshot.format_version
            ));
        }
        if snapshot.peaks.len() != snapshot.references.len() {
            return Err("snapshot reference and peak tables disagree".to_string());
        }

        let mut session = Session::new();
        session.references = snapshot.references.clone();
        session.peak_cache = snapshot.peaks.clone();
        for (i, info) in snapshot.references.iter().enumerate() {
            session.handles.insert(info.id.clone(), RefHandle(i as u32));
        }

        for &(address, reference, anchor_ms) in &snapshot.postings {
            if reference as usize >= snapshot.references.len() {
                return Err(format!("posting references unknown handle {}", reference));
            }
            session.index.buckets.entry(address).or_default().push(Posting {
                reference: RefHandle(reference),
                anchor_ms,
            });
        }

        Ok(session)
    }
}

/// Snapshot format version.
pub const SNAPSHOT_VERSION: u16 = 1;

/// Serialized form of a [`Session`].
///
/// Postings are `(address, reference, anchor_time_ms)` triples against a
/// separate reference table; the 41-bit packed address is the stable wire
/// form. `created_by` / `created_at` are for the caller to fill; the engine
/// itself never reads a clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub format_version: u16,
    pub created_by: Option<String>,
    pub created_at: Option<String>,
    pub references: Vec<ReferenceInfo>,
    pub peaks: Vec<Vec<Peak>>,
    pub postings: Vec<(u64, u32, u32)>,
}

impl SessionSnapshot {
    /// Serialize to MessagePack bytes.
    pub fn to_msgpack(&self) -> HumResult<Vec<u8>> {
        rmp_serde::to_vec_named(self).map_err(|e| e.to_string())
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_msgpack(bytes: &[u8]) -> HumResult<SessionSnapshot> {
        rmp_serde::from_slice(bytes).map_err(|e| e.to_string())
    }
}

/// Non-finite samples violate the input contract; nothing downstream can
/// recover meaning from them.
fn check_finite(samples: &[f32]) -> HumResult<()> {
    if samples.iter().any(|s| !s.is_finite()) {
        return Err("input contains non-finite samples".to_string());
    }
    Ok(())
}

/// blake3 digest of raw sample content, hashed in bounded chunks.
fn digest_samples(samples: &[f32]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(samples.len() as u64).to_le_bytes());
    let mut bytes = Vec::with_capacity(4096);
    for chunk in samples.chunks(1024) {
        bytes.clear();
        for &sample in chunk {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        hasher.update(&bytes);
    }
    hasher.finalize().into()
}

/// blake3 digest of a peak sequence, for references added without samples.
fn digest_peaks(constellation: &[Peak]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(constellation.len() as u64).to_le_bytes());
    for peak in constellation {
        hasher.update(&peak.time_secs.to_le_bytes());
        hasher.update(&peak.freq_hz.to_le_bytes());
    }
    hasher.finalize().into()
}
