//! Binary word2vec embedding index: O(log N) key -> vector lookup with
//! stable index-based back-references into the owning
//! [`crate::graph::TypeGraph`].
//!
//! File format (see spec §6): an ASCII header line `"<N> <D>\n"`
//! followed by `N` records, each a space-terminated UTF-8 key followed
//! by `D` little-endian `f32` values and a trailing newline. Keys wider
//! than [`MAX_KEY_LEN`] bytes are rejected.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use parking_lot::Mutex;

use crate::sorted_array::{InsertMode, Layout, SortedArray};
use crate::{Error, Result};

/// Matches the original format's key buffer width.
pub const MAX_KEY_LEN: usize = 64;

/// Mutable per-entry state, guarded by the entry's own lock so that
/// ingestion threads never contend on a process-wide lock for a token
/// observation.
#[derive(Debug, Default)]
pub struct EntryState {
    pub active_in_current_graph: bool,
    pub graph_node_index: u32,
    pub occurrence_count: u64,
}

pub struct EmbeddingEntry {
    pub key: String,
    /// Row into [`EmbeddingIndex`]'s contiguous vector buffer.
    row: usize,
    state: Mutex<EntryState>,
}

impl EmbeddingEntry {
    /// Locks and exposes the entry's mutable state. Callers (the type
    /// graph's ingestion path, see [`crate::graph::TypeGraph::observe`])
    /// hold this lock across the read-modify-write that decides whether
    /// a new graph node must be allocated.
    pub fn lock_state(&self) -> parking_lot::MutexGuard<'_, EntryState> {
        self.state.lock()
    }
}

/// Loaded, read-only-after-load word2vec embedding table.
pub struct EmbeddingIndex {
    num_dimensions: usize,
    vectors: Vec<f32>,
    /// Sorted by key; binary search gives `key_to_index`.
    entries: Vec<EmbeddingEntry>,
    discarded: SortedArray<String, u64>,
}

impl EmbeddingIndex {
    pub fn num_dimensions(&self) -> usize {
        self.num_dimensions
    }

    pub fn num_vectors(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, index: usize) -> &EmbeddingEntry {
        &self.entries[index]
    }

    pub fn vector(&self, index: usize) -> &[f32] {
        let row = self.entries[index].row;
        &self.vectors[row * self.num_dimensions..(row + 1) * self.num_dimensions]
    }

    /// O(log N) key lookup via binary search over the key-sorted
    /// entries array. A miss is *not* recorded here; callers record
    /// discarded keys explicitly via [`EmbeddingIndex::record_discarded`]
    /// since only the type graph knows the occurrence count to bump.
    pub fn key_to_index(&self, key: &str) -> Option<usize> {
        self.entries
            .binary_search_by(|e| e.key.as_str().cmp(key))
            .ok()
    }

    pub fn record_discarded(&self, key: &str) {
        self.discarded
            .bump_or_insert(key.to_string(), 1, |count| *count += 1);
    }

    pub fn discarded_snapshot(&self) -> Vec<(String, u64)> {
        self.discarded.to_sorted_vec()
    }

    /// Returns the entry whose vector is closest (by cosine distance)
    /// to `target`'s vector, skipping entries whose key equals
    /// `target`. O(N * D).
    pub fn find_closest(&self, target: &str) -> Option<&EmbeddingEntry> {
        let target_index = self.key_to_index(target)?;
        let target_vector = self.vector(target_index);

        let mut best: Option<(usize, f32)> = None;
        for i in 0..self.entries.len() {
            if self.entries[i].key == target {
                continue;
            }
            let d = crate::distance::cosine_distance(target_vector, self.vector(i));
            if best.map(|(_, bd)| d < bd).unwrap_or(true) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| &self.entries[i])
    }

    pub fn load_word2vec_binary<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(Error::Io)?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(Error::Io)?;
        let bytes: &[u8] = &mmap;

        let header_end = bytes
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| Error::EmbeddingLoad("missing header line".into()))?;
        let header = std::str::from_utf8(&bytes[..header_end])
            .map_err(|e| Error::EmbeddingLoad(format!("non-UTF8 header: {e}")))?;
        let mut header_parts = header.trim_end().split(' ');
        let num_vectors: usize = header_parts
            .next()
            .ok_or_else(|| Error::EmbeddingLoad("missing vector count".into()))?
            .parse()
            .map_err(|e| Error::EmbeddingLoad(format!("invalid vector count: {e}")))?;
        let num_dimensions: usize = header_parts
            .next()
            .ok_or_else(|| Error::EmbeddingLoad("missing dimension count".into()))?
            .parse()
            .map_err(|e| Error::EmbeddingLoad(format!("invalid dimension count: {e}")))?;

        log::info!(
            "loading word2vec binary {}: {} vectors, {} dimensions",
            path.display(),
            num_vectors,
            num_dimensions
        );

        let mut vectors = vec![0.0_f32; num_vectors * num_dimensions];
        let mut entries = Vec::with_capacity(num_vectors);

        let mut cursor = header_end + 1;
        for row in 0..num_vectors {
            let key_start = cursor;
            let key_end = bytes[cursor..]
                .iter()
                .position(|&b| b == b' ')
                .map(|off| cursor + off)
                .ok_or_else(|| Error::EmbeddingLoad(format!("truncated record {row}: missing key terminator")))?;
            let key_len = key_end - key_start;
            if key_len > MAX_KEY_LEN {
                return Err(Error::EmbeddingLoad(format!(
                    "record {row}: key exceeds {MAX_KEY_LEN} bytes"
                )));
            }
            let key = std::str::from_utf8(&bytes[key_start..key_end])
                .map_err(|e| Error::EmbeddingLoad(format!("record {row}: non-UTF8 key: {e}")))?
                .to_string();
            cursor = key_end + 1;

            let vector_bytes_len = num_dimensions * std::mem::size_of::<f32>();
            if cursor + vector_bytes_len > bytes.len() {
                return Err(Error::EmbeddingLoad(format!(
                    "record {row}: truncated vector data"
                )));
            }
            let dst = &mut vectors[row * num_dimensions..(row + 1) * num_dimensions];
            for (d, chunk) in bytes[cursor..cursor + vector_bytes_len]
                .chunks_exact(4)
                .enumerate()
            {
                dst[d] = f32::from_le_bytes(chunk.try_into().unwrap());
            }
            cursor += vector_bytes_len;

            if cursor < bytes.len() && bytes[cursor] == b'\n' {
                cursor += 1;
            }

            entries.push(EmbeddingEntry {
                key,
                row,
                state: Mutex::new(EntryState::default()),
            });
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(Self {
            num_dimensions,
            vectors,
            entries,
            discarded: SortedArray::new(Layout::Linear),
        })
    }

    pub fn insert_discarded_for_test(&self, key: &str, count: u64) {
        self.discarded
            .insert(key.to_string(), count, InsertMode::Overwrite);
    }
}
