//! A keyed, sorted container with two interchangeable layout strategies
//! and a mutex guarding concurrent inserts. Used directly by the
//! [`crate::embedding`] index (key -> vector index) and by the
//! discarded-keys diagnostics table the [`crate::graph`] type graph
//! maintains for tokens that miss the embedding index.

use parking_lot::Mutex;

/// How [`SortedArray::insert`] should treat an already-present key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InsertMode {
    /// Always push a new element, even if the key already exists.
    Always,
    /// Leave the array untouched if the key is already present.
    IfAbsent,
    /// Replace the existing value if the key is present, insert otherwise.
    Overwrite,
}

/// Re-sort the unsorted tail once it holds this many elements.
const TAIL_THRESHOLD: usize = 32;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Binary-searched sorted prefix with a small unsorted tail that is
    /// merged back in once it reaches [`TAIL_THRESHOLD`] elements.
    Linear,
    /// A binary-heap-ordered array: every insert is appended at the next
    /// free slot and sifted toward the root while it is smaller than its
    /// parent under key order, so index 0 always holds the minimum key.
    /// A heap array is not binary-searchable, so lookups are a linear
    /// scan; deletion is not required by the core, so no sift-down is
    /// implemented.
    Tree,
}

struct Inner<K, V> {
    sorted: Vec<(K, V)>,
    tail: Vec<(K, V)>,
    layout: Layout,
}

impl<K: Ord + Clone, V> Inner<K, V> {
    fn reconcile_tail(&mut self) {
        if self.tail.is_empty() {
            return;
        }
        self.sorted.append(&mut self.tail);
        self.sorted.sort_by(|a, b| a.0.cmp(&b.0));
    }

    /// Binary search over the sorted prefix only. Only meaningful for
    /// [`Layout::Linear`]; the tree layout's backing array is heap-
    /// ordered, not sorted.
    fn search_sorted(&self, key: &K) -> std::result::Result<usize, usize> {
        self.sorted.binary_search_by(|probe| probe.0.cmp(key))
    }

    fn find(&self, key: &K) -> Option<usize> {
        match self.layout {
            Layout::Linear => {
                if let Ok(idx) = self.search_sorted(key) {
                    return Some(idx);
                }
                self.tail.iter().position(|(k, _)| k == key)
            }
            Layout::Tree => self.sorted.iter().position(|(k, _)| k == key),
        }
    }

    /// Sifts the element at `idx` toward the root while its key is
    /// smaller than its parent's, preserving the min-heap property.
    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.sorted[idx].0 < self.sorted[parent].0 {
                self.sorted.swap(idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
    }
}

/// A sorted associative array, parametric over key and value types.
///
/// Both layouts support the three [`InsertMode`] insert semantics and
/// guarantee that once inserted, a key remains retrievable via
/// [`SortedArray::key_to_index`] / [`SortedArray::get`]. The linear
/// layout's insert is O(1) amortised (append to the tail) with O(log n)
/// lookup against the sorted prefix; the tree layout's insert is
/// O(log n) (append plus sift-up) but, being heap-ordered rather than
/// sorted, its lookup is a linear scan.
pub struct SortedArray<K, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K: Ord + Clone, V: Clone> SortedArray<K, V> {
    pub fn new(layout: Layout) -> Self {
        Self {
            inner: Mutex::new(Inner {
                sorted: Vec::new(),
                tail: Vec::new(),
                layout,
            }),
        }
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock();
        inner.sorted.len() + inner.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the logical index of `key`, or `None` if absent. For the
    /// linear layout this index is only stable until the next tail
    /// reconciliation; callers that need a durable handle should use
    /// [`SortedArray::get`] / [`SortedArray::insert`] instead.
    pub fn key_to_index(&self, key: &K) -> Option<usize> {
        let inner = self.inner.lock();
        inner.find(key)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let inner = self.inner.lock();
        match inner.layout {
            Layout::Linear => match inner.search_sorted(key) {
                Ok(idx) => Some(inner.sorted[idx].1.clone()),
                Err(_) => inner
                    .tail
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.clone()),
            },
            Layout::Tree => inner
                .sorted
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone()),
        }
    }

    /// Inserts `(key, value)` honoring `mode`. Returns `true` if the
    /// array was mutated (value inserted or overwritten).
    pub fn insert(&self, key: K, value: V, mode: InsertMode) -> bool {
        let mut inner = self.inner.lock();

        if mode != InsertMode::Always {
            match inner.layout {
                Layout::Linear => {
                    if let Ok(idx) = inner.search_sorted(&key) {
                        match mode {
                            InsertMode::IfAbsent => return false,
                            InsertMode::Overwrite => {
                                inner.sorted[idx].1 = value;
                                return true;
                            }
                            InsertMode::Always => unreachable!(),
                        }
                    }
                    if let Some(pos) = inner.tail.iter().position(|(k, _)| k == &key) {
                        match mode {
                            InsertMode::IfAbsent => return false,
                            InsertMode::Overwrite => {
                                inner.tail[pos].1 = value;
                                return true;
                            }
                            InsertMode::Always => unreachable!(),
                        }
                    }
                }
                Layout::Tree => {
                    if let Some(idx) = inner.sorted.iter().position(|(k, _)| k == &key) {
                        match mode {
                            InsertMode::IfAbsent => return false,
                            InsertMode::Overwrite => {
                                inner.sorted[idx].1 = value;
                                return true;
                            }
                            InsertMode::Always => unreachable!(),
                        }
                    }
                }
            }
        }

        match inner.layout {
            Layout::Linear => {
                inner.tail.push((key, value));
                if inner.tail.len() >= TAIL_THRESHOLD {
                    inner.reconcile_tail();
                }
            }
            Layout::Tree => {
                inner.sorted.push((key, value));
                let idx = inner.sorted.len() - 1;
                inner.sift_up(idx);
            }
        }
        true
    }

    /// Increments the value of an integer-valued entry, inserting it
    /// with `init` if absent. Used by the discarded-keys diagnostics
    /// table to bump occurrence counts under a single lock acquisition.
    pub fn bump_or_insert<F>(&self, key: K, init: V, bump: F)
    where
        F: FnOnce(&mut V),
    {
        let mut inner = self.inner.lock();
        match inner.layout {
            Layout::Linear => {
                if let Ok(idx) = inner.search_sorted(&key) {
                    bump(&mut inner.sorted[idx].1);
                    return;
                }
                if let Some(pos) = inner.tail.iter().position(|(k, _)| k == &key) {
                    bump(&mut inner.tail[pos].1);
                    return;
                }
            }
            Layout::Tree => {
                if let Some(idx) = inner.sorted.iter().position(|(k, _)| k == &key) {
                    bump(&mut inner.sorted[idx].1);
                    return;
                }
            }
        }
        match inner.layout {
            Layout::Linear => {
                inner.tail.push((key, init));
                if inner.tail.len() >= TAIL_THRESHOLD {
                    inner.reconcile_tail();
                }
            }
            Layout::Tree => {
                inner.sorted.push((key, init));
                let idx = inner.sorted.len() - 1;
                inner.sift_up(idx);
            }
        }
    }

    /// Snapshot of all `(key, value)` pairs, sorted by key. The linear
    /// layout's backing array is already sorted once its tail is
    /// reconciled; the tree layout's is heap-ordered, so it is sorted
    /// here instead.
    pub fn to_sorted_vec(&self) -> Vec<(K, V)> {
        let mut inner = self.inner.lock();
        match inner.layout {
            Layout::Linear => {
                inner.reconcile_tail();
                inner.sorted.clone()
            }
            Layout::Tree => {
                let mut snapshot = inner.sorted.clone();
                snapshot.sort_by(|a, b| a.0.cmp(&b.0));
                snapshot
            }
        }
    }
}
