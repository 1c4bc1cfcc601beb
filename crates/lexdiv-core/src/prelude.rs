pub use crate::distance::{cosine_distance, CosineBackend, ScalarCosine, Simd256Cosine};
pub use crate::diversity;
pub use crate::embedding::{EmbeddingEntry, EmbeddingIndex};
pub use crate::graph::{GraphNode, TypeGraph};
pub use crate::heap::DistanceHeap;
pub use crate::matrix::{DistanceMatrix, DistanceRowEngine};
pub use crate::mst::MinimumSpanningTree;
pub use crate::sorted_array::{InsertMode, SortedArray};
pub use crate::stats::{mean, mean_and_stddev, stddev};
pub use crate::zipf::zipfian_fit;
pub use crate::{Error, FpMode, Result};
