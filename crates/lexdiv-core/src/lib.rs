//! Streaming lexical-diversity measurement engine.
//!
//! The crate is organised the way the measurement pipeline flows:
//! tokens are mapped through an [`embedding`] index onto a growing
//! [`graph`] of distinct types, pairwise distances between active types
//! are produced by the [`matrix`] engine (or consumed one row at a time
//! by the iterative aggregators in [`diversity`]), a [`heap`] of those
//! distances feeds the [`mst`] builder, and [`zipf`] fits a Zipfian
//! shape parameter to the current rank-frequency distribution.
//!
//! [`sorted_array`] and [`stats`] are the leaf building blocks shared by
//! everything above them.

pub mod distance;
pub mod diversity;
pub mod embedding;
pub mod graph;
pub mod heap;
pub mod matrix;
pub mod mst;
pub mod prelude;
pub mod sorted_array;
pub mod stats;
pub mod zipf;

use thiserror::Error;

/// Fatal error kinds surfaced by the core. There is no per-record
/// recovery path except for embedding misses, which are routed into the
/// discarded-keys index instead of raising an error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("malformed input: {0}")]
    ParseFormat(String),

    #[error("failed to load embeddings: {0}")]
    EmbeddingLoad(String),

    #[error("allocation failed: {0}")]
    AllocFailed(String),

    #[error("failed to spawn or join a worker thread: {0}")]
    ThreadSpawn(String),

    #[error("internal invariant violated: {0}")]
    LogicInvariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Floating-point precision a [`matrix::DistanceMatrix`] is materialised
/// in. The disparity indices run in f32; the MST builder and heap
/// always use f64 for the running comparisons that decide tree shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FpMode {
    Fp32,
    Fp64,
}
