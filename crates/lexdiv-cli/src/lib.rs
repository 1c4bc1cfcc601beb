//! Driver, corpus readers, and output sinks for `lexdiv-measure`. Kept
//! as a library so the pipeline can be exercised from integration
//! tests (and, in principle, driven programmatically) independently of
//! the CLI entry point, mirroring the teacher's split between a thin
//! binary and a reusable app crate.

pub mod config;
pub mod driver;
pub mod error;
pub mod indices;
pub mod input;
pub mod output;
