use thiserror::Error;

/// Fatal error kinds surfaced by the CLI, on top of the core's own
/// [`lexdiv_core::Error`]. `main` prints one stderr line naming the kind
/// and exits 1 on any of these, matching spec.md §7/§6.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] lexdiv_core::Error),

    #[error("invalid flag {flag}: {reason}")]
    InvalidFlag { flag: String, reason: String },
}

pub type Result<T> = std::result::Result<T, CliError>;
