use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the reduction pipeline.
///
/// `MalformedInput` and `SymmetryDetection` are recoverable at the per-file
/// level; the batch driver records them and moves on. `Directory` means the
/// run as a whole cannot proceed.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("symmetry detection failed: {0}")]
    SymmetryDetection(String),

    #[error("structure has no atomic sites")]
    EmptyStructure,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("cannot access {path}: {reason}")]
    Directory { path: String, reason: String },

    #[error("render failed: {0}")]
    Render(String),
}

impl Error {
    /// Short tag used in batch reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedInput(_) => "malformed-input",
            Error::SymmetryDetection(_) => "symmetry-detection",
            Error::EmptyStructure => "empty-structure",
            Error::Io(_) | Error::Directory { .. } => "io",
            Error::Render(_) => "render",
        }
    }

    /// Per-file errors are recorded in the report; directory-level errors
    /// abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Directory { .. })
    }
}
