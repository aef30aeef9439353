// Error types for the solver's outer surfaces (input files, snapshots, fixtures)

use std::{io, path::PathBuf};

use thiserror::Error;

pub type CavityResult<T> = Result<T, CavityError>;

#[derive(Error, Debug)]
pub enum CavityError {
    /// Reading or writing a file failed
    #[error("unable to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A JSON document could not be (de)serialized
    #[error("malformed json in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A simulation parameter is outside of its valid range
    #[error("invalid simulation input: {0}")]
    InvalidInput(String),

    /// Two grids that must line up have different shapes
    #[error("field shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// A final field drifted from its stored reference
    #[error("field `{field}` deviates from reference by {max_abs_diff:e} (tolerance {tolerance:e})")]
    ReferenceMismatch {
        field: &'static str,
        max_abs_diff: f64,
        tolerance: f64,
    },
}

impl CavityError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CavityError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        CavityError::Json {
            path: path.into(),
            source,
        }
    }
}
