//! Error types.
//!
//! ## Rust Lesson #20: Error Handling
//!
//! Fallible operations return `Result<T, E>`. `thiserror` derives the
//! `Display` and `std::error::Error` boilerplate from the `#[error(...)]`
//! attributes, and `#[source]` chains the underlying cause.
//!
//! Geometry never fails: invalid results are NaN points. Only structural
//! checks and file parsing report errors.

use std::path::PathBuf;

use thiserror::Error;

/// A map whose faces cannot be consistently two-coloured.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FaceError {
    #[error("face structure is inconsistent: {}", problems.join("; "))]
    Inconsistent { problems: Vec<String> },
}

/// Failure to read or write a tiling file.
#[derive(Debug, Error)]
pub enum TilingFileError {
    #[error("XML error at byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("expected a <tiling> root element, found <{0}>")]
    UnexpectedRoot(String),

    #[error("<{element}> is missing attribute `{attribute}`")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("attribute `{attribute}` = \"{value}\": expected {expected} numbers")]
    BadNumbers {
        attribute: String,
        value: String,
        expected: usize,
    },

    #[error("<{0}> must appear inside a <tile>")]
    Orphan(String),

    #[error("tile {index} has {points} points and no `regular` side count")]
    BadTile { index: usize, points: usize },

    #[error("tiling has no <translation> or <inflation> element")]
    NoLattice,

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<TilingFileError>,
    },
}
