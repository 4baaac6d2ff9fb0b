//! Error types for the emblem core.

use std::fmt;

use thiserror::Error;

/// A rank definition line that could not be parsed.
///
/// `line` is the 1-based position in the raw definition text. Blank lines
/// are skipped by the parser but still count here, so the number always
/// matches what an editor shows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind} {text:?}")]
pub struct ColourFormatError {
    pub line: usize,
    pub text: String,
    pub kind: ColourFormatKind,
}

/// What exactly was wrong with the colour field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColourFormatKind {
    /// The line has no `, colour` field at all.
    MissingColour,
    /// The `#` form did not parse as hexadecimal.
    InvalidHex,
    /// A hex value above `#ffffff`.
    OutOfRange,
    /// Neither `None` nor a `#RRGGBB` form.
    Unrecognized,
}

impl fmt::Display for ColourFormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColour => f.write_str("missing colour field on"),
            Self::InvalidHex => f.write_str("invalid hex code"),
            Self::OutOfRange => f.write_str("hex value out of range (max #ffffff)"),
            Self::Unrecognized => f.write_str("unrecognized colour format"),
        }
    }
}

/// Snapshot decode failures. Any of these aborts the whole load; a partial
/// registry is never installed.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot entry has no type tag")]
    MissingTypeTag,

    #[error("unknown snapshot type tag {0:?}")]
    UnknownTypeTag(String),

    #[error("malformed snapshot entry: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A platform call made during a realization pass failed.
///
/// In-memory state stays consistent: the entry that failed is still
/// unrealized and the next pass retries it.
#[derive(Debug, Error)]
#[error("creating the role for rank {name:?} failed")]
pub struct RealizeError {
    pub name: String,
    #[source]
    pub source: anyhow::Error,
}
