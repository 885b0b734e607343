//! Error type shared by graph construction, sketching and path search.
//!
//! Errors are split by who can do something about them: [`PrgError::MalformedPrg`]
//! and [`PrgError::InvalidParameter`] come from caller input, whereas
//! [`PrgError::Invariant`] means a graph is internally inconsistent and should
//! not be used further.

use thiserror::Error;

/// Errors returned by the library.
#[derive(Error, Debug)]
pub enum PrgError {
    /// The PRG string has unbalanced or badly nested site markers.
    #[error("Malformed PRG: {0}")]
    MalformedPrg(String),

    /// A graph invariant was broken (ordering, missing node, dangling edge).
    #[error("Graph invariant violated: {0}")]
    Invariant(String),

    /// Probability queries were made before `set_p` / `set_num_reads`.
    #[error("Probability parameters not set: {0}")]
    ProbabilityUnset(String),

    /// No path with positive length runs through the k-mer graph.
    #[error("Found no path through kmer graph")]
    NoPath,

    /// Parameter outside its allowed range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Could not parse a persisted graph or path.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Binary index (de)serialisation failed.
    #[error("Index serialisation error: {0}")]
    Serialisation(String),

    /// Could not read or write FASTA.
    #[error("FASTA error: {0}")]
    Fastx(#[from] needletail::errors::ParseError),

    /// IO error reading or writing a file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, PrgError>;
