use thiserror::Error;

/// Errors raised while transferring scores onto a structure.
///
/// Degenerate alignments and low coverage are not errors; they surface as
/// empty residue maps and sentinel annotations instead.
#[derive(Debug, Error)]
pub enum AnnotateError {
    /// One of the sequences handed to the aligner has no residues
    #[error("empty sequence: {0}")]
    EmptySequence(&'static str),

    /// A primary input is missing or unusable (reference, variant table, chain)
    #[error("input error: {0}")]
    Input(String),

    /// A single row or record could not be parsed
    #[error("malformed record at line {line}: {message}")]
    MalformedRecord { line: usize, message: String },

    /// An alignment block points past the end of the structure sequence
    #[error("alignment block {start}..{end} exceeds structure sequence of length {len}")]
    BlockOutOfRange { start: usize, end: usize, len: usize },

    /// Two alignment blocks claim the same residue or reference position
    #[error("alignment blocks overlap at residue {residue}, reference position {position}")]
    OverlappingBlocks { residue: String, position: usize },

    /// A value whose two-decimal form does not fit the 6-column annotation slot
    #[error("value {0} does not fit the 6-column annotation slot")]
    SlotOverflow(f64),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
