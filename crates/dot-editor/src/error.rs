use dot_core::ParseError;
use thiserror::Error;

/// Errors produced while editing a DOT document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The current or edited text is not valid DOT.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The text cursor did not find a token the parse tree says is there.
    /// Text and tree have diverged; the working copy is discarded.
    #[error("expected \"{expected}\", found: \"{found}...\"")]
    StructuralMismatch { expected: String, found: String },

    /// An edge name that is neither `A->B` nor `A--B`.
    #[error("invalid edge {0:?}: expected `A->B` or `A--B`")]
    InvalidEdgeSpec(String),
}
