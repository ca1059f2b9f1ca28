use thiserror::Error;

/// Errors produced while reading DOT source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input does not conform to the DOT grammar.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
}

impl ParseError {
    /// Build a syntax error located where `rest` starts inside `source`.
    pub(crate) fn at(source: &str, rest: &str, message: impl Into<String>) -> Self {
        let offset = source.len().saturating_sub(rest.len());
        let consumed = &source[..offset];
        let line = consumed.matches('\n').count() + 1;
        let line_start = consumed.rfind('\n').map_or(0, |pos| pos + 1);
        let column = consumed[line_start..].chars().count() + 1;
        ParseError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }
}
