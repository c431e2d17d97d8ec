//! Error types surfaced by the DSL front end.

use crate::eval::EvalError;

/// A syntax error: the grammar rejected the input. No AST is produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{line}:{column}] syntax error: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Either failure of the combined parse-and-compile entry point.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DslError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl DslError {
    /// Line the editor should mark, when one is known.
    pub fn line(&self) -> Option<usize> {
        match self {
            DslError::Parse(e) => Some(e.line),
            DslError::Eval(e) => e.line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::EvalErrorKind;

    #[test]
    fn parse_error_display_has_position() {
        let err = ParseError::new("unexpected `}`", 3, 7);
        assert_eq!(err.to_string(), "[3:7] syntax error: unexpected `}`");
    }

    #[test]
    fn dsl_error_line() {
        let parse: DslError = ParseError::new("x", 2, 1).into();
        assert_eq!(parse.line(), Some(2));

        let eval: DslError = EvalError::new(EvalErrorKind::TypeMismatch, "bad").into();
        assert_eq!(eval.line(), None);

        let eval: DslError = EvalError::new(EvalErrorKind::TypeMismatch, "bad")
            .at_line(9)
            .into();
        assert_eq!(eval.line(), Some(9));
    }
}
