//! Evaluation errors. Compilation fails closed: the first error aborts it.

use serde::Serialize;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EvalErrorKind {
    UndefinedVariable,
    UndefinedElement,
    UndefinedProperty,
    IndexOutOfRange,
    IterationLimitExceeded,
    TypeMismatch,
    SceneNotFound,
    /// The compiler configuration itself is unusable.
    InvalidConfig,
}

/// A semantic error raised while compiling a scene.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{}{kind:?}: {message}", line_prefix(.line))]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
    pub line: Option<usize>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
        }
    }

    pub fn undefined_variable(name: &str) -> Self {
        Self::new(
            EvalErrorKind::UndefinedVariable,
            format!("undefined variable `{name}`"),
        )
    }

    pub fn undefined_element(name: &str) -> Self {
        Self::new(
            EvalErrorKind::UndefinedElement,
            format!("undefined element `{name}`"),
        )
    }

    pub fn undefined_property(property: &str, on: &str) -> Self {
        Self::new(
            EvalErrorKind::UndefinedProperty,
            format!("no property `{property}` on {on}"),
        )
    }

    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::new(
            EvalErrorKind::IndexOutOfRange,
            format!("index {index} out of range for length {len}"),
        )
    }

    pub fn iteration_limit(limit: u64) -> Self {
        Self::new(
            EvalErrorKind::IterationLimitExceeded,
            format!("loops exceeded the scene iteration limit of {limit}"),
        )
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::TypeMismatch, message)
    }

    pub fn scene_not_found(name: &str) -> Self {
        Self::new(
            EvalErrorKind::SceneNotFound,
            format!("no scene named \"{name}\""),
        )
    }

    /// Attach a source line unless one is already known.
    pub fn at_line(mut self, line: usize) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        self
    }
}

impl From<ConfigError> for EvalError {
    fn from(err: ConfigError) -> Self {
        Self::new(EvalErrorKind::InvalidConfig, err.to_string())
    }
}

fn line_prefix(line: &Option<usize>) -> String {
    line.map(|l| format!("[line {l}] ")).unwrap_or_default()
}
