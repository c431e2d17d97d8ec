//! Scene evaluation: AST → timed command sequence.

pub mod error;
pub mod interpreter;
pub mod resolver;
pub mod scope;
pub mod value;

pub use error::{EvalError, EvalErrorKind};
pub use interpreter::Interpreter;
pub use resolver::{Element, ElementBindings};
pub use value::{ElementId, ElementRef, PathSegment, Value};

use tracing::debug;

use crate::command::CommandSequence;
use crate::config::CompilerConfig;
use crate::dsl::ast::{Expr, Program};

/// Compile the scene named `scene_name` into its command timeline.
///
/// Compilation is deterministic: the same program, bindings and config always
/// produce an identical sequence.
#[tracing::instrument(skip(program, bindings, config))]
pub fn compile(
    program: &Program,
    scene_name: &str,
    bindings: &ElementBindings,
    config: &CompilerConfig,
) -> Result<CommandSequence, EvalError> {
    let scene = program
        .scene(scene_name)
        .ok_or_else(|| EvalError::scene_not_found(scene_name))?;
    config.validate()?;

    let sequence = Interpreter::new(config, bindings).run(scene)?;
    debug!(
        commands = sequence.len(),
        elements = sequence.elements.len(),
        total_duration = sequence.total_duration,
        "scene compiled"
    );
    Ok(sequence)
}

/// Evaluate an expression with nothing in scope.
pub fn evaluate(expr: &Expr) -> Result<Value, EvalError> {
    let config = CompilerConfig::default();
    let bindings = ElementBindings::new();
    Interpreter::new(&config, &bindings)
        .evaluate(expr)
        .map_err(|e| e.at_line(expr.line))
}
