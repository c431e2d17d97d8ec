//! Scenescript, an animation DSL compiler for algorithm visualizations.
//!
//! Source text is parsed into a typed AST ([`dsl`]), one scene is evaluated
//! into a time-stamped command list bound to scene elements ([`eval`]), and
//! the result is exposed with a source-line index for code stepping
//! ([`command`]).

pub mod command;
pub mod config;
pub mod dsl;
pub mod eval;

pub use command::{Command, CommandKind, CommandSequence, LineIndex, MarkerKind, Timeline};
pub use config::CompilerConfig;
pub use dsl::{Compiler, DslError, ParseError, Program};
pub use eval::{compile, ElementBindings, ElementId, ElementRef, EvalError, EvalErrorKind, Value};
