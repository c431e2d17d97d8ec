//! Scene DSL front end: source text → tokens → AST, plus the one-call
//! compile entry point used by the CLI and embedding hosts.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use error::{DslError, ParseError};

use lexer::Lexer;
use parser::Parser;

use crate::command::CommandSequence;
use crate::config::CompilerConfig;
use crate::eval::{self, ElementBindings, Value};

/// The DSL compiler.
///
/// Parses source text through lexer → parser → AST, then evaluates a scene
/// into its command timeline.
pub struct Compiler;

impl Compiler {
    /// Parse DSL source into a Program AST.
    pub fn parse(source: &str) -> Result<Program, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(tokens);
        parser.parse()
    }

    /// Parse a single expression such as `2 + 3 * 4`.
    pub fn parse_expr(source: &str) -> Result<Expr, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Parser::new(tokens).parse_standalone_expr()
    }

    /// Parse and evaluate a standalone expression with nothing in scope.
    pub fn eval_expr(source: &str) -> Result<Value, DslError> {
        let expr = Self::parse_expr(source)?;
        Ok(eval::evaluate(&expr)?)
    }

    /// Parse `source` and compile the scene named `scene`.
    pub fn compile(
        source: &str,
        scene: &str,
        bindings: &ElementBindings,
        config: &CompilerConfig,
    ) -> Result<CommandSequence, DslError> {
        let program = Self::parse(source)?;
        Ok(eval::compile(&program, scene, bindings, config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::EvalErrorKind;

    #[test]
    fn eval_expr_respects_precedence() {
        assert_eq!(Compiler::eval_expr("2 + 3 * 4").unwrap(), Value::Number(14.0));
        assert_eq!(Compiler::eval_expr("(2 + 3) * 4").unwrap(), Value::Number(20.0));
        assert_eq!(Compiler::eval_expr("10 - 3 - 2").unwrap(), Value::Number(5.0));
        assert_eq!(Compiler::eval_expr("!true || 2 < 3").unwrap(), Value::Bool(true));
    }

    #[test]
    fn eval_expr_unbound_identifier() {
        let err = Compiler::eval_expr("x + 1").unwrap_err();
        assert!(matches!(err, DslError::Eval(ref e) if e.kind == EvalErrorKind::UndefinedVariable));
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn parse_expr_rejects_trailing_tokens() {
        assert!(Compiler::parse_expr("1 2").is_err());
    }

    #[test]
    fn compile_reports_parse_errors() {
        let err = Compiler::compile(
            "scene s { let = 1 }",
            "s",
            &ElementBindings::new(),
            &CompilerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DslError::Parse(_)));
    }

    #[test]
    fn compile_missing_scene() {
        let err = Compiler::compile(
            "scene intro { }",
            "outro",
            &ElementBindings::new(),
            &CompilerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DslError::Eval(ref e) if e.kind == EvalErrorKind::SceneNotFound));
    }
}
