//! Recursive-descent parser for the scene DSL.
//!
//! Parses a token stream into the AST. Binary operators are parsed one
//! precedence level per function, lowest first:
//!
//! ```text
//! ||  &&  == !=  < <= > >=  + -  * / %  unary - !  postfix . []  primary
//! ```
//!
//! Every level folds its operand chain left to right, so `10 - 3 - 2` is
//! `(10 - 3) - 2`.

use super::ast::*;
use super::error::ParseError;
use super::token::{Token, TokenKind};

/// Maximum nesting of blocks and parenthesized expressions.
const MAX_DEPTH: usize = 64;

/// Maximum height of an expression tree, counting operator chains.
const MAX_HEIGHT: usize = 128;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    /// Height of the expression most recently returned by an expression rule.
    height: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let (line, col) = tokens.last().map_or((1, 1), |t| (t.line, t.col));
            tokens.push(Token {
                kind: TokenKind::Eof,
                line,
                col,
            });
        }
        Self {
            tokens,
            pos: 0,
            depth: 0,
            height: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut scenes = Vec::new();

        while !self.is_at_end() {
            if !self.check(&TokenKind::Scene) {
                return Err(self.unexpected("`scene`"));
            }
            scenes.push(self.parse_scene()?);
        }

        Ok(Program { scenes })
    }

    /// Parse a standalone expression, requiring the whole input to be consumed.
    pub fn parse_standalone_expr(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expr()?;
        if !self.is_at_end() {
            return Err(self.unexpected("end of expression"));
        }
        Ok(expr)
    }

    fn parse_scene(&mut self) -> Result<SceneBlock, ParseError> {
        let line = self.peek().line;
        self.expect(TokenKind::Scene)?;

        let t = self.peek().clone();
        let name = match t.kind {
            TokenKind::Str(s) => {
                self.advance();
                s
            }
            _ => self.expect_ident()?,
        };

        let body = self.parse_block()?;
        Ok(SceneBlock { name, body, line })
    }

    fn parse_block(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.expect(TokenKind::LBrace)?;
        self.enter()?;

        let mut statements = Vec::new();
        loop {
            while self.check(&TokenKind::Semicolon) {
                self.advance();
            }
            if self.check(&TokenKind::RBrace) || self.is_at_end() {
                break;
            }
            statements.push(self.parse_statement()?);
        }

        self.expect(TokenKind::RBrace)?;
        self.leave();
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let t = self.peek().clone();
        let line = t.line;

        let kind = match t.kind {
            TokenKind::ElementType(element_type) => {
                self.advance();
                self.parse_element_declaration(element_type)?
            }
            TokenKind::Let => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(TokenKind::Eq)?;
                let value = self.parse_expr()?;
                StatementKind::VariableDeclaration { name, value }
            }
            TokenKind::For => {
                self.advance();
                let var = self.expect_ident()?;
                self.expect(TokenKind::In)?;
                let start = self.parse_expr()?;
                self.expect(TokenKind::DotDot)?;
                let end = self.parse_expr()?;
                let body = self.parse_block()?;
                StatementKind::ForLoop {
                    var,
                    start,
                    end,
                    body,
                }
            }
            TokenKind::While => {
                self.advance();
                let condition = self.parse_expr()?;
                let body = self.parse_block()?;
                StatementKind::WhileLoop { condition, body }
            }
            TokenKind::If => self.parse_if()?,
            TokenKind::Parallel => {
                self.advance();
                let body = self.parse_block()?;
                StatementKind::ParallelBlock { body }
            }
            TokenKind::Wait => {
                self.advance();
                let duration = self.parse_expr()?;
                StatementKind::WaitCommand {
                    mode: WaitMode::Wait,
                    duration: Some(duration),
                }
            }
            TokenKind::Pause => {
                self.advance();
                let duration = if self.continues_line() && self.starts_expr() {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                StatementKind::WaitCommand {
                    mode: WaitMode::Pause,
                    duration,
                }
            }
            TokenKind::Camera => {
                self.advance();
                let action = match self.peek().kind.clone() {
                    TokenKind::CameraAction(action) => {
                        self.advance();
                        action
                    }
                    _ => return Err(self.unexpected("camera action")),
                };
                let targets = self.parse_target_list()?;
                let options = self.parse_options()?;
                StatementKind::CameraCommand {
                    action,
                    targets,
                    options,
                }
            }
            TokenKind::Play => {
                self.advance();
                let cue = match self.peek().kind.clone() {
                    TokenKind::Cue(cue) => {
                        self.advance();
                        cue
                    }
                    _ => return Err(self.unexpected("audio cue")),
                };
                let options = self.parse_options()?;
                StatementKind::AudioCommand { cue, options }
            }
            TokenKind::Action(action) => {
                self.advance();
                let targets = self.parse_target_list()?;
                let options = self.parse_options()?;
                StatementKind::AnimationCommand {
                    action,
                    targets,
                    options,
                }
            }
            TokenKind::Ident(name) => {
                self.advance();
                let mut accessors = Vec::new();
                loop {
                    if self.check(&TokenKind::Dot) {
                        self.advance();
                        accessors.push(Accessor::Member(self.expect_word()?));
                    } else if self.check(&TokenKind::LBracket) {
                        self.advance();
                        accessors.push(Accessor::Index(self.parse_expr()?));
                        self.expect(TokenKind::RBracket)?;
                    } else {
                        break;
                    }
                }
                self.expect(TokenKind::Eq)?;
                let value = self.parse_expr()?;
                StatementKind::Assignment {
                    target: AssignTarget { name, accessors },
                    value,
                }
            }
            _ => return Err(self.unexpected("statement")),
        };

        Ok(Statement { kind, line })
    }

    fn parse_element_declaration(
        &mut self,
        element_type: ElementType,
    ) -> Result<StatementKind, ParseError> {
        let name = self.expect_ident()?;

        let value = if self.check(&TokenKind::Eq) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };

        let position = if self.check(&TokenKind::At) {
            self.advance();
            self.expect(TokenKind::LParen)?;
            let x = self.parse_expr()?;
            self.expect(TokenKind::Comma)?;
            let y = self.parse_expr()?;
            self.expect(TokenKind::RParen)?;
            Some((x, y))
        } else {
            None
        };

        Ok(StatementKind::ElementDeclaration {
            element_type,
            name,
            value,
            position,
        })
    }

    /// `if cond { } [else if ... | else { }]`
    fn parse_if(&mut self) -> Result<StatementKind, ParseError> {
        self.expect(TokenKind::If)?;
        let condition = self.parse_expr()?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.check(&TokenKind::Else) {
            self.advance();
            if self.check(&TokenKind::If) {
                let line = self.peek().line;
                self.enter()?;
                let nested = self.parse_if()?;
                self.leave();
                Some(vec![Statement { kind: nested, line }])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(StatementKind::IfStatement {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// Targets are postfix expressions. Whitespace-separated targets must stay
    /// on the command's line; a comma lets the list continue on the next one.
    fn parse_target_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut targets = Vec::new();
        loop {
            let after_comma = !targets.is_empty() && self.check(&TokenKind::Comma);
            if after_comma {
                self.advance();
            }
            let starts_target = matches!(
                self.peek().kind,
                TokenKind::Ident(_) | TokenKind::LBracket | TokenKind::LParen
            );
            if !starts_target || !(after_comma || self.continues_line()) {
                if after_comma {
                    return Err(self.unexpected("target after `,`"));
                }
                break;
            }
            targets.push(self.parse_postfix()?);
        }
        Ok(targets)
    }

    fn parse_options(&mut self) -> Result<Vec<CommandOption>, ParseError> {
        let mut options = Vec::new();
        while let TokenKind::OptionName(key) = self.peek().kind.clone() {
            self.advance();
            let value = self.parse_expr()?;
            options.push(CommandOption { key, value });
        }
        Ok(options)
    }

    // ---- expressions ---------------------------------------------------

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        self.parse_left_assoc(Self::parse_and, &[(TokenKind::OrOr, BinaryOp::Or)])
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        self.parse_left_assoc(Self::parse_equality, &[(TokenKind::AndAnd, BinaryOp::And)])
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        self.parse_left_assoc(
            Self::parse_comparison,
            &[
                (TokenKind::EqEq, BinaryOp::Eq),
                (TokenKind::NotEq, BinaryOp::NotEq),
            ],
        )
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        self.parse_left_assoc(
            Self::parse_additive,
            &[
                (TokenKind::LtEq, BinaryOp::LtEq),
                (TokenKind::GtEq, BinaryOp::GtEq),
                (TokenKind::Lt, BinaryOp::Lt),
                (TokenKind::Gt, BinaryOp::Gt),
            ],
        )
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_left_assoc(
            Self::parse_multiplicative,
            &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_left_assoc(
            Self::parse_unary,
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Rem),
            ],
        )
    }

    /// Parse `operand (op operand)*`, wrapping the accumulator on each pair.
    fn parse_left_assoc(
        &mut self,
        operand: fn(&mut Self) -> Result<Expr, ParseError>,
        table: &[(TokenKind, BinaryOp)],
    ) -> Result<Expr, ParseError> {
        let mut left = operand(self)?;
        let mut height = self.height;
        while let Some(op) = table
            .iter()
            .find(|(kind, _)| self.check(kind))
            .map(|(_, op)| *op)
        {
            self.advance();
            let right = operand(self)?;
            height = self.set_height(height.max(self.height) + 1)?;
            let (line, col) = (left.line, left.col);
            left = Expr {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
                col,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let t = self.peek().clone();
        let op = match t.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();
        self.set_height(self.height + 1)?;
        Ok(Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            line: t.line,
            col: t.col,
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        let mut height = self.height;
        loop {
            let (line, col) = (expr.line, expr.col);
            if self.check(&TokenKind::Dot) {
                self.advance();
                let property = self.expect_word()?;
                height = self.set_height(height + 1)?;
                expr = Expr {
                    kind: ExprKind::Member {
                        object: Box::new(expr),
                        property,
                    },
                    line,
                    col,
                };
            } else if self.check(&TokenKind::LBracket) {
                self.advance();
                self.enter()?;
                let index = self.parse_expr()?;
                self.expect(TokenKind::RBracket)?;
                self.leave();
                height = self.set_height(height.max(self.height) + 1)?;
                expr = Expr {
                    kind: ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    line,
                    col,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let t = self.peek().clone();
        self.height = 1;
        let kind = match t.kind {
            TokenKind::Number(n) => {
                self.advance();
                ExprKind::Number(n)
            }
            TokenKind::Duration(s) => {
                self.advance();
                ExprKind::Duration(s)
            }
            TokenKind::Str(s) => {
                self.advance();
                ExprKind::String(s)
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Boolean(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Boolean(false)
            }
            TokenKind::Ident(name) => {
                self.advance();
                ExprKind::Identifier(name)
            }
            TokenKind::LParen => {
                self.advance();
                self.enter()?;
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                self.leave();
                return Ok(inner);
            }
            TokenKind::LBracket => {
                self.advance();
                self.enter()?;
                let mut tallest = 0;
                let items = self.parse_comma_list(TokenKind::RBracket, |p| {
                    let item = p.parse_expr()?;
                    tallest = tallest.max(p.height);
                    Ok(item)
                })?;
                self.leave();
                self.set_height(tallest + 1)?;
                ExprKind::Array(items)
            }
            TokenKind::LBrace => {
                self.advance();
                self.enter()?;
                let mut tallest = 0;
                let fields = self.parse_comma_list(TokenKind::RBrace, |p| {
                    let key = p.expect_key()?;
                    p.expect(TokenKind::Colon)?;
                    let value = p.parse_expr()?;
                    tallest = tallest.max(p.height);
                    Ok((key, value))
                })?;
                self.leave();
                self.set_height(tallest + 1)?;
                ExprKind::Object(fields)
            }
            ref other if other.keyword_text().is_some() => {
                return Err(self.reserved_word_error(&t));
            }
            _ => return Err(self.unexpected("expression")),
        };

        Ok(Expr {
            kind,
            line: t.line,
            col: t.col,
        })
    }

    /// Parse `item (, item)* ,? close` after the opening delimiter.
    fn parse_comma_list<T>(
        &mut self,
        close: TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let mut items = Vec::new();
        while !self.check(&close) {
            items.push(item(self)?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    // ---- helpers -------------------------------------------------------

    fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().kind == *kind
    }

    /// Whether the next token sits on the same line as the previous one.
    fn continues_line(&self) -> bool {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(prev) => prev.line == self.peek().line,
            None => false,
        }
    }

    fn starts_expr(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Number(_)
                | TokenKind::Duration(_)
                | TokenKind::Str(_)
                | TokenKind::Ident(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::Minus
                | TokenKind::Bang
        )
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let t = self.peek();
            return Err(ParseError::new("nesting too deep", t.line, t.col));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn set_height(&mut self, height: usize) -> Result<usize, ParseError> {
        if height > MAX_HEIGHT {
            let t = self.peek();
            return Err(ParseError::new("expression too deeply nested", t.line, t.col));
        }
        self.height = height;
        Ok(height)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&kind.describe()))
        }
    }

    /// Expect a non-reserved identifier.
    fn expect_ident(&mut self) -> Result<String, ParseError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            ref other if other.keyword_text().is_some() => Err(self.reserved_word_error(&t)),
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Expect any word, reserved or not (member names after `.`).
    fn expect_word(&mut self) -> Result<String, ParseError> {
        let t = self.peek().clone();
        if let TokenKind::Ident(name) = t.kind {
            self.advance();
            return Ok(name);
        }
        match t.kind.keyword_text() {
            Some(word) => {
                self.advance();
                Ok(word.to_string())
            }
            None => Err(self.unexpected("property name")),
        }
    }

    /// Object keys may be words or string literals.
    fn expect_key(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Str(s) = &self.peek().kind {
            let key = s.clone();
            self.advance();
            return Ok(key);
        }
        self.expect_word()
    }

    fn reserved_word_error(&self, t: &Token) -> ParseError {
        let word = t.kind.keyword_text().unwrap_or("?");
        ParseError::new(
            format!("`{word}` is a reserved word and cannot be used as an identifier"),
            t.line,
            t.col,
        )
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let t = self.peek();
        ParseError::new(
            format!("expected {expected}, found {}", t.kind.describe()),
            t.line,
            t.col,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::lexer::Lexer;

    fn parse(src: &str) -> Result<Program, ParseError> {
        let mut lexer = Lexer::new(src);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(tokens);
        parser.parse()
    }

    fn expr(src: &str) -> Expr {
        let tokens = Lexer::new(src).tokenize().unwrap();
        Parser::new(tokens).parse_standalone_expr().unwrap()
    }

    fn body(src: &str) -> Vec<Statement> {
        let program = parse(&format!("scene s {{\n{src}\n}}")).unwrap();
        program.scenes.into_iter().next().unwrap().body
    }

    fn binary(e: &Expr) -> (BinaryOp, &Expr, &Expr) {
        match &e.kind {
            ExprKind::Binary { op, left, right } => (*op, left, right),
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn parse_empty_program() {
        let prog = parse("").unwrap();
        assert!(prog.scenes.is_empty());
    }

    #[test]
    fn parse_scene_names() {
        let prog = parse("scene \"intro\" {}\nscene main { }").unwrap();
        assert_eq!(prog.scene_names(), vec!["intro", "main"]);
        assert_eq!(prog.scenes[1].line, 2);
    }

    #[test]
    fn multiplication_binds_tighter() {
        let e = expr("2 + 3 * 4");
        let (op, left, right) = binary(&e);
        assert_eq!(op, BinaryOp::Add);
        assert_eq!(left.kind, ExprKind::Number(2.0));
        assert_eq!(binary(right).0, BinaryOp::Mul);
    }

    #[test]
    fn parentheses_override_precedence() {
        let e = expr("(2 + 3) * 4");
        let (op, left, _) = binary(&e);
        assert_eq!(op, BinaryOp::Mul);
        assert_eq!(binary(left).0, BinaryOp::Add);
    }

    #[test]
    fn subtraction_is_left_associative() {
        let e = expr("10 - 3 - 2");
        let (op, left, right) = binary(&e);
        assert_eq!(op, BinaryOp::Sub);
        assert_eq!(right.kind, ExprKind::Number(2.0));
        let (inner, a, b) = binary(left);
        assert_eq!(inner, BinaryOp::Sub);
        assert_eq!(a.kind, ExprKind::Number(10.0));
        assert_eq!(b.kind, ExprKind::Number(3.0));
    }

    #[test]
    fn logical_operators_lowest() {
        let e = expr("a < 1 && b == 2 || !c");
        let (op, left, right) = binary(&e);
        assert_eq!(op, BinaryOp::Or);
        assert_eq!(binary(left).0, BinaryOp::And);
        assert!(matches!(
            right.kind,
            ExprKind::Unary {
                op: UnaryOp::Not,
                ..
            }
        ));
    }

    #[test]
    fn unary_binds_tighter_than_binary() {
        let e = expr("-a * 2");
        let (op, left, _) = binary(&e);
        assert_eq!(op, BinaryOp::Mul);
        assert!(matches!(left.kind, ExprKind::Unary { op: UnaryOp::Neg, .. }));
    }

    #[test]
    fn duration_literals_normalized() {
        assert_eq!(expr("500ms").kind, ExprKind::Duration(0.5));
        assert_eq!(expr("2s").kind, ExprKind::Duration(2.0));
    }

    #[test]
    fn postfix_chain() {
        let e = expr("g.nodes[i + 1].label");
        match &e.kind {
            ExprKind::Member { object, property } => {
                assert_eq!(property, "label");
                assert!(matches!(object.kind, ExprKind::Index { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn member_name_may_be_keyword() {
        let e = expr("n.value");
        assert!(matches!(e.kind, ExprKind::Member { ref property, .. } if property == "value"));
    }

    #[test]
    fn array_and_object_literals() {
        let e = expr("[1, \"two\", [true], {color: \"red\", \"x\": 2,}]");
        match e.kind {
            ExprKind::Array(items) => {
                assert_eq!(items.len(), 4);
                match &items[3].kind {
                    ExprKind::Object(fields) => {
                        assert_eq!(fields[0].0, "color");
                        assert_eq!(fields[1].0, "x");
                    }
                    other => panic!("unexpected {other:?}"),
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reserved_word_rejected_as_identifier() {
        let err = parse("scene s { let scene = 1 }").unwrap_err();
        assert!(err.message.contains("reserved"), "{}", err.message);
        assert_eq!((err.line, err.column), (1, 15));
    }

    #[test]
    fn reserved_word_rejected_in_expression() {
        let tokens = Lexer::new("1 + highlight").tokenize().unwrap();
        let err = Parser::new(tokens).parse_standalone_expr().unwrap_err();
        assert!(err.message.contains("`highlight` is a reserved word"));
    }

    #[test]
    fn identifier_with_keyword_prefix_accepted() {
        let stmts = body("let scenery = 1");
        assert!(matches!(
            &stmts[0].kind,
            StatementKind::VariableDeclaration { name, .. } if name == "scenery"
        ));
    }

    #[test]
    fn element_declaration_with_position() {
        let stmts = body("array a = [5, 3, 8] at (100, 50 + 10)");
        match &stmts[0].kind {
            StatementKind::ElementDeclaration {
                element_type,
                name,
                value,
                position,
            } => {
                assert_eq!(*element_type, ElementType::Array);
                assert_eq!(name, "a");
                assert!(value.is_some());
                assert!(position.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn element_declaration_without_value() {
        let stmts = body("stack s\nqueue q at (1, 2)");
        assert_eq!(stmts.len(), 2);
        assert!(matches!(
            &stmts[0].kind,
            StatementKind::ElementDeclaration { value: None, position: None, .. }
        ));
    }

    #[test]
    fn for_loop_range() {
        let stmts = body("for i in 0..n - 1 { highlight a[i] }");
        match &stmts[0].kind {
            StatementKind::ForLoop {
                var,
                start,
                end,
                body,
            } => {
                assert_eq!(var, "i");
                assert_eq!(start.kind, ExprKind::Number(0.0));
                assert_eq!(binary(end).0, BinaryOp::Sub);
                assert_eq!(body.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn else_if_chain() {
        let stmts = body("if x > 1 { wait 1s } else if x > 0 { wait 2s } else { wait 3s }");
        match &stmts[0].kind {
            StatementKind::IfStatement { else_branch, .. } => {
                let nested = else_branch.as_ref().unwrap();
                assert_eq!(nested.len(), 1);
                assert!(matches!(
                    &nested[0].kind,
                    StatementKind::IfStatement {
                        else_branch: Some(_),
                        ..
                    }
                ));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn command_targets_and_options() {
        let stmts = body("swap a[0] a[1] duration 1s color \"red\"\nhighlight a[2]");
        assert_eq!(stmts.len(), 2);
        match &stmts[0].kind {
            StatementKind::AnimationCommand {
                action,
                targets,
                options,
            } => {
                assert_eq!(*action, AnimationAction::Swap);
                assert_eq!(targets.len(), 2);
                assert_eq!(options.len(), 2);
                assert_eq!(options[0].key, OptionKey::Duration);
                assert_eq!(options[0].value.kind, ExprKind::Duration(1.0));
                assert_eq!(options[1].key, OptionKey::Color);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(stmts[1].line, 3);
    }

    #[test]
    fn targets_stop_at_line_end() {
        let stmts = body("highlight a\nx = 3");
        assert_eq!(stmts.len(), 2);
        match &stmts[0].kind {
            StatementKind::AnimationCommand { targets, .. } => assert_eq!(targets.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(stmts[1].kind, StatementKind::Assignment { .. }));
    }

    #[test]
    fn comma_continues_target_list() {
        let stmts = body("compare a[0],\n  a[1]");
        match &stmts[0].kind {
            StatementKind::AnimationCommand { targets, .. } => assert_eq!(targets.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn camera_and_audio_commands() {
        let stmts = body("camera focus a[1] duration 1s\ncamera reset\nplay ding volume 0.5");
        assert!(matches!(
            &stmts[0].kind,
            StatementKind::CameraCommand { action: CameraAction::Focus, targets, .. } if targets.len() == 1
        ));
        assert!(matches!(
            &stmts[1].kind,
            StatementKind::CameraCommand { action: CameraAction::Reset, targets, .. } if targets.is_empty()
        ));
        assert!(matches!(
            &stmts[2].kind,
            StatementKind::AudioCommand { cue: AudioCue::Ding, options } if options.len() == 1
        ));
    }

    #[test]
    fn pause_duration_only_on_same_line() {
        let stmts = body("pause\nx = 1\npause 2s");
        assert_eq!(stmts.len(), 3);
        assert!(matches!(
            &stmts[0].kind,
            StatementKind::WaitCommand { mode: WaitMode::Pause, duration: None }
        ));
        assert!(matches!(
            &stmts[2].kind,
            StatementKind::WaitCommand { mode: WaitMode::Pause, duration: Some(_) }
        ));
    }

    #[test]
    fn semicolons_separate_statements() {
        let stmts = body("parallel { wait 1s; wait 2s };");
        match &stmts[0].kind {
            StatementKind::ParallelBlock { body } => assert_eq!(body.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn assignment_with_accessors() {
        let stmts = body("grid[1][2] = 0\nnode.label = \"x\"");
        match &stmts[0].kind {
            StatementKind::Assignment { target, .. } => {
                assert_eq!(target.name, "grid");
                assert_eq!(target.accessors.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &stmts[1].kind {
            StatementKind::Assignment { target, .. } => {
                assert_eq!(target.accessors, vec![Accessor::Member("label".into())]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_error_missing_brace() {
        let err = parse("scene s { wait 1s").unwrap_err();
        assert!(err.message.contains("`}`"), "{}", err.message);
    }

    #[test]
    fn parse_error_top_level_statement() {
        assert!(parse("wait 1s").is_err());
    }

    #[test]
    fn parse_error_assignment_without_eq() {
        assert!(parse("scene s { x 3 }").is_err());
    }

    #[test]
    fn parse_error_deep_nesting() {
        let src = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        let tokens = Lexer::new(&src).tokenize().unwrap();
        assert!(Parser::new(tokens).parse_standalone_expr().is_err());
    }

    #[test]
    fn deeply_nested_index_rejected() {
        let src = format!("{}0{}", "a[".repeat(2000), "]".repeat(2000));
        let tokens = Lexer::new(&src).tokenize().unwrap();
        let err = Parser::new(tokens).parse_standalone_expr().unwrap_err();
        assert!(err.message.contains("nesting too deep"));
    }

    #[test]
    fn long_else_if_chain_rejected() {
        let chain = "if false { } else ".repeat(3000);
        let err = parse(&format!("scene s {{ {chain}{{ }} }}")).unwrap_err();
        assert!(err.message.contains("nesting too deep"));

        let short = "if false { } else ".repeat(20);
        assert!(parse(&format!("scene s {{ {short}{{ }} }}")).is_ok());
    }

    #[test]
    fn long_operator_chain_rejected() {
        let src = format!("1{}", " + 1".repeat(200_000));
        let tokens = Lexer::new(&src).tokenize().unwrap();
        let err = Parser::new(tokens).parse_standalone_expr().unwrap_err();
        assert!(err.message.contains("too deeply nested"));
    }

    #[test]
    fn height_adds_up_across_parentheses() {
        let group = |inner: &str| format!("({inner}{})", " + 1".repeat(60));
        let src = group(&group(&group("1")));
        let tokens = Lexer::new(&src).tokenize().unwrap();
        assert!(Parser::new(tokens).parse_standalone_expr().is_err());

        let two = group(&group("1"));
        let tokens = Lexer::new(&two).tokenize().unwrap();
        assert!(Parser::new(tokens).parse_standalone_expr().is_ok());
    }

    #[test]
    fn statement_lines_recorded() {
        let program =
            parse("scene \"demo\" { array a = [5,3,8]\n  highlight a[0] duration 500ms\n  swap a[0] a[1]\n}")
                .unwrap();
        let lines: Vec<usize> = program.scenes[0].body.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
    }
}
