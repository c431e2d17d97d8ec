//! Tree-walking evaluator that flattens one scene into timed commands.
//!
//! Statements run strictly in order against a symbolic cursor measured in
//! seconds. Commands are emitted at the cursor and advance it by their
//! duration; `parallel` blocks restart every child at the same cursor and
//! continue from the latest child end.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::error::EvalError;
use super::resolver::{
    assign_into, deref, deref_deep, index_of, resolve_index, resolve_member, resolve_targets, ElementBindings,
    ElementStore,
};
use super::scope::{Binding, ScopeArena, ScopeId};
use super::value::{apply_binary, ElementRef, PathSegment, Value};
use crate::command::{Command, CommandKind, CommandSequence, MarkerKind};
use crate::config::CompilerConfig;
use crate::dsl::ast::*;

/// How an unbound identifier at the base of a postfix chain is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Value,
    Target,
}

pub struct Interpreter<'a> {
    config: &'a CompilerConfig,
    bindings: &'a ElementBindings,
    scopes: ScopeArena,
    store: ElementStore,
    commands: Vec<Command>,
    cursor: f64,
    /// Loop iterations run so far, across every loop in the scene.
    iterations: u64,
}

impl<'a> Interpreter<'a> {
    pub fn new(config: &'a CompilerConfig, bindings: &'a ElementBindings) -> Self {
        Self {
            config,
            bindings,
            scopes: ScopeArena::new(),
            store: ElementStore::new(bindings),
            commands: Vec::new(),
            cursor: 0.0,
            iterations: 0,
        }
    }

    /// Evaluate every statement of `scene` and collect the timeline.
    pub fn run(mut self, scene: &SceneBlock) -> Result<CommandSequence, EvalError> {
        let root = self.scopes.root();
        for stmt in &scene.body {
            self.exec(stmt, root)?;
        }
        Ok(CommandSequence::new(
            scene.name.clone(),
            self.commands,
            self.store.into_elements(),
            self.cursor,
        ))
    }

    /// Evaluate a standalone expression with no bindings in scope.
    pub fn evaluate(self, expr: &Expr) -> Result<Value, EvalError> {
        self.eval_value(expr, self.scopes.root())
    }

    fn exec(&mut self, stmt: &Statement, scope: ScopeId) -> Result<(), EvalError> {
        self.exec_kind(&stmt.kind, stmt.line, scope)
            .map_err(|e| e.at_line(stmt.line))
    }

    /// Run `body` in a fresh child scope of `parent`.
    fn exec_block(&mut self, body: &[Statement], parent: ScopeId) -> Result<(), EvalError> {
        let scope = self.scopes.push(parent);
        for stmt in body {
            self.exec(stmt, scope)?;
        }
        self.scopes.pop(scope);
        Ok(())
    }

    fn exec_kind(
        &mut self,
        kind: &StatementKind,
        line: usize,
        scope: ScopeId,
    ) -> Result<(), EvalError> {
        match kind {
            StatementKind::ElementDeclaration {
                element_type,
                name,
                value,
                position,
            } => {
                let value = match value {
                    Some(expr) => self.eval_value(expr, scope)?,
                    None => default_element_value(*element_type),
                };
                let position = match position {
                    Some((x, y)) => Some((
                        self.eval_finite(x, scope, "position x")?,
                        self.eval_finite(y, scope, "position y")?,
                    )),
                    None => None,
                };
                let r = self
                    .store
                    .declare(self.bindings, name, *element_type, value, position, line)?;
                self.scopes.declare(scope, name, Binding::Element(r));
                Ok(())
            }
            StatementKind::VariableDeclaration { name, value } => {
                let value = self.eval(value, scope)?;
                self.scopes.declare(scope, name, Binding::Variable(value));
                Ok(())
            }
            StatementKind::Assignment { target, value } => self.assign(target, value, scope),
            StatementKind::ForLoop {
                var,
                start,
                end,
                body,
            } => self.exec_for(var, start, end, body, scope),
            StatementKind::WhileLoop { condition, body } => {
                let mut iterations: u64 = 0;
                while self.eval_value(condition, scope)?.is_truthy() {
                    self.charge_iterations(1)?;
                    iterations += 1;
                    self.exec_block(body, scope)?;
                }
                debug!(line, iterations, "while loop finished");
                Ok(())
            }
            StatementKind::IfStatement {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_value(condition, scope)?.is_truthy() {
                    self.exec_block(then_branch, scope)
                } else if let Some(else_branch) = else_branch {
                    self.exec_block(else_branch, scope)
                } else {
                    Ok(())
                }
            }
            StatementKind::ParallelBlock { body } => {
                let start = self.cursor;
                let mut end = start;
                let block = self.scopes.push(scope);
                for stmt in body {
                    self.cursor = start;
                    self.exec(stmt, block)?;
                    end = end.max(self.cursor);
                }
                self.scopes.pop(block);
                self.cursor = end;
                if self.config.parallel_markers {
                    self.commands
                        .push(Command::marker(end, MarkerKind::ParallelEnd, None));
                }
                Ok(())
            }
            StatementKind::WaitCommand { mode, duration } => {
                let amount = match duration {
                    Some(expr) => {
                        let value = self.eval_value(expr, scope)?;
                        seconds(&value, "wait duration")?
                    }
                    None => 0.0,
                };
                if *mode == WaitMode::Pause {
                    let mut marker = Command::marker(self.cursor, MarkerKind::Pause, Some(line));
                    marker.duration = amount;
                    self.commands.push(marker);
                }
                self.advance_to(self.cursor + amount)
            }
            StatementKind::CameraCommand {
                action,
                targets,
                options,
            } => {
                let targets = self.resolve_target_list(targets, scope)?;
                let options = self.eval_options(options, scope)?;
                self.emit(CommandKind::Camera(*action), targets, options, line)
            }
            StatementKind::AudioCommand { cue, options } => {
                let options = self.eval_options(options, scope)?;
                self.emit(CommandKind::Audio(*cue), Vec::new(), options, line)
            }
            StatementKind::AnimationCommand {
                action,
                targets,
                options,
            } => {
                let targets = self.resolve_target_list(targets, scope)?;
                let options = self.eval_options(options, scope)?;
                self.apply_effect(*action, &targets, &options)?;
                self.emit(CommandKind::Animation(*action), targets, options, line)
            }
        }
    }

    fn exec_for(
        &mut self,
        var: &str,
        start: &Expr,
        end: &Expr,
        body: &[Statement],
        scope: ScopeId,
    ) -> Result<(), EvalError> {
        let start = self.eval_number(start, scope, "loop start")?;
        let end = self.eval_number(end, scope, "loop end")?;
        if start.is_nan() || end.is_nan() || start.is_infinite() {
            return Err(EvalError::type_mismatch(format!(
                "invalid loop range {start}..{end}"
            )));
        }

        let count = if end > start { (end - start).ceil() } else { 0.0 };
        if count > self.remaining_iterations() as f64 {
            return Err(EvalError::iteration_limit(self.config.max_iterations));
        }
        let count = count as u64;
        self.charge_iterations(count)?;
        debug!(var, start, end, iterations = count, "for loop");

        for k in 0..count {
            let iteration = self.scopes.push(scope);
            self.scopes.declare(
                iteration,
                var,
                Binding::Variable(Value::Number(start + k as f64)),
            );
            for stmt in body {
                self.exec(stmt, iteration)?;
            }
            self.scopes.pop(iteration);
        }
        Ok(())
    }

    fn remaining_iterations(&self) -> u64 {
        self.config.max_iterations.saturating_sub(self.iterations)
    }

    /// Spend `n` iterations of the scene-wide loop budget.
    fn charge_iterations(&mut self, n: u64) -> Result<(), EvalError> {
        if n > self.remaining_iterations() {
            return Err(EvalError::iteration_limit(self.config.max_iterations));
        }
        self.iterations += n;
        Ok(())
    }

    fn assign(&mut self, target: &AssignTarget, value: &Expr, scope: ScopeId) -> Result<(), EvalError> {
        let value = self.eval(value, scope)?;
        let binding = self
            .scopes
            .lookup(scope, &target.name)
            .cloned()
            .ok_or_else(|| EvalError::undefined_variable(&target.name))?;

        let mut segments = Vec::with_capacity(target.accessors.len());
        for accessor in &target.accessors {
            segments.push(match accessor {
                Accessor::Member(name) => PathSegment::Property(name.clone()),
                Accessor::Index(expr) => {
                    let index = self.eval_value(expr, scope)?;
                    PathSegment::Index(index_of(&index)?)
                }
            });
        }

        match binding {
            Binding::Element(r) => self.write_element(&r, segments, value),
            Binding::Variable(Value::Element(r)) if !segments.is_empty() => {
                self.write_element(&r, segments, value)
            }
            Binding::Variable(_) => match self.scopes.lookup_mut(scope, &target.name) {
                Some(Binding::Variable(slot)) => assign_into(slot, &segments, value),
                _ => Err(EvalError::undefined_variable(&target.name)),
            },
        }
    }

    fn write_element(
        &mut self,
        base: &ElementRef,
        segments: Vec<PathSegment>,
        value: Value,
    ) -> Result<(), EvalError> {
        let target = segments
            .into_iter()
            .fold(base.clone(), |r, segment| r.child(segment));
        let value = deref(value, &self.store)?;
        self.store.set(&target, value)
    }

    /// State changes a command makes to the elements it animates.
    fn apply_effect(
        &mut self,
        action: AnimationAction,
        targets: &[ElementRef],
        options: &BTreeMap<OptionKey, Value>,
    ) -> Result<(), EvalError> {
        match action {
            AnimationAction::Swap => match targets {
                [a, b] => self.store.swap(a, b),
                _ => Err(EvalError::type_mismatch(format!(
                    "swap needs exactly two targets, got {}",
                    targets.len()
                ))),
            },
            AnimationAction::Set | AnimationAction::Push => {
                let value = options.get(&OptionKey::Value).cloned().ok_or_else(|| {
                    EvalError::type_mismatch(format!("`{action}` requires a `value` option"))
                })?;
                for target in targets {
                    if action == AnimationAction::Set {
                        self.store.set(target, value.clone())?;
                    } else {
                        self.store.push(target, value.clone())?;
                    }
                }
                Ok(())
            }
            AnimationAction::Pop => {
                for target in targets {
                    self.store.pop(target)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Append a command at the cursor (plus `delay`) and advance past it.
    fn emit(
        &mut self,
        kind: CommandKind,
        targets: Vec<ElementRef>,
        options: BTreeMap<OptionKey, Value>,
        line: usize,
    ) -> Result<(), EvalError> {
        let duration = match options.get(&OptionKey::Duration) {
            Some(v) => seconds(v, "duration")?,
            None => self.config.default_duration,
        };
        let delay = match options.get(&OptionKey::Delay) {
            Some(v) => seconds(v, "delay")?,
            None => 0.0,
        };
        let time_offset = self.cursor + delay;
        if !time_offset.is_finite() {
            return Err(EvalError::type_mismatch("command start time is not finite"));
        }

        self.commands.push(Command {
            time_offset,
            kind,
            targets,
            options,
            duration,
            source_line: Some(line),
        });
        self.advance_to(time_offset + duration)
    }

    fn advance_to(&mut self, t: f64) -> Result<(), EvalError> {
        if !t.is_finite() {
            return Err(EvalError::type_mismatch("timeline cursor is not finite"));
        }
        self.cursor = t;
        Ok(())
    }

    fn eval_options(
        &self,
        options: &[CommandOption],
        scope: ScopeId,
    ) -> Result<BTreeMap<OptionKey, Value>, EvalError> {
        let mut resolved = BTreeMap::new();
        for option in options {
            // `to` may name an element as a destination; the rest are data.
            let value = if option.key == OptionKey::To {
                self.eval(&option.value, scope)?
            } else {
                self.eval_value(&option.value, scope)?
            };
            resolved.insert(option.key, value);
        }
        Ok(resolved)
    }

    fn resolve_target_list(&self, targets: &[Expr], scope: ScopeId) -> Result<Vec<ElementRef>, EvalError> {
        let mut out = Vec::new();
        for target in targets {
            let value = self.eval_in(target, scope, Lookup::Target)?;
            resolve_targets(value, &self.store, &mut out)?;
        }
        Ok(out)
    }

    // ---- expressions ---------------------------------------------------

    /// Evaluate, keeping element references as references.
    fn eval(&self, expr: &Expr, scope: ScopeId) -> Result<Value, EvalError> {
        self.eval_in(expr, scope, Lookup::Value)
    }

    /// Evaluate and dereference a top-level element reference.
    fn eval_value(&self, expr: &Expr, scope: ScopeId) -> Result<Value, EvalError> {
        let value = self.eval(expr, scope)?;
        deref(value, &self.store)
    }

    fn eval_number(&self, expr: &Expr, scope: ScopeId, what: &str) -> Result<f64, EvalError> {
        let value = self.eval_value(expr, scope)?;
        value.as_number().ok_or_else(|| {
            EvalError::type_mismatch(format!(
                "{what} must be a number, found {}",
                value.type_name()
            ))
        })
    }

    fn eval_finite(&self, expr: &Expr, scope: ScopeId, what: &str) -> Result<f64, EvalError> {
        let n = self.eval_number(expr, scope, what)?;
        if n.is_finite() {
            Ok(n)
        } else {
            Err(EvalError::type_mismatch(format!("{what} must be finite, got {n}")))
        }
    }

    fn eval_in(&self, expr: &Expr, scope: ScopeId, lookup: Lookup) -> Result<Value, EvalError> {
        match &expr.kind {
            ExprKind::Number(n) | ExprKind::Duration(n) => Ok(Value::Number(*n)),
            ExprKind::String(s) => Ok(Value::Str(s.clone())),
            ExprKind::Boolean(b) => Ok(Value::Bool(*b)),
            ExprKind::Array(items) => items
                .iter()
                .map(|item| self.eval_in(item, scope, lookup))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            ExprKind::Object(fields) => {
                let mut object = BTreeMap::new();
                for (key, value) in fields {
                    object.insert(key.clone(), self.eval(value, scope)?);
                }
                Ok(Value::Object(object))
            }
            ExprKind::Identifier(name) => self
                .scopes
                .lookup(scope, name)
                .map(Binding::value)
                .ok_or_else(|| match lookup {
                    Lookup::Value => EvalError::undefined_variable(name),
                    Lookup::Target => EvalError::undefined_element(name),
                }),
            ExprKind::Member { object, property } => {
                let base = self.eval_in(object, scope, lookup)?;
                resolve_member(base, property, &self.store)
            }
            ExprKind::Index { object, index } => {
                let base = self.eval_in(object, scope, lookup)?;
                let index = self.eval_value(index, scope)?;
                resolve_index(base, &index, &self.store)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval_value(operand, scope)?;
                match (op, value) {
                    (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
                    (UnaryOp::Neg, other) => Err(EvalError::type_mismatch(format!(
                        "cannot negate a {}",
                        other.type_name()
                    ))),
                    (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
                }
            }
            ExprKind::Binary { op, left, right } => {
                let l = self.eval_value(left, scope)?;
                match op {
                    BinaryOp::And if !l.is_truthy() => return Ok(Value::Bool(false)),
                    BinaryOp::Or if l.is_truthy() => return Ok(Value::Bool(true)),
                    BinaryOp::And | BinaryOp::Or => {
                        return Ok(Value::Bool(self.eval_value(right, scope)?.is_truthy()))
                    }
                    _ => {}
                }
                let r = self.eval_value(right, scope)?;
                let (l, r) = if matches!(op, BinaryOp::Eq | BinaryOp::NotEq) {
                    (deref_deep(l, &self.store)?, deref_deep(r, &self.store)?)
                } else {
                    (l, r)
                };
                let result = apply_binary(*op, &l, &r)?;
                if let Value::Number(n) = result {
                    if !n.is_finite() && matches!(op, BinaryOp::Div | BinaryOp::Rem) {
                        warn!(line = expr.line, col = expr.col, result = n, "division by zero");
                    }
                }
                Ok(result)
            }
        }
    }
}

/// Value used for an element declared without `= value`.
fn default_element_value(element_type: ElementType) -> Value {
    if element_type.is_sequence() {
        Value::Array(Vec::new())
    } else if element_type == ElementType::Text {
        Value::Str(String::new())
    } else {
        Value::Object(BTreeMap::new())
    }
}

/// A timeline amount: finite, non-negative seconds.
fn seconds(value: &Value, what: &str) -> Result<f64, EvalError> {
    match value {
        Value::Number(n) if n.is_finite() && *n >= 0.0 => Ok(*n),
        Value::Number(n) => Err(EvalError::type_mismatch(format!(
            "{what} must be a finite, non-negative number of seconds, got {n}"
        ))),
        other => Err(EvalError::type_mismatch(format!(
            "{what} must be a number of seconds, found {}",
            other.type_name()
        ))),
    }
}
