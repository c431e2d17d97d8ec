//! Runtime values of the evaluator.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::EvalError;
use crate::dsl::ast::BinaryOp;

/// Identifies a scene element within one compiled scene.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ElementId(pub u32);

/// One step from an element's root value toward a nested cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Property(String),
}

/// Handle to a scene element, or to a cell/property inside one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementRef {
    pub id: ElementId,
    pub name: String,
    pub path: Vec<PathSegment>,
}

impl ElementRef {
    pub fn whole(id: ElementId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            path: Vec::new(),
        }
    }

    /// A reference one segment deeper than `self`.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut path = self.path.clone();
        path.push(segment);
        Self {
            id: self.id,
            name: self.name.clone(),
            path,
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for segment in &self.path {
            match segment {
                PathSegment::Index(i) => write!(f, "[{i}]")?,
                PathSegment::Property(p) => write!(f, ".{p}")?,
            }
        }
        Ok(())
    }
}

/// A dynamically typed DSL value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Element(ElementRef),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Element(_) => "element",
        }
    }

    /// `false`, `0`, NaN and `""` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Element(_) => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(fields) => {
                f.write_str("{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Element(r) => write!(f, "{r}"),
        }
    }
}

/// Apply a non-short-circuit binary operator to two dereferenced operands.
pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = compare(op, left, right)?;
            let result = match op {
                BinaryOp::Lt => ordering == Some(Ordering::Less),
                BinaryOp::LtEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                BinaryOp::Gt => ordering == Some(Ordering::Greater),
                _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::Str(format!("{left}{right}"))),
            _ => Err(operand_mismatch(op, left, right)),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (Value::Number(a), Value::Number(b)) = (left, right) else {
                return Err(operand_mismatch(op, left, right));
            };
            let result = match op {
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            };
            Ok(Value::Number(result))
        }
        BinaryOp::And | BinaryOp::Or => Err(EvalError::type_mismatch(format!(
            "`{}` must be evaluated with short-circuiting",
            op.symbol()
        ))),
    }
}

/// Numbers compare numerically, strings lexicographically. NaN is unordered.
fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Option<Ordering>, EvalError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        _ => Err(operand_mismatch(op, left, right)),
    }
}

fn operand_mismatch(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::type_mismatch(format!(
        "cannot apply `{}` to {} and {}",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}
