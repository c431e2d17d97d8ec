//! Element store and target resolution.
//!
//! Elements are owned by the scene being compiled. Member and index accessors
//! applied to an element produce deeper [`ElementRef`]s so that `a[0]` can be
//! animated as a target; applied to plain values they produce values.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{EvalError, EvalErrorKind};
use super::value::{ElementId, ElementRef, PathSegment, Value};
use crate::dsl::ast::ElementType;

/// Caller-supplied mapping from declaration names to existing element ids,
/// used when recompiling against live canvas state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementBindings {
    elements: BTreeMap<String, ElementId>,
}

impl ElementBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, id: ElementId) {
        self.elements.insert(name.into(), id);
    }

    pub fn get(&self, name: &str) -> Option<ElementId> {
        self.elements.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn ids(&self) -> BTreeSet<ElementId> {
        self.elements.values().copied().collect()
    }
}

impl FromIterator<(String, ElementId)> for ElementBindings {
    fn from_iter<I: IntoIterator<Item = (String, ElementId)>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

/// A scene element materialized by a declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    pub element_type: ElementType,
    /// Data after every state-changing command has been applied.
    pub value: Value,
    pub position: Option<(f64, f64)>,
    pub line: usize,
}

/// Per-compilation table of declared elements.
#[derive(Debug)]
pub struct ElementStore {
    elements: BTreeMap<ElementId, Element>,
    /// Ids held by bindings; fresh allocations never take them.
    reserved: BTreeSet<ElementId>,
    next_id: u32,
    used_bindings: BTreeSet<String>,
}

impl ElementStore {
    pub fn new(bindings: &ElementBindings) -> Self {
        let reserved = bindings.ids();
        // Fresh ids follow the highest bound id, wrapping to 0 past u32::MAX.
        let next_id = reserved
            .last()
            .map_or(0, |id| id.0.checked_add(1).unwrap_or(0));
        Self {
            elements: BTreeMap::new(),
            reserved,
            next_id,
            used_bindings: BTreeSet::new(),
        }
    }

    /// Materialize an element, reusing the bound id for the first declaration
    /// of a bound name and allocating a fresh id otherwise.
    pub fn declare(
        &mut self,
        bindings: &ElementBindings,
        name: &str,
        element_type: ElementType,
        value: Value,
        position: Option<(f64, f64)>,
        line: usize,
    ) -> Result<ElementRef, EvalError> {
        let bound = bindings
            .get(name)
            .filter(|id| !self.elements.contains_key(id) && !self.used_bindings.contains(name));

        let id = match bound {
            Some(id) => {
                self.used_bindings.insert(name.to_string());
                id
            }
            None => self.fresh_id()?,
        };

        debug!(name, id = id.0, %element_type, reused = bound.is_some(), "declare element");

        self.elements.insert(
            id,
            Element {
                id,
                name: name.to_string(),
                element_type,
                value,
                position,
                line,
            },
        );
        Ok(ElementRef::whole(id, name))
    }

    /// First id at or after `next_id` that is neither bound nor in use.
    fn fresh_id(&mut self) -> Result<ElementId, EvalError> {
        let start = self.next_id;
        let mut candidate = start;
        loop {
            let id = ElementId(candidate);
            candidate = candidate.wrapping_add(1);
            if !self.reserved.contains(&id) && !self.elements.contains_key(&id) {
                self.next_id = candidate;
                return Ok(id);
            }
            if candidate == start {
                return Err(EvalError::new(
                    EvalErrorKind::IndexOutOfRange,
                    "no element ids left to allocate",
                ));
            }
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Current value at the referenced path.
    pub fn get(&self, r: &ElementRef) -> Result<&Value, EvalError> {
        let element = self
            .elements
            .get(&r.id)
            .ok_or_else(|| EvalError::undefined_element(&r.name))?;
        value_at(&element.value, &r.path)
    }

    /// Overwrite the value at the referenced path. A final property segment
    /// may create a new key on an object.
    pub fn set(&mut self, r: &ElementRef, value: Value) -> Result<(), EvalError> {
        let element = self
            .elements
            .get_mut(&r.id)
            .ok_or_else(|| EvalError::undefined_element(&r.name))?;
        assign_into(&mut element.value, &r.path, value)
    }

    /// Exchange the values at two references.
    pub fn swap(&mut self, a: &ElementRef, b: &ElementRef) -> Result<(), EvalError> {
        let va = self.get(a)?.clone();
        let vb = self.get(b)?.clone();
        self.set(a, vb)?;
        self.set(b, va)
    }

    pub fn push(&mut self, r: &ElementRef, value: Value) -> Result<(), EvalError> {
        let mut current = self.get(r)?.clone();
        match &mut current {
            Value::Array(items) => items.push(value),
            other => {
                return Err(EvalError::type_mismatch(format!(
                    "cannot push onto {r}: it holds a {}",
                    other.type_name()
                )))
            }
        }
        self.set(r, current)
    }

    pub fn pop(&mut self, r: &ElementRef) -> Result<Value, EvalError> {
        let mut current = self.get(r)?.clone();
        let popped = match &mut current {
            Value::Array(items) => items.pop().ok_or_else(|| EvalError::index_out_of_range(0, 0))?,
            other => {
                return Err(EvalError::type_mismatch(format!(
                    "cannot pop from {r}: it holds a {}",
                    other.type_name()
                )))
            }
        };
        self.set(r, current)?;
        Ok(popped)
    }

    /// All elements, ordered by id.
    pub fn into_elements(self) -> Vec<Element> {
        self.elements.into_values().collect()
    }
}

/// Follow `path` inside `value`.
pub fn value_at<'v>(value: &'v Value, path: &[PathSegment]) -> Result<&'v Value, EvalError> {
    let mut current = value;
    for segment in path {
        current = match (segment, current) {
            (PathSegment::Index(i), Value::Array(items)) => items
                .get(*i)
                .ok_or_else(|| EvalError::index_out_of_range(*i, items.len()))?,
            (PathSegment::Property(key), Value::Object(fields)) => fields
                .get(key)
                .ok_or_else(|| EvalError::undefined_property(key, "object"))?,
            (PathSegment::Index(_), other) => {
                return Err(EvalError::type_mismatch(format!(
                    "cannot index a {}",
                    other.type_name()
                )))
            }
            (PathSegment::Property(key), other) => {
                return Err(EvalError::undefined_property(key, other.type_name()))
            }
        };
    }
    Ok(current)
}

/// Write `new` at `path` inside `value`.
pub fn assign_into(value: &mut Value, path: &[PathSegment], new: Value) -> Result<(), EvalError> {
    let Some((segment, rest)) = path.split_first() else {
        *value = new;
        return Ok(());
    };
    match (segment, value) {
        (PathSegment::Index(i), Value::Array(items)) => {
            let len = items.len();
            let slot = items
                .get_mut(*i)
                .ok_or_else(|| EvalError::index_out_of_range(*i, len))?;
            assign_into(slot, rest, new)
        }
        (PathSegment::Property(key), Value::Object(fields)) => {
            if rest.is_empty() {
                fields.insert(key.clone(), new);
                Ok(())
            } else {
                let slot = fields
                    .get_mut(key)
                    .ok_or_else(|| EvalError::undefined_property(key, "object"))?;
                assign_into(slot, rest, new)
            }
        }
        (PathSegment::Index(_), other) => Err(EvalError::type_mismatch(format!(
            "cannot index a {}",
            other.type_name()
        ))),
        (PathSegment::Property(key), other) => {
            Err(EvalError::undefined_property(key, other.type_name()))
        }
    }
}

/// Convert an evaluated index to a position: must be a non-negative integer.
pub fn index_of(index: &Value) -> Result<usize, EvalError> {
    let Value::Number(n) = index else {
        return Err(EvalError::type_mismatch(format!(
            "index must be a number, found {}",
            index.type_name()
        )));
    };
    if !n.is_finite() || n.fract() != 0.0 {
        return Err(EvalError::type_mismatch(format!(
            "index must be an integer, found {n}"
        )));
    }
    if *n < 0.0 {
        return Err(EvalError::new(
            EvalErrorKind::IndexOutOfRange,
            format!("negative index {n}"),
        ));
    }
    Ok(*n as usize)
}

/// Replace an element reference by the value it currently points at.
pub fn deref(value: Value, store: &ElementStore) -> Result<Value, EvalError> {
    match value {
        Value::Element(r) => Ok(store.get(&r)?.clone()),
        other => Ok(other),
    }
}

/// Nesting limit for [`deref_deep`]; deeper values are treated as cyclic.
const MAX_DEREF_DEPTH: usize = 64;

/// Replace every element reference inside `value`, at any depth, by the
/// value it points at.
pub fn deref_deep(value: Value, store: &ElementStore) -> Result<Value, EvalError> {
    deref_at_depth(value, store, 0)
}

fn deref_at_depth(value: Value, store: &ElementStore, depth: usize) -> Result<Value, EvalError> {
    if depth > MAX_DEREF_DEPTH {
        return Err(EvalError::type_mismatch(
            "value nests too deeply to compare (cyclic element reference?)",
        ));
    }
    match value {
        Value::Element(r) => deref_at_depth(store.get(&r)?.clone(), store, depth + 1),
        Value::Array(items) => items
            .into_iter()
            .map(|item| deref_at_depth(item, store, depth + 1))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(fields) => fields
            .into_iter()
            .map(|(k, v)| Ok::<_, EvalError>((k, deref_at_depth(v, store, depth + 1)?)))
            .collect::<Result<_, EvalError>>()
            .map(Value::Object),
        other => Ok(other),
    }
}

/// Resolve `base[index]`.
pub fn resolve_index(base: Value, index: &Value, store: &ElementStore) -> Result<Value, EvalError> {
    let i = index_of(index)?;
    match base {
        Value::Element(r) => match store.get(&r)? {
            Value::Array(items) => {
                if i >= items.len() {
                    return Err(EvalError::index_out_of_range(i, items.len()));
                }
                Ok(Value::Element(r.child(PathSegment::Index(i))))
            }
            Value::Str(s) => char_at(s, i),
            other => Err(EvalError::type_mismatch(format!(
                "cannot index {r}: it holds a {}",
                other.type_name()
            ))),
        },
        Value::Array(items) => {
            let len = items.len();
            items
                .into_iter()
                .nth(i)
                .ok_or_else(|| EvalError::index_out_of_range(i, len))
        }
        Value::Str(s) => char_at(&s, i),
        other => Err(EvalError::type_mismatch(format!(
            "cannot index a {}",
            other.type_name()
        ))),
    }
}

fn char_at(s: &str, i: usize) -> Result<Value, EvalError> {
    s.chars()
        .nth(i)
        .map(|c| Value::Str(c.to_string()))
        .ok_or_else(|| EvalError::index_out_of_range(i, s.chars().count()))
}

/// Resolve `base.property`.
pub fn resolve_member(base: Value, property: &str, store: &ElementStore) -> Result<Value, EvalError> {
    match base {
        Value::Element(r) => {
            let current = store.get(&r)?;
            if let Value::Object(fields) = current {
                if fields.contains_key(property) {
                    return Ok(Value::Element(r.child(PathSegment::Property(property.to_string()))));
                }
            }
            if let Some(v) = builtin_property(current, property) {
                return Ok(v);
            }
            if property == "value" {
                return Ok(current.clone());
            }
            if r.path.is_empty() {
                if let Some((x, y)) = store.element(r.id).and_then(|e| e.position) {
                    match property {
                        "x" => return Ok(Value::Number(x)),
                        "y" => return Ok(Value::Number(y)),
                        _ => {}
                    }
                }
            }
            Err(EvalError::undefined_property(property, &format!("element {r}")))
        }
        Value::Object(mut fields) => match fields.remove(property) {
            Some(v) => Ok(v),
            None => Err(EvalError::undefined_property(property, "object")),
        },
        other => builtin_property(&other, property)
            .ok_or_else(|| EvalError::undefined_property(property, other.type_name())),
    }
}

fn builtin_property(value: &Value, property: &str) -> Option<Value> {
    match (value, property) {
        (Value::Array(items), "length") => Some(Value::Number(items.len() as f64)),
        (Value::Str(s), "length") => Some(Value::Number(s.chars().count() as f64)),
        _ => None,
    }
}

/// Turn an evaluated target expression into element references: an element
/// yields itself, an array of elements yields each of them.
pub fn resolve_targets(value: Value, store: &ElementStore, out: &mut Vec<ElementRef>) -> Result<(), EvalError> {
    match value {
        Value::Element(r) => {
            store.get(&r)?;
            out.push(r);
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Element(_) => resolve_targets(item, store, out)?,
                    other => {
                        return Err(EvalError::type_mismatch(format!(
                            "animation target must be an element, found {}",
                            other.type_name()
                        )))
                    }
                }
            }
            Ok(())
        }
        other => Err(EvalError::type_mismatch(format!(
            "animation target must be an element, found {}",
            other.type_name()
        ))),
    }
}
