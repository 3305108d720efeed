//! Logic functions: kernel bodies plus the values they capture.
//!
//! A [`LogicFunction`] is immutable once built. It is resolved against a new
//! [`BuildContext`](crate::BuildContext) on every lowering pass; the resulting
//! [`Replacements`] belong to that pass only and are never cached on the
//! function.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tessera_backend::{NativeArray, NativeIndex, NativeValue};
use tessera_ir::{Capture, Placement, Predicate, ScalarValue};

use crate::error::NestError;

type BodyFn = dyn Fn(&KernelScope<'_>);

/// Backend-ready value substituted for one capture.
#[derive(Clone, Debug, PartialEq)]
pub enum Replacement {
    Value(NativeValue),
    /// Resolved elements of a sequence capture, in original relative order.
    Sequence(Vec<NativeValue>),
}

/// Substitutions computed for one logic function in one pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Replacements {
    entries: FxHashMap<String, Replacement>,
}

impl Replacements {
    pub fn get(&self, name: &str) -> Option<&Replacement> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, name: &str, replacement: Replacement) {
        self.entries.insert(name.to_string(), replacement);
    }
}

/// What a kernel body sees for one capture name.
#[derive(Copy, Clone, Debug)]
pub enum Binding<'a> {
    /// The capture was substituted for this pass.
    Resolved(&'a Replacement),
    /// The capture is passed through with its original value.
    Captured(&'a Capture),
}

/// Name-based view of a logic function's captures, handed to its body.
pub struct KernelScope<'a> {
    logic: &'a LogicFunction,
    replacements: &'a Replacements,
}

impl<'a> KernelScope<'a> {
    /// The binding for `name`: the replacement if one exists, else the
    /// original capture.
    pub fn get(&self, name: &str) -> Option<Binding<'a>> {
        if let Some(replacement) = self.replacements.get(name) {
            return Some(Binding::Resolved(replacement));
        }
        self.logic.capture(name).map(Binding::Captured)
    }

    /// The native array substituted for `name`.
    pub fn array(&self, name: &str) -> Option<NativeArray> {
        match self.replacements.get(name)? {
            Replacement::Value(value) => value.as_array(),
            Replacement::Sequence(_) => None,
        }
    }

    /// The native index substituted for `name`.
    pub fn index(&self, name: &str) -> Option<NativeIndex> {
        match self.replacements.get(name)? {
            Replacement::Value(value) => value.as_index(),
            Replacement::Sequence(_) => None,
        }
    }

    /// The integer substituted for `name` (a resolved deferred value or an
    /// integer argument).
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.replacements.get(name)? {
            Replacement::Value(NativeValue::Scalar(ScalarValue::Int(value))) => Some(*value),
            _ => None,
        }
    }

    /// The resolved elements of a sequence capture.
    pub fn sequence(&self, name: &str) -> Option<&'a [NativeValue]> {
        match self.replacements.get(name)? {
            Replacement::Sequence(values) => Some(values.as_slice()),
            Replacement::Value(_) => None,
        }
    }
}

/// Scheduling metadata attached with a logic function.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogicOptions {
    pub predicate: Option<Predicate>,
    pub placement: Option<Placement>,
}

impl LogicOptions {
    #[must_use]
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }
}

/// A kernel body and the named values it closes over.
///
/// Cheap to clone: clones share the body and captures.
#[derive(Clone)]
pub struct LogicFunction {
    name: Rc<str>,
    captures: Rc<[(String, Capture)]>,
    body: Rc<BodyFn>,
}

impl LogicFunction {
    /// Start building a logic function.
    pub fn builder(name: impl Into<String>) -> LogicBuilder {
        LogicBuilder {
            name: name.into(),
            captures: Vec::new(),
            body: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Captures in declaration order.
    pub fn captures(&self) -> &[(String, Capture)] {
        &self.captures
    }

    pub fn capture(&self, name: &str) -> Option<&Capture> {
        self.captures
            .iter()
            .find(|(capture_name, _)| capture_name == name)
            .map(|(_, capture)| capture)
    }

    /// Run the body with `replacements` substituted. Captures without a
    /// replacement keep their original value.
    pub fn invoke(&self, replacements: &Replacements) {
        let scope = KernelScope {
            logic: self,
            replacements,
        };
        (self.body)(&scope);
    }
}

impl fmt::Debug for LogicFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicFunction")
            .field("name", &self.name)
            .field("captures", &self.captures)
            .finish_non_exhaustive()
    }
}

/// Builder for [`LogicFunction`].
pub struct LogicBuilder {
    name: String,
    captures: Vec<(String, Capture)>,
    body: Option<Rc<BodyFn>>,
}

impl LogicBuilder {
    /// Capture `value` under `name`.
    #[must_use]
    pub fn capture(mut self, name: impl Into<String>, value: impl Into<Capture>) -> Self {
        self.captures.push((name.into(), value.into()));
        self
    }

    /// Set the body.
    #[must_use]
    pub fn body(mut self, body: impl Fn(&KernelScope<'_>) + 'static) -> Self {
        self.body = Some(Rc::new(body));
        self
    }

    /// Validate and build.
    pub fn finish(self) -> Result<LogicFunction, NestError> {
        let invalid = |reason: String| NestError::InvalidLogic {
            name: self.name.clone(),
            reason,
        };

        if !is_identifier(&self.name) {
            return Err(invalid("name is not an identifier".to_string()));
        }
        for (pos, (name, _)) in self.captures.iter().enumerate() {
            if !is_identifier(name) {
                return Err(invalid(format!("capture name `{name}` is not an identifier")));
            }
            if self.captures[..pos].iter().any(|(earlier, _)| earlier == name) {
                return Err(invalid(format!("capture `{name}` is declared twice")));
            }
        }
        let Some(body) = self.body.clone() else {
            return Err(invalid("no body".to_string()));
        };

        Ok(LogicFunction {
            name: Rc::from(self.name.as_str()),
            captures: Rc::from(self.captures),
            body,
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
