//! Deferred integers.
//!
//! A [`DeferredValue`] stands in for an integer that is not known when a nest
//! is declared (typically an extent supplied per lowering pass). It has two
//! sources:
//!
//! - **Parameter**: a slot bound by the caller, usually through [`Parameters`]
//!   right before a pass.
//! - **Derived**: a callback computing the value, usually from other deferred
//!   values (see [`DeferredValue::map`]).
//!
//! Clones share the source, so binding a parameter is visible through every
//! clone captured by a nest or a logic function.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::arena::{CaptureArena, CaptureId, CaptureKind};

/// A deferred value that could not produce an integer.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("deferred value `{name}` could not be resolved: {reason}")]
pub struct DeferredError {
    pub name: String,
    pub reason: String,
}

type DeriveFn = dyn Fn() -> Result<i64, String>;

enum Source {
    Parameter(Cell<Option<i64>>),
    Derived(Box<DeriveFn>),
}

/// Placeholder for an integer resolved on demand.
#[derive(Clone)]
pub struct DeferredValue {
    id: CaptureId,
    name: Rc<str>,
    source: Rc<Source>,
}

impl DeferredValue {
    /// An unbound parameter.
    pub fn parameter(arena: &mut CaptureArena, name: &str) -> Self {
        DeferredValue {
            id: arena.alloc(CaptureKind::Deferred),
            name: Rc::from(name),
            source: Rc::new(Source::Parameter(Cell::new(None))),
        }
    }

    /// A value computed by `derive` each time it is resolved.
    pub fn derived(
        arena: &mut CaptureArena,
        name: &str,
        derive: impl Fn() -> Result<i64, String> + 'static,
    ) -> Self {
        DeferredValue {
            id: arena.alloc(CaptureKind::Deferred),
            name: Rc::from(name),
            source: Rc::new(Source::Derived(Box::new(derive))),
        }
    }

    /// A derived value applying `f` to this one.
    pub fn map(
        &self,
        arena: &mut CaptureArena,
        name: &str,
        f: impl Fn(i64) -> i64 + 'static,
    ) -> Self {
        let base = self.clone();
        Self::derived(arena, name, move || {
            base.resolve().map(&f).map_err(|err| err.to_string())
        })
    }

    #[inline]
    pub fn id(&self) -> CaptureId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` for parameters, which can be bound with [`set`](Self::set).
    pub fn is_parameter(&self) -> bool {
        matches!(*self.source, Source::Parameter(_))
    }

    /// Bind a parameter.
    pub fn set(&self, value: i64) -> Result<(), DeferredError> {
        match &*self.source {
            Source::Parameter(slot) => {
                slot.set(Some(value));
                Ok(())
            }
            Source::Derived(_) => Err(self.error("derived values cannot be bound")),
        }
    }

    /// Unbind a parameter. No-op for derived values.
    pub fn clear(&self) {
        if let Source::Parameter(slot) = &*self.source {
            slot.set(None);
        }
    }

    /// Resolve to a concrete integer.
    pub fn resolve(&self) -> Result<i64, DeferredError> {
        match &*self.source {
            Source::Parameter(slot) => slot.get().ok_or_else(|| self.error("parameter is unbound")),
            Source::Derived(derive) => derive().map_err(|reason| self.error(&reason)),
        }
    }

    fn error(&self, reason: &str) -> DeferredError {
        DeferredError {
            name: self.name.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Debug for DeferredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.source {
            Source::Parameter(slot) => match slot.get() {
                Some(value) => format!("= {value}"),
                None => "unbound".to_string(),
            },
            Source::Derived(_) => "derived".to_string(),
        };
        write!(f, "DeferredValue({}, {:?}, {state})", self.name, self.id)
    }
}

/// An ordered set of parameter bindings for one lowering pass.
///
/// Binding the same parameter twice replaces the earlier value.
#[derive(Clone, Debug, Default)]
pub struct Parameters {
    bindings: Vec<(DeferredValue, i64)>,
    positions: FxHashMap<CaptureId, usize>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a binding.
    #[must_use]
    pub fn with(mut self, parameter: &DeferredValue, value: i64) -> Self {
        self.bind(parameter, value);
        self
    }

    /// Add or replace a binding.
    pub fn bind(&mut self, parameter: &DeferredValue, value: i64) {
        if let Some(&pos) = self.positions.get(&parameter.id()) {
            self.bindings[pos].1 = value;
        } else {
            self.positions.insert(parameter.id(), self.bindings.len());
            self.bindings.push((parameter.clone(), value));
        }
    }

    /// Look up the value bound to `parameter`.
    pub fn get(&self, parameter: &DeferredValue) -> Option<i64> {
        self.positions
            .get(&parameter.id())
            .map(|&pos| self.bindings[pos].1)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bind every parameter.
    ///
    /// All-or-nothing: if any binding targets a derived value, nothing is
    /// written.
    pub fn apply(&self) -> Result<(), DeferredError> {
        if let Some((derived, _)) = self.bindings.iter().find(|(p, _)| !p.is_parameter()) {
            return Err(derived.error("derived values cannot be bound"));
        }
        for (parameter, value) in &self.bindings {
            parameter.set(*value)?;
        }
        Ok(())
    }

    /// Unbind every parameter this set binds.
    pub fn release(&self) {
        for (parameter, _) in &self.bindings {
            parameter.clear();
        }
    }
}
