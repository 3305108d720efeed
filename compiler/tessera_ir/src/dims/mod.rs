//! Per-dimension values with 1-D unwrapping.

use std::fmt;

use crate::deferred::DeferredValue;

/// One value per dimension of an iteration space.
///
/// A 1-dimensional space yields the bare value rather than a length-1
/// sequence, so `let i = nest.indices().one()` reads naturally while
/// `let [i, j] = ...` style destructuring works for higher ranks.
#[derive(Clone, Debug, PartialEq)]
pub enum Dims<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Dims<T> {
    /// Build from per-dimension values, unwrapping the 1-D case.
    pub fn from_vec(mut values: Vec<T>) -> Self {
        if values.len() == 1 {
            if let Some(only) = values.pop() {
                return Dims::One(only);
            }
        }
        Dims::Many(values)
    }

    /// Number of dimensions.
    pub fn len(&self) -> usize {
        match self {
            Dims::One(_) => 1,
            Dims::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bare value of a 1-D space.
    pub fn one(self) -> Option<T> {
        match self {
            Dims::One(value) => Some(value),
            Dims::Many(_) => None,
        }
    }

    /// The values of a multi-dimensional space.
    pub fn many(self) -> Option<Vec<T>> {
        match self {
            Dims::One(_) => None,
            Dims::Many(values) => Some(values),
        }
    }

    /// Per-dimension values regardless of rank.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Dims::One(value) => vec![value],
            Dims::Many(values) => values,
        }
    }
}

/// Extent of one dimension: concrete, or deferred until lowering.
#[derive(Clone)]
pub enum Extent {
    Fixed(i64),
    Deferred(DeferredValue),
}

impl Extent {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Extent::Deferred(_))
    }
}

impl From<i64> for Extent {
    fn from(value: i64) -> Self {
        Extent::Fixed(value)
    }
}

impl From<DeferredValue> for Extent {
    fn from(value: DeferredValue) -> Self {
        Extent::Deferred(value)
    }
}

impl From<&DeferredValue> for Extent {
    fn from(value: &DeferredValue) -> Self {
        Extent::Deferred(value.clone())
    }
}

/// Fixed extents compare by value, deferred ones by identity.
impl PartialEq for Extent {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Extent::Fixed(a), Extent::Fixed(b)) => a == b,
            (Extent::Deferred(a), Extent::Deferred(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl fmt::Debug for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extent::Fixed(value) => write!(f, "{value}"),
            Extent::Deferred(value) => write!(f, "?{}", value.name()),
        }
    }
}
