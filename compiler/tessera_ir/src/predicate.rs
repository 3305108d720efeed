//! Kernel predicates and placement directives.
//!
//! Both are metadata for the backend's scheduler. Nest construction passes
//! them through unchanged.

use crate::index::LoopIndex;

/// Condition on the iteration point under which a kernel runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// First iteration of the index.
    First(LoopIndex),
    /// Last iteration of the index.
    Last(LoopIndex),
    /// The index equals a value.
    Equals(LoopIndex, i64),
    /// The index lies in `[start, end)`.
    Range { index: LoopIndex, start: i64, end: i64 },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    #[must_use]
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Every index the predicate mentions, in first-seen order.
    pub fn indices(&self) -> Vec<LoopIndex> {
        let mut out = Vec::new();
        self.collect_indices(&mut out);
        out
    }

    fn collect_indices(&self, out: &mut Vec<LoopIndex>) {
        match self {
            Predicate::First(index)
            | Predicate::Last(index)
            | Predicate::Equals(index, _)
            | Predicate::Range { index, .. } => {
                if !out.contains(index) {
                    out.push(*index);
                }
            }
            Predicate::And(lhs, rhs) | Predicate::Or(lhs, rhs) => {
                lhs.collect_indices(out);
                rhs.collect_indices(out);
            }
            Predicate::Not(inner) => inner.collect_indices(out),
        }
    }
}

/// Where a kernel is emitted relative to a loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Before the loop over the index begins.
    Before(LoopIndex),
    /// After the loop over the index ends.
    After(LoopIndex),
}

impl Placement {
    pub fn index(self) -> LoopIndex {
        match self {
            Placement::Before(index) | Placement::After(index) => index,
        }
    }
}
