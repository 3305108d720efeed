use pretty_assertions::assert_eq;

use super::*;

#[test]
fn alloc_issues_distinct_tokens() {
    let mut arena = CaptureArena::new();
    let a = arena.alloc(CaptureKind::Array);
    let b = arena.alloc(CaptureKind::Array);
    assert_ne!(a, b);
    assert_eq!(arena.len(), 2);
}

#[test]
fn kind_is_recorded_per_token() {
    let mut arena = CaptureArena::new();
    let idx = arena.alloc(CaptureKind::Index);
    let deferred = arena.alloc(CaptureKind::Deferred);
    assert_eq!(arena.kind(idx), Some(CaptureKind::Index));
    assert_eq!(arena.kind(deferred), Some(CaptureKind::Deferred));
    assert_eq!(arena.kind(CaptureId::from_raw(99)), None);
}

#[test]
fn nest_tokens_are_independent_of_capture_tokens() {
    let mut arena = CaptureArena::new();
    let n0 = arena.alloc_nest();
    let n1 = arena.alloc_nest();
    assert_ne!(n0, n1);
    assert!(arena.is_empty());
}

#[test]
fn debug_format() {
    assert_eq!(format!("{:?}", CaptureId::from_raw(7)), "CaptureId(7)");
}
