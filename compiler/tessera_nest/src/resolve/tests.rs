#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use tessera_backend::{
    ArrayOrigin, Backend, BackendOp, NativeArray, RecordingBackend, SpaceId,
};
use tessera_ir::{
    CaptureArena, ConstantData, DeferredValue, ElementType, Layout, LoopIndex, OpaqueValue,
};

use crate::context::FunctionArgs;
use crate::options::BuildOptions;

use super::*;

fn logic_with(captures: Vec<(&str, Capture)>) -> LogicFunction {
    captures
        .into_iter()
        .fold(LogicFunction::builder("kernel"), |builder, (name, capture)| {
            builder.capture(name, capture)
        })
        .body(|_scope| {})
        .finish()
        .unwrap()
}

fn temp(arena: &mut CaptureArena) -> ArrayHandle {
    ArrayHandle::temporary(arena, ElementType::Float32, Layout::first_major(&[16, 16]))
}

#[test]
fn identity_hit_wins_over_every_other_rule() {
    let mut arena = CaptureArena::new();
    let a = temp(&mut arena);
    let logic = logic_with(vec![("a", Capture::from(&a))]);
    let seeded = NativeValue::Array(NativeArray {
        id: 99,
        element_type: ElementType::Float32,
        origin: ArrayOrigin::Argument,
    });

    let mut backend = RecordingBackend::new();
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), BuildOptions::default());
    ctx.record(a.id(), seeded);
    let replacements = resolve_captures(&logic, &mut ctx).unwrap();
    drop(ctx);

    assert_eq!(replacements.get("a"), Some(&Replacement::Value(seeded)));
    assert_eq!(backend.count(ArrayOrigin::Allocated), 0);
}

#[test]
fn distinct_temporaries_get_distinct_allocations() {
    let mut arena = CaptureArena::new();
    let a = temp(&mut arena);
    let b = temp(&mut arena);
    let logic = logic_with(vec![("a", Capture::from(&a)), ("b", Capture::from(&b))]);

    let mut backend = RecordingBackend::new();
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), BuildOptions::default());
    let replacements = resolve_captures(&logic, &mut ctx).unwrap();
    assert!(ctx.identity_map().contains(a.id()));
    assert!(ctx.identity_map().contains(b.id()));
    drop(ctx);

    assert_ne!(replacements.get("a"), replacements.get("b"));
    assert_eq!(backend.count(ArrayOrigin::Allocated), 2);
}

#[test]
fn same_temporary_under_two_names_allocates_once() {
    let mut arena = CaptureArena::new();
    let a = temp(&mut arena);
    let logic = logic_with(vec![("x", Capture::from(&a)), ("y", Capture::from(&a))]);

    let mut backend = RecordingBackend::new();
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), BuildOptions::default());
    let replacements = resolve_captures(&logic, &mut ctx).unwrap();
    drop(ctx);

    assert_eq!(replacements.get("x"), replacements.get("y"));
    assert_eq!(backend.count(ArrayOrigin::Allocated), 1);
}

#[test]
fn constant_resolves_to_backend_reference() {
    let mut arena = CaptureArena::new();
    let c = ArrayHandle::constant(
        &mut arena,
        ElementType::Int64,
        Layout::first_major(&[2]),
        ConstantData::Int(vec![3, 4]),
    );
    let logic = logic_with(vec![("c", Capture::from(&c))]);

    let mut backend = RecordingBackend::new();
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), BuildOptions::default());
    let replacements = resolve_captures(&logic, &mut ctx).unwrap();
    let recorded = ctx.identity_map().get(c.id());
    drop(ctx);

    let Some(Replacement::Value(value)) = replacements.get("c") else {
        panic!("constant was not resolved");
    };
    assert_eq!(value.as_array().map(|a| a.origin), Some(ArrayOrigin::Constant));
    assert_eq!(recorded, Some(*value));
}

#[test]
fn unseeded_argument_array_is_left_alone() {
    let mut arena = CaptureArena::new();
    let a = ArrayHandle::input_output(&mut arena, ElementType::Float32, Layout::first_major(&[4]));
    let logic = logic_with(vec![("a", Capture::from(&a))]);

    let mut backend = RecordingBackend::new();
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), BuildOptions::default());
    let replacements = resolve_captures(&logic, &mut ctx).unwrap();

    assert!(replacements.is_empty());
    assert!(ctx.identity_map().is_empty());
}

#[test]
fn foreign_index_passes_through() {
    let mut arena = CaptureArena::new();
    let other_nest = arena.alloc_nest();
    let i = LoopIndex::new(&mut arena, other_nest, 0);
    let logic = logic_with(vec![("i", Capture::from(i))]);

    let mut backend = RecordingBackend::new();
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), BuildOptions::default());
    let replacements = resolve_captures(&logic, &mut ctx).unwrap();
    assert!(!replacements.contains("i"));
}

#[test]
fn deferred_resolves_to_integer() {
    let mut arena = CaptureArena::new();
    let n = DeferredValue::parameter(&mut arena, "N");
    n.set(48).unwrap();
    let logic = logic_with(vec![("n", Capture::from(&n))]);

    let mut backend = RecordingBackend::new();
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), BuildOptions::default());
    let replacements = resolve_captures(&logic, &mut ctx).unwrap();
    assert_eq!(
        replacements.get("n"),
        Some(&Replacement::Value(NativeValue::Scalar(ScalarValue::Int(48))))
    );
}

#[test]
fn unbound_deferred_is_unresolvable() {
    let mut arena = CaptureArena::new();
    let n = DeferredValue::parameter(&mut arena, "N");
    let logic = logic_with(vec![("n", Capture::from(&n))]);

    let mut backend = RecordingBackend::new();
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), BuildOptions::default());
    let err = resolve_captures(&logic, &mut ctx).unwrap_err();
    assert!(matches!(err, NestError::UnresolvableDeferred(ref e) if e.name == "N"));
}

#[test]
fn sequence_drops_unmapped_elements_in_order() {
    let mut arena = CaptureArena::new();
    let nest = arena.alloc_nest();
    let i = LoopIndex::new(&mut arena, nest, 0);
    let j = LoopIndex::new(&mut arena, nest, 1);
    let k = LoopIndex::new(&mut arena, nest, 2);
    let logic = logic_with(vec![("idx", Capture::from(vec![i, j, k]))]);

    let mut backend = RecordingBackend::new();
    let space = backend.create_space(&[4, 4, 4]).unwrap();
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), BuildOptions::default());
    ctx.record(i.id(), NativeValue::Index(space.indices[0]));
    ctx.record(k.id(), NativeValue::Index(space.indices[2]));

    let replacements = resolve_captures(&logic, &mut ctx).unwrap();
    assert_eq!(
        replacements.get("idx"),
        Some(&Replacement::Sequence(vec![
            NativeValue::Index(space.indices[0]),
            NativeValue::Index(space.indices[2]),
        ]))
    );
}

#[test]
fn strict_sequences_reject_unmapped_elements() {
    let mut arena = CaptureArena::new();
    let nest = arena.alloc_nest();
    let i = LoopIndex::new(&mut arena, nest, 0);
    let logic = logic_with(vec![("idx", Capture::from(vec![i]))]);

    let mut backend = RecordingBackend::new();
    let options = BuildOptions::default().with_strict_sequences(true);
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), options);
    let err = resolve_captures(&logic, &mut ctx).unwrap_err();
    assert!(matches!(
        err,
        NestError::CaptureResolution { ref capture, .. } if capture == "idx"
    ));
}

#[test]
fn failing_lazy_sequence_propagates() {
    let logic = logic_with(vec![(
        "xs",
        Capture::from(CaptureSeq::lazy(|| Err("iteration failed".to_string()))),
    )]);

    let mut backend = RecordingBackend::new();
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), BuildOptions::default());
    let err = resolve_captures(&logic, &mut ctx).unwrap_err();
    assert_eq!(
        err,
        NestError::CaptureResolution {
            logic: "kernel".to_string(),
            capture: "xs".to_string(),
            reason: "iteration failed".to_string(),
        }
    );
}

#[test]
fn opaque_scalar_is_unsubstituted() {
    let mut arena = CaptureArena::new();
    let s = OpaqueValue::new(&mut arena, ScalarValue::Bool(true));
    let logic = logic_with(vec![("s", Capture::from(s))]);

    let mut backend = RecordingBackend::new();
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), BuildOptions::default());
    let replacements = resolve_captures(&logic, &mut ctx).unwrap();
    assert!(replacements.is_empty());
}

#[test]
fn backend_allocation_failure_propagates() {
    let mut arena = CaptureArena::new();
    let a = temp(&mut arena);
    let logic = logic_with(vec![("a", Capture::from(&a))]);

    let mut backend = RecordingBackend::new();
    backend.reject(BackendOp::Allocate);
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), BuildOptions::default());
    let err = resolve_captures(&logic, &mut ctx).unwrap_err();
    assert!(matches!(err, NestError::Backend(_)));
    assert!(ctx.identity_map().is_empty());
}

#[test]
fn add_iteration_logic_requires_space() {
    let logic = logic_with(vec![]);
    let mut backend = RecordingBackend::new();
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), BuildOptions::default());
    let err = add_iteration_logic(&logic, &LogicOptions::default(), &mut ctx).unwrap_err();
    assert_eq!(err, NestError::MissingSpace);
}

#[test]
fn registered_kernel_runs_body_with_replacements() {
    let mut arena = CaptureArena::new();
    let nest = arena.alloc_nest();
    let i = LoopIndex::new(&mut arena, nest, 0);
    let a = temp(&mut arena);
    let seen = Rc::new(Cell::new(None));
    let sink = Rc::clone(&seen);
    let logic = LogicFunction::builder("store")
        .capture("i", i)
        .capture("a", &a)
        .body(move |scope| sink.set(scope.array("a").zip(scope.index("i"))))
        .finish()
        .unwrap();

    let mut backend = RecordingBackend::new();
    let space = backend.create_space(&[16]).unwrap();
    let mut ctx = BuildContext::new(&mut backend, FunctionArgs::new(), BuildOptions::default());
    ctx.set_space(space.clone());
    ctx.record(i.id(), NativeValue::Index(space.indices[0]));
    add_iteration_logic(&logic, &LogicOptions::default(), &mut ctx).unwrap();
    drop(ctx);

    let recorded = &backend.kernels()[0];
    assert_eq!(recorded.space, SpaceId::new(0));
    assert_eq!(recorded.kernel.name(), "store");
    assert_eq!(recorded.kernel.indices(), &[space.indices[0]]);
    recorded.kernel.invoke();
    let (array, index) = seen.get().unwrap();
    assert_eq!(array.origin, ArrayOrigin::Allocated);
    assert_eq!(index, space.indices[0]);
}
