#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;
use tessera_backend::{BackendOp, RecordingBackend};
use tessera_ir::{CaptureArena, DeferredValue, Dims, Extent};

use crate::logic::LogicFunction;

use super::*;

#[test]
fn host_target_is_default() {
    assert_eq!(Target::default(), Target::HOST);
    assert_eq!(Target::HOST.category, TargetCategory::Cpu);
    let gpu = Target::new("sm_80", TargetCategory::Gpu, 16);
    assert_eq!(gpu.name, "sm_80");
}

#[test]
fn create_plan_uses_requested_target() {
    let mut arena = CaptureArena::new();
    let gpu = Target::new("sm_80", TargetCategory::Gpu, 16);
    let plan = Nest::new(&mut arena, [8_i64]).create_plan(gpu.clone());
    assert_eq!(plan.target(), &gpu);
    assert_eq!(plan.options(), BuildOptions::default());

    let host = Nest::new(&mut arena, [8_i64]).create_host_plan();
    assert_eq!(host.target(), &Target::HOST);
}

#[test]
fn prepare_pass_rebuilds_index_map() {
    let mut arena = CaptureArena::new();
    let n = DeferredValue::parameter(&mut arena, "N");
    let nest = Nest::new(&mut arena, [Extent::from(4_i64), Extent::from(&n)]);
    let indices = nest.indices().into_vec();
    let mut schedule = nest.create_schedule();
    assert_eq!(schedule.extent_of(indices[1]), None);

    n.set(7).unwrap();
    schedule.prepare_pass().unwrap();
    assert_eq!(schedule.dimension_of(indices[1]), Some(1));
    assert_eq!(schedule.extent_of(indices[0]), Some(4));
    assert_eq!(schedule.extent_of(indices[1]), Some(7));

    n.set(9).unwrap();
    schedule.prepare_pass().unwrap();
    assert_eq!(schedule.extent_of(indices[1]), Some(9));
}

#[test]
fn failed_prepare_pass_clears_stale_state() {
    let mut arena = CaptureArena::new();
    let n = DeferredValue::parameter(&mut arena, "N");
    let nest = Nest::new(&mut arena, [&n]);
    let Dims::One(i) = nest.indices() else {
        panic!("expected a bare index");
    };
    let mut schedule = nest.create_schedule();

    n.set(3).unwrap();
    schedule.prepare_pass().unwrap();
    assert_eq!(schedule.extent_of(i), Some(3));

    n.clear();
    assert!(schedule.prepare_pass().is_err());
    assert_eq!(schedule.extent_of(i), None);
}

#[test]
fn lower_reports_what_it_built() {
    let mut arena = CaptureArena::new();
    let mut nest = Nest::new(&mut arena, [2_i64, 3]);
    nest.iteration_logic(LogicFunction::builder("k").body(|_scope| {}).finish().unwrap());
    let mut plan = nest.create_host_plan();

    let mut backend = RecordingBackend::new();
    let lowered = plan
        .lower(&mut backend, FunctionArgs::new(), &Parameters::new())
        .unwrap();

    assert_eq!(lowered.target(), "host");
    assert_eq!(lowered.space().extents.as_slice(), &[2, 3]);
    assert_eq!(lowered.identity_map().len(), 2);
    assert_eq!(lowered.kernel_count(), 1);
    assert_eq!(backend.kernels().len(), 1);
}

#[test]
fn lower_fails_on_unbound_parameter() {
    let mut arena = CaptureArena::new();
    let n = DeferredValue::parameter(&mut arena, "N");
    let mut plan = Nest::new(&mut arena, [&n]).create_host_plan();

    let mut backend = RecordingBackend::new();
    let err = plan
        .lower(&mut backend, FunctionArgs::new(), &Parameters::new())
        .unwrap_err();
    assert!(matches!(err, NestError::UnresolvableDeferred(_)));
    assert!(backend.spaces().is_empty());
}

#[test]
fn parameter_bindings_do_not_outlive_their_pass() {
    let mut arena = CaptureArena::new();
    let n = DeferredValue::parameter(&mut arena, "N");
    let mut plan = Nest::new(&mut arena, [&n]).create_host_plan();
    let mut backend = RecordingBackend::new();

    let first = plan
        .lower(&mut backend, FunctionArgs::new(), &Parameters::new().with(&n, 4))
        .unwrap();
    assert_eq!(first.space().extents.as_slice(), &[4]);
    assert!(n.resolve().is_err());

    let err = plan
        .lower(&mut backend, FunctionArgs::new(), &Parameters::new())
        .unwrap_err();
    assert!(matches!(err, NestError::UnresolvableDeferred(ref e) if e.name == "N"));
    assert_eq!(backend.spaces().len(), 1);
}

#[test]
fn lower_propagates_kernel_rejection() {
    let mut arena = CaptureArena::new();
    let mut nest = Nest::new(&mut arena, [4_i64]);
    nest.iteration_logic(LogicFunction::builder("k").body(|_scope| {}).finish().unwrap());
    let mut plan = nest.create_host_plan();

    let mut backend = RecordingBackend::new();
    backend.reject(BackendOp::AddKernel);
    let err = plan
        .lower(&mut backend, FunctionArgs::new(), &Parameters::new())
        .unwrap_err();
    assert!(matches!(err, NestError::Backend(_)));
}
