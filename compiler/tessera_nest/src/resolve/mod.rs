//! Capture resolution.
//!
//! Turns a [`LogicFunction`]'s captures into backend values for one pass.
//! Rules, in order, for a capture `v` under name `k`:
//!
//! 1. `v`'s identity is in the identity map: use the mapped value.
//! 2. `v` is an array:
//!    - temporary: allocate, record under `v`'s identity, use it;
//!    - constant: resolve the data, record, use it;
//!    - argument roles: leave unresolved (arguments are seeded before any
//!      command replays, so rule 1 already had its chance).
//! 3. `v` is a loop index: leave unresolved. Indices of the nest being built
//!    were seeded; one that was not belongs to another nest and passes
//!    through untouched.
//! 4. `v` is deferred: use its resolved integer.
//! 5. `v` is a sequence: look each element up by identity, keep the ones
//!    found (in order) and drop the rest. Opaque scalars stay unresolved.

use tessera_backend::{Kernel, NativeIndex, NativeValue};
use tessera_ir::{ArrayHandle, ArrayRole, Capture, CaptureSeq, ScalarValue};

use crate::context::BuildContext;
use crate::error::NestError;
use crate::logic::{LogicFunction, LogicOptions, Replacement, Replacements};

/// Resolve every capture of `logic` against `ctx`.
///
/// Temporaries and constants materialized here are recorded in the context's
/// identity map, so a second capture of the same handle (in this or a later
/// command of the same pass) reuses the first backend value.
pub fn resolve_captures(
    logic: &LogicFunction,
    ctx: &mut BuildContext<'_>,
) -> Result<Replacements, NestError> {
    let mut replacements = Replacements::default();
    for (name, capture) in logic.captures() {
        if let Some(replacement) = resolve_one(logic, name, capture, ctx)? {
            replacements.insert(name, replacement);
        }
    }
    Ok(replacements)
}

fn resolve_one(
    logic: &LogicFunction,
    name: &str,
    capture: &Capture,
    ctx: &mut BuildContext<'_>,
) -> Result<Option<Replacement>, NestError> {
    if let Some(value) = capture.identity().and_then(|id| ctx.lookup(id)) {
        tracing::trace!(logic = logic.name(), capture = name, ?value, "identity hit");
        return Ok(Some(Replacement::Value(value)));
    }

    match capture {
        Capture::Array(array) => resolve_array(logic, name, array, ctx),
        Capture::Index(index) => {
            tracing::debug!(
                logic = logic.name(),
                capture = name,
                ?index,
                "index of another nest passed through"
            );
            Ok(None)
        }
        Capture::Deferred(value) => {
            let resolved = value.resolve()?;
            Ok(Some(Replacement::Value(NativeValue::Scalar(
                ScalarValue::Int(resolved),
            ))))
        }
        Capture::Sequence(seq) => resolve_sequence(logic, name, seq, ctx).map(Some),
        Capture::Opaque(_) => Ok(None),
    }
}

fn resolve_array(
    logic: &LogicFunction,
    name: &str,
    array: &ArrayHandle,
    ctx: &mut BuildContext<'_>,
) -> Result<Option<Replacement>, NestError> {
    if array.role().is_argument() {
        tracing::debug!(
            logic = logic.name(),
            capture = name,
            id = ?array.id(),
            "argument array not seeded; left unresolved"
        );
        return Ok(None);
    }
    let native = if array.role() == ArrayRole::Temporary {
        ctx.allocate(array.element_type(), array.layout())?
    } else {
        let data = array.data().ok_or_else(|| NestError::CaptureResolution {
            logic: logic.name().to_string(),
            capture: name.to_string(),
            reason: "constant array carries no data".to_string(),
        })?;
        ctx.resolve_constant(array.element_type(), array.layout(), data)?
    };
    tracing::debug!(
        logic = logic.name(),
        capture = name,
        role = ?array.role(),
        native = native.id,
        "materialized array"
    );
    let value = NativeValue::Array(native);
    ctx.record(array.id(), value);
    Ok(Some(Replacement::Value(value)))
}

fn resolve_sequence(
    logic: &LogicFunction,
    name: &str,
    seq: &CaptureSeq,
    ctx: &BuildContext<'_>,
) -> Result<Replacement, NestError> {
    let failure = |reason: String| NestError::CaptureResolution {
        logic: logic.name().to_string(),
        capture: name.to_string(),
        reason,
    };

    let elements = seq.elements().map_err(&failure)?;
    let mut resolved = Vec::with_capacity(elements.len());
    for (position, element) in elements.iter().enumerate() {
        match element.identity().and_then(|id| ctx.lookup(id)) {
            Some(value) => resolved.push(value),
            None if ctx.options().strict_sequences => {
                return Err(failure(format!(
                    "element {position} ({}) has no backend value",
                    element.kind_name()
                )));
            }
            None => {
                tracing::debug!(
                    logic = logic.name(),
                    capture = name,
                    position,
                    kind = element.kind_name(),
                    "dropped unmapped sequence element"
                );
            }
        }
    }
    Ok(Replacement::Sequence(resolved))
}

/// Resolve `logic`'s captures and register the adapted kernel in the
/// context's native space.
pub(crate) fn add_iteration_logic(
    logic: &LogicFunction,
    options: &LogicOptions,
    ctx: &mut BuildContext<'_>,
) -> Result<(), NestError> {
    let space = ctx.space().cloned().ok_or(NestError::MissingSpace)?;
    let replacements = resolve_captures(logic, ctx)?;
    let indices = used_indices(logic, &replacements);

    tracing::debug!(
        logic = logic.name(),
        indices = %indices
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
        "detected logic function index usage"
    );

    let body = logic.clone();
    let kernel = Kernel::new(logic.name(), indices, move || body.invoke(&replacements));
    ctx.backend()
        .add_kernel(&space, kernel, options.predicate.clone(), options.placement)?;
    Ok(())
}

/// Native indices referenced by the replacements, in capture order.
fn used_indices(logic: &LogicFunction, replacements: &Replacements) -> Vec<NativeIndex> {
    let mut indices = Vec::new();
    let mut push = |value: &NativeValue| {
        if let Some(index) = value.as_index() {
            if !indices.contains(&index) {
                indices.push(index);
            }
        }
    };
    for (name, _) in logic.captures() {
        match replacements.get(name) {
            Some(Replacement::Value(value)) => push(value),
            Some(Replacement::Sequence(values)) => values.iter().for_each(&mut push),
            None => {}
        }
    }
    indices
}

#[cfg(test)]
mod tests;
