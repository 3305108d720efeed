//! Kernels registered with a backend.

use std::fmt;
use std::rc::Rc;

use crate::native::NativeIndex;

/// A named, zero-argument kernel body ready for emission.
///
/// The body already carries its substituted captures; the backend invokes it
/// while emitting the innermost loop of a space.
#[derive(Clone)]
pub struct Kernel {
    name: String,
    indices: Vec<NativeIndex>,
    body: Rc<dyn Fn()>,
}

impl Kernel {
    /// Create a kernel. `indices` are the native indices the body refers to.
    pub fn new(
        name: impl Into<String>,
        indices: Vec<NativeIndex>,
        body: impl Fn() + 'static,
    ) -> Self {
        Kernel {
            name: name.into(),
            indices,
            body: Rc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native indices used by the body, in capture order.
    pub fn indices(&self) -> &[NativeIndex] {
        &self.indices
    }

    /// Run the body.
    pub fn invoke(&self) {
        (self.body)();
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("name", &self.name)
            .field("indices", &self.indices)
            .finish_non_exhaustive()
    }
}
