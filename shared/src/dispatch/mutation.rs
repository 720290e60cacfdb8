use std::fmt;

use crate::{ForeignRuntime, RuntimeError};

type ApplyFn = Box<dyn FnOnce(&dyn ForeignRuntime) -> Result<(), RuntimeError> + Send + 'static>;

/// One outgoing write into the foreign runtime.
///
/// The closure owns copies of everything it needs (handle, operation, the
/// value as it was when the mutation was created) and never reads live proxy
/// fields when it finally runs.
pub struct Mutation {
    label: String,
    apply: ApplyFn,
}

impl Mutation {
    pub fn new<F>(label: impl Into<String>, apply: F) -> Self
    where
        F: FnOnce(&dyn ForeignRuntime) -> Result<(), RuntimeError> + Send + 'static,
    {
        Self {
            label: label.into(),
            apply: Box::new(apply),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn into_parts(self) -> (String, ApplyFn) {
        (self.label, self.apply)
    }
}

impl fmt::Debug for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation").field("label", &self.label).finish()
    }
}
