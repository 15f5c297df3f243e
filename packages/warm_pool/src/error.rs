use std::fmt;

use thiserror::Error;

use crate::{Host, InstanceId, PoolId, Poolable};

/// Lookup failures reported by a [`PoolRegistry`][crate::PoolRegistry].
///
/// These are normal conditions that the caller is expected to handle, as opposed to misuse of
/// pools and instances, which panics.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No pool exists in the registry for the requested prototype.
    #[error("prototype {prototype} is not registered in this registry")]
    PrototypeNotRegistered {
        /// Debug representation of the prototype that was requested.
        prototype: String,
    },

    /// An instance was returned to a registry that does not own the pool it is bound to.
    #[error("instance {instance_id} does not belong to any pool in this registry (bound to {})", display_binding(.pool_id))]
    InstanceNotRegistered {
        /// The instance that was returned.
        instance_id: InstanceId,

        /// The pool the instance is bound to, if any.
        pool_id: Option<PoolId>,
    },
}

#[expect(
    clippy::ref_option,
    reason = "thiserror hands out fields by reference in format arguments"
)]
fn display_binding(pool_id: &Option<PoolId>) -> String {
    pool_id.map_or_else(|| "no pool".to_string(), |id| id.to_string())
}

/// A specialized `Result` type for registry operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

/// An instance that a [`PoolRegistry`][crate::PoolRegistry] refused to reclaim.
///
/// The instance is handed back to the caller together with the reason, so that it can be
/// returned to the right registry or disposed of.
#[derive(Error)]
#[error("{error}")]
pub struct ReclaimError<H: Host> {
    #[source]
    error: Error,
    instance: Poolable<H>,
}

impl<H: Host> ReclaimError<H> {
    pub(crate) fn new(error: Error, instance: Poolable<H>) -> Self {
        Self { error, instance }
    }

    /// The reason the instance was refused.
    #[must_use]
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Takes back the instance that was refused.
    #[must_use]
    pub fn into_instance(self) -> Poolable<H> {
        self.instance
    }

    /// Splits the error into the reason and the refused instance.
    #[must_use]
    pub fn into_parts(self) -> (Error, Poolable<H>) {
        (self.error, self.instance)
    }
}

impl<H: Host> fmt::Debug for ReclaimError<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReclaimError")
            .field("error", &self.error)
            .field("instance_id", &self.instance.id())
            .finish_non_exhaustive()
    }
}
