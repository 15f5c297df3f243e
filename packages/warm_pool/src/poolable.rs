use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::{Host, InstanceId, Pool, PoolId, PoolInner};

/// Where a [`Poolable`] is in its lifecycle.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "the lifecycle is closed, callers are expected to match on it exhaustively"
)]
pub enum PoolableState {
    /// The instance has never been bound to a pool. This is the initial state and is never
    /// re-entered.
    Unbound,

    /// The instance is bound to a pool and in normal use, outside the free list.
    Active,

    /// The instance is sleeping in the free list of the pool it is bound to.
    Pooled,
}

/// The permanent link between an instance and the pool that recycles it.
///
/// The link does not keep the pool alive, otherwise every sleeping instance would keep its own
/// pool alive through the free list. The host is held strongly so that an instance that
/// outlives its pool can still be destroyed.
pub(crate) struct Binding<H: Host> {
    pool_id: PoolId,
    pool: Weak<PoolInner<H>>,
    host: Rc<H>,
}

/// A recyclable instance of a host object.
///
/// Wraps a host object together with its pool binding and lifecycle state. Instances are
/// normally created by a [`Pool`] and bound to it immediately, though an instance can also be
/// created unbound via [`new()`][Self::new] and bound later.
///
/// The binding is assigned exactly once and never changes. To move an object to a different
/// pool, a fresh instance must be created.
///
/// The host object is accessible via [`Deref`] and [`DerefMut`].
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
///
/// use warm_pool::{Host, Pool, PoolableState};
///
/// # struct Factory;
/// # impl Host for Factory {
/// #     type Prototype = u8;
/// #     type Object = Vec<u8>;
/// #     type Container = ();
/// #     fn instantiate(&self, prototype: &u8) -> Vec<u8> { vec![*prototype] }
/// #     fn destroy(&self, _object: Vec<u8>) {}
/// # }
/// let pool = Pool::new(Rc::new(Factory), 7, 0);
///
/// let mut instance = pool.lend();
/// assert_eq!(instance.state(), PoolableState::Active);
/// assert_eq!(instance.pool_id(), Some(pool.id()));
///
/// instance.push(8);
/// assert_eq!(*instance, vec![7, 8]);
///
/// instance.release();
/// assert_eq!(pool.len(), 1);
/// ```
///
/// # Thread safety
///
/// This type is neither [`Send`] nor [`Sync`], as it refers back to a single-threaded pool.
pub struct Poolable<H: Host> {
    id: InstanceId,
    object: H::Object,
    binding: Option<Binding<H>>,
    state: PoolableState,
}

impl<H: Host> Poolable<H> {
    /// Wraps a host object that does not belong to any pool.
    ///
    /// The instance starts in the [`Unbound`][PoolableState::Unbound] state.
    #[must_use]
    pub fn new(object: H::Object) -> Self {
        Self {
            id: InstanceId::next(),
            object,
            binding: None,
            state: PoolableState::Unbound,
        }
    }

    /// Binds the instance to a pool and marks it as in normal use.
    ///
    /// # Panics
    ///
    /// Panics if the instance is already bound. An instance can only be bound once - to use
    /// the object with a different pool, create a new instance.
    pub fn bind(&mut self, pool: &Pool<H>) {
        self.bind_with_state(pool.inner(), PoolableState::Active);
    }

    /// Binds the instance and puts it directly into the given state, bypassing
    /// [`Active`][PoolableState::Active]. Pre-warming uses this to create sleeping instances.
    pub(crate) fn bind_with_state(&mut self, pool: &Rc<PoolInner<H>>, state: PoolableState) {
        assert!(
            self.binding.is_none(),
            "{} is already bound to {} - an instance can only be bound once, create a new instance to use a different pool",
            self.id,
            self.pool_id()
                .map_or_else(|| "a pool".to_string(), |id| id.to_string()),
        );

        self.binding = Some(Binding {
            pool_id: pool.id(),
            pool: Rc::downgrade(pool),
            host: Rc::clone(pool.host()),
        });
        self.state = state;
    }

    /// Returns the instance to the pool it is bound to.
    ///
    /// The pool puts the instance to sleep and adds it to its free list.
    ///
    /// If the pool no longer exists, the instance cannot be recycled. A warning is logged and
    /// the object is destroyed via the host.
    ///
    /// # Panics
    ///
    /// Panics if the instance is not bound to a pool.
    pub fn release(self) {
        let Some(binding) = self.binding.as_ref() else {
            panic!(
                "{} cannot be released because it is not bound to a pool",
                self.id
            );
        };

        if let Some(inner) = binding.pool.upgrade() {
            Pool::from_inner(inner).reclaim(self);
            return;
        }

        warn!(
            instance_id = %self.id,
            pool_id = %binding.pool_id,
            "released an instance whose pool no longer exists, destroying the object"
        );

        let host = Rc::clone(&binding.host);
        host.destroy(self.object);
    }

    /// Returns the instance to its pool if it is bound to one, otherwise hands it back.
    ///
    /// # Errors
    ///
    /// Returns the instance unchanged if it is not bound to a pool.
    pub fn try_release(self) -> Result<(), Self> {
        if self.is_bound() {
            self.release();
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Returns the instance to its pool if it is bound to one, otherwise passes the object to
    /// `dispose`, typically to destroy it.
    pub fn release_or_else(self, dispose: impl FnOnce(H::Object)) {
        if let Err(unbound) = self.try_release() {
            dispose(unbound.object);
        }
    }

    /// Whether the instance has been bound to a pool.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Whether the instance is sleeping in the free list of its pool.
    #[must_use]
    pub fn is_pooled(&self) -> bool {
        self.state == PoolableState::Pooled
    }

    /// The current lifecycle state of the instance.
    #[must_use]
    pub fn state(&self) -> PoolableState {
        self.state
    }

    /// The identity of this instance.
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// The identity of the pool this instance is bound to, if any.
    #[must_use]
    pub fn pool_id(&self) -> Option<PoolId> {
        self.binding.as_ref().map(|binding| binding.pool_id)
    }

    /// Takes the host object out of the instance.
    ///
    /// The object is no longer recyclable after this, which is appropriate when the caller
    /// intends to destroy it.
    #[must_use]
    pub fn into_inner(self) -> H::Object {
        self.object
    }

    /// Wraps an object under an existing identity, to construct clashing free list entries.
    #[cfg(test)]
    pub(crate) fn with_id(id: InstanceId, object: H::Object) -> Self {
        Self {
            id,
            object,
            binding: None,
            state: PoolableState::Unbound,
        }
    }

    pub(crate) fn object_mut(&mut self) -> &mut H::Object {
        &mut self.object
    }

    pub(crate) fn set_state(&mut self, state: PoolableState) {
        self.state = state;
    }
}

impl<H: Host> Deref for Poolable<H> {
    type Target = H::Object;

    fn deref(&self) -> &Self::Target {
        &self.object
    }
}

impl<H: Host> DerefMut for Poolable<H> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.object
    }
}

impl<H: Host> fmt::Debug for Poolable<H> {
    #[cfg_attr(test, mutants::skip)] // Diagnostics only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poolable")
            .field("id", &self.id)
            .field("pool_id", &self.pool_id())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
