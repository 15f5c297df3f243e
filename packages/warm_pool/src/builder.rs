use std::fmt;
use std::rc::Rc;

use crate::{DropPolicy, Host, Pool};

/// Builder for creating an instance of [`Pool`].
///
/// The host and the prototype are mandatory and supplied up front, whereas other settings are
/// optional.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
///
/// use warm_pool::{DropPolicy, Host, Pool};
///
/// # #[derive(Clone, Debug)]
/// # struct Shelf;
/// # struct Factory;
/// # impl Host for Factory {
/// #     type Prototype = u8;
/// #     type Object = u8;
/// #     type Container = Shelf;
/// #     fn instantiate(&self, prototype: &u8) -> u8 { *prototype }
/// #     fn destroy(&self, _object: u8) {}
/// # }
/// let pool = Pool::builder(Rc::new(Factory), 3)
///     .buffer(10)
///     .container(Shelf)
///     .drop_policy(DropPolicy::MustNotDropItems)
///     .build();
///
/// assert_eq!(pool.len(), 10);
/// # pool.teardown();
/// ```
#[must_use]
pub struct PoolBuilder<H: Host> {
    host: Rc<H>,
    prototype: H::Prototype,
    buffer: usize,
    container: Option<H::Container>,
    drop_policy: DropPolicy,
}

impl<H: Host> PoolBuilder<H> {
    pub(crate) fn new(host: Rc<H>, prototype: H::Prototype) -> Self {
        Self {
            host,
            prototype,
            buffer: 0,
            container: None,
            drop_policy: DropPolicy::default(),
        }
    }

    /// Sets the number of sleeping instances to create up front. Defaults to zero.
    pub fn buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer;
        self
    }

    /// Sets the container that sleeping instances are placed under.
    pub fn container(mut self, container: H::Container) -> Self {
        self.container = Some(container);
        self
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs how to treat sleeping
    /// instances when the pool is dropped.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the pool, creating the pre-warmed instances via the host.
    #[must_use]
    pub fn build(self) -> Pool<H> {
        Pool::new_inner(
            self.host,
            self.prototype,
            self.buffer,
            self.container,
            self.drop_policy,
        )
    }
}

impl<H: Host> fmt::Debug for PoolBuilder<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuilder")
            .field("prototype", &self.prototype)
            .field("buffer", &self.buffer)
            .field("container", &self.container)
            .field("drop_policy", &self.drop_policy)
            .finish_non_exhaustive()
    }
}
