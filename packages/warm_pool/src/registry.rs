use std::fmt;
use std::rc::Rc;

use foldhash::{HashMap, HashMapExt, HashSet, HashSetExt};
use tracing::debug;

use crate::error::Result;
use crate::{DropPolicy, Error, Host, Pool, PoolId, PoolRegistryBuilder, Poolable, ReclaimError};

/// A directory of pools, one for each registered prototype.
///
/// The registry creates pools on request, routes lend requests to the right pool by prototype
/// and rejects instances that belong to some other registry. Reclaiming never needs the
/// registry - an instance always knows its own pool - but doing so through the registry gives
/// a clear error when an instance ends up in the wrong place.
///
/// All pools share the host of the registry, as well as its default container and drop policy.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
///
/// use warm_pool::{Error, Host, PoolRegistry};
///
/// # struct Factory;
/// # impl Host for Factory {
/// #     type Prototype = &'static str;
/// #     type Object = String;
/// #     type Container = ();
/// #     fn instantiate(&self, prototype: &&'static str) -> String { prototype.to_string() }
/// #     fn destroy(&self, _object: String) {}
/// # }
/// let mut registry = PoolRegistry::new(Rc::new(Factory));
///
/// let sparks = registry.register_prototype("spark", 5);
///
/// // Registering again returns the same pool and does not pre-warm again.
/// let again = registry.register_prototype("spark", 5);
/// assert_eq!(sparks, again);
/// assert_eq!(sparks.len(), 5);
///
/// let spark = registry.lend(&"spark").unwrap();
/// registry.reclaim(spark).unwrap();
///
/// assert!(matches!(
///     registry.lend(&"smoke"),
///     Err(Error::PrototypeNotRegistered { .. })
/// ));
/// ```
///
/// # Thread safety
///
/// This type is neither [`Send`] nor [`Sync`]. If pooling needs to happen from multiple threads,
/// give each thread its own registry and host.
pub struct PoolRegistry<H: Host> {
    host: Rc<H>,
    container: Option<H::Container>,
    drop_policy: DropPolicy,

    pools: HashMap<H::Prototype, Pool<H>>,

    /// Identities of the pools in `pools`, for routing checks on reclaim.
    pool_ids: HashSet<PoolId>,
}

impl<H: Host> PoolRegistry<H> {
    /// Creates an empty registry with default configuration.
    ///
    /// For custom configuration, use [`PoolRegistry::builder()`].
    #[must_use]
    pub fn new(host: Rc<H>) -> Self {
        Self::builder(host).build()
    }

    /// Starts building a registry.
    pub fn builder(host: Rc<H>) -> PoolRegistryBuilder<H> {
        PoolRegistryBuilder::new(host)
    }

    pub(crate) fn new_inner(
        host: Rc<H>,
        container: Option<H::Container>,
        drop_policy: DropPolicy,
    ) -> Self {
        Self {
            host,
            container,
            drop_policy,
            pools: HashMap::new(),
            pool_ids: HashSet::new(),
        }
    }

    /// Returns the pool for `prototype`, creating it with `buffer` pre-warmed instances if
    /// the prototype is not yet registered.
    ///
    /// If a pool already exists, it is returned unchanged and `buffer` is ignored, so it is
    /// fine to call this on every use site to ensure registration.
    pub fn register_prototype(&mut self, prototype: H::Prototype, buffer: usize) -> Pool<H> {
        if let Some(existing) = self.pools.get(&prototype) {
            return existing.clone();
        }

        let mut builder = Pool::builder(Rc::clone(&self.host), prototype.clone())
            .buffer(buffer)
            .drop_policy(self.drop_policy);

        if let Some(container) = &self.container {
            builder = builder.container(container.clone());
        }

        let pool = builder.build();

        debug!(
            pool_id = %pool.id(),
            prototype = ?prototype,
            buffer,
            "prototype registered"
        );

        self.pool_ids.insert(pool.id());
        self.pools.insert(prototype, pool.clone());

        pool
    }

    /// Lends out an instance of `prototype` from its pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PrototypeNotRegistered`] if no pool exists for `prototype`.
    pub fn lend(&self, prototype: &H::Prototype) -> Result<Poolable<H>> {
        self.pools
            .get(prototype)
            .map(Pool::lend)
            .ok_or_else(|| Error::PrototypeNotRegistered {
                prototype: format!("{prototype:?}"),
            })
    }

    /// Returns an instance to its pool, after checking that the pool belongs to this registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InstanceNotRegistered`] together with the instance if the instance is
    /// not bound to any pool of this registry.
    ///
    /// # Panics
    ///
    /// Panics if the instance is already sleeping in its pool.
    pub fn reclaim(
        &self,
        instance: Poolable<H>,
    ) -> std::result::Result<(), ReclaimError<H>> {
        match instance.pool_id() {
            Some(pool_id) if self.pool_ids.contains(&pool_id) => {
                instance.release();
                Ok(())
            }
            pool_id => Err(ReclaimError::new(
                Error::InstanceNotRegistered {
                    instance_id: instance.id(),
                    pool_id,
                },
                instance,
            )),
        }
    }

    /// Whether a pool exists for `prototype`.
    #[must_use]
    pub fn is_registered(&self, prototype: &H::Prototype) -> bool {
        self.pools.contains_key(prototype)
    }

    /// The pool for `prototype`, if one exists.
    #[must_use]
    pub fn get(&self, prototype: &H::Prototype) -> Option<&Pool<H>> {
        self.pools.get(prototype)
    }

    /// All pools of the registry, in no particular order.
    pub fn pools(&self) -> impl Iterator<Item = &Pool<H>> {
        self.pools.values()
    }

    /// The number of registered prototypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether no prototype has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// The container that pools of this registry place sleeping instances under, if any.
    #[must_use]
    pub fn container(&self) -> Option<&H::Container> {
        self.container.as_ref()
    }

    /// Tears down every pool of the registry.
    ///
    /// The pools stay registered and usable, only their sleeping instances are destroyed.
    pub fn teardown(&self) {
        for pool in self.pools.values() {
            pool.teardown();
        }

        debug!(pools = self.pools.len(), "registry torn down");
    }
}

impl<H: Host> fmt::Debug for PoolRegistry<H> {
    #[cfg_attr(test, mutants::skip)] // Diagnostics only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("container", &self.container)
            .field("drop_policy", &self.drop_policy)
            .field("pools", &self.pools.values().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
