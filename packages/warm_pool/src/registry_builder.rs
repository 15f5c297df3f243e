use std::fmt;
use std::rc::Rc;

use crate::{DropPolicy, Host, PoolRegistry};

/// Builder for creating an instance of [`PoolRegistry`].
///
/// Besides the settings shared by every pool of the registry, the builder accepts a list of
/// prototypes to register up front, e.g. from level configuration data loaded at startup.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
///
/// use warm_pool::{Host, PoolRegistry};
///
/// # struct Factory;
/// # impl Host for Factory {
/// #     type Prototype = &'static str;
/// #     type Object = String;
/// #     type Container = &'static str;
/// #     fn instantiate(&self, prototype: &&'static str) -> String { prototype.to_string() }
/// #     fn destroy(&self, _object: String) {}
/// # }
/// let registry = PoolRegistry::builder(Rc::new(Factory))
///     .container("pooled objects")
///     .prewarm("bullet", 32)
///     .prewarm("explosion", 4)
///     .build();
///
/// assert!(registry.is_registered(&"bullet"));
/// assert_eq!(registry.get(&"explosion").map(|pool| pool.len()), Some(4));
/// ```
#[must_use]
pub struct PoolRegistryBuilder<H: Host> {
    host: Rc<H>,
    container: Option<H::Container>,
    drop_policy: DropPolicy,
    prewarm: Vec<(H::Prototype, usize)>,
}

impl<H: Host> PoolRegistryBuilder<H> {
    pub(crate) fn new(host: Rc<H>) -> Self {
        Self {
            host,
            container: None,
            drop_policy: DropPolicy::default(),
            prewarm: Vec::new(),
        }
    }

    /// Sets the container that every pool of the registry places sleeping instances under.
    pub fn container(mut self, container: H::Container) -> Self {
        self.container = Some(container);
        self
    }

    /// Sets the [drop policy][DropPolicy] of every pool of the registry.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Registers `prototype` with `buffer` pre-warmed instances when the registry is built.
    ///
    /// Prototypes are registered in the order given. If the same prototype is given more than
    /// once, the first entry wins, just as with
    /// [`register_prototype()`][PoolRegistry::register_prototype].
    pub fn prewarm(mut self, prototype: H::Prototype, buffer: usize) -> Self {
        self.prewarm.push((prototype, buffer));
        self
    }

    /// Builds the registry and registers every pre-warmed prototype.
    #[must_use]
    pub fn build(self) -> PoolRegistry<H> {
        let mut registry = PoolRegistry::new_inner(self.host, self.container, self.drop_policy);

        for (prototype, buffer) in self.prewarm {
            _ = registry.register_prototype(prototype, buffer);
        }

        registry
    }
}

impl<H: Host> fmt::Debug for PoolRegistryBuilder<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolRegistryBuilder")
            .field("container", &self.container)
            .field("drop_policy", &self.drop_policy)
            .field("prewarm", &self.prewarm)
            .finish_non_exhaustive()
    }
}
