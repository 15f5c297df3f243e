use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::thread;

use tracing::{debug, trace};

use crate::free_list::FreeList;
use crate::{
    DropPolicy, Host, InstanceId, LifecycleEvent, PoolBuilder, PoolId, Poolable, PoolableState,
};

/// The shared state behind every [`Pool`] handle.
pub(crate) struct PoolInner<H: Host> {
    id: PoolId,
    prototype: H::Prototype,
    container: Option<H::Container>,
    host: Rc<H>,
    drop_policy: DropPolicy,

    /// The sleeping instances. An instance can never be in the free list twice.
    free: RefCell<FreeList<H>>,
}

impl<H: Host> PoolInner<H> {
    pub(crate) fn id(&self) -> PoolId {
        self.id
    }

    pub(crate) fn host(&self) -> &Rc<H> {
        &self.host
    }

    /// Puts a bound instance to sleep and adds it to the free list.
    ///
    /// This is the only place where instances enter the free list.
    fn put_to_sleep(&self, mut instance: Poolable<H>) {
        self.host
            .notify(instance.object_mut(), LifecycleEvent::Sleep);

        if let Some(container) = &self.container {
            self.host.attach(instance.object_mut(), container);
        }

        instance.set_state(PoolableState::Pooled);

        let inserted = self.free.borrow_mut().insert(instance);
        debug_assert!(
            inserted.is_ok(),
            "free list already contained the instance being put to sleep"
        );
    }

    /// Destroys every sleeping instance via the host and empties the free list.
    ///
    /// Returns the number of destroyed instances.
    fn destroy_free_list(&self) -> usize {
        // We take the instances out first so the host sees a consistent (empty) pool.
        let sleeping = self.free.borrow_mut().take_all();
        let count = sleeping.len();

        for instance in sleeping {
            self.host.destroy(instance.into_inner());
        }

        count
    }
}

impl<H: Host> Drop for PoolInner<H> {
    fn drop(&mut self) {
        let remaining = self.free.get_mut().len();

        if remaining == 0 {
            return;
        }

        match self.drop_policy {
            DropPolicy::MayDropItems => {
                let destroyed = self.destroy_free_list();
                debug!(pool_id = %self.id, destroyed, "pool dropped, sleeping instances destroyed");
            }
            DropPolicy::MustNotDropItems => {
                // If we are already panicking, a second panic would abort the process.
                if !thread::panicking() {
                    panic!(
                        "{} dropped with {remaining} sleeping instances but its drop policy requires an explicit teardown",
                        self.id
                    );
                }
            }
        }
    }
}

/// A free list of recyclable instances created from a single prototype.
///
/// The pool lends out sleeping instances on demand and creates new ones when it runs dry, so
/// [`lend()`][Self::lend] always succeeds. Every instance the pool creates is permanently bound
/// to it and comes back via [`reclaim()`][Self::reclaim] or [`Poolable::release()`].
///
/// The pool only owns the instances that are currently sleeping in its free list. Instances
/// that are lent out belong to whoever holds them.
///
/// `Pool` is a cheaply cloneable handle - all clones refer to the same pool and compare equal.
/// The pool lives as long as any handle to it exists. When the last handle is dropped, the
/// [drop policy][DropPolicy] decides what happens to the sleeping instances.
///
/// # Resource usage
///
/// The pool has no upper bound. Every lend from an empty pool creates a new instance and every
/// reclaim keeps it, so the pool grows to the peak number of instances in use at once.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
///
/// use warm_pool::{Host, Pool};
///
/// # struct Factory;
/// # impl Host for Factory {
/// #     type Prototype = &'static str;
/// #     type Object = String;
/// #     type Container = ();
/// #     fn instantiate(&self, prototype: &&'static str) -> String { prototype.to_string() }
/// #     fn destroy(&self, _object: String) {}
/// # }
/// let pool = Pool::new(Rc::new(Factory), "spark", 2);
/// assert_eq!(pool.len(), 2);
///
/// let first = pool.lend();
/// let second = pool.lend();
/// assert!(pool.is_empty());
///
/// // The pool grows on demand.
/// let third = pool.lend();
/// assert_eq!(*third, "spark");
///
/// pool.reclaim(first);
/// pool.reclaim(second);
/// third.release();
/// assert_eq!(pool.len(), 3);
///
/// pool.teardown();
/// assert!(pool.is_empty());
/// ```
///
/// # Thread safety
///
/// This type is neither [`Send`] nor [`Sync`]. All operations are expected to happen on the
/// thread that owns the host, e.g. from a per-frame update loop.
pub struct Pool<H: Host> {
    inner: Rc<PoolInner<H>>,
}

impl<H: Host> Pool<H> {
    /// Creates a pool for `prototype` and pre-warms it with `buffer` sleeping instances.
    ///
    /// For additional configuration, use [`Pool::builder()`].
    #[must_use]
    pub fn new(host: Rc<H>, prototype: H::Prototype, buffer: usize) -> Self {
        Self::builder(host, prototype).buffer(buffer).build()
    }

    /// Starts building a pool for `prototype`.
    pub fn builder(host: Rc<H>, prototype: H::Prototype) -> PoolBuilder<H> {
        PoolBuilder::new(host, prototype)
    }

    pub(crate) fn new_inner(
        host: Rc<H>,
        prototype: H::Prototype,
        buffer: usize,
        container: Option<H::Container>,
        drop_policy: DropPolicy,
    ) -> Self {
        let inner = Rc::new(PoolInner {
            id: PoolId::next(),
            prototype,
            container,
            host,
            drop_policy,
            free: RefCell::new(FreeList::with_capacity(buffer)),
        });

        for _ in 0..buffer {
            let object = inner.host.instantiate(&inner.prototype);

            // Pre-warmed instances are born sleeping, they never pass through Active.
            let mut instance = Poolable::<H>::new(object);
            instance.bind_with_state(&inner, PoolableState::Pooled);
            inner.put_to_sleep(instance);
        }

        debug!(
            pool_id = %inner.id,
            prototype = ?inner.prototype,
            buffer,
            "pool created"
        );

        Self { inner }
    }

    pub(crate) fn from_inner(inner: Rc<PoolInner<H>>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Rc<PoolInner<H>> {
        &self.inner
    }

    /// The process-unique identity of the pool, for diagnostics.
    #[must_use]
    pub fn id(&self) -> PoolId {
        self.inner.id
    }

    /// The prototype the pool creates instances from.
    #[must_use]
    pub fn prototype(&self) -> &H::Prototype {
        &self.inner.prototype
    }

    /// The container sleeping instances are placed under, if any.
    #[must_use]
    pub fn container(&self) -> Option<&H::Container> {
        self.inner.container.as_ref()
    }

    /// The number of sleeping instances in the free list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.free.borrow().len()
    }

    /// Whether the free list is empty. The next lend will create a new instance.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.free.borrow().is_empty()
    }

    /// Whether the given instance is sleeping in the free list.
    #[must_use]
    pub fn contains(&self, instance_id: InstanceId) -> bool {
        self.inner.free.borrow().contains(instance_id)
    }

    /// The identities of all sleeping instances, in no particular order.
    #[must_use]
    pub fn pooled_ids(&self) -> Vec<InstanceId> {
        self.inner.free.borrow().ids().collect()
    }

    /// Lends out an instance for active use.
    ///
    /// An arbitrary sleeping instance is taken from the free list. Callers must not rely on
    /// which one. If the free list is empty, a new instance is created and bound to this pool.
    ///
    /// Either way, the instance is detached from its container and woken up before it is
    /// returned. The returned instance is always [`Active`][PoolableState::Active] and bound
    /// to this pool.
    #[must_use]
    pub fn lend(&self) -> Poolable<H> {
        let reused = self.inner.free.borrow_mut().pop();

        let mut instance = if let Some(mut instance) = reused {
            instance.set_state(PoolableState::Active);
            trace!(pool_id = %self.inner.id, instance_id = %instance.id(), "lent sleeping instance");
            instance
        } else {
            let object = self.inner.host.instantiate(&self.inner.prototype);
            let mut instance = Poolable::<H>::new(object);
            instance.bind_with_state(&self.inner, PoolableState::Active);
            trace!(pool_id = %self.inner.id, instance_id = %instance.id(), "free list empty, lent new instance");
            instance
        };

        self.inner.host.detach(instance.object_mut());
        self.inner
            .host
            .notify(instance.object_mut(), LifecycleEvent::Wake);

        instance
    }

    /// Puts an instance to sleep and returns it to the free list.
    ///
    /// # Panics
    ///
    /// Panics if the instance is not bound to this pool or is already in the free list. Nothing
    /// is modified in either case.
    pub fn reclaim(&self, instance: Poolable<H>) {
        assert!(
            instance.pool_id() == Some(self.inner.id),
            "{} cannot be reclaimed by {} because it is bound to {}",
            instance.id(),
            self.inner.id,
            instance
                .pool_id()
                .map_or_else(|| "no pool".to_string(), |id| id.to_string()),
        );

        assert!(
            !self.contains(instance.id()),
            "{} is already sleeping in {}",
            instance.id(),
            self.inner.id
        );

        trace!(pool_id = %self.inner.id, instance_id = %instance.id(), "reclaimed instance");

        self.inner.put_to_sleep(instance);
    }

    /// Destroys every sleeping instance via the host and empties the free list.
    ///
    /// Instances that are lent out are not affected and can still be returned to the pool
    /// afterwards. The pool itself remains usable.
    pub fn teardown(&self) {
        let destroyed = self.inner.destroy_free_list();

        debug!(pool_id = %self.inner.id, destroyed, "pool torn down");
    }
}

impl<H: Host> Clone for Pool<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: Host> PartialEq for Pool<H> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<H: Host> Eq for Pool<H> {}

impl<H: Host> fmt::Debug for Pool<H> {
    #[cfg_attr(test, mutants::skip)] // Diagnostics only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.inner.id)
            .field("prototype", &self.inner.prototype)
            .field("container", &self.inner.container)
            .field("drop_policy", &self.inner.drop_policy)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::{Arc, Mutex};

    use mockall::Sequence;
    use mockall::predicate::eq;
    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::MockHost;

    assert_not_impl_any!(Pool<MockHost>: Send, Sync);

    /// A host that accepts any call, creating objects that count up from the prototype.
    fn permissive_host() -> MockHost {
        let next = Cell::new(0_u64);

        let mut host = MockHost::new();
        host.expect_instantiate().returning(move |prototype| {
            next.set(next.get().wrapping_add(1));
            u64::from(*prototype).wrapping_mul(1000).wrapping_add(next.get())
        });
        host.expect_destroy().return_const(());
        host.expect_notify().return_const(());
        host.expect_attach().return_const(());
        host.expect_detach().return_const(());
        host
    }

    fn pool_with(buffer: usize) -> Pool<MockHost> {
        Pool::new(Rc::new(permissive_host()), 1, buffer)
    }

    fn assert_free_list_is_set(pool: &Pool<MockHost>) {
        let mut ids = pool.pooled_ids();
        let len = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), len);
        assert_eq!(len, pool.len());
    }

    #[test]
    fn prewarm_creates_sleeping_instances() {
        let pool = pool_with(2);

        assert_eq!(pool.len(), 2);
        assert!(!pool.is_empty());
        assert_free_list_is_set(&pool);

        for instance in pool.inner.free.borrow().iter() {
            assert_eq!(instance.state(), PoolableState::Pooled);
            assert!(instance.is_pooled());
            assert_eq!(instance.pool_id(), Some(pool.id()));
        }
    }

    #[test]
    fn zero_buffer_creates_empty_pool() {
        let pool = pool_with(0);

        assert!(pool.is_empty());
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn prewarm_sleeps_and_attaches_each_instance() {
        let mut seq = Sequence::new();
        let mut host = MockHost::new();

        for object in [10_u64, 11] {
            host.expect_instantiate()
                .with(eq(7_u32))
                .once()
                .in_sequence(&mut seq)
                .return_const(object);
            host.expect_notify()
                .withf(|_, event| *event == LifecycleEvent::Sleep)
                .once()
                .in_sequence(&mut seq)
                .return_const(());
            host.expect_attach()
                .withf(|_, container| *container == 3)
                .once()
                .in_sequence(&mut seq)
                .return_const(());
        }

        let pool = Pool::builder(Rc::new(host), 7)
            .buffer(2)
            .container(3)
            .build();

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.container(), Some(&3));

        // Expectations end here, dropping without teardown would call destroy.
        drop(pool.inner.free.borrow_mut().take_all());
    }

    #[test]
    fn lend_detaches_then_wakes() {
        let mut seq = Sequence::new();
        let mut host = MockHost::new();

        host.expect_instantiate().once().return_const(55_u64);
        host.expect_detach()
            .withf(|object| *object == 55)
            .once()
            .in_sequence(&mut seq)
            .return_const(());
        host.expect_notify()
            .withf(|object, event| *object == 55 && *event == LifecycleEvent::Wake)
            .once()
            .in_sequence(&mut seq)
            .return_const(());

        let pool = Pool::new(Rc::new(host), 1, 0);
        let instance = pool.lend();

        assert_eq!(*instance, 55);
        assert_eq!(instance.state(), PoolableState::Active);
        assert_eq!(instance.pool_id(), Some(pool.id()));
    }

    #[test]
    fn lend_from_empty_pool_creates_bound_instance() {
        let pool = pool_with(0);

        let instance = pool.lend();

        assert!(pool.is_empty());
        assert_eq!(instance.state(), PoolableState::Active);
        assert_eq!(instance.pool_id(), Some(pool.id()));
    }

    #[test]
    fn lend_takes_from_free_list() {
        let pool = pool_with(2);
        let sleeping = pool.pooled_ids();

        let instance = pool.lend();

        assert_eq!(pool.len(), 1);
        assert!(sleeping.contains(&instance.id()));
        assert!(!pool.contains(instance.id()));
        assert_eq!(instance.state(), PoolableState::Active);
    }

    #[test]
    fn reclaim_sleeps_attaches_and_inserts() {
        let mut seq = Sequence::new();
        let mut host = MockHost::new();

        host.expect_instantiate().once().return_const(9_u64);
        host.expect_detach().once().in_sequence(&mut seq).return_const(());
        host.expect_notify()
            .withf(|_, event| *event == LifecycleEvent::Wake)
            .once()
            .in_sequence(&mut seq)
            .return_const(());
        host.expect_notify()
            .withf(|_, event| *event == LifecycleEvent::Sleep)
            .once()
            .in_sequence(&mut seq)
            .return_const(());
        host.expect_attach()
            .withf(|object, container| *object == 9 && *container == 4)
            .once()
            .in_sequence(&mut seq)
            .return_const(());
        host.expect_destroy()
            .with(eq(9_u64))
            .once()
            .in_sequence(&mut seq)
            .return_const(());

        let pool = Pool::builder(Rc::new(host), 1).container(4).build();

        let instance = pool.lend();
        let id = instance.id();
        pool.reclaim(instance);

        assert_eq!(pool.len(), 1);
        assert!(pool.contains(id));
        assert!(
            pool.inner
                .free
                .borrow()
                .iter()
                .filter(|instance| instance.id() == id)
                .all(Poolable::is_pooled)
        );

        pool.teardown();
    }

    #[test]
    fn reclaim_without_container_does_not_attach() {
        let mut host = MockHost::new();
        host.expect_instantiate().return_const(1_u64);
        host.expect_notify().return_const(());
        host.expect_detach().return_const(());
        host.expect_attach().never();
        host.expect_destroy().return_const(());

        let pool = Pool::new(Rc::new(host), 1, 1);
        let instance = pool.lend();
        pool.reclaim(instance);

        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn round_trips_are_size_neutral() {
        let pool = pool_with(3);

        for _ in 0..10 {
            let a = pool.lend();
            let b = pool.lend();
            pool.reclaim(a);
            let c = pool.lend();
            pool.reclaim(b);
            pool.reclaim(c);

            assert_eq!(pool.len(), 3);
            assert_free_list_is_set(&pool);
        }
    }

    #[test]
    fn draining_a_large_pool_lends_every_instance_once() {
        let pool = pool_with(50_000);
        let mut sleeping = pool.pooled_ids();
        sleeping.sort();

        let lent = (0..50_000).map(|_| pool.lend()).collect::<Vec<_>>();

        assert!(pool.is_empty());
        let mut ids = lent.iter().map(Poolable::id).collect::<Vec<_>>();
        ids.sort();
        ids.dedup();
        assert_eq!(ids, sleeping);

        for instance in lent {
            pool.reclaim(instance);
        }

        assert_eq!(pool.len(), 50_000);
        assert_free_list_is_set(&pool);
    }

    #[test]
    fn pool_grows_to_peak_usage() {
        let pool = pool_with(2);

        let lent = (0..3).map(|_| pool.lend()).collect::<Vec<_>>();
        assert!(pool.is_empty());

        for instance in &lent {
            assert_eq!(instance.state(), PoolableState::Active);
            assert_eq!(instance.pool_id(), Some(pool.id()));
        }

        for instance in lent {
            pool.reclaim(instance);
        }

        assert_eq!(pool.len(), 3);
        assert_free_list_is_set(&pool);
    }

    #[test]
    #[should_panic]
    fn reclaim_into_other_pool_panics() {
        let first = pool_with(0);
        let second = pool_with(0);

        second.reclaim(first.lend());
    }

    #[test]
    fn rejected_reclaim_leaves_pools_unchanged() {
        let first = pool_with(1);
        let second = pool_with(2);
        let instance = first.lend();

        let result = panic::catch_unwind(AssertUnwindSafe(|| second.reclaim(instance)));

        assert!(result.is_err());
        assert_eq!(first.len(), 0);
        assert_eq!(second.len(), 2);
    }

    #[test]
    #[should_panic]
    fn reclaim_unbound_panics() {
        let pool = pool_with(0);

        pool.reclaim(Poolable::<MockHost>::new(5));
    }

    #[test]
    #[should_panic]
    fn reclaim_already_sleeping_instance_panics() {
        let pool = pool_with(0);
        let instance = pool.lend();

        // Ownership rules prevent holding a sleeping instance, so we occupy its slot directly.
        assert!(
            pool.inner
                .free
                .borrow_mut()
                .insert(Poolable::with_id(instance.id(), 0))
                .is_ok()
        );

        pool.reclaim(instance);
    }

    fn destroyed_snapshot(destroyed: &Mutex<Vec<u64>>) -> Vec<u64> {
        destroyed
            .lock()
            .expect("test mutex is never poisoned")
            .clone()
    }

    #[test]
    fn teardown_destroys_sleeping_instances_only() {
        let destroyed = Arc::new(Mutex::new(Vec::new()));

        let mut host = MockHost::new();
        let next = Cell::new(0_u64);
        host.expect_instantiate().returning(move |_| {
            next.set(next.get().wrapping_add(1));
            next.get()
        });
        host.expect_notify().return_const(());
        host.expect_detach().return_const(());
        {
            let destroyed = Arc::clone(&destroyed);
            host.expect_destroy().returning(move |object| {
                destroyed
                    .lock()
                    .expect("test mutex is never poisoned")
                    .push(object);
            });
        }

        let pool = Pool::new(Rc::new(host), 1, 2);
        let lent = pool.lend();
        let lent_object = *lent;

        pool.teardown();

        assert!(pool.is_empty());
        assert_eq!(destroyed_snapshot(&destroyed).len(), 1);
        assert!(!destroyed_snapshot(&destroyed).contains(&lent_object));

        // The lent instance is unaffected and can still come home.
        assert_eq!(lent.state(), PoolableState::Active);
        pool.reclaim(lent);
        assert_eq!(pool.len(), 1);

        // Teardown is repeatable.
        pool.teardown();
        pool.teardown();
        assert!(pool.is_empty());
        assert_eq!(destroyed_snapshot(&destroyed).len(), 2);
    }

    #[test]
    fn drop_destroys_sleeping_instances_by_default() {
        let mut host = MockHost::new();
        host.expect_instantiate().return_const(1_u64);
        host.expect_notify().return_const(());
        host.expect_destroy().times(3).return_const(());

        drop(Pool::new(Rc::new(host), 1, 3));
    }

    #[test]
    #[should_panic]
    fn drop_with_sleeping_instances_panics_if_policy_must_not_drop() {
        let pool = Pool::builder(Rc::new(permissive_host()), 1)
            .buffer(1)
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        drop(pool);
    }

    #[test]
    fn drop_after_teardown_does_not_panic_if_policy_must_not_drop() {
        let pool = Pool::builder(Rc::new(permissive_host()), 1)
            .buffer(1)
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        pool.teardown();
        drop(pool);
    }

    #[test]
    fn clones_are_equal_and_share_state() {
        let pool = pool_with(1);
        let clone = pool.clone();

        assert_eq!(pool, clone);
        assert_eq!(pool.id(), clone.id());

        let instance = clone.lend();
        assert!(pool.is_empty());
        pool.reclaim(instance);
        assert_eq!(clone.len(), 1);
    }

    #[test]
    fn distinct_pools_are_not_equal() {
        let first = pool_with(0);
        let second = pool_with(0);

        assert_ne!(first, second);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn prototype_is_kept() {
        let pool = Pool::new(Rc::new(permissive_host()), 42, 0);

        assert_eq!(*pool.prototype(), 42);
        assert_eq!(pool.container(), None);
    }

    #[test]
    fn debug_includes_id_and_len() {
        let pool = pool_with(2);
        let output = format!("{pool:?}");

        assert!(output.contains("Pool"));
        assert!(output.contains("len: 2"));
    }
}
