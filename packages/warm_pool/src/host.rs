use std::fmt::Debug;
use std::hash::Hash;

/// A notification sent to an object when it moves in or out of a free list.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "an object is either entering or leaving a free list, there is nothing else to add"
)]
pub enum LifecycleEvent {
    /// The object has entered a free list and should deactivate itself.
    Sleep,

    /// The object has been lent out and should resume normal operation.
    Wake,
}

/// The capabilities that the host environment provides to the pools.
///
/// Pools never construct, destroy or organize objects themselves - every such action is
/// delegated to the host. The host is shared by a registry and all of its pools, so every
/// method takes `&self`. Hosts that need to mutate their own state can do so via interior
/// mutability, as all pool operations happen on a single thread.
///
/// Only [`instantiate()`][Self::instantiate] and [`destroy()`][Self::destroy] are mandatory.
/// The lifecycle notification and placement methods are best-effort and do nothing by default.
///
/// # Reentrancy
///
/// Host methods must not call back into the pool that invoked them. Pools do not guard against
/// this and doing so may panic or leave the free list in an unexpected state.
#[cfg_attr(
    test,
    mockall::automock(type Prototype = u32; type Object = u64; type Container = u8;)
)]
pub trait Host {
    /// Identifies the kind of object to create. Two prototypes are equal if and only if they
    /// denote the same template.
    type Prototype: Clone + Eq + Hash + Debug;

    /// The objects created from prototypes.
    type Object;

    /// A placement context that pooled objects are organized under while they sleep.
    ///
    /// Every pool of a registry receives its own copy of the registry's container.
    type Container: Clone + Debug;

    /// Creates a new object from a prototype.
    fn instantiate(&self, prototype: &Self::Prototype) -> Self::Object;

    /// Irreversibly disposes of an object.
    fn destroy(&self, object: Self::Object);

    /// Notifies an object that it is going to sleep or waking up.
    ///
    /// The default implementation does nothing.
    fn notify(&self, object: &mut Self::Object, event: LifecycleEvent) {
        _ = object;
        _ = event;
    }

    /// Places a sleeping object under a container.
    ///
    /// The default implementation does nothing.
    fn attach(&self, object: &mut Self::Object, container: &Self::Container) {
        _ = object;
        _ = container;
    }

    /// Removes an object from whatever container it was placed under, if any.
    ///
    /// The default implementation does nothing.
    fn detach(&self, object: &mut Self::Object) {
        _ = object;
    }
}
