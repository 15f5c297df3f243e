/// Determines what happens to the sleeping objects of a pool when the pool is dropped.
///
/// By default, a pool destroys its sleeping objects via the host when the last handle to it
/// is dropped. Objects that are lent out at that time are never affected.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
///
/// use warm_pool::{DropPolicy, Host, Pool};
///
/// # struct Factory;
/// # impl Host for Factory {
/// #     type Prototype = u8;
/// #     type Object = u8;
/// #     type Container = ();
/// #     fn instantiate(&self, prototype: &u8) -> u8 { *prototype }
/// #     fn destroy(&self, _object: u8) {}
/// # }
/// let pool = Pool::builder(Rc::new(Factory), 1)
///     .drop_policy(DropPolicy::MustNotDropItems)
///     .build();
///
/// // Under this policy, the pool must be emptied before it is dropped.
/// pool.teardown();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The pool destroys its sleeping objects when it is dropped. This is the default.
    #[default]
    MayDropItems,

    /// The pool panics if it still holds sleeping objects when it is dropped.
    ///
    /// This may be valuable if objects must be destroyed at a well-defined point in time, for
    /// example before the host itself shuts down, and an explicit
    /// [`teardown()`][crate::Pool::teardown] is expected to take care of that.
    MustNotDropItems,
}
