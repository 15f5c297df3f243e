use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Pool`][crate::Pool].
///
/// Only meant for diagnostics - pools are compared by handle identity, not by this value.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PoolId(u64);

impl PoolId {
    pub(crate) fn next() -> Self {
        // Relaxed is enough, we only need uniqueness, not ordering with other memory.
        Self(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool-{}", self.0)
    }
}

/// Process-unique identity of a [`Poolable`][crate::Poolable] instance.
///
/// Free lists are keyed by this value, which is what makes them true sets of instances.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(PoolId: Send, Sync, Copy, fmt::Display);
    assert_impl_all!(InstanceId: Send, Sync, Copy, fmt::Display);

    #[test]
    fn ids_are_unique() {
        let a = PoolId::next();
        let b = PoolId::next();
        assert_ne!(a, b);

        let x = InstanceId::next();
        let y = InstanceId::next();
        assert_ne!(x, y);
    }

    #[test]
    fn ids_are_unique_across_threads() {
        let handles = (0..4)
            .map(|_| thread::spawn(|| (0..100).map(|_| InstanceId::next()).collect::<Vec<_>>()))
            .collect::<Vec<_>>();

        let mut all = handles
            .into_iter()
            .flat_map(|h| h.join().expect("id generator thread does not panic"))
            .collect::<Vec<_>>();

        all.sort();
        all.dedup();
        assert_eq!(all.len(), 400);
    }

    #[test]
    fn display_is_prefixed() {
        assert!(PoolId::next().to_string().starts_with("pool-"));
        assert!(InstanceId::next().to_string().starts_with("instance-"));
    }
}
