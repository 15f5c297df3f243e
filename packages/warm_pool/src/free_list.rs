use std::mem;

use foldhash::{HashSet, HashSetExt};

use crate::{Host, InstanceId, Poolable};

/// The sleeping instances of a pool.
///
/// Instances are kept on a stack, so taking one out and putting one back are both O(1)
/// regardless of how full the list is. A separate index of instance identities keeps the list
/// a true set: each instance appears at most once and membership checks do not scan the stack.
pub(crate) struct FreeList<H: Host> {
    /// Top of the stack is the most recently inserted instance.
    instances: Vec<Poolable<H>>,

    /// Identities of everything in `instances`.
    members: HashSet<InstanceId>,
}

impl<H: Host> FreeList<H> {
    #[must_use]
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    #[must_use]
    pub(crate) fn contains(&self, instance_id: InstanceId) -> bool {
        self.members.contains(&instance_id)
    }

    /// Adds an instance.
    ///
    /// If an instance with the same identity is already a member, the list is left unchanged
    /// and the instance is handed back.
    pub(crate) fn insert(&mut self, instance: Poolable<H>) -> Result<(), Poolable<H>> {
        if !self.members.insert(instance.id()) {
            return Err(instance);
        }

        self.instances.push(instance);
        Ok(())
    }

    /// Removes an arbitrary member.
    pub(crate) fn pop(&mut self) -> Option<Poolable<H>> {
        let instance = self.instances.pop()?;
        self.members.remove(&instance.id());
        Some(instance)
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances.iter().map(Poolable::id)
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Poolable<H>> {
        self.instances.iter()
    }

    /// Empties the list, returning everything that was in it.
    pub(crate) fn take_all(&mut self) -> Vec<Poolable<H>> {
        self.members.clear();
        mem::take(&mut self.instances)
    }
}
