use std::collections::{BTreeSet, HashSet, VecDeque};
use std::hash::Hash;

/// How a collection field treats the order of its JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionPolicy {
    /// Array order is kept in both directions.
    Sequence,
    /// Unordered; duplicates in the array collapse.
    Set,
}

/// A homogeneous collection that can back a mapped field.
///
/// The policy is fixed per implementation, so a field declared as `Vec<T>`
/// always decodes into a sequence and a `HashSet<T>` into a set.
pub trait Collection: Default {
    type Item;

    const POLICY: CollectionPolicy;

    /// Number of items.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate in the collection's own iteration order.
    fn items(&self) -> impl Iterator<Item = &Self::Item>;

    /// Add an item; sets ignore duplicates.
    fn insert(&mut self, item: Self::Item);
}

impl<T> Collection for Vec<T> {
    type Item = T;

    const POLICY: CollectionPolicy = CollectionPolicy::Sequence;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn items(&self) -> impl Iterator<Item = &T> {
        self.iter()
    }

    fn insert(&mut self, item: T) {
        self.push(item);
    }
}

impl<T> Collection for VecDeque<T> {
    type Item = T;

    const POLICY: CollectionPolicy = CollectionPolicy::Sequence;

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn items(&self) -> impl Iterator<Item = &T> {
        self.iter()
    }

    fn insert(&mut self, item: T) {
        self.push_back(item);
    }
}

impl<T: Hash + Eq> Collection for HashSet<T> {
    type Item = T;

    const POLICY: CollectionPolicy = CollectionPolicy::Set;

    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn items(&self) -> impl Iterator<Item = &T> {
        self.iter()
    }

    fn insert(&mut self, item: T) {
        HashSet::insert(self, item);
    }
}

impl<T: Ord> Collection for BTreeSet<T> {
    type Item = T;

    const POLICY: CollectionPolicy = CollectionPolicy::Set;

    fn len(&self) -> usize {
        BTreeSet::len(self)
    }

    fn items(&self) -> impl Iterator<Item = &T> {
        self.iter()
    }

    fn insert(&mut self, item: T) {
        BTreeSet::insert(self, item);
    }
}
