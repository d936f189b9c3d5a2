//! Append-only storage indexed by opaque IDs.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Conversion between an ID newtype and its raw index.
pub trait ArenaId: Copy {
    /// Creates an ID from a raw index.
    fn from_raw(index: u32) -> Self;

    /// Returns the raw index.
    fn as_raw(self) -> u32;
}

/// A dense vector of `T` addressed by `I`.
///
/// Items are never removed or reordered, so an ID stays valid for the life of
/// the arena and allocation order doubles as discovery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arena<I: ArenaId, T> {
    items: Vec<T>,
    #[serde(skip)]
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Stores `item` and returns its ID.
    pub fn alloc(&mut self, item: T) -> I {
        let id = self.next_id();
        self.items.push(item);
        id
    }

    /// Stores the item built from its own ID.
    pub fn alloc_with(&mut self, build: impl FnOnce(I) -> T) -> I {
        let id = self.next_id();
        self.items.push(build(id));
        id
    }

    /// The ID the next allocation will receive.
    pub fn next_id(&self) -> I {
        I::from_raw(self.items.len() as u32)
    }

    /// Returns the item for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this arena.
    pub fn get(&self, id: I) -> &T {
        &self.items[id.as_raw() as usize]
    }

    /// Returns the item for `id`, or `None` if out of range.
    pub fn try_get(&self, id: I) -> Option<&T> {
        self.items.get(id.as_raw() as usize)
    }

    /// Returns the item for `id` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this arena.
    pub fn get_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.as_raw() as usize]
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing was allocated.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over `(id, &item)` in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }

    /// Iterates over `(id, &mut item)` in allocation order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> {
        self.items
            .iter_mut()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }

    /// Iterates over IDs in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = I> {
        (0..self.items.len() as u32).map(I::from_raw)
    }

    /// Iterates over items in allocation order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        self.get(id)
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        self.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::StateId;

    #[test]
    fn alloc_and_index() {
        let mut arena: Arena<StateId, &str> = Arena::new();
        let a = arena.alloc("wait");
        let b = arena.alloc("head");
        assert_eq!(arena[a], "wait");
        assert_eq!(arena[b], "head");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn alloc_with_sees_own_id() {
        let mut arena: Arena<StateId, u32> = Arena::new();
        arena.alloc(7);
        let id = arena.alloc_with(|id| id.as_raw() * 10);
        assert_eq!(arena[id], 10);
    }

    #[test]
    fn next_id_predicts_alloc() {
        let mut arena: Arena<StateId, ()> = Arena::new();
        let predicted = arena.next_id();
        assert_eq!(arena.alloc(()), predicted);
    }

    #[test]
    fn try_get_out_of_range() {
        let arena: Arena<StateId, u8> = Arena::new();
        assert!(arena.try_get(StateId::from_raw(0)).is_none());
    }

    #[test]
    fn get_mut_modifies() {
        let mut arena: Arena<StateId, Vec<u8>> = Arena::new();
        let id = arena.alloc(Vec::new());
        arena[id].push(1);
        assert_eq!(arena[id], vec![1]);
    }

    #[test]
    fn ids_and_iter_agree() {
        let mut arena: Arena<StateId, char> = Arena::new();
        arena.alloc('a');
        arena.alloc('b');
        let ids: Vec<_> = arena.ids().collect();
        let iter_ids: Vec<_> = arena.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, iter_ids);
    }

    #[test]
    fn serializes_as_plain_list() {
        let mut arena: Arena<StateId, u8> = Arena::new();
        arena.alloc(1);
        arena.alloc(2);
        assert_eq!(serde_json::to_string(&arena).unwrap(), "[1,2]");
        let back: Arena<StateId, u8> = serde_json::from_str("[1,2]").unwrap();
        assert_eq!(back, arena);
    }
}
