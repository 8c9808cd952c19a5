//! Insertion-ordered pools of not-yet-matched entities.
//!
//! Entries live in an arena of slots; a removed entry leaves an empty slot
//! behind so iteration order never shifts. An entity can only leave a pool by
//! being removed, and a removed key is never re-admitted by the engine.

use rustc_hash::FxHashMap;

use crate::models::Keyed;
use crate::normalize::ContentKey;

#[derive(Clone, Debug)]
pub struct Pool<T> {
    slots: Vec<Option<T>>,
    index: FxHashMap<ContentKey, usize>,
}

impl<T: Keyed> Pool<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Insert at the end of the iteration order.
    /// A duplicate key is refused and the entity handed back.
    pub fn insert(&mut self, item: T) -> Result<(), T> {
        let key = item.key();
        if self.index.contains_key(&key) {
            return Err(item);
        }
        self.index.insert(key, self.slots.len());
        self.slots.push(Some(item));
        Ok(())
    }

    pub fn get(&self, key: &ContentKey) -> Option<&T> {
        self.index.get(key).and_then(|&slot| self.slots[slot].as_ref())
    }

    pub fn remove(&mut self, key: &ContentKey) -> Option<T> {
        let slot = self.index.remove(key)?;
        self.slots[slot].take()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Live entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Keys of live entries in insertion order.
    pub fn keys(&self) -> Vec<ContentKey> {
        self.iter().map(Keyed::key).collect()
    }
}

impl<T: Keyed> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}
