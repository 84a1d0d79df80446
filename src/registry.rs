//! Insertion-ordered entity collections keyed by a stable id.
//!
//! Node types, nodes and joints all live in a [`Registry`]. Writes return a new
//! registry and leave the original untouched, so a compile pass can hold on to
//! a snapshot while the editor keeps producing new ones.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::de::{SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A record that knows its own key.
pub trait Entity {
    type Id: Clone + Eq + Hash + fmt::Debug;

    fn id(&self) -> Self::Id;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Registry<E: Entity> {
    entries: IndexMap<E::Id, E>,
}

impl<E: Entity> Default for Registry<E> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<E: Entity> Registry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &E::Id) -> Option<&E> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &E::Id) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &E::Id> {
        self.entries.keys()
    }

    /// Raw key/value view.
    pub fn as_map(&self) -> &IndexMap<E::Id, E> {
        &self.entries
    }
}

impl<E: Entity + Clone> Registry<E> {
    /// Insert or replace. A replaced entity keeps its original position.
    pub fn put(&self, entity: E) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(entity.id(), entity);
        Self { entries }
    }

    /// Remove `id` if present, preserving the order of the remaining entities.
    pub fn remove(&self, id: &E::Id) -> Self {
        let mut entries = self.entries.clone();
        entries.shift_remove(id);
        Self { entries }
    }

    /// Keep only the entities matching `keep`.
    pub fn retain(&self, mut keep: impl FnMut(&E) -> bool) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|&(_, e)| keep(e))
            .map(|(k, e)| (k.clone(), e.clone()))
            .collect();
        Self { entries }
    }
}

impl<E: Entity> FromIterator<E> for Registry<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let entries = iter.into_iter().map(|e| (e.id(), e)).collect();
        Self { entries }
    }
}

impl<'a, E: Entity> IntoIterator for &'a Registry<E> {
    type Item = &'a E;
    type IntoIter = indexmap::map::Values<'a, E::Id, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

// Serialized as a plain array of entities; ids are recovered from the records.
impl<E: Entity + Serialize> Serialize for Registry<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}

impl<'de, E: Entity + Deserialize<'de>> Deserialize<'de> for Registry<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RegistryVisitor<E>(PhantomData<E>);

        impl<'de, E: Entity + Deserialize<'de>> Visitor<'de> for RegistryVisitor<E> {
            type Value = Registry<E>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array of entities")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut entries = IndexMap::new();
                while let Some(entity) = seq.next_element::<E>()? {
                    entries.insert(entity.id(), entity);
                }
                Ok(Registry { entries })
            }
        }

        deserializer.deserialize_seq(RegistryVisitor(PhantomData))
    }
}
