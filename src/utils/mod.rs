//! Small cross-cutting helpers shared by the ingestion engine.

pub(crate) mod whichever;

use foldhash::fast::{FixedState, RandomState};
use std::{collections::HashMap, env, hash::Hash};

const SEED_ENV_VAR: &str = "INGEST_SEED";

/// Reads the deterministic-hasher override from the environment, letting a
/// run's hash-map iteration order be reproduced when debugging orphan
/// pairing.
pub fn get_seed() -> Option<u64> {
    env::var(SEED_ENV_VAR).ok().map(|s| s.bytes().fold(0u64, |a, b| a ^ u64::from(b)))
}

/// A hash map whose hasher is either a fixed, reproducible seed (for
/// debugging) or a fresh random one (the default), selected once at
/// start-up via [`get_seed`].
pub enum SeededMap<K, V> {
    Seeded(HashMap<K, V, FixedState>),
    Random(HashMap<K, V, RandomState>),
}

impl<K, V> SeededMap<K, V> {
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => SeededMap::Seeded(HashMap::with_hasher(FixedState::with_seed(seed))),
            None => SeededMap::Random(HashMap::with_hasher(RandomState::default())),
        }
    }
}

impl<K: Eq + Hash, V> SeededMap<K, V> {
    #[inline]
    pub fn get(&self, k: &K) -> Option<&V> {
        match self {
            SeededMap::Seeded(map) => map.get(k),
            SeededMap::Random(map) => map.get(k),
        }
    }

    #[inline]
    pub fn insert(&mut self, k: K, v: V) -> Option<V> {
        match self {
            SeededMap::Seeded(map) => map.insert(k, v),
            SeededMap::Random(map) => map.insert(k, v),
        }
    }

    #[inline]
    pub fn remove(&mut self, k: &K) -> Option<V> {
        match self {
            SeededMap::Seeded(map) => map.remove(k),
            SeededMap::Random(map) => map.remove(k),
        }
    }

    #[inline]
    pub fn get_mut(&mut self, k: &K) -> Option<&mut V> {
        match self {
            SeededMap::Seeded(map) => map.get_mut(k),
            SeededMap::Random(map) => map.get_mut(k),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match self {
            SeededMap::Seeded(map) => map.len(),
            SeededMap::Random(map) => map.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> IntoIterator for SeededMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::collections::hash_map::IntoIter<K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        match self {
            SeededMap::Seeded(map) => map.into_iter(),
            SeededMap::Random(map) => map.into_iter(),
        }
    }
}
