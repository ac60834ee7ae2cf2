//! Hash maps keyed by raw host handles and facility names.

use ahash::RandomState;

pub type HashMap<K, V> = hashbrown::HashMap<K, V, RandomState>;
