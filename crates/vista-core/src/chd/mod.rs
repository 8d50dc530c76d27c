//! Compress-hash-displace perfect hash table keyed by node code

mod hash;

pub use hash::HashFunction;

use std::collections::HashSet;

use crate::config::ChdConfig;
use crate::error::ChdBuildError;

use hash::seed_mix;

/// Number of times the table size is doubled before giving up on a seed search.
const MAX_RESIZES: u32 = 3;

/// Immutable string-keyed dictionary answering each lookup with one slot read.
///
/// Built once from the full entry set. Every bucket of keys sharing a primary
/// hash gets a displacement seed that scatters its keys into distinct free
/// slots; single-key buckets point straight at a slot.
pub struct ChdDictionary<V> {
    table: Vec<Option<(Box<str>, V)>>,
    seeds: Vec<i32>,
    hash_function: HashFunction,
    len: usize,
}

impl<V> std::fmt::Debug for ChdDictionary<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChdDictionary")
            .field("len", &self.len)
            .field("slots", &self.table.len())
            .field("hash_function", &self.hash_function)
            .finish()
    }
}

/// Output of the displacement search: a seed per bucket and the slot chosen
/// for each input hash, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Displacement {
    pub seeds: Vec<i32>,
    pub slots: Vec<usize>,
}

/// Find displacement seeds for `keys` (with their primary `hashes`) in a
/// table of `size` slots.
///
/// Pure and deterministic. Returns `None` when some bucket exhausts
/// `size * multiplier` candidate seeds.
pub(crate) fn displace(keys: &[&str], hashes: &[u32], size: usize, multiplier: u32) -> Option<Displacement> {
    debug_assert_eq!(keys.len(), hashes.len());
    debug_assert!(size.is_power_of_two());
    let mask = size - 1;

    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); size];
    for (i, &hash) in hashes.iter().enumerate() {
        buckets[hash as usize & mask].push(i);
    }

    let mut order: Vec<usize> = (0..size).collect();
    order.sort_by(|&a, &b| buckets[b].len().cmp(&buckets[a].len()));

    let mut seeds = vec![0i32; size];
    let mut slots = vec![usize::MAX; hashes.len()];
    let mut occupied = vec![false; size];
    let max_seed = (size as u64 * u64::from(multiplier)).min(i32::MAX as u64) as u32;
    let mut candidate: Vec<usize> = Vec::new();

    for &bucket in &order {
        let items = &buckets[bucket];
        if items.len() <= 1 {
            break;
        }

        let mut found = None;
        for seed in 1..=max_seed {
            candidate.clear();
            let fits = items.iter().all(|&i| {
                let slot = seed_mix(seed, hashes[i], keys[i], size);
                if occupied[slot] || candidate.contains(&slot) {
                    return false;
                }
                candidate.push(slot);
                true
            });
            if fits {
                found = Some(seed);
                break;
            }
        }

        let seed = found?;
        for (&i, &slot) in items.iter().zip(&candidate) {
            occupied[slot] = true;
            slots[i] = slot;
        }
        seeds[bucket] = seed as i32;
    }

    let mut next_free = 0;
    for &bucket in &order {
        let items = &buckets[bucket];
        if items.len() != 1 {
            continue;
        }
        while occupied[next_free] {
            next_free += 1;
        }
        occupied[next_free] = true;
        slots[items[0]] = next_free;
        seeds[bucket] = -(next_free as i32) - 1;
    }

    Some(Displacement { seeds, slots })
}

impl<V> ChdDictionary<V> {
    /// Build with the default hash function and seed search bound.
    pub fn build<I>(entries: I) -> Result<Self, ChdBuildError>
    where
        I: IntoIterator<Item = (String, V)>,
    {
        Self::build_with(entries, &ChdConfig::default())
    }

    /// Build with explicit construction settings.
    pub fn build_with<I>(entries: I, config: &ChdConfig) -> Result<Self, ChdBuildError>
    where
        I: IntoIterator<Item = (String, V)>,
    {
        let entries: Vec<(String, V)> = entries.into_iter().collect();

        let mut seen = HashSet::with_capacity(entries.len());
        for (key, _) in &entries {
            if !seen.insert(key.as_str()) {
                return Err(ChdBuildError::DuplicateKey(key.clone()));
            }
        }
        drop(seen);

        let hash_function = config.hash_function;
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        let hashes: Vec<u32> = keys.iter().map(|k| hash_function.hash(k)).collect();

        let mut size = entries.len().max(1).next_power_of_two() * 2;
        let mut resizes = 0;
        let displacement = loop {
            if let Some(d) = displace(&keys, &hashes, size, config.max_seed_search_multiplier) {
                break d;
            }
            if resizes == MAX_RESIZES {
                return Err(ChdBuildError::SeedSearchExhausted {
                    entries: entries.len(),
                    size,
                });
            }
            resizes += 1;
            size *= 2;
            tracing::debug!("CHD seed search failed, retrying with {} slots", size);
        };
        drop(keys);

        let len = entries.len();
        let mut table: Vec<Option<(Box<str>, V)>> = (0..size).map(|_| None).collect();
        for ((key, value), slot) in entries.into_iter().zip(displacement.slots) {
            table[slot] = Some((key.into_boxed_str(), value));
        }

        tracing::debug!(
            "CHD table built: {} entries in {} slots ({} hash)",
            len,
            size,
            hash_function
        );

        Ok(ChdDictionary {
            table,
            seeds: displacement.seeds,
            hash_function,
            len,
        })
    }

    /// Look up a key. A stored key that differs from `key` is a miss.
    pub fn get(&self, key: &str) -> Option<&V> {
        let size = self.table.len();
        let hash = self.hash_function.hash(key);
        let seed = self.seeds[hash as usize & (size - 1)];
        let slot = if seed < 0 {
            (-(seed + 1)) as usize
        } else {
            seed_mix(seed as u32, hash, key, size)
        };
        match self.table.get(slot) {
            Some(Some((stored, value))) if stored.as_ref() == key => Some(value),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn hash_function(&self) -> HashFunction {
        self.hash_function
    }

    /// Iterate over entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.table
            .iter()
            .filter_map(|entry| entry.as_ref().map(|(k, v)| (k.as_ref(), v)))
    }
}
