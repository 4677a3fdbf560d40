//! Hash combining for composite keys
//!
//! Uses a fixed-seed `ahash` hasher, so results are deterministic for a given
//! build but are not a stable on-disk format.

use std::hash::Hash;

use ahash::RandomState;

const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

fn hash_value<T: Hash + ?Sized>(value: &T) -> u64 {
    RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]).hash_one(value)
}

/// Mix the hash of `value` into `seed`
///
/// ```
/// use memocache::hash::hash_combine;
///
/// let key = hash_combine(hash_combine(0, "visit"), &42u32);
/// assert_eq!(key, hash_combine(hash_combine(0, "visit"), &42u32));
/// ```
pub fn hash_combine<T: Hash + ?Sized>(seed: u64, value: &T) -> u64 {
    let mixed = hash_value(value)
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2);
    seed ^ mixed
}

/// Combine the hashes of every item, in order, starting from zero
pub fn hash_iterable<I>(items: I) -> u64
where
    I: IntoIterator,
    I::Item: Hash,
{
    items
        .into_iter()
        .fold(0, |seed, item| hash_combine(seed, &item))
}
