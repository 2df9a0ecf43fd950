//! Key to slot routing.
//!
//! A table holds one independent hash function per shard. The table reduces
//! each raw hash to a slot address, so a [`Router`] only has to produce well
//! distributed 64-bit values; the table assumes, but never verifies, that it
//! does.

use core::hash::BuildHasher;
use core::hash::Hash;

use foldhash::fast::FixedState;

/// The default seed of [`SeededRouter::default`].
const DEFAULT_SEED: u64 = 0x243F_6A88_85A3_08D3;

/// A set of independent hash functions, one per shard.
///
/// Implementations must be pure: the same `(shard, key)` pair always yields
/// the same value, because both the lookup and the insert path route through
/// it.
///
/// Closures implement `Router`, which is convenient for pinning keys to known
/// slots:
///
/// ```
/// use ctab::{CTab, ConstParams};
///
/// // Every key lands in slot 0 of shard 0, and slot `key` of shard 1.
/// let router = |shard: usize, key: &u32| if shard == 0 { 0 } else { u64::from(*key) };
///
/// let mut table: CTab<u32, u32, ConstParams<2, 4>, _> = CTab::with_router(router);
///
/// table.insert(1, 10).unwrap();
/// assert_eq!(table.lookup(1), Some(10));
/// ```
pub trait Router<K>
where
  K: ?Sized,
{
  /// Hashes `key` with the function belonging to `shard`.
  fn hash(&self, shard: usize, key: &K) -> u64;
}

impl<K, F> Router<K> for F
where
  K: ?Sized,
  F: Fn(usize, &K) -> u64,
{
  #[inline]
  fn hash(&self, shard: usize, key: &K) -> u64 {
    self(shard, key)
  }
}

// -----------------------------------------------------------------------------
// Seeded Router
// -----------------------------------------------------------------------------

/// A [`Router`] built from one seeded [`foldhash`] state per shard.
///
/// Every shard derives its own seed from the base seed, so the per-shard
/// functions are independent of each other.
///
/// [`foldhash`]: https://docs.rs/foldhash
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeededRouter {
  seed: u64,
}

impl SeededRouter {
  /// Creates a router from a base seed.
  #[inline]
  pub const fn new(seed: u64) -> Self {
    Self { seed }
  }

  /// Returns the base seed.
  #[inline]
  pub const fn seed(self) -> u64 {
    self.seed
  }

  #[inline]
  fn state(self, shard: usize) -> FixedState {
    FixedState::with_seed(mix(self.seed, shard as u64))
  }
}

impl Default for SeededRouter {
  #[inline]
  fn default() -> Self {
    Self::new(DEFAULT_SEED)
  }
}

impl<K> Router<K> for SeededRouter
where
  K: Hash + ?Sized,
{
  #[inline]
  fn hash(&self, shard: usize, key: &K) -> u64 {
    self.state(shard).hash_one(key)
  }
}

/// SplitMix64 finalizer over `seed + shard`.
#[inline]
const fn mix(seed: u64, shard: u64) -> u64 {
  let mut value: u64 = seed.wrapping_add(shard.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
  value = (value ^ (value >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
  value = (value ^ (value >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
  value ^ (value >> 31)
}
