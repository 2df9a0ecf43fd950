//! The eviction ring.
//!
//! Shards form a fixed cycle `0 -> 1 -> .. -> N-1 -> 0`. A pair displaced
//! from shard `i` travels as a [`PendingEviction`] to shard `i + 1 (mod N)`,
//! where it may displace another pair in turn, until one lands in a free slot.
//!
//! Every admitted insert owns exactly one pending eviction until its chain
//! resolves, so the ring length is the number of inserts in flight. Pending
//! evictions are not in any shard, so lookups consult the ring directly.

use std::collections::VecDeque;

use crate::index::Ticket;

/// A pair in transit between shards.
pub(crate) struct PendingEviction<K, V> {
  pub(crate) key: K,
  pub(crate) value: V,
  /// The insert whose chain this pair belongs to.
  pub(crate) origin: Ticket,
  /// The shard this pair is heading for.
  pub(crate) shard: usize,
  /// Displacements caused by the chain so far.
  pub(crate) hops: usize,
  /// The first step on which the pair may claim its shard.
  pub(crate) due: u64,
}

pub(crate) struct Ring<K, V> {
  pending: VecDeque<PendingEviction<K, V>>,
}

impl<K, V> Ring<K, V>
where
  K: Eq,
{
  #[inline]
  pub(crate) fn new() -> Self {
    Self {
      pending: VecDeque::new(),
    }
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.pending.len()
  }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool {
    self.pending.is_empty()
  }

  #[inline]
  pub(crate) fn push(&mut self, eviction: PendingEviction<K, V>) {
    self.pending.push_back(eviction);
  }

  #[inline]
  pub(crate) fn get(&self, index: usize) -> Option<&PendingEviction<K, V>> {
    self.pending.get(index)
  }

  /// Puts a stalled eviction back where it was taken from.
  #[inline]
  pub(crate) fn insert(&mut self, index: usize, eviction: PendingEviction<K, V>) {
    self.pending.insert(index, eviction);
  }

  #[inline]
  pub(crate) fn remove(&mut self, index: usize) -> Option<PendingEviction<K, V>> {
    self.pending.remove(index)
  }

  /// Returns the position of the pair carrying `key`.
  #[inline]
  pub(crate) fn position(&self, key: &K) -> Option<usize> {
    self.pending.iter().position(|pending| pending.key == *key)
  }

  /// Replaces the value carried at `index`.
  #[inline]
  pub(crate) fn update(&mut self, index: usize, value: V) {
    if let Some(pending) = self.pending.get_mut(index) {
      pending.value = value;
    }
  }

  pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
    self.pending.iter().map(|pending| (&pending.key, &pending.value))
  }
}
