//! Per-shard forwarding unit.
//!
//! A write is logically effective on the step that dispatched it, but only
//! lands in storage [`Params::DEPTH`] steps later. Until it lands, the write
//! lives here as a [`ForwardEntry`] that every read of the shard consults
//! first, so the effect is visible immediately.
//!
//! [`Params::DEPTH`]: crate::params::Params::DEPTH

use std::collections::VecDeque;

use crate::index::SlotIndex;

/// The effect of a pending write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Write<V> {
  Value(V),
  Tombstone,
}

impl<V> Write<V> {
  #[inline]
  pub(crate) const fn as_value(&self) -> Option<&V> {
    match self {
      Self::Value(value) => Some(value),
      Self::Tombstone => None,
    }
  }
}

/// A pending write of `key`, landing at `slot` on step `lands`.
pub(crate) struct ForwardEntry<K, V, P>
where
  P: ?Sized,
{
  pub(crate) key: K,
  pub(crate) slot: SlotIndex<P>,
  pub(crate) write: Write<V>,
  pub(crate) lands: u64,
}

/// Pending writes of one shard, oldest first.
///
/// Entries are pushed in dispatch order, and every entry lands exactly
/// `DEPTH` steps after dispatch, so the queue is also sorted by landing step.
pub(crate) struct ForwardingUnit<K, V, P>
where
  P: ?Sized,
{
  entries: VecDeque<ForwardEntry<K, V, P>>,
}

impl<K, V, P> ForwardingUnit<K, V, P>
where
  K: Eq,
  P: ?Sized,
{
  #[inline]
  pub(crate) fn new() -> Self {
    Self {
      entries: VecDeque::new(),
    }
  }

  #[cfg(test)]
  pub(crate) fn len(&self) -> usize {
    self.entries.len()
  }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Registers a pending write.
  pub(crate) fn push(&mut self, entry: ForwardEntry<K, V, P>) {
    debug_assert!(
      self.entries.back().is_none_or(|last| last.lands <= entry.lands),
      "forward entries must be registered in landing order",
    );

    self.entries.push_back(entry);
  }

  /// Returns the newest pending write for `key`, if any.
  #[inline]
  pub(crate) fn get(&self, key: &K) -> Option<&Write<V>> {
    self
      .entries
      .iter()
      .rev()
      .find(|entry| entry.key == *key)
      .map(|entry| &entry.write)
  }

  /// Removes and returns the oldest entry if it lands at or before `now`.
  #[inline]
  pub(crate) fn pop_due(&mut self, now: u64) -> Option<ForwardEntry<K, V, P>> {
    if self.entries.front()?.lands <= now {
      self.entries.pop_front()
    } else {
      None
    }
  }

  /// Removes every pending write for `key`, returning the newest one.
  ///
  /// Called when `key` leaves the shard; its logical value travels with it.
  pub(crate) fn take(&mut self, key: &K) -> Option<Write<V>> {
    let mut newest: Option<Write<V>> = None;
    let mut index: usize = 0;

    while index < self.entries.len() {
      if self.entries[index].key == *key {
        newest = self.entries.remove(index).map(|entry| entry.write);
      } else {
        index += 1;
      }
    }

    newest
  }
}
