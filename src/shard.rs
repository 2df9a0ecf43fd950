//! One shard of the table.
//!
//! A shard owns its slot array outright. Per step it has one read port and
//! one write port:
//!
//! - a broadcast probe (lookup, modify, delete) takes the read port;
//! - a writeback landing from the forwarding unit takes the write port;
//! - an incoming eviction needs both, and only gets them if neither was
//!   taken earlier in the step.
//!
//! Arbitration is static: the table calls [`Shard::begin`], then probes, then
//! evictions, every step in that order.

use crate::array::Array;
use crate::forward::ForwardEntry;
use crate::forward::ForwardingUnit;
use crate::forward::Write;
use crate::index::SlotIndex;
use crate::params::Params;

/// An occupied slot.
pub(crate) struct Slot<K, V> {
  pub(crate) key: K,
  pub(crate) value: V,
}

#[derive(Clone, Copy, Default)]
struct Ports {
  read: bool,
  write: bool,
}

pub(crate) struct Shard<K, V, P>
where
  P: Params + ?Sized,
{
  slots: Array<Option<Slot<K, V>>, P>,
  forward: ForwardingUnit<K, V, P>,
  ports: Ports,
}

impl<K, V, P> Shard<K, V, P>
where
  K: Eq,
  P: Params + ?Sized,
{
  pub(crate) fn new() -> Self {
    Self {
      slots: Array::new(|_| None),
      forward: ForwardingUnit::new(),
      ports: Ports::default(),
    }
  }

  /// Starts step `now`: frees both ports, then lands every writeback due.
  pub(crate) fn begin(&mut self, now: u64) {
    self.ports = Ports::default();

    while let Some(entry) = self.forward.pop_due(now) {
      self.ports.write = true;
      self.land(entry);
    }
  }

  fn land(&mut self, entry: ForwardEntry<K, V, P>) {
    let cell: &mut Option<Slot<K, V>> = self.slots.get_mut(entry.slot);
    let owned: bool = cell.as_ref().is_some_and(|slot| slot.key == entry.key);

    // Displacement takes every pending write of the displaced key with it.
    debug_assert!(owned, "writeback landed on a slot its key no longer owns");

    if !owned {
      return;
    }

    match entry.write {
      Write::Value(value) => {
        if let Some(slot) = cell {
          slot.value = value;
        }
      }
      Write::Tombstone => {
        *cell = None;
      }
    }
  }

  /// Reads `key` at `slot` through the forwarding unit without taking a port.
  pub(crate) fn read(&self, slot: SlotIndex<P>, key: &K) -> Option<&V> {
    match self.forward.get(key) {
      Some(write) => write.as_value(),
      None => self
        .slots
        .get(slot)
        .as_ref()
        .filter(|stored| stored.key == *key)
        .map(|stored| &stored.value),
    }
  }

  /// Serves a broadcast probe, taking the read port for this step.
  pub(crate) fn lookup(&mut self, slot: SlotIndex<P>, key: &K) -> Option<&V> {
    self.ports.read = true;
    self.read(slot, key)
  }

  /// Registers a write of `key`, effective now and landing on step `lands`.
  pub(crate) fn writeback(&mut self, slot: SlotIndex<P>, key: K, write: Write<V>, lands: u64) {
    self.forward.push(ForwardEntry {
      key,
      slot,
      write,
      lands,
    });
  }

  /// Returns `true` if an eviction could use this shard for the current step.
  #[inline]
  pub(crate) fn is_free(&self) -> bool {
    !self.ports.read && !self.ports.write
  }

  /// Writes `incoming` into `slot`, returning the logical previous occupant.
  ///
  /// Hands `incoming` back untouched if either port is already taken this
  /// step; the caller holds it and retries on the next step.
  pub(crate) fn accept_eviction(
    &mut self,
    slot: SlotIndex<P>,
    incoming: Slot<K, V>,
  ) -> Result<Option<Slot<K, V>>, Slot<K, V>> {
    if !self.is_free() {
      return Err(incoming);
    }

    self.ports.read = true;
    self.ports.write = true;

    let Some(mut previous) = self.slots.get_mut(slot).replace(incoming) else {
      return Ok(None);
    };

    match self.forward.take(&previous.key) {
      None => Ok(Some(previous)),
      Some(Write::Value(value)) => {
        previous.value = value;
        Ok(Some(previous))
      }
      Some(Write::Tombstone) => Ok(None),
    }
  }

  /// Returns `true` if no writeback is pending.
  #[inline]
  pub(crate) fn is_settled(&self) -> bool {
    self.forward.is_empty()
  }

  /// Returns the number of pending writebacks.
  #[cfg(test)]
  pub(crate) fn pending(&self) -> usize {
    self.forward.len()
  }

  /// Returns the number of physically occupied slots.
  #[cfg(test)]
  pub(crate) fn occupied(&self) -> usize {
    self.slots.as_slice().iter().filter(|slot| slot.is_some()).count()
  }

  /// Returns `true` if any slot physically stores `key`.
  #[cfg(test)]
  pub(crate) fn stores(&self, key: &K) -> bool {
    self.slots.as_slice().iter().flatten().any(|slot| slot.key == *key)
  }

  /// Iterates the logical contents of the shard.
  pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
    let forward: &ForwardingUnit<K, V, P> = &self.forward;

    self
      .slots
      .as_slice()
      .iter()
      .flatten()
      .filter_map(move |slot| match forward.get(&slot.key) {
        Some(write) => write.as_value().map(|value| (&slot.key, value)),
        None => Some((&slot.key, &slot.value)),
      })
  }
}
