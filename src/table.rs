//! Lock-step coordinator.
//!
//! Every call to [`Table::step`] advances every component by exactly one unit
//! of work, in a fixed order:
//!
//! 1. each shard lands the writebacks due this step;
//! 2. a dispatched lookup, modify or delete probes every shard and the ring;
//! 3. each due eviction tries to claim its shard;
//! 4. a dispatched insert is admitted, rejected or refused.
//!
//! At most one request is dispatched per step. Shards never touch each other's
//! storage; displaced pairs move between them only through the [`Ring`].

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use std::collections::VecDeque;

use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::admission::Admission;
use crate::admission::Stats;
use crate::error::Error;
use crate::error::Presence;
use crate::forward::Write;
use crate::index::SlotIndex;
use crate::index::Ticket;
use crate::params::Duplicates;
use crate::params::Params;
use crate::params::ParamsExt;
use crate::request::Event;
use crate::request::Reply;
use crate::request::Request;
use crate::request::Update;
use crate::ring::PendingEviction;
use crate::ring::Ring;
use crate::router::Router;
use crate::shard::Shard;
use crate::shard::Slot;

/// The shard every new insert enters the ring at.
const ENTRY: usize = 0;

/// Where a probe found a key.
enum Location<P>
where
  P: ?Sized,
{
  Shard { shard: usize, slot: SlotIndex<P> },
  Ring { index: usize },
}

/// A reply waiting for its completion step.
struct Scheduled<K, V> {
  due: u64,
  ticket: Ticket,
  reply: Reply<K, V>,
}

// -----------------------------------------------------------------------------
// Table State
// -----------------------------------------------------------------------------

pub(crate) struct Table<K, V, P, R>
where
  P: Params + ?Sized,
{
  shards: Box<[Shard<K, V, P>]>,
  ring: Ring<K, V>,
  admission: Admission<P>,
  router: R,
  /// Submitted requests, dispatched one per step.
  queue: VecDeque<(Ticket, Request<K, V>)>,
  /// Replies of dispatched requests, ordered by completion step.
  replies: VecDeque<Scheduled<K, V>>,
  /// Number of logically present keys.
  entries: usize,
  now: u64,
  ticket: Ticket,
}

impl<K, V, P, R> Table<K, V, P, R>
where
  K: Eq,
  V: Clone,
  P: Params + ?Sized,
  R: Router<K>,
{
  #[track_caller]
  pub(crate) fn new(router: R) -> Self {
    P::validate();

    Self {
      shards: (0..P::SHARDS).map(|_| Shard::new()).collect(),
      ring: Ring::new(),
      admission: Admission::new(),
      router,
      queue: VecDeque::new(),
      replies: VecDeque::new(),
      entries: 0,
      now: 0,
      ticket: Ticket::from_bits(0),
    }
  }

  #[inline]
  pub(crate) const fn cap(&self) -> usize {
    P::TOTAL
  }

  #[inline]
  pub(crate) const fn len(&self) -> usize {
    self.entries
  }

  #[inline]
  pub(crate) const fn is_empty(&self) -> bool {
    self.entries == 0
  }

  #[inline]
  pub(crate) const fn now(&self) -> u64 {
    self.now
  }

  #[inline]
  pub(crate) const fn in_flight(&self) -> usize {
    self.admission.in_flight()
  }

  #[inline]
  pub(crate) const fn stats(&self) -> Stats {
    self.admission.stats()
  }

  #[inline]
  pub(crate) const fn router(&self) -> &R {
    &self.router
  }

  /// Queues `request` for dispatch and returns its ticket.
  pub(crate) fn submit(&mut self, request: Request<K, V>) -> Ticket {
    let ticket: Ticket = self.ticket;

    self.ticket = ticket.next();
    self.queue.push_back((ticket, request));

    ticket
  }

  /// Returns `true` if no request, writeback or eviction is in flight.
  pub(crate) fn is_quiescent(&self) -> bool {
    self.queue.is_empty()
      && self.replies.is_empty()
      && self.ring.is_empty()
      && self.shards.iter().all(Shard::is_settled)
  }

  /// Runs one step, appending everything that happened to `events`.
  pub(crate) fn step(&mut self, events: &mut Vec<Event<K, V>>) {
    let now: u64 = self.now;

    for shard in &mut self.shards {
      shard.begin(now);
    }

    let mut insert: Option<(Ticket, K, V)> = None;

    match self.queue.pop_front() {
      Some((ticket, Request::Lookup(key))) => self.lookup(ticket, &key),
      Some((ticket, Request::Delete(key))) => self.delete(ticket, key, events),
      Some((ticket, Request::Modify(key, update))) => self.modify(ticket, key, update),
      Some((ticket, Request::Insert(key, value))) => insert = Some((ticket, key, value)),
      None => {}
    }

    self.circulate(events);

    if let Some((ticket, key, value)) = insert {
      self.admit(ticket, key, value, events);
    }

    while self.replies.front().is_some_and(|scheduled| scheduled.due <= now) {
      if let Some(scheduled) = self.replies.pop_front() {
        events.push(Event::Reply {
          ticket: scheduled.ticket,
          reply: scheduled.reply,
        });
      }
    }

    debug_assert_eq!(self.in_flight(), self.ring.len());

    self.now = now.wrapping_add(1);
  }

  /// Iterates the logical contents of the table, circulating pairs included.
  pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
    self
      .shards
      .iter()
      .flat_map(Shard::iter)
      .chain(self.ring.iter())
  }

  // ---------------------------------------------------------------------------
  // Probes
  // ---------------------------------------------------------------------------

  #[inline]
  fn slot(&self, shard: usize, key: &K) -> SlotIndex<P> {
    SlotIndex::from_hash(self.router.hash(shard, key))
  }

  /// The step on which a write dispatched now lands in storage.
  #[inline]
  const fn lands(&self) -> u64 {
    self.now.wrapping_add(P::DEPTH as u64)
  }

  /// Finds `key` in the shards and the ring.
  ///
  /// A broadcast probe (`claim`) takes every shard's read port for the step.
  fn locate(&mut self, key: &K, claim: bool) -> Option<Location<P>> {
    let mut found: Option<Location<P>> = self
      .ring
      .position(key)
      .map(|index| Location::Ring { index });

    for shard in 0..P::SHARDS {
      let slot: SlotIndex<P> = self.slot(shard, key);

      let present: bool = if claim {
        self.shards[shard].lookup(slot, key).is_some()
      } else {
        self.shards[shard].read(slot, key).is_some()
      };

      if present {
        debug_assert!(found.is_none(), "key is present in more than one place");
        found = Some(Location::Shard { shard, slot });
      }
    }

    found
  }

  fn schedule(&mut self, ticket: Ticket, reply: Reply<K, V>) {
    self.replies.push_back(Scheduled {
      due: self.lands(),
      ticket,
      reply,
    });
  }

  fn lookup(&mut self, ticket: Ticket, key: &K) {
    trace!(%ticket, now = self.now, "lookup dispatched");

    let value: Option<V> = match self.locate(key, true) {
      Some(Location::Shard { shard, slot }) => self.shards[shard].read(slot, key).cloned(),
      Some(Location::Ring { index }) => self.ring.get(index).map(|pending| pending.value.clone()),
      None => None,
    };

    self.schedule(ticket, Reply::Lookup(value));
  }

  fn modify(&mut self, ticket: Ticket, key: K, update: Update<V>) {
    trace!(%ticket, now = self.now, "modify dispatched");

    let found: bool = match self.locate(&key, true) {
      Some(Location::Shard { shard, slot }) => {
        let lands: u64 = self.lands();

        if let Some(current) = self.shards[shard].read(slot, &key) {
          let value: V = update(current);
          self.shards[shard].writeback(slot, key, Write::Value(value), lands);
          true
        } else {
          false
        }
      }
      Some(Location::Ring { index }) => {
        if let Some(pending) = self.ring.get(index) {
          let value: V = update(&pending.value);
          self.ring.update(index, value);
          true
        } else {
          false
        }
      }
      None => false,
    };

    self.schedule(ticket, Reply::Modify(Presence::from_found(found)));
  }

  fn delete(&mut self, ticket: Ticket, key: K, events: &mut Vec<Event<K, V>>) {
    trace!(%ticket, now = self.now, "delete dispatched");

    let found: bool = match self.locate(&key, true) {
      Some(Location::Shard { shard, slot }) => {
        let lands: u64 = self.lands();
        self.shards[shard].writeback(slot, key, Write::Tombstone, lands);
        true
      }
      Some(Location::Ring { index }) => match self.ring.remove(index) {
        Some(pending) => {
          // The chain has nothing left to place.
          self.admission.settle();

          debug!(ticket = %pending.origin, hops = pending.hops, "circulating pair deleted");

          events.push(Event::Settled {
            ticket: pending.origin,
            hops: pending.hops,
          });

          true
        }
        None => false,
      },
      None => false,
    };

    if found {
      self.entries -= 1;
    }

    self.schedule(ticket, Reply::Delete(Presence::from_found(found)));
  }

  // ---------------------------------------------------------------------------
  // Eviction Ring
  // ---------------------------------------------------------------------------

  /// Offers every due eviction to its shard, oldest first.
  fn circulate(&mut self, events: &mut Vec<Event<K, V>>) {
    let now: u64 = self.now;
    let mut index: usize = 0;

    loop {
      let due: u64 = match self.ring.get(index) {
        Some(pending) => pending.due,
        None => break,
      };

      if due > now {
        index += 1;
        continue;
      }

      let Some(pending) = self.ring.remove(index) else {
        break;
      };

      let PendingEviction {
        key,
        value,
        origin,
        shard,
        hops,
        due,
      } = pending;

      let slot: SlotIndex<P> = self.slot(shard, &key);

      match self.shards[shard].accept_eviction(slot, Slot { key, value }) {
        Err(Slot { key, value }) => {
          trace!(ticket = %origin, shard, now, "eviction stalled");

          self.admission.stall();

          self.ring.insert(
            index,
            PendingEviction {
              key,
              value,
              origin,
              shard,
              hops,
              due,
            },
          );

          index += 1;
        }
        Ok(None) => {
          debug!(ticket = %origin, shard, hops, now, "insert settled");

          self.admission.settle();

          events.push(Event::Settled {
            ticket: origin,
            hops,
          });
        }
        Ok(Some(displaced)) => {
          self.displace(displaced, origin, shard, hops.saturating_add(1), events);
        }
      }
    }
  }

  /// Sends a pair displaced from `from` on to the next shard of the ring.
  fn displace(
    &mut self,
    displaced: Slot<K, V>,
    origin: Ticket,
    from: usize,
    hops: usize,
    events: &mut Vec<Event<K, V>>,
  ) {
    self.admission.hop();

    if hops > P::RING_BOUND {
      warn!(ticket = %origin, hops, bound = P::RING_BOUND, "eviction chain exceeded the ring bound");

      self.admission.overflow();
      self.entries -= 1;

      events.push(Event::Overflow {
        ticket: origin,
        key: displaced.key,
        value: displaced.value,
      });

      return;
    }

    trace!(ticket = %origin, from, hops, "pair displaced");

    self.ring.push(PendingEviction {
      key: displaced.key,
      value: displaced.value,
      origin,
      shard: (from + 1) % P::SHARDS,
      hops,
      due: self.lands(),
    });
  }

  // ---------------------------------------------------------------------------
  // Admission
  // ---------------------------------------------------------------------------

  fn admit(&mut self, ticket: Ticket, key: K, value: V, events: &mut Vec<Event<K, V>>) {
    let result: Result<(), Error<K, V>> = match self.locate(&key, false) {
      Some(location) => {
        self.admission.duplicate();

        match P::DUPLICATES {
          Duplicates::Reject => {
            debug!(%ticket, "duplicate insert rejected");
            Err(Error::Duplicate { key, value })
          }
          Duplicates::Overwrite => {
            debug!(%ticket, "duplicate insert overwrites");
            self.overwrite(location, key, value);
            Ok(())
          }
        }
      }
      None if !self.admission.has_capacity() => {
        debug!(%ticket, in_flight = self.in_flight(), "insert refused");
        self.admission.refuse();
        Err(Error::Busy { key, value })
      }
      None => {
        debug!(%ticket, now = self.now, "insert admitted");

        self.admission.admit();
        self.entries += 1;

        self.ring.push(PendingEviction {
          key,
          value,
          origin: ticket,
          shard: ENTRY,
          hops: 0,
          due: self.now.wrapping_add(1),
        });

        Ok(())
      }
    };

    events.push(Event::Reply {
      ticket,
      reply: Reply::Insert(result),
    });
  }

  fn overwrite(&mut self, location: Location<P>, key: K, value: V) {
    match location {
      Location::Shard { shard, slot } => {
        let lands: u64 = self.lands();
        self.shards[shard].writeback(slot, key, Write::Value(value), lands);
      }
      Location::Ring { index } => {
        self.ring.update(index, value);
      }
    }
  }
}

// -----------------------------------------------------------------------------
// Inspection
// -----------------------------------------------------------------------------

#[cfg(test)]
impl<K, V, P, R> Table<K, V, P, R>
where
  K: Eq,
  P: Params + ?Sized,
{
  /// Returns how many places physically hold `key`: slots plus the ring.
  pub(crate) fn placements(&self, key: &K) -> usize {
    let slots: usize = self.shards.iter().filter(|shard| shard.stores(key)).count();
    let ring: usize = usize::from(self.ring.position(key).is_some());

    slots + ring
  }

  /// Returns the number of physically occupied slots, per shard.
  pub(crate) fn occupancy(&self) -> Vec<usize> {
    self.shards.iter().map(Shard::occupied).collect()
  }

  /// Returns the number of pending writebacks across all shards.
  pub(crate) fn writebacks(&self) -> usize {
    self.shards.iter().map(Shard::pending).sum()
  }
}

impl<K, V, P, R> Debug for Table<K, V, P, R>
where
  K: Eq + Debug,
  V: Clone + Debug,
  P: Params + ?Sized,
  R: Router<K>,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_map().entries(self.iter()).finish()
  }
}
