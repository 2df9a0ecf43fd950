use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::mem;

use crate::admission::Stats;
use crate::error::Error;
use crate::error::Presence;
use crate::index::Ticket;
use crate::params::DefaultParams;
use crate::params::Params;
use crate::params::ParamsExt;
use crate::request::Event;
use crate::request::Reply;
use crate::request::Request;
use crate::router::Router;
use crate::router::SeededRouter;
use crate::table::Table;

/// A latency-bounded multi-table key-value store.
///
/// `CTab` spreads its entries over [`Params::SHARDS`] shards. Each key has one
/// candidate slot per shard, picked by the router `R`. New entries enter the
/// eviction ring at shard `0` and are pushed shard by shard until one lands
/// in a free slot.
///
/// The table advances in discrete steps. It can be driven two ways:
///
/// - **Synchronously**: [`lookup`], [`insert`], [`delete`] and [`modify`]
///   submit one request and step the table until its reply arrives.
/// - **Pipelined**: [`submit`] queues requests, and every [`step`] dispatches
///   one and returns the [`Event`]s that happened during the step.
///
/// See the [crate-level documentation][crate] for an overview.
///
/// # Type Parameters
///
/// - `K`: The key type.
/// - `V`: The value type.
/// - `P`: Configuration parameters implementing [`Params`]. Defaults to
///   [`DefaultParams`] (4 shards of 1024 slots).
/// - `R`: The [`Router`] mapping keys to slots. Defaults to [`SeededRouter`].
///
/// # Examples
///
/// ```
/// use ctab::CTab;
///
/// let mut table: CTab<&str, u32> = CTab::new();
///
/// table.insert("one", 1).unwrap();
/// assert_eq!(table.lookup("one"), Some(1));
/// ```
///
/// [`lookup`]: Self::lookup
/// [`insert`]: Self::insert
/// [`delete`]: Self::delete
/// [`modify`]: Self::modify
/// [`submit`]: Self::submit
/// [`step`]: Self::step
pub struct CTab<K, V, P = DefaultParams, R = SeededRouter>
where
  P: Params + ?Sized,
{
  inner: Table<K, V, P, R>,
  /// Events produced while a synchronous call waited for its own reply.
  backlog: Vec<Event<K, V>>,
}

impl<K, V, P, R> CTab<K, V, P, R>
where
  K: Eq,
  V: Clone,
  P: Params + ?Sized,
  R: Router<K>,
{
  /// Creates a new, empty table with a default router.
  ///
  /// # Panics
  ///
  /// Panics if `P` describes an unusable table, e.g. fewer than two shards.
  ///
  /// # Examples
  ///
  /// ```
  /// use ctab::CTab;
  ///
  /// let table: CTab<u64, String> = CTab::new();
  /// assert!(table.is_empty());
  /// ```
  #[inline]
  #[track_caller]
  pub fn new() -> Self
  where
    R: Default,
  {
    Self::with_router(R::default())
  }

  /// Creates a new, empty table using `router` to place keys.
  ///
  /// # Examples
  ///
  /// ```
  /// use ctab::{CTab, SeededRouter};
  ///
  /// let table: CTab<u64, u64> = CTab::with_router(SeededRouter::new(7));
  /// assert_eq!(table.router().seed(), 7);
  /// ```
  #[inline]
  #[track_caller]
  pub fn with_router(router: R) -> Self {
    Self {
      inner: Table::new(router),
      backlog: Vec::new(),
    }
  }

  /// Returns the router used to place keys.
  #[inline]
  pub const fn router(&self) -> &R {
    self.inner.router()
  }

  /// Returns the total number of slots across all shards.
  ///
  /// # Examples
  ///
  /// ```
  /// use ctab::{CTab, ConstParams};
  ///
  /// let table: CTab<u64, u64, ConstParams<4, 512>> = CTab::new();
  /// assert_eq!(table.capacity(), 4 * 512);
  /// ```
  #[inline]
  pub const fn capacity(&self) -> usize {
    self.inner.cap()
  }

  /// Returns the number of keys logically present, circulating keys included.
  ///
  /// # Examples
  ///
  /// ```
  /// use ctab::CTab;
  ///
  /// let mut table: CTab<u64, u64> = CTab::new();
  /// assert_eq!(table.len(), 0);
  ///
  /// table.insert(1, 1).unwrap();
  /// table.insert(2, 2).unwrap();
  /// assert_eq!(table.len(), 2);
  ///
  /// table.delete(1);
  /// assert_eq!(table.len(), 1);
  /// ```
  #[inline]
  pub const fn len(&self) -> usize {
    self.inner.len()
  }

  /// Returns `true` if the table contains no keys.
  #[inline]
  pub const fn is_empty(&self) -> bool {
    self.inner.is_empty()
  }

  /// Returns the fraction of slots holding a key.
  #[inline]
  #[allow(clippy::cast_precision_loss)]
  pub fn load_factor(&self) -> f64 {
    self.len() as f64 / self.capacity() as f64
  }

  /// Returns the number of steps run so far.
  #[inline]
  pub const fn now(&self) -> u64 {
    self.inner.now()
  }

  /// Returns the number of admitted inserts whose chains are unresolved.
  #[inline]
  pub const fn in_flight(&self) -> usize {
    self.inner.in_flight()
  }

  /// Returns the running counters of the table.
  #[inline]
  pub const fn stats(&self) -> Stats {
    self.inner.stats()
  }

  // ---------------------------------------------------------------------------
  // Pipelined API
  // ---------------------------------------------------------------------------

  /// Queues a request and returns its ticket.
  ///
  /// Requests are dispatched in submission order, one per [`step`]. Nothing
  /// happens until the table is stepped.
  ///
  /// An insert refused with [`Error::Busy`] must be resubmitted with the
  /// identical key and value to preserve the caller's ordering.
  ///
  /// [`step`]: Self::step
  #[inline]
  pub fn submit(&mut self, request: Request<K, V>) -> Ticket {
    self.inner.submit(request)
  }

  /// Advances the table by one step and returns what happened.
  ///
  /// Events buffered by earlier synchronous calls are returned first.
  ///
  /// # Examples
  ///
  /// ```
  /// use ctab::{CTab, ConstParams, Event, Reply, Request};
  ///
  /// let mut table: CTab<u32, u32, ConstParams<2, 16>> = CTab::new();
  ///
  /// table.insert(1, 10).unwrap();
  /// table.settle();
  ///
  /// let ticket = table.submit(Request::Lookup(1));
  ///
  /// assert!(table.step().is_empty());
  /// assert!(table.step().is_empty());
  ///
  /// let events: Vec<Event<u32, u32>> = table.step();
  ///
  /// assert_eq!(events.len(), 1);
  /// assert_eq!(events[0].ticket(), ticket);
  /// assert!(matches!(events[0], Event::Reply { reply: Reply::Lookup(Some(10)), .. }));
  /// ```
  pub fn step(&mut self) -> Vec<Event<K, V>> {
    let mut events: Vec<Event<K, V>> = mem::take(&mut self.backlog);
    self.inner.step(&mut events);
    events
  }

  /// Returns `true` if nothing is queued, circulating or waiting to land.
  #[inline]
  pub fn is_quiescent(&self) -> bool {
    self.inner.is_quiescent()
  }

  /// Steps the table until it is quiescent and returns every event.
  ///
  /// Afterwards every admitted insert has either settled or overflowed, and
  /// every write has landed in storage.
  pub fn settle(&mut self) -> Vec<Event<K, V>> {
    let mut events: Vec<Event<K, V>> = mem::take(&mut self.backlog);

    while !self.inner.is_quiescent() {
      self.inner.step(&mut events);
    }

    events
  }

  // ---------------------------------------------------------------------------
  // Synchronous API
  // ---------------------------------------------------------------------------

  /// Submits `request` and steps until its reply arrives.
  ///
  /// Events for other tickets are kept for the next [`step`] or [`settle`].
  ///
  /// [`step`]: Self::step
  /// [`settle`]: Self::settle
  fn call(&mut self, request: Request<K, V>) -> Reply<K, V> {
    let ticket: Ticket = self.inner.submit(request);
    let mut events: Vec<Event<K, V>> = Vec::new();

    loop {
      self.inner.step(&mut events);

      let mut reply: Option<Reply<K, V>> = None;

      for event in events.drain(..) {
        match event {
          Event::Reply { ticket: done, reply: this } if done == ticket => reply = Some(this),
          other => self.backlog.push(other),
        }
      }

      if let Some(reply) = reply {
        return reply;
      }
    }
  }

  /// Returns a copy of the value stored for `key`.
  ///
  /// Takes [`Params::DEPTH`] `+ 1` steps. A key whose insert is still
  /// circulating is found.
  ///
  /// # Examples
  ///
  /// ```
  /// use ctab::CTab;
  ///
  /// let mut table: CTab<u64, &str> = CTab::new();
  ///
  /// table.insert(7, "seven").unwrap();
  /// assert_eq!(table.lookup(7), Some("seven"));
  /// assert_eq!(table.lookup(8), None);
  /// ```
  pub fn lookup(&mut self, key: K) -> Option<V> {
    match self.call(Request::Lookup(key)) {
      Reply::Lookup(value) => value,
      _ => unreachable!("reply kind always matches the request kind"),
    }
  }

  /// Inserts a new pair.
  ///
  /// Completes on its dispatch step. `Ok` means the pair was admitted: it is
  /// visible to every later request, but its eviction chain may still be
  /// running. The outcome of the chain is reported later as
  /// [`Event::Settled`] or [`Event::Overflow`].
  ///
  /// # Errors
  ///
  /// - [`Error::Busy`] if [`Params::INSERTS`] inserts are already circulating.
  /// - [`Error::Duplicate`] if `key` is present and duplicates are rejected.
  ///
  /// # Examples
  ///
  /// ```
  /// use ctab::CTab;
  ///
  /// let mut table: CTab<u64, u64> = CTab::new();
  ///
  /// table.insert(1, 1).unwrap();
  /// table.settle();
  ///
  /// let error = table.insert(1, 2).unwrap_err();
  /// assert!(error.is_duplicate());
  /// assert_eq!(error.into_inner(), (1, 2));
  /// ```
  pub fn insert(&mut self, key: K, value: V) -> Result<(), Error<K, V>> {
    match self.call(Request::Insert(key, value)) {
      Reply::Insert(result) => result,
      _ => unreachable!("reply kind always matches the request kind"),
    }
  }

  /// Removes `key`.
  ///
  /// # Examples
  ///
  /// ```
  /// use ctab::{CTab, Presence};
  ///
  /// let mut table: CTab<u64, u64> = CTab::new();
  ///
  /// table.insert(1, 1).unwrap();
  /// assert_eq!(table.delete(1), Presence::Found);
  /// assert_eq!(table.delete(1), Presence::NotFound);
  /// ```
  pub fn delete(&mut self, key: K) -> Presence {
    match self.call(Request::Delete(key)) {
      Reply::Delete(presence) => presence,
      _ => unreachable!("reply kind always matches the request kind"),
    }
  }

  /// Replaces the value of `key` with `update` applied to the current value.
  ///
  /// The read and the write happen on the same step, so no other request can
  /// observe or change the value in between.
  ///
  /// # Examples
  ///
  /// ```
  /// use ctab::{CTab, Presence};
  ///
  /// let mut table: CTab<u64, u64> = CTab::new();
  ///
  /// table.insert(1, 1).unwrap();
  /// assert_eq!(table.modify(1, |value| value + 1), Presence::Found);
  /// assert_eq!(table.lookup(1), Some(2));
  /// ```
  pub fn modify<F>(&mut self, key: K, update: F) -> Presence
  where
    F: FnOnce(&V) -> V + Send + 'static,
  {
    match self.call(Request::modify(key, update)) {
      Reply::Modify(presence) => presence,
      _ => unreachable!("reply kind always matches the request kind"),
    }
  }

  /// Iterates every key and its current value, in no particular order.
  ///
  /// # Examples
  ///
  /// ```
  /// use ctab::CTab;
  ///
  /// let mut table: CTab<u64, u64> = CTab::new();
  ///
  /// table.insert(1, 10).unwrap();
  /// table.settle();
  /// table.insert(2, 20).unwrap();
  ///
  /// let mut entries: Vec<(u64, u64)> = table.iter().map(|(k, v)| (*k, *v)).collect();
  /// entries.sort();
  /// assert_eq!(entries, [(1, 10), (2, 20)]);
  /// ```
  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
    self.inner.iter()
  }

  #[cfg(test)]
  pub(crate) const fn table(&self) -> &Table<K, V, P, R> {
    &self.inner
  }
}

impl<K, V, P, R> Debug for CTab<K, V, P, R>
where
  K: Eq + Debug,
  V: Clone + Debug,
  P: Params + ?Sized,
  R: Router<K>,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("CTab")
      .field("params", &P::debug())
      .field("entries", &self.inner)
      .finish_non_exhaustive()
  }
}

impl<K, V, P, R> Default for CTab<K, V, P, R>
where
  K: Eq,
  V: Clone,
  P: Params + ?Sized,
  R: Router<K> + Default,
{
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
