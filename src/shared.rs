use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use std::sync::PoisonError;

use crate::admission::Stats;
use crate::error::Error;
use crate::error::Presence;
use crate::params::DefaultParams;
use crate::params::Params;
use crate::public::CTab;
use crate::request::Event;
use crate::router::Router;
use crate::router::SeededRouter;
use crate::sync::Mutex;
use crate::sync::atomic::AtomicUsize;
use crate::sync::atomic::Ordering;

/// A [`CTab`] that can be shared between threads.
///
/// Every operation locks the table for the duration of one synchronous call,
/// so requests from different threads are serialized in lock order. The
/// number of entries is mirrored in an atomic and can be read without
/// taking the lock.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use ctab::Shared;
///
/// let table: Arc<Shared<u64, u64>> = Arc::new(Shared::new());
///
/// let handles: Vec<_> = (0..4)
///   .map(|id| {
///     let table = Arc::clone(&table);
///     thread::spawn(move || {
///       while table.insert(id, id * 10).is_err_and(|error| error.is_busy()) {
///         table.settle();
///       }
///     })
///   })
///   .collect();
///
/// for handle in handles {
///   handle.join().unwrap();
/// }
///
/// assert_eq!(table.len(), 4);
/// assert_eq!(table.lookup(3), Some(30));
/// ```
pub struct Shared<K, V, P = DefaultParams, R = SeededRouter>
where
  P: Params + ?Sized,
{
  table: Mutex<CTab<K, V, P, R>>,
  entries: AtomicUsize,
}

impl<K, V, P, R> Shared<K, V, P, R>
where
  K: Eq,
  V: Clone,
  P: Params + ?Sized,
  R: Router<K>,
{
  /// Creates a new, empty shared table with a default router.
  #[inline]
  #[track_caller]
  pub fn new() -> Self
  where
    R: Default,
  {
    Self::from_table(CTab::new())
  }

  /// Creates a new, empty shared table using `router` to place keys.
  #[inline]
  #[track_caller]
  pub fn with_router(router: R) -> Self {
    Self::from_table(CTab::with_router(router))
  }

  /// Wraps an existing table.
  pub fn from_table(table: CTab<K, V, P, R>) -> Self {
    Self {
      entries: AtomicUsize::new(table.len()),
      table: Mutex::new(table),
    }
  }

  /// Returns the number of keys logically present.
  ///
  /// Reads the mirrored counter without locking; the value reflects the
  /// last completed operation.
  #[inline]
  pub fn len(&self) -> usize {
    self.entries.load(Ordering::Acquire)
  }

  /// Returns `true` if the table contains no keys.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns the running counters of the table.
  pub fn stats(&self) -> Stats {
    self.with(|table| table.stats())
  }

  /// See [`CTab::lookup`].
  pub fn lookup(&self, key: K) -> Option<V> {
    self.with(|table| table.lookup(key))
  }

  /// See [`CTab::insert`].
  ///
  /// # Errors
  ///
  /// See [`CTab::insert`].
  pub fn insert(&self, key: K, value: V) -> Result<(), Error<K, V>> {
    self.with(|table| table.insert(key, value))
  }

  /// See [`CTab::delete`].
  pub fn delete(&self, key: K) -> Presence {
    self.with(|table| table.delete(key))
  }

  /// See [`CTab::modify`].
  pub fn modify<F>(&self, key: K, update: F) -> Presence
  where
    F: FnOnce(&V) -> V + Send + 'static,
  {
    self.with(|table| table.modify(key, update))
  }

  /// See [`CTab::settle`].
  pub fn settle(&self) -> Vec<Event<K, V>> {
    self.with(CTab::settle)
  }

  /// Runs `f` with exclusive access to the table.
  ///
  /// A panic in another thread while it held the lock does not poison the
  /// table for everyone else: every request leaves the table consistent
  /// before control returns to the caller.
  pub fn with<T, F>(&self, f: F) -> T
  where
    F: FnOnce(&mut CTab<K, V, P, R>) -> T,
  {
    let mut guard = self.table.lock().unwrap_or_else(PoisonError::into_inner);

    let output: T = f(&mut *guard);

    self.entries.store(guard.len(), Ordering::Release);

    output
  }
}

impl<K, V, P, R> Debug for Shared<K, V, P, R>
where
  P: Params + ?Sized,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Shared")
      .field("len", &self.entries.load(Ordering::Relaxed))
      .finish_non_exhaustive()
  }
}

impl<K, V, P, R> Default for Shared<K, V, P, R>
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
