//! Requests, replies and events of the pipelined API.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;

use crate::error::Error;
use crate::error::Presence;
use crate::index::Ticket;

/// A boxed read-modify-write function.
pub type Update<V> = Box<dyn FnOnce(&V) -> V + Send>;

/// A request submitted through [`CTab::submit`].
///
/// [`CTab::submit`]: crate::public::CTab::submit
pub enum Request<K, V> {
  /// Read the value of a key.
  Lookup(K),
  /// Insert a new pair.
  Insert(K, V),
  /// Remove a key.
  Delete(K),
  /// Replace the value of a key with a function of its current value.
  Modify(K, Update<V>),
}

impl<K, V> Request<K, V> {
  /// Creates a [`Request::Modify`] from an unboxed function.
  #[inline]
  pub fn modify<F>(key: K, update: F) -> Self
  where
    F: FnOnce(&V) -> V + Send + 'static,
  {
    Self::Modify(key, Box::new(update))
  }

  /// Returns the key this request addresses.
  #[inline]
  pub const fn key(&self) -> &K {
    match self {
      Self::Lookup(key) | Self::Insert(key, _) | Self::Delete(key) | Self::Modify(key, _) => key,
    }
  }
}

impl<K, V> Debug for Request<K, V>
where
  K: Debug,
  V: Debug,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::Lookup(key) => f.debug_tuple("Lookup").field(key).finish(),
      Self::Insert(key, value) => f.debug_tuple("Insert").field(key).field(value).finish(),
      Self::Delete(key) => f.debug_tuple("Delete").field(key).finish(),
      Self::Modify(key, _) => f.debug_tuple("Modify").field(key).finish_non_exhaustive(),
    }
  }
}

/// The answer to a [`Request`].
#[derive(Debug, PartialEq, Eq)]
pub enum Reply<K, V> {
  Lookup(Option<V>),
  Insert(Result<(), Error<K, V>>),
  Delete(Presence),
  Modify(Presence),
}

/// Something that happened during a step.
#[derive(Debug, PartialEq, Eq)]
pub enum Event<K, V> {
  /// A request completed.
  ///
  /// Lookups, modifies and deletes complete exactly [`Params::DEPTH`] steps
  /// after dispatch; inserts complete on their dispatch step.
  ///
  /// [`Params::DEPTH`]: crate::params::Params::DEPTH
  Reply { ticket: Ticket, reply: Reply<K, V> },
  /// The eviction chain of an admitted insert resolved.
  ///
  /// Either a pair found a free slot, or the circulating pair was deleted.
  Settled { ticket: Ticket, hops: usize },
  /// The eviction chain of an admitted insert exceeded the ring bound.
  ///
  /// The pair is the last one displaced and is no longer in the table.
  Overflow { ticket: Ticket, key: K, value: V },
}

impl<K, V> Event<K, V> {
  /// Returns the ticket of the request this event belongs to.
  #[inline]
  pub const fn ticket(&self) -> Ticket {
    match self {
      Self::Reply { ticket, .. } | Self::Settled { ticket, .. } | Self::Overflow { ticket, .. } => {
        *ticket
      }
    }
  }

  /// Converts an [`Overflow`] event into the matching [`Error`].
  ///
  /// Returns `None` for every other event.
  ///
  /// [`Overflow`]: Self::Overflow
  #[inline]
  pub fn into_error(self) -> Option<Error<K, V>> {
    match self {
      Self::Overflow { key, value, .. } => Some(Error::Overflow { key, value }),
      Self::Reply { .. } | Self::Settled { .. } => None,
    }
  }
}
