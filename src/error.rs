use core::error::Error as StdError;
use core::fmt::Debug;
use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result;

/// Failure of an insert.
///
/// Every variant hands the pair back, so nothing is lost: a [`Busy`] pair can
/// be resubmitted unchanged, and an [`Overflow`] pair can be re-homed by the
/// caller. A failure only ever concerns the triggering insert; other keys are
/// untouched.
///
/// Modify and delete have no failure mode; an absent key is the normal
/// [`Presence::NotFound`] outcome.
///
/// [`Busy`]: Self::Busy
/// [`Overflow`]: Self::Overflow
/// [`Presence::NotFound`]: crate::Presence::NotFound
#[derive(Clone, PartialEq, Eq)]
pub enum Error<K, V> {
  /// Admission capacity is exhausted; resubmit the identical request.
  Busy { key: K, value: V },
  /// The key is already present and duplicates are rejected.
  Duplicate { key: K, value: V },
  /// An eviction chain exceeded the ring bound.
  ///
  /// The pair is the last one displaced, which is not necessarily the pair
  /// that was inserted. It has left the table.
  Overflow { key: K, value: V },
}

impl<K, V> Error<K, V> {
  /// Returns `true` if this is a backpressure refusal.
  #[inline]
  pub const fn is_busy(&self) -> bool {
    matches!(self, Self::Busy { .. })
  }

  /// Returns `true` if the key was already present.
  #[inline]
  pub const fn is_duplicate(&self) -> bool {
    matches!(self, Self::Duplicate { .. })
  }

  /// Returns `true` if an eviction chain exceeded the ring bound.
  #[inline]
  pub const fn is_overflow(&self) -> bool {
    matches!(self, Self::Overflow { .. })
  }

  /// Returns the key carried by the error.
  #[inline]
  pub const fn key(&self) -> &K {
    match self {
      Self::Busy { key, .. } | Self::Duplicate { key, .. } | Self::Overflow { key, .. } => key,
    }
  }

  /// Consumes the error, returning the pair it carries.
  #[inline]
  pub fn into_inner(self) -> (K, V) {
    match self {
      Self::Busy { key, value } | Self::Duplicate { key, value } | Self::Overflow { key, value } => {
        (key, value)
      }
    }
  }
}

// Keys and values are deliberately left out of the formatted output.
impl<K, V> Debug for Error<K, V> {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::Busy { .. } => f.write_str("Busy { .. }"),
      Self::Duplicate { .. } => f.write_str("Duplicate { .. }"),
      Self::Overflow { .. } => f.write_str("Overflow { .. }"),
    }
  }
}

impl<K, V> Display for Error<K, V> {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::Busy { .. } => f.write_str("insert refused: admission capacity exhausted"),
      Self::Duplicate { .. } => f.write_str("insert refused: key already present"),
      Self::Overflow { .. } => f.write_str("insert failed: eviction chain exceeded the ring bound"),
    }
  }
}

impl<K, V> StdError for Error<K, V> {}

/// Outcome of a modify or delete.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Presence {
  /// The key was present and the write was applied.
  Found,
  /// The key was absent; nothing changed.
  NotFound,
}

impl Presence {
  #[inline]
  pub const fn is_found(self) -> bool {
    matches!(self, Self::Found)
  }

  #[inline]
  pub(crate) const fn from_found(found: bool) -> Self {
    if found { Self::Found } else { Self::NotFound }
  }
}
