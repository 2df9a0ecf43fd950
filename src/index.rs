//! Index types.
//!
//! Provides [`Ticket`], the public request identifier, and [`SlotIndex`], the
//! internal address of a slot inside one shard.

use core::fmt::Debug;
use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result;
use core::marker::PhantomData;

use crate::params::Params;
use crate::params::ParamsExt;

// -----------------------------------------------------------------------------
// Ticket
// -----------------------------------------------------------------------------

/// An opaque identifier for a submitted request.
///
/// Returned by [`CTab::submit`]; every [`Event`] produced by the table
/// carries the ticket of the request it belongs to. Tickets are issued in
/// submission order, so they also order requests.
///
/// # Examples
///
/// ```
/// use ctab::{CTab, Event, Reply, Request, Ticket};
///
/// let mut table: CTab<u32, u32> = CTab::new();
///
/// let ticket: Ticket = table.submit(Request::Insert(1, 10));
///
/// for event in table.step() {
///   if let Event::Reply { ticket: done, reply: Reply::Insert(result) } = event {
///     assert_eq!(done, ticket);
///     assert!(result.is_ok());
///   }
/// }
/// ```
///
/// [`CTab::submit`]: crate::public::CTab::submit
/// [`Event`]: crate::request::Event
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Ticket {
  bits: u64,
}

impl Ticket {
  /// Creates a [`Ticket`] from its raw bit representation.
  #[inline]
  pub const fn from_bits(bits: u64) -> Self {
    Self { bits }
  }

  /// Returns the raw bit representation of this ticket.
  ///
  /// See [`from_bits`] to reconstruct a ticket.
  ///
  /// [`from_bits`]: Self::from_bits
  #[inline]
  pub const fn into_bits(self) -> u64 {
    self.bits
  }

  #[inline]
  pub(crate) const fn next(self) -> Self {
    Self::from_bits(self.bits.wrapping_add(1))
  }
}

impl Debug for Ticket {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Debug::fmt(&self.bits, f)
  }
}

impl Display for Ticket {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Display::fmt(&self.bits, f)
  }
}

// -----------------------------------------------------------------------------
// Slot Index
// -----------------------------------------------------------------------------

/// A slot address inside one shard; always less than [`Params::SLOTS`].
#[repr(transparent)]
pub(crate) struct SlotIndex<P>
where
  P: ?Sized,
{
  source: usize,
  marker: PhantomData<fn(P)>,
}

impl<P> SlotIndex<P>
where
  P: Params + ?Sized,
{
  /// Reduces a raw hash to a slot address.
  #[inline]
  pub(crate) const fn from_hash(hash: u64) -> Self {
    Self {
      source: hash as usize & P::SLOT_MASK,
      marker: PhantomData,
    }
  }
}

impl<P> SlotIndex<P>
where
  P: ?Sized,
{
  #[inline]
  pub(crate) const fn get(self) -> usize {
    self.source
  }
}

impl<P> Clone for SlotIndex<P>
where
  P: ?Sized,
{
  #[inline]
  fn clone(&self) -> Self {
    *self
  }
}

impl<P> Copy for SlotIndex<P> where P: ?Sized {}

impl<P> PartialEq for SlotIndex<P>
where
  P: ?Sized,
{
  #[inline]
  fn eq(&self, other: &Self) -> bool {
    self.source == other.source
  }
}

impl<P> Eq for SlotIndex<P> where P: ?Sized {}

impl<P> Debug for SlotIndex<P>
where
  P: ?Sized,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Debug::fmt(&self.source, f)
  }
}
