//! Insert admission control.
//!
//! Serial mode admits one insert at a time; pipelined mode admits up to
//! [`Params::INSERTS`]. A refused insert leaves no trace, and the caller
//! resubmits the identical request later.
//!
//! [`Params::INSERTS`]: crate::params::Params::INSERTS

use core::marker::PhantomData;

use crate::params::Params;

/// Running counters of a table.
///
/// # Examples
///
/// ```
/// use ctab::CTab;
///
/// let mut table: CTab<u32, u32> = CTab::new();
///
/// table.insert(1, 1).unwrap();
/// table.settle();
///
/// assert_eq!(table.stats().admitted, 1);
/// assert_eq!(table.stats().settled, 1);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct Stats {
  /// Inserts admitted into the ring.
  pub admitted: u64,
  /// Inserts refused for lack of capacity.
  pub busy: u64,
  /// Inserts that found their key already present.
  pub duplicates: u64,
  /// Eviction chains that found a free slot (or whose pair was deleted).
  pub settled: u64,
  /// Eviction chains aborted at the ring bound.
  pub overflowed: u64,
  /// Displacements across all chains.
  pub hops: u64,
  /// Steps an eviction was held because its shard's ports were taken.
  pub stalls: u64,
}

impl Stats {
  /// Returns the mean number of displacements per resolved chain.
  #[allow(clippy::cast_precision_loss)]
  pub fn mean_hops(&self) -> f64 {
    let chains: u64 = self.settled + self.overflowed;

    if chains == 0 {
      0.0
    } else {
      self.hops as f64 / chains as f64
    }
  }
}

pub(crate) struct Admission<P>
where
  P: Params + ?Sized,
{
  in_flight: usize,
  stats: Stats,
  marker: PhantomData<fn(P)>,
}

impl<P> Admission<P>
where
  P: Params + ?Sized,
{
  #[inline]
  pub(crate) fn new() -> Self {
    Self {
      in_flight: 0,
      stats: Stats::default(),
      marker: PhantomData,
    }
  }

  #[inline]
  pub(crate) const fn in_flight(&self) -> usize {
    self.in_flight
  }

  #[inline]
  pub(crate) const fn has_capacity(&self) -> bool {
    self.in_flight < P::INSERTS
  }

  #[inline]
  pub(crate) const fn stats(&self) -> Stats {
    self.stats
  }

  /// Admits one insert; the caller must have checked [`has_capacity`].
  ///
  /// [`has_capacity`]: Self::has_capacity
  #[inline]
  pub(crate) fn admit(&mut self) {
    debug_assert!(self.has_capacity());
    self.in_flight += 1;
    self.stats.admitted += 1;
  }

  #[inline]
  pub(crate) fn refuse(&mut self) {
    self.stats.busy += 1;
  }

  #[inline]
  pub(crate) fn duplicate(&mut self) {
    self.stats.duplicates += 1;
  }

  #[inline]
  pub(crate) fn hop(&mut self) {
    self.stats.hops += 1;
  }

  #[inline]
  pub(crate) fn stall(&mut self) {
    self.stats.stalls += 1;
  }

  /// Releases the capacity of a chain that resolved into a slot.
  #[inline]
  pub(crate) fn settle(&mut self) {
    self.release();
    self.stats.settled += 1;
  }

  /// Releases the capacity of a chain that exceeded the ring bound.
  #[inline]
  pub(crate) fn overflow(&mut self) {
    self.release();
    self.stats.overflowed += 1;
  }

  #[inline]
  fn release(&mut self) {
    debug_assert!(self.in_flight > 0, "released an insert that was never admitted");
    self.in_flight = self.in_flight.saturating_sub(1);
  }
}
