use core::any;
use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::marker::PhantomData;
use core::mem;
use core::num::NonZeroUsize;

// -----------------------------------------------------------------------------
// Configurable Params
// -----------------------------------------------------------------------------

/// Configuration parameters for a [`CTab`].
///
/// Every knob of the table is fixed at compile time. The simplest approach is
/// [`ConstParams`]:
///
/// ```no_run
/// use ctab::{CTab, ConstParams};
///
/// // 4 shards of 256 slots, pipeline depth 2, one insert in flight.
/// type MyTable = CTab<u64, u64, ConstParams<4, 256>>;
/// ```
///
/// # Implementing `Params`
///
/// For full control, implement directly. Unspecified constants fall back to
/// the [`DefaultParams`] values:
///
/// ```no_run
/// use ctab::{CTab, Capacity, Duplicates, Params};
///
/// struct Pipelined;
///
/// impl Params for Pipelined {
///   const SHARDS: usize = 8;
///   const SLOTS: Capacity = Capacity::new(1 << 14);
///   const INSERTS: usize = 4;
///   const DUPLICATES: Duplicates = Duplicates::Overwrite;
/// }
///
/// let table: CTab<u64, u64, Pipelined> = CTab::new();
/// ```
///
/// [`CTab`]: crate::public::CTab
pub trait Params {
  /// The number of shards (independent hash tables) in the ring.
  ///
  /// Must be at least `2`; a displaced entry always moves to another shard.
  const SHARDS: usize = DefaultParams::SHARDS;

  /// The number of slots owned by each shard.
  ///
  /// This value is rounded up to the nearest power of two and clamped to
  /// <code>[Capacity::MIN]..=[Capacity::MAX]</code>.
  const SLOTS: Capacity = DefaultParams::SLOTS;

  /// The pipeline depth, in steps.
  ///
  /// Lookups, modifies and deletes reply this many steps after dispatch, and
  /// their writebacks land in storage this many steps after dispatch. A
  /// displaced entry also spends this many steps in transit between shards.
  const DEPTH: usize = DefaultParams::DEPTH;

  /// The maximum number of inserts circulating at once.
  ///
  /// `1` selects serial mode.
  const INSERTS: usize = DefaultParams::INSERTS;

  /// The maximum number of displacements a single insert may cause before it
  /// is declared unresolvable.
  const RING_BOUND: usize = DefaultParams::RING_BOUND;

  /// How an insert for a key that is already present is handled.
  const DUPLICATES: Duplicates = DefaultParams::DUPLICATES;
}

// -----------------------------------------------------------------------------
// Configurable Params - Extensions
// -----------------------------------------------------------------------------

/// Derived parameters computed from [`Params`].
///
/// Automatically implemented for all [`Params`] types.
///
/// # Example
///
/// ```no_run
/// use ctab::config::{ConstParams, ParamsExt};
///
/// println!("{:#?}", <ConstParams<4, 1024> as ParamsExt>::debug());
/// ```
pub trait ParamsExt: Params + Sealed {
  const SLOT_MASK: usize = Self::SLOTS.as_usize().strict_sub(1);
  const TOTAL: usize = Self::SHARDS.strict_mul(Self::SLOTS.as_usize());

  /// Panics if the configuration cannot describe a working table.
  #[track_caller]
  fn validate() {
    assert!(Self::SHARDS >= 2, "invalid params: `SHARDS` must be at least 2");
    assert!(Self::DEPTH >= 1, "invalid params: `DEPTH` must be at least 1");
    assert!(Self::INSERTS >= 1, "invalid params: `INSERTS` must be at least 1");
    assert!(Self::RING_BOUND >= 1, "invalid params: `RING_BOUND` must be at least 1");
  }

  #[inline]
  fn debug() -> DebugParams<Self> {
    DebugParams {
      marker: PhantomData,
    }
  }
}

// -----------------------------------------------------------------------------
// Debug Params
// -----------------------------------------------------------------------------

/// A helper type for displaying [`Params`] configuration.
///
/// Returned by [`ParamsExt::debug`]; implements [`Debug`] to show all derived
/// configuration values.
#[derive(Clone, Copy)]
pub struct DebugParams<P>
where
  P: ?Sized,
{
  marker: PhantomData<fn(P)>,
}

impl<P> Debug for DebugParams<P>
where
  P: Params + ?Sized,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct(any::type_name::<P>())
      .field("SHARDS", &P::SHARDS)
      .field("SLOTS", &P::SLOTS)
      .field("DEPTH", &P::DEPTH)
      .field("INSERTS", &P::INSERTS)
      .field("RING_BOUND", &P::RING_BOUND)
      .field("DUPLICATES", &P::DUPLICATES)
      .field("SLOT_MASK", &format_args!("{:0>32b}", P::SLOT_MASK))
      .field("TOTAL", &P::TOTAL)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Default Params
// -----------------------------------------------------------------------------

/// The default table configuration.
///
/// Four shards of [`Capacity::DEF`] slots, a pipeline depth of `2`, serial
/// inserts, a ring bound of `256` hops, and duplicate inserts rejected.
///
/// # Example
///
/// ```no_run
/// use ctab::{CTab, DefaultParams};
///
/// // These are equivalent:
/// let table1: CTab<u64, u64> = CTab::new();
/// let table2: CTab<u64, u64, DefaultParams> = CTab::new();
/// ```
#[derive(Clone, Copy)]
#[non_exhaustive]
pub struct DefaultParams;

impl Debug for DefaultParams {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Debug::fmt(&<Self as ParamsExt>::debug(), f)
  }
}

impl Params for DefaultParams {
  const SHARDS: usize = 4;
  const SLOTS: Capacity = Capacity::DEF;
  const DEPTH: usize = 2;
  const INSERTS: usize = 1;
  const RING_BOUND: usize = 256;
  const DUPLICATES: Duplicates = Duplicates::Reject;
}

// -----------------------------------------------------------------------------
// Const-Generic Params
// -----------------------------------------------------------------------------

/// A [`Params`] implementation with compile-time configurable geometry.
///
/// - `N`: number of shards.
/// - `S`: slots per shard (rounded up to a power of two).
/// - `D`: pipeline depth (default `2`).
/// - `M`: concurrent inserts (default `1`).
///
/// The ring bound and duplicate policy use the [`DefaultParams`] values.
///
/// # Examples
///
/// ```no_run
/// use ctab::{CTab, ConstParams};
///
/// let table: CTab<u32, u32, ConstParams<2, 1000>> = CTab::new();
/// assert_eq!(table.capacity(), 2 * 1024);
/// ```
///
/// ```no_run
/// use ctab::{CTab, ConstParams};
///
/// type Pipelined = CTab<u32, u32, ConstParams<4, 4096, 3, 8>>;
/// ```
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub struct ConstParams<const N: usize, const S: usize, const D: usize = 2, const M: usize = 1>;

impl<const N: usize, const S: usize, const D: usize, const M: usize> Params
  for ConstParams<N, S, D, M>
{
  const SHARDS: usize = N;
  const SLOTS: Capacity = Capacity::new(S);
  const DEPTH: usize = D;
  const INSERTS: usize = M;
}

// -----------------------------------------------------------------------------
// Auto-implement Derive
// -----------------------------------------------------------------------------

mod private {
  pub trait Sealed {}
}

use private::Sealed;

impl<P> Sealed for P where P: Params + ?Sized {}
impl<P> ParamsExt for P where P: Params + ?Sized {}

// -----------------------------------------------------------------------------
// Duplicate Policy
// -----------------------------------------------------------------------------

/// Policy for an insert whose key is already present.
///
/// Under both policies at most one insert per key is ever circulating: a
/// duplicate never enters the eviction ring.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum Duplicates {
  /// Refuse the insert with [`Error::Duplicate`], handing the pair back.
  ///
  /// [`Error::Duplicate`]: crate::Error::Duplicate
  #[default]
  Reject,
  /// Replace the stored value in place, exactly like a modify.
  Overwrite,
}

// -----------------------------------------------------------------------------
// Capacity
// -----------------------------------------------------------------------------

/// A validated per-shard slot count.
///
/// Represents a power-of-two value in the range <code>[MIN]..=[MAX]</code>.
/// Used by [`Params::SLOTS`].
///
/// # Construction
///
/// Use [`new()`] to create from an arbitrary value; it rounds up to the nearest
/// power of two and clamps to the valid range.
///
/// ```no_run
/// use ctab::Capacity;
///
/// // Exact power of two
/// let cap = Capacity::new(256);
/// assert_eq!(cap.as_usize(), 256);
///
/// // Rounded up
/// let cap = Capacity::new(100);
/// assert_eq!(cap.as_usize(), 128);
///
/// // Clamped to minimum
/// let cap = Capacity::new(1);
/// assert_eq!(cap, Capacity::MIN);
///
/// // Clamped to maximum
/// let cap = Capacity::new(usize::MAX);
/// assert_eq!(cap, Capacity::MAX);
/// ```
///
/// [MIN]: Self::MIN
/// [MAX]: Self::MAX
/// [`new()`]: Self::new
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct Capacity(CapacityEnum);

impl Capacity {
  /// The minimum supported capacity (2² slots).
  pub const MIN: Self = Self(CapacityEnum::_Capacity1Shl2);

  /// The maximum supported capacity (2²⁴ slots).
  pub const MAX: Self = Self(CapacityEnum::_Capacity1Shl24);

  /// The default capacity (2¹⁰ slots).
  pub const DEF: Self = Self(CapacityEnum::_Capacity1Shl10);

  /// Creates a new [`Capacity`] from an arbitrary value.
  ///
  /// Rounds up to the nearest power of two and clamps to
  /// <code>[MIN]..=[MAX]</code>.
  ///
  /// [MIN]: Self::MIN
  /// [MAX]: Self::MAX
  #[inline]
  pub const fn new(value: usize) -> Self {
    let Some(capacity) = value.checked_next_power_of_two() else {
      return Self::MAX;
    };

    if capacity < Self::MIN.as_usize() {
      Self::MIN
    } else if capacity > Self::MAX.as_usize() {
      Self::MAX
    } else {
      // SAFETY: `capacity` is a power of two inside the supported range.
      unsafe { Self::new_unchecked(capacity) }
    }
  }

  /// Creates a new [`Capacity`] without validation.
  ///
  /// # Safety
  ///
  /// `value` must be a power of two in <code>[MIN]..=[MAX]</code>.
  ///
  /// [MIN]: Self::MIN
  /// [MAX]: Self::MAX
  #[inline]
  pub const unsafe fn new_unchecked(value: usize) -> Self {
    // SAFETY: Caller guarantees `value` is a valid `Capacity`.
    unsafe { mem::transmute::<usize, Self>(value) }
  }

  /// Returns the capacity as a [`usize`].
  #[inline]
  pub const fn as_usize(self) -> usize {
    self.0 as usize
  }

  /// Returns the capacity as a [`NonZeroUsize`].
  #[inline]
  pub const fn as_nonzero(self) -> NonZeroUsize {
    // SAFETY: All `Capacity` values are non-zero by construction.
    unsafe { mem::transmute::<Self, NonZeroUsize>(self) }
  }

  /// Returns the base-2 logarithm of the capacity.
  #[inline]
  pub const fn log2(self) -> u32 {
    self.as_nonzero().trailing_zeros()
  }
}

impl Debug for Capacity {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "{:?} (1 << {:?})", self.as_nonzero(), self.log2())
  }
}

impl Default for Capacity {
  #[inline]
  fn default() -> Self {
    Self::DEF
  }
}

impl From<Capacity> for NonZeroUsize {
  #[inline]
  fn from(other: Capacity) -> Self {
    other.as_nonzero()
  }
}

impl From<Capacity> for usize {
  #[inline]
  fn from(other: Capacity) -> Self {
    other.as_usize()
  }
}

#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(usize)]
enum CapacityEnum {
  _Capacity1Shl2 = 1 << 2,
  _Capacity1Shl3 = 1 << 3,
  _Capacity1Shl4 = 1 << 4,
  _Capacity1Shl5 = 1 << 5,
  _Capacity1Shl6 = 1 << 6,
  _Capacity1Shl7 = 1 << 7,
  _Capacity1Shl8 = 1 << 8,
  _Capacity1Shl9 = 1 << 9,
  _Capacity1Shl10 = 1 << 10,
  _Capacity1Shl11 = 1 << 11,
  _Capacity1Shl12 = 1 << 12,
  _Capacity1Shl13 = 1 << 13,
  _Capacity1Shl14 = 1 << 14,
  _Capacity1Shl15 = 1 << 15,
  _Capacity1Shl16 = 1 << 16,
  _Capacity1Shl17 = 1 << 17,
  _Capacity1Shl18 = 1 << 18,
  _Capacity1Shl19 = 1 << 19,
  _Capacity1Shl20 = 1 << 20,
  _Capacity1Shl21 = 1 << 21,
  _Capacity1Shl22 = 1 << 22,
  _Capacity1Shl23 = 1 << 23,
  _Capacity1Shl24 = 1 << 24,
}
