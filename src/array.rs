//! Fixed-length slot storage.
//!
//! Provides [`Array`], the backing storage of one shard.

use core::marker::PhantomData;

use crate::index::SlotIndex;
use crate::params::Params;

/// A fixed-size array of exactly [`P::SLOTS`] elements.
///
/// [`P::SLOTS`]: Params::SLOTS
pub(crate) struct Array<T, P>
where
  P: Params + ?Sized,
{
  data: Box<[T]>,
  phantom: PhantomData<fn(P)>,
}

impl<T, P> Array<T, P>
where
  P: Params + ?Sized,
{
  /// Creates a new array, initializing each element with the given function.
  #[inline]
  pub(crate) fn new<F>(init: F) -> Self
  where
    F: FnMut(usize) -> T,
  {
    Self {
      data: (0..P::SLOTS.as_usize()).map(init).collect(),
      phantom: PhantomData,
    }
  }

  #[inline]
  pub(crate) fn as_slice(&self) -> &[T] {
    &self.data
  }

  /// Returns a reference to the element at the given index.
  #[inline]
  pub(crate) fn get(&self, index: SlotIndex<P>) -> &T {
    debug_assert!(index.get() < self.data.len());

    // SAFETY: `SlotIndex<P>` values are masked by `P::SLOT_MASK`, and the
    // array always holds `P::SLOTS` elements.
    unsafe { self.data.get_unchecked(index.get()) }
  }

  /// Returns a mutable reference to the element at the given index.
  #[inline]
  pub(crate) fn get_mut(&mut self, index: SlotIndex<P>) -> &mut T {
    debug_assert!(index.get() < self.data.len());

    // SAFETY: See `get`.
    unsafe { self.data.get_unchecked_mut(index.get()) }
  }
}
