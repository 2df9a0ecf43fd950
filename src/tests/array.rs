use crate::array::Array;
use crate::index::SlotIndex;
use crate::params::ConstParams;
use crate::params::Params;
use crate::utils::each_params;

#[test]
fn length() {
  each_params!({
    let array: Array<usize, P> = Array::new(|index| index);

    assert_eq!(array.as_slice().len(), P::SLOTS.as_usize());
  });
}

#[test]
fn slice_representation() {
  let array: Array<usize, ConstParams<2, 64>> = Array::new(|index| index * 2);

  assert_eq!(array.as_slice().len(), 64);

  for (index, value) in array.as_slice().iter().enumerate() {
    assert_eq!(*value, index * 2);
  }
}

#[test]
fn get_by_slot_index() {
  type P = ConstParams<2, 16>;

  let mut array: Array<usize, P> = Array::new(|index| index);

  let index: SlotIndex<P> = SlotIndex::from_hash(16 + 5);

  assert_eq!(*array.get(index), 5);

  *array.get_mut(index) = 500;

  assert_eq!(*array.get(index), 500);
  assert_eq!(array.as_slice()[5], 500);
}
