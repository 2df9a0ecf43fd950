use crate::forward::Write;
use crate::index::SlotIndex;
use crate::params::ConstParams;
use crate::shard::Shard;
use crate::shard::Slot;

type P = ConstParams<2, 16>;
type TestShard = Shard<u32, u32, P>;

fn slot(index: u64) -> SlotIndex<P> {
  SlotIndex::from_hash(index)
}

fn pair(key: u32, value: u32) -> Slot<u32, u32> {
  Slot { key, value }
}

fn place(shard: &mut TestShard, now: u64, index: u64, key: u32, value: u32) {
  shard.begin(now);

  assert!(matches!(shard.accept_eviction(slot(index), pair(key, value)), Ok(None)));
}

#[test]
fn new_shard_is_empty() {
  let shard: TestShard = Shard::new();

  assert_eq!(shard.occupied(), 0);
  assert_eq!(shard.pending(), 0);
  assert!(shard.is_settled());
  assert!(shard.is_free());
  assert_eq!(shard.read(slot(0), &0), None);
  assert_eq!(shard.iter().count(), 0);
}

#[test]
fn eviction_into_free_slot() {
  let mut shard: TestShard = Shard::new();

  place(&mut shard, 0, 3, 1, 10);

  assert_eq!(shard.read(slot(3), &1), Some(&10));
  assert_eq!(shard.read(slot(3), &2), None);
  assert_eq!(shard.read(slot(4), &1), None);
  assert!(shard.stores(&1));
  assert_eq!(shard.occupied(), 1);
}

#[test]
fn one_eviction_per_step() {
  let mut shard: TestShard = Shard::new();

  place(&mut shard, 0, 3, 1, 10);

  assert!(!shard.is_free());

  let Err(rejected) = shard.accept_eviction(slot(4), pair(2, 20)) else {
    panic!("second eviction in one step was accepted");
  };

  assert_eq!(rejected.key, 2);
  assert_eq!(rejected.value, 20);
  assert!(!shard.stores(&2));

  shard.begin(1);

  assert!(shard.is_free());
  assert!(matches!(shard.accept_eviction(slot(4), pair(2, 20)), Ok(None)));
}

#[test]
fn probe_blocks_eviction() {
  let mut shard: TestShard = Shard::new();

  shard.begin(0);

  assert_eq!(shard.lookup(slot(3), &1), None);
  assert!(!shard.is_free());
  assert!(shard.accept_eviction(slot(3), pair(1, 10)).is_err());
  assert_eq!(shard.occupied(), 0);
}

#[test]
fn eviction_displaces_occupant() {
  let mut shard: TestShard = Shard::new();

  place(&mut shard, 0, 3, 1, 10);

  shard.begin(1);

  let Ok(Some(displaced)) = shard.accept_eviction(slot(3), pair(2, 20)) else {
    panic!("occupant was not displaced");
  };

  assert_eq!(displaced.key, 1);
  assert_eq!(displaced.value, 10);
  assert_eq!(shard.read(slot(3), &2), Some(&20));
  assert!(!shard.stores(&1));
}

#[test]
fn writeback_is_visible_before_landing() {
  let mut shard: TestShard = Shard::new();

  place(&mut shard, 0, 3, 1, 10);

  shard.begin(1);
  shard.writeback(slot(3), 1, Write::Value(11), 3);

  assert_eq!(shard.read(slot(3), &1), Some(&11));
  assert_eq!(shard.pending(), 1);
  assert!(!shard.is_settled());

  shard.begin(2);

  assert_eq!(shard.read(slot(3), &1), Some(&11));
  assert!(shard.is_free());

  // Landing takes the write port for the step.
  shard.begin(3);

  assert!(!shard.is_free());
  assert!(shard.is_settled());
  assert_eq!(shard.read(slot(3), &1), Some(&11));
  assert_eq!(shard.iter().collect::<Vec<_>>(), [(&1, &11)]);
}

#[test]
fn tombstone_clears_slot() {
  let mut shard: TestShard = Shard::new();

  place(&mut shard, 0, 3, 1, 10);

  shard.begin(1);
  shard.writeback(slot(3), 1, Write::Tombstone, 3);

  assert_eq!(shard.read(slot(3), &1), None);
  assert_eq!(shard.iter().count(), 0);
  assert!(shard.stores(&1));

  shard.begin(3);

  assert!(!shard.stores(&1));
  assert_eq!(shard.occupied(), 0);
}

#[test]
fn displaced_pair_carries_forwarded_value() {
  let mut shard: TestShard = Shard::new();

  place(&mut shard, 0, 3, 1, 10);

  shard.begin(1);
  shard.writeback(slot(3), 1, Write::Value(11), 3);
  shard.writeback(slot(3), 1, Write::Value(12), 3);

  shard.begin(2);

  let Ok(Some(displaced)) = shard.accept_eviction(slot(3), pair(2, 20)) else {
    panic!("occupant was not displaced");
  };

  assert_eq!(displaced.key, 1);
  assert_eq!(displaced.value, 12);
  assert!(shard.is_settled());

  // Nothing is left to land on the new occupant.
  shard.begin(3);

  assert_eq!(shard.read(slot(3), &2), Some(&20));
}

#[test]
fn deleted_occupant_frees_slot() {
  let mut shard: TestShard = Shard::new();

  place(&mut shard, 0, 3, 1, 10);

  shard.begin(1);
  shard.writeback(slot(3), 1, Write::Tombstone, 3);

  shard.begin(2);

  assert!(matches!(shard.accept_eviction(slot(3), pair(2, 20)), Ok(None)));
  assert!(shard.is_settled());

  shard.begin(3);

  assert_eq!(shard.read(slot(3), &2), Some(&20));
  assert_eq!(shard.occupied(), 1);
}

#[test]
fn reinsert_over_pending_tombstone() {
  let mut shard: TestShard = Shard::new();

  place(&mut shard, 0, 3, 1, 10);

  shard.begin(1);
  shard.writeback(slot(3), 1, Write::Tombstone, 3);

  shard.begin(2);

  assert!(matches!(shard.accept_eviction(slot(3), pair(1, 100)), Ok(None)));

  shard.begin(3);
  shard.begin(4);

  assert_eq!(shard.read(slot(3), &1), Some(&100));
}
