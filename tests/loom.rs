#![cfg(loom)]

use loom::sync::Arc;
use loom::thread;
use loom::thread::JoinHandle;
use std::ops::Deref;

use ctab::ConstParams;
use ctab::Error;
use ctab::Presence;
use ctab::Shared;

type Insert = JoinHandle<()>;
type Delete = JoinHandle<Presence>;
type Lookup = JoinHandle<Option<u32>>;
type Modify = JoinHandle<Presence>;

type ArcTable = Arc<Shared<u32, u32, ConstParams<2, 4>>>;

struct LoomTable {
  inner: ArcTable,
}

impl LoomTable {
  fn new() -> Self {
    Self {
      inner: Arc::new(Shared::new()),
    }
  }

  fn spawn_insert(&self, key: u32, value: u32) -> Insert {
    let table: ArcTable = ArcTable::clone(&self.inner);
    thread::spawn(move || admit(&table, key, value))
  }

  fn spawn_delete(&self, key: u32) -> Delete {
    let table: ArcTable = ArcTable::clone(&self.inner);
    thread::spawn(move || table.delete(key))
  }

  fn spawn_lookup(&self, key: u32) -> Lookup {
    let table: ArcTable = ArcTable::clone(&self.inner);
    thread::spawn(move || table.lookup(key))
  }

  fn spawn_modify(&self, key: u32) -> Modify {
    let table: ArcTable = ArcTable::clone(&self.inner);
    thread::spawn(move || table.modify(key, |value| value + 1))
  }
}

impl Deref for LoomTable {
  type Target = ArcTable;

  #[inline]
  fn deref(&self) -> &Self::Target {
    &self.inner
  }
}

/// Inserts a pair, settling the table while the insert is refused.
fn admit(table: &Shared<u32, u32, ConstParams<2, 4>>, key: u32, value: u32) {
  loop {
    match table.insert(key, value) {
      Ok(()) => return,
      Err(Error::Busy { .. }) => {
        table.settle();
      }
      Err(error) => panic!("unexpected insert failure: {error}"),
    }
  }
}

#[test]
fn test_insert() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new();

    let thread_a: Insert = table.spawn_insert(1, 10);
    let thread_b: Insert = table.spawn_insert(2, 20);

    thread_a.join().unwrap();
    thread_b.join().unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.lookup(1), Some(10));
    assert_eq!(table.lookup(2), Some(20));
  });
}

#[test]
fn test_insert_race() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new();

    let thread_a: JoinHandle<bool> = {
      let table: ArcTable = ArcTable::clone(&table);
      thread::spawn(move || table.insert(1, 10).is_ok())
    };

    let thread_b: JoinHandle<bool> = {
      let table: ArcTable = ArcTable::clone(&table);
      thread::spawn(move || table.insert(1, 20).is_ok())
    };

    let admitted_a: bool = thread_a.join().unwrap();
    let admitted_b: bool = thread_b.join().unwrap();

    assert!(admitted_a != admitted_b, "exactly one insert should be admitted");
    assert_eq!(table.len(), 1);

    let expected: u32 = if admitted_a { 10 } else { 20 };

    assert_eq!(table.lookup(1), Some(expected));
  });
}

#[test]
fn test_insert_lookup() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new();

    admit(&table, 1, 10);

    let insert: Insert = table.spawn_insert(2, 20);
    let lookup: Lookup = table.spawn_lookup(1);

    insert.join().unwrap();

    assert_eq!(lookup.join().unwrap(), Some(10));
  });
}

#[test]
fn test_insert_delete() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new();

    admit(&table, 1, 10);

    let insert: Insert = table.spawn_insert(2, 20);
    let delete: Delete = table.spawn_delete(1);

    insert.join().unwrap();

    assert_eq!(delete.join().unwrap(), Presence::Found);
    assert_eq!(table.lookup(1), None);
    assert_eq!(table.len(), 1);
  });
}

#[test]
fn test_delete_race() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new();

    admit(&table, 1, 10);

    let delete_a: Delete = table.spawn_delete(1);
    let delete_b: Delete = table.spawn_delete(1);

    let found_a: bool = delete_a.join().unwrap().is_found();
    let found_b: bool = delete_b.join().unwrap().is_found();

    assert!(found_a != found_b, "exactly one delete should succeed");
    assert!(table.is_empty());
  });
}

#[test]
fn test_delete_race_lookup() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new();

    admit(&table, 1, 10);

    let lookup: Lookup = table.spawn_lookup(1);
    let delete: Delete = table.spawn_delete(1);

    assert_eq!(delete.join().unwrap(), Presence::Found);

    if let Some(value) = lookup.join().unwrap() {
      assert_eq!(value, 10);
    }
  });
}

#[test]
fn test_modify_race() {
  loom::model(|| {
    let table: LoomTable = LoomTable::new();

    admit(&table, 1, 0);

    let modify_a: Modify = table.spawn_modify(1);
    let modify_b: Modify = table.spawn_modify(1);

    assert_eq!(modify_a.join().unwrap(), Presence::Found);
    assert_eq!(modify_b.join().unwrap(), Presence::Found);

    assert_eq!(table.lookup(1), Some(2));
  });
}
