#![cfg(shuttle)]

use shuttle::sync::Arc;
use shuttle::thread;
use shuttle::thread::JoinHandle;

use ctab::ConstParams;
use ctab::Error;
use ctab::Presence;
use ctab::Shared;

type Table = Shared<u32, u32, ConstParams<4, 16, 2, 2>>;

const ITERATIONS: usize = 1_000;

fn admit(table: &Table, key: u32, value: u32) {
  loop {
    match table.insert(key, value) {
      Ok(()) => return,
      Err(Error::Busy { .. }) => thread::yield_now(),
      Err(error) => panic!("unexpected insert failure: {error}"),
    }
  }
}

#[test]
fn test_disjoint_writers() {
  shuttle::check_random(
    || {
      let table: Arc<Table> = Arc::new(Table::new());

      let handles: Vec<JoinHandle<()>> = (0..4)
        .map(|thread_id: u32| {
          let table: Arc<Table> = Arc::clone(&table);

          thread::spawn(move || {
            for index in 0..4 {
              let key: u32 = thread_id * 10 + index;

              admit(&table, key, key);
              assert_eq!(table.modify(key, |value| value * 2), Presence::Found);

              if index % 2 == 1 {
                assert_eq!(table.delete(key), Presence::Found);
              }
            }
          })
        })
        .collect();

      for handle in handles {
        handle.join().unwrap();
      }

      table.settle();

      assert_eq!(table.len(), 8);
      assert_eq!(table.stats().overflowed, 0);

      for thread_id in 0..4 {
        for index in 0..4 {
          let key: u32 = thread_id * 10 + index;
          let expected: Option<u32> = (index % 2 == 0).then_some(key * 2);

          assert_eq!(table.lookup(key), expected);
        }
      }
    },
    ITERATIONS,
  );
}

#[test]
fn test_shared_counter() {
  shuttle::check_random(
    || {
      let table: Arc<Table> = Arc::new(Table::new());

      admit(&table, 0, 0);

      let handles: Vec<JoinHandle<()>> = (0..4)
        .map(|_| {
          let table: Arc<Table> = Arc::clone(&table);

          thread::spawn(move || {
            for _ in 0..8 {
              assert_eq!(table.modify(0, |value| value + 1), Presence::Found);
            }
          })
        })
        .collect();

      for handle in handles {
        handle.join().unwrap();
      }

      assert_eq!(table.lookup(0), Some(32));
    },
    ITERATIONS,
  );
}

#[test]
fn test_insert_delete_race() {
  shuttle::check_random(
    || {
      let table: Arc<Table> = Arc::new(Table::new());

      let writer: JoinHandle<bool> = {
        let table: Arc<Table> = Arc::clone(&table);
        thread::spawn(move || table.insert(7, 70).is_ok())
      };

      let deleter: JoinHandle<Presence> = {
        let table: Arc<Table> = Arc::clone(&table);
        thread::spawn(move || table.delete(7))
      };

      let admitted: bool = writer.join().unwrap();
      let deleted: Presence = deleter.join().unwrap();

      assert!(admitted);

      match deleted {
        Presence::Found => assert_eq!(table.lookup(7), None),
        Presence::NotFound => assert_eq!(table.lookup(7), Some(70)),
      }

      assert_eq!(table.len(), usize::from(!deleted.is_found()));
    },
    ITERATIONS,
  );
}
