//! A latency-bounded multi-table key-value store.
//!
//! `ctab` provides [`CTab`], a fixed-capacity map that spreads its entries
//! over several independent hash tables ("shards"). Every operation completes
//! in a fixed number of steps, independent of the load of the table: probes
//! read every shard at once, and inserts never wait for the displacements
//! they cause.
//!
//! # Overview
//!
//! Each key has one candidate slot in every shard. An insert enters an
//! eviction ring at shard `0`: if the candidate slot is free the pair lands
//! there, otherwise it takes the slot and the displaced pair moves on to the
//! next shard, and so on around the ring. While a pair circulates it stays
//! visible to lookups, modifies and deletes.
//!
//! Writes land in storage a fixed number of steps after they are issued. A
//! per-shard forwarding unit makes them visible from the step they are
//! issued on, so back-to-back read-modify-writes of one key never see a stale
//! value.
//!
//! # Usage
//!
//! ```
//! use ctab::{CTab, Presence};
//!
//! let mut table: CTab<&str, u32> = CTab::new();
//!
//! table.insert("apples", 3).unwrap();
//! assert_eq!(table.lookup("apples"), Some(3));
//!
//! assert_eq!(table.modify("apples", |count| count + 2), Presence::Found);
//! assert_eq!(table.lookup("apples"), Some(5));
//!
//! assert_eq!(table.delete("apples"), Presence::Found);
//! assert_eq!(table.lookup("apples"), None);
//! ```
//!
//! # Pipelining
//!
//! The synchronous methods above step the table until their own reply
//! arrives. For full throughput, submit requests and drive the table one
//! [`step`] at a time; every step dispatches one request and returns the
//! [`Event`]s that happened during it:
//!
//! ```
//! use ctab::{CTab, ConstParams, Event, Reply, Request};
//!
//! let mut table: CTab<u32, u32, ConstParams<2, 64>> = CTab::new();
//!
//! let insert = table.submit(Request::Insert(1, 10));
//! let lookup = table.submit(Request::Lookup(1));
//!
//! let mut events = Vec::new();
//!
//! while !table.is_quiescent() {
//!   events.extend(table.step());
//! }
//!
//! assert!(events.contains(&Event::Reply { ticket: insert, reply: Reply::Insert(Ok(())) }));
//! assert!(events.contains(&Event::Reply { ticket: lookup, reply: Reply::Lookup(Some(10)) }));
//! ```
//!
//! Inserts are admitted only while fewer than [`Params::INSERTS`] of them are
//! circulating. Otherwise they are refused with [`Error::Busy`], carrying the
//! pair back so the identical request can be resubmitted.
//!
//! # Configuration
//!
//! The geometry of the table is configured at compile time through the
//! [`Params`] trait. The default configuration ([`DefaultParams`]) has four
//! shards of [`Capacity::DEF`] slots:
//!
//! ```
//! use ctab::{CTab, DefaultParams};
//!
//! // These are equivalent:
//! let table1: CTab<u64, u64> = CTab::new();
//! let table2: CTab<u64, u64, DefaultParams> = CTab::new();
//! ```
//!
//! For custom geometries, use [`ConstParams`]:
//!
//! ```
//! use ctab::{CTab, ConstParams};
//!
//! // 8 shards of 512 slots, pipeline depth 3, 4 inserts in flight.
//! let table: CTab<u64, u64, ConstParams<8, 512, 3, 4>> = CTab::new();
//! assert_eq!(table.capacity(), 8 * 512);
//! ```
//!
//! Keys are mapped to slots by a [`Router`]. The default [`SeededRouter`]
//! derives one [`foldhash`] function per shard from a seed.
//!
//! # Concurrency
//!
//! [`CTab`] itself is single-threaded: every operation takes `&mut self`.
//! [`Shared`] wraps it in a mutex for use from several threads.
//!
//! [`step`]: crate::public::CTab::step
//! [`Capacity::DEF`]: crate::config::Capacity::DEF
//! [`ConstParams`]: crate::config::ConstParams
//! [`DefaultParams`]: crate::config::DefaultParams
//! [`Params`]: crate::config::Params
//! [`Params::INSERTS`]: crate::config::Params::INSERTS
//! [`Error::Busy`]: crate::error::Error::Busy
//! [`foldhash`]: https://docs.rs/foldhash
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod admission;
mod array;
mod error;
mod forward;
mod index;
mod params;
mod public;
mod request;
mod ring;
mod router;
mod shard;
mod shared;
mod table;
mod utils;

#[cfg(test)]
mod tests;

pub(crate) use crate::utils::sync;

pub mod implementation {
  #![doc = include_str!("../IMPLEMENTATION.md")]
}

pub mod config {
  //! Configuration parameters which can be used to override the default table
  //! settings.

  pub use crate::params::Capacity;
  pub use crate::params::ConstParams;
  pub use crate::params::DebugParams;
  pub use crate::params::DefaultParams;
  pub use crate::params::Duplicates;
  pub use crate::params::Params;
  pub use crate::params::ParamsExt;
}

#[doc(inline)]
pub use self::config::Capacity;

#[doc(inline)]
pub use self::config::ConstParams;

#[doc(inline)]
pub use self::config::DefaultParams;

#[doc(inline)]
pub use self::config::Duplicates;

#[doc(inline)]
pub use self::config::Params;

pub use self::admission::Stats;
pub use self::error::Error;
pub use self::error::Presence;
pub use self::index::Ticket;
pub use self::public::CTab;
pub use self::request::Event;
pub use self::request::Reply;
pub use self::request::Request;
pub use self::request::Update;
pub use self::router::Router;
pub use self::router::SeededRouter;
pub use self::shared::Shared;
