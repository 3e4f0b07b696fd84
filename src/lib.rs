//! Nodestats is a bounded time-series store for node health metrics. It
//! ingests samples pushed by a node's backend, keeps a fixed number of the
//! most recent points for every metric series, and hands consistent
//! snapshots of the whole store to any number of observers.
//!
//! Why you might choose to use nodestats:
//!
//!  * You need rolling charts whose memory use never grows.
//!  * You want co-displayed series (components and their totals) to always
//!    share the same x-axis labels.
//!  * You want topic registration with the backend to survive reconnects
//!    without duplicate requests.
//!
//! The `nodestats` executable replays recorded backend messages through the
//! store and prints the rendered dashboard to the console.
#![allow(unknown_lints)]
#![deny(trivial_numeric_casts, missing_docs, unstable_features, unused_import_braces)]
extern crate chrono;
extern crate clap;
extern crate serde;
extern crate serde_json;
extern crate slab;
extern crate toml;

#[macro_use]
extern crate log;

#[macro_use]
extern crate serde_derive;

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
extern crate tempdir;

pub mod config;
pub mod format;
pub mod metric;
pub mod ring;
pub mod series;
pub mod source;
pub mod store;
pub mod subscription;
pub mod time;
pub mod view;
