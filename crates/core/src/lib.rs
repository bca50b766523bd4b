//! Domain core for the Somnus remote-monitoring backend.
//!
//! Everything in this crate is independent of HTTP and of the database.
//! Persistence is reached only through the traits in [`store`], which the
//! `somnus-db` crate implements for PostgreSQL and [`memory`] implements
//! in-process.

pub mod alert;
pub mod device;
pub mod error;
pub mod ingest;
pub mod ledger;
pub mod locks;
pub mod measurement;
pub mod memory;
pub mod roles;
pub mod severity;
pub mod store;
pub mod telemetry;
pub mod types;
