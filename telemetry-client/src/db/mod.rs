//! SQL for the collector tables.
//!
//! Every function takes a single `PgConnection` so callers decide how long a
//! connection is held; schema is expected to be applied out-of-band via
//! `sql/schema/*.sql`.

pub mod collection_runs;
pub mod devices;
pub mod readings;
