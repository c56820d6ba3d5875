//! failguard core - shared abstractions for the failover connection shim
//!
//! This crate provides the traits and types every other failguard crate
//! depends on:
//!
//! - `DatabaseDriver` - opens a connection from an endpoint descriptor
//! - `Connection` - a live connection that can query, execute and close
//! - Common types like `Value`, `Row`, `QueryResult`
//! - `FailguardError` and the crate-wide `Result` alias

mod connection;
mod driver;
mod error;
mod types;

pub use connection::*;
pub use driver::*;
pub use error::*;
pub use types::*;
