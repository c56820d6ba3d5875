//! PostgreSQL driver implementation
//!
//! Endpoint descriptors are anything `tokio_postgres::Config` parses: a
//! libpq-style `key=value` list or a `postgresql://` URL.

mod connection;
mod driver;
mod tls;
mod value;

pub use connection::PostgresConnection;
pub use driver::{PostgresDriver, redact_endpoint};
pub use tls::{TlsError, make_tls_connector};
