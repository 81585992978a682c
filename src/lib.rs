//! Single-connection SQLite wrapper with serialized, thread-safe execution.
//!
//! This crate wraps one native SQLite handle in a [`Connection`] that funnels
//! every native call through a dedicated serial worker thread. Callers on any
//! thread observe correct, non-interleaved access to the handle; nested calls
//! made from inside a running callback execute inline instead of deadlocking.
//! Native status codes outside the success set are translated into structured
//! [`Error`] values carrying the engine's message.
//!
//! Deliberately out of scope: pooling, prepared statements and result-row
//! streaming, transactions, migrations, and schema introspection. The surface
//! is connection lifecycle, serialized execution, and error translation.
//!
//! # Example
//!
//! ```rust,ignore
//! use serialite::{Connection, Location};
//!
//! let conn = Connection::open(Location::InMemory, false)?;
//! conn.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//! conn.execute("INSERT INTO users (name) VALUES ('alice')")?;
//! assert_eq!(conn.change_count(), 1);
//!
//! // Group several calls into one exclusive section:
//! let total = conn.run_serialized(|| {
//!     conn.execute("INSERT INTO users (name) VALUES ('bob')")?;
//!     Ok::<i32, serialite::Error>(conn.total_change_count())
//! })?;
//! ```
//!
//! # Thread safety
//!
//! [`Connection`] is `Send` and `Sync`. Exactly one callback at a time runs
//! against the handle, in admission order across all calling threads, and the
//! handle is also opened with `SQLITE_OPEN_FULLMUTEX` as a second line of
//! defense. One connection per database file is assumed; concurrent writers
//! through separate connections are not coordinated by this crate.

// FFI calls into libsqlite3 require unsafe code.
#![allow(unsafe_code)]

pub mod connection;
pub mod error;
pub mod ffi;
pub mod types;
mod worker;

pub use connection::Connection;
pub use error::{Error, Result, SUCCESS_CODES, SqliteError};
pub use types::{Location, Operation};
