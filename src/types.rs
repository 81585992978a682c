//! Value types describing storage targets and detected mutation kinds.

use crate::ffi;
use std::ffi::c_int;
use std::fmt;

/// Where a connection stores its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Ephemeral in-process store; nothing is persisted.
    InMemory,
    /// Anonymous on-disk store, discarded when the connection closes.
    Temporary,
    /// Persistent store at the given path.
    Uri(String),
}

impl Location {
    /// The string handed to the native open call. The engine treats
    /// `":memory:"` as the in-memory sentinel and the empty string as a
    /// temporary database.
    pub fn as_engine_path(&self) -> &str {
        match self {
            Location::InMemory => ":memory:",
            Location::Temporary => "",
            Location::Uri(path) => path,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::InMemory => f.write_str(":memory:"),
            Location::Temporary => f.write_str("(temporary)"),
            Location::Uri(path) => f.write_str(path),
        }
    }
}

/// The kind of mutation the engine reports for a changed row.
///
/// Decoded from the native authorizer action codes. The code space is fixed
/// at build time, so an unrecognized code is an ABI contract violation, not a
/// recoverable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
    Delete,
    Select,
}

impl Operation {
    /// Decode a native action code.
    ///
    /// # Panics
    /// Panics on a code outside the known set; reaching that arm means the
    /// engine ABI no longer matches this build.
    pub fn from_code(code: c_int) -> Self {
        match code {
            ffi::SQLITE_INSERT => Operation::Insert,
            ffi::SQLITE_UPDATE => Operation::Update,
            ffi::SQLITE_DELETE => Operation::Delete,
            ffi::SQLITE_SELECT => Operation::Select,
            other => unreachable!("no operation for native action code {other}"),
        }
    }
}
