//! The native engine boundary.
//!
//! Exactly the libsqlite3 surface this crate depends on: open/close, one
//! run-to-completion execution entry point, error introspection, and the
//! change counters. Everything is re-exported from `libsqlite3-sys` so the
//! bundled amalgamation provides the symbols on every target.
//!
//! Any SQL engine exposing an equivalent synchronous C ABI could serve as the
//! substrate; the rest of the crate only reaches the engine through this
//! module.

use std::ffi::{CStr, c_int};

pub use libsqlite3_sys::{
    SQLITE_CANTOPEN, SQLITE_CONSTRAINT, SQLITE_DELETE, SQLITE_DONE, SQLITE_ERROR, SQLITE_INSERT,
    SQLITE_MISUSE, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_FULLMUTEX, SQLITE_OPEN_READONLY,
    SQLITE_OPEN_READWRITE, SQLITE_ROW, SQLITE_SELECT, SQLITE_UPDATE, sqlite3, sqlite3_changes,
    sqlite3_close, sqlite3_db_readonly, sqlite3_errmsg, sqlite3_errstr, sqlite3_exec,
    sqlite3_last_insert_rowid, sqlite3_open_v2, sqlite3_total_changes,
};

/// Convert an SQLite result code to a human-readable string.
pub fn error_string(code: c_int) -> &'static str {
    // SAFETY: sqlite3_errstr returns a static string
    unsafe {
        let ptr = sqlite3_errstr(code);
        CStr::from_ptr(ptr).to_str().unwrap_or("unknown error")
    }
}
