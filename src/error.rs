//! Error types and native status-code translation.
//!
//! SQLite reports the outcome of every call as an integer status code and
//! keeps the matching human-readable message on the connection handle. The
//! translator here turns that pair into a structured error value, treating
//! the narrow success set as "no error".

use crate::ffi;
use std::ffi::{CStr, c_int};
use std::fmt;

/// Native status codes that do not represent failure for a run-to-completion
/// call.
///
/// Intentionally narrow: codes like `SQLITE_BUSY` and `SQLITE_LOCKED` are
/// genuine errors at this layer and are never retried here.
pub const SUCCESS_CODES: [c_int; 3] = [ffi::SQLITE_OK, ffi::SQLITE_ROW, ffi::SQLITE_DONE];

/// A structured native engine failure: the status code plus the engine's
/// message captured from the handle at the moment of failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteError {
    /// Human-readable engine message.
    pub message: String,
    /// Native status code outside the success set.
    pub code: c_int,
}

impl SqliteError {
    /// Translate a native status code into an error, or `None` when `code`
    /// is a member of [`SUCCESS_CODES`].
    ///
    /// The last-error message lives on the handle and is overwritten by the
    /// next native call, so this must run inside the same serialized step
    /// that produced `code`.
    ///
    /// # Safety
    /// `db` must be a valid open handle. The handle is only read, never
    /// mutated.
    pub(crate) unsafe fn translate(code: c_int, db: *mut ffi::sqlite3) -> Option<Self> {
        if SUCCESS_CODES.contains(&code) {
            return None;
        }

        // SAFETY: db is valid per contract; errmsg returns a NUL-terminated
        // string owned by the handle.
        let message = unsafe { CStr::from_ptr(ffi::sqlite3_errmsg(db)) }
            .to_string_lossy()
            .into_owned();
        let message = if message.is_empty() {
            ffi::error_string(code).to_owned()
        } else {
            message
        };

        Some(Self { message, code })
    }

    /// Build an error from a bare status code when no handle is available.
    pub(crate) fn from_code(code: c_int) -> Self {
        Self {
            message: ffi::error_string(code).to_owned(),
            code,
        }
    }
}

impl fmt::Display for SqliteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// The primary error type for connection operations.
#[derive(Debug)]
pub enum Error {
    /// The native open call failed; no handle was retained.
    Open(SqliteError),
    /// A serialized native call returned a non-success code.
    Execute(SqliteError),
}

impl Error {
    /// The native status code carried by this error.
    pub fn code(&self) -> c_int {
        match self {
            Error::Open(e) | Error::Execute(e) => e.code,
        }
    }

    /// The engine message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            Error::Open(e) | Error::Execute(e) => &e.message,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Open(e) => write!(f, "Open error: {e}"),
            Error::Execute(e) => write!(f, "Execution error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type alias for connection operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    fn open_raw() -> *mut ffi::sqlite3 {
        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        // SAFETY: valid pointers; the result code is asserted
        let rc = unsafe {
            ffi::sqlite3_open_v2(
                c":memory:".as_ptr(),
                &mut db,
                ffi::SQLITE_OPEN_CREATE | ffi::SQLITE_OPEN_READWRITE,
                ptr::null(),
            )
        };
        assert_eq!(rc, ffi::SQLITE_OK);
        db
    }

    #[test]
    fn success_codes_translate_to_no_error() {
        let db = open_raw();
        for code in SUCCESS_CODES {
            // SAFETY: db is a valid open handle
            assert!(unsafe { SqliteError::translate(code, db) }.is_none());
        }
        // SAFETY: opened above, closed exactly once
        unsafe { ffi::sqlite3_close(db) };
    }

    #[test]
    fn failure_codes_carry_code_and_message() {
        let db = open_raw();
        // SAFETY: db is a valid open handle
        let err = unsafe { SqliteError::translate(ffi::SQLITE_CONSTRAINT, db) }
            .expect("constraint code is not in the success set");
        assert_eq!(err.code, ffi::SQLITE_CONSTRAINT);
        assert!(!err.message.is_empty());
        // SAFETY: opened above, closed exactly once
        unsafe { ffi::sqlite3_close(db) };
    }

    #[test]
    fn translate_reads_the_handle_message() {
        let db = open_raw();
        // Force a real failure so the handle carries a meaningful message.
        // SAFETY: db is valid; exec result is fed straight to the translator
        let rc = unsafe {
            ffi::sqlite3_exec(db, c"NOT VALID SQL".as_ptr(), None, ptr::null_mut(), ptr::null_mut())
        };
        // SAFETY: same serialized step as the failing call
        let err = unsafe { SqliteError::translate(rc, db) }.expect("invalid sql must fail");
        assert_eq!(err.code, ffi::SQLITE_ERROR);
        assert!(err.message.contains("syntax error"), "got: {}", err.message);
        // SAFETY: opened above, closed exactly once
        unsafe { ffi::sqlite3_close(db) };
    }

    #[test]
    fn display_formats() {
        let err = Error::Execute(SqliteError {
            message: "constraint failed".to_string(),
            code: ffi::SQLITE_CONSTRAINT,
        });
        assert_eq!(err.to_string(), "Execution error: constraint failed (code 19)");
        assert_eq!(err.code(), ffi::SQLITE_CONSTRAINT);
        assert_eq!(err.message(), "constraint failed");

        let err = Error::Open(SqliteError::from_code(ffi::SQLITE_CANTOPEN));
        assert!(err.to_string().starts_with("Open error:"));
    }
}
