//! SQLite connection with per-connection serialized execution.
//!
//! A [`Connection`] exclusively owns one native database handle and one
//! [`SerialWorker`](crate::worker). Every native call is funneled through the
//! worker, so for the lifetime of the connection at most one native call
//! against the handle is in flight at any instant, no matter which threads
//! the callers are on. Callbacks submitted concurrently are totally ordered
//! by the worker; a callback that calls back into the same connection runs
//! inline, in program order relative to its enclosing callback.
//!
//! The handle is additionally opened with `SQLITE_OPEN_FULLMUTEX`, which
//! serializes the engine's own internal locking. That is a defense-in-depth
//! layer underneath the worker, not a substitute for it.

use crate::error::{Error, Result, SqliteError};
use crate::ffi;
use crate::types::Location;
use crate::worker::SerialWorker;
use std::ffi::CString;
use std::fmt;
use std::ptr;

/// The owned native handle.
///
/// Non-null from successful open until drop. It crosses threads only under
/// the connection's serialization discipline, and never escapes this module.
#[derive(Clone, Copy)]
struct DbHandle(*mut ffi::sqlite3);

impl DbHandle {
    /// Accessor rather than direct field access so closures capture the
    /// `Send`-asserted wrapper, never the bare pointer field.
    fn as_ptr(self) -> *mut ffi::sqlite3 {
        self.0
    }
}

// SAFETY: the handle is opened with SQLITE_OPEN_FULLMUTEX and all native
// calls against it are serialized by the connection's worker.
unsafe impl Send for DbHandle {}
unsafe impl Sync for DbHandle {}

/// A single connection to a SQLite database.
///
/// Safe to share across threads: all execution goes through one serial
/// worker owned by the connection.
pub struct Connection {
    handle: DbHandle,
    location: Location,
    worker: SerialWorker,
}

impl Connection {
    /// Open a database at `location`.
    ///
    /// `readonly` opens the handle with write capability disabled; otherwise
    /// the database is created if missing. A failed native open retains
    /// nothing — the error is translated and the half-constructed handle is
    /// released before returning.
    pub fn open(location: Location, readonly: bool) -> Result<Self> {
        let c_path = CString::new(location.as_engine_path()).map_err(|_| {
            Error::Open(SqliteError {
                message: "database path contains a NUL byte".to_string(),
                code: ffi::SQLITE_MISUSE,
            })
        })?;

        let mode = if readonly {
            ffi::SQLITE_OPEN_READONLY
        } else {
            ffi::SQLITE_OPEN_CREATE | ffi::SQLITE_OPEN_READWRITE
        };
        let flags = mode | ffi::SQLITE_OPEN_FULLMUTEX;

        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        // SAFETY: valid pointers; the result code is checked below
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };
        if rc != ffi::SQLITE_OK {
            // The engine usually hands back a half-constructed handle that
            // carries the error message. Read the message, then release the
            // handle so the failed open leaves no partial state behind.
            let error = if db.is_null() {
                SqliteError::from_code(rc)
            } else {
                // SAFETY: db is valid until closed; translation happens
                // before any other native call touches it
                let error = unsafe { SqliteError::translate(rc, db) }
                    .unwrap_or_else(|| SqliteError::from_code(rc));
                // SAFETY: db came from the failed open above; no statements
                // exist yet, so a plain close suffices
                unsafe { ffi::sqlite3_close(db) };
                error
            };
            return Err(Error::Open(error));
        }

        let worker = match SerialWorker::spawn() {
            Ok(worker) => worker,
            Err(spawn_err) => {
                // SAFETY: db was opened above and has not been shared
                unsafe { ffi::sqlite3_close(db) };
                return Err(Error::Open(SqliteError {
                    message: format!("failed to spawn connection worker: {spawn_err}"),
                    code: ffi::SQLITE_ERROR,
                }));
            }
        };

        tracing::debug!(location = %location, readonly, "opened sqlite connection");
        Ok(Self {
            handle: DbHandle(db),
            location,
            worker,
        })
    }

    /// Open the database file at `path`; equivalent to
    /// `open(Location::Uri(path), readonly)`.
    pub fn open_path(path: impl Into<String>, readonly: bool) -> Result<Self> {
        Self::open(Location::Uri(path.into()), readonly)
    }

    /// Open an ephemeral in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(Location::InMemory, false)
    }

    /// The storage target this connection was opened with.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Run `callback` with exclusive access to the native handle.
    ///
    /// A caller on an ordinary thread blocks until the connection's worker
    /// has executed the callback; callbacks submitted from several threads
    /// run one at a time in admission order. A callback already running on
    /// the worker that calls `run_serialized` again executes the nested
    /// callback immediately, so reentrant use cannot deadlock.
    ///
    /// There is no cancellation or timeout: a submitted callback always runs
    /// to completion.
    pub fn run_serialized<T, F>(&self, callback: F) -> T
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        self.worker.run(callback)
    }

    /// Execute a single SQL statement to completion, without streaming any
    /// result rows back.
    ///
    /// The call is wrapped in [`run_serialized`](Self::run_serialized) and
    /// the status code is translated inside the same serialized step, before
    /// any later native call can overwrite the engine's message.
    pub fn execute(&self, sql: &str) -> Result<()> {
        let c_sql = CString::new(sql).map_err(|_| {
            Error::Execute(SqliteError {
                message: "sql contains a NUL byte".to_string(),
                code: ffi::SQLITE_MISUSE,
            })
        })?;

        tracing::trace!(sql = %sql, "executing statement");
        let db = self.handle;
        self.run_serialized(move || {
            // SAFETY: the handle is open for the life of the connection and
            // this closure holds the serialization slot
            let rc = unsafe {
                ffi::sqlite3_exec(
                    db.as_ptr(),
                    c_sql.as_ptr(),
                    None,
                    ptr::null_mut(),
                    ptr::null_mut(),
                )
            };
            // SAFETY: same serialized step as the call that produced rc
            match unsafe { SqliteError::translate(rc, db.as_ptr()) } {
                None => Ok(()),
                Some(error) => Err(Error::Execute(error)),
            }
        })
    }

    /// Whether the main database was opened with write capability disabled.
    ///
    /// Like the other pass-through reads below, this is not serialized
    /// internally; call it from within a `run_serialized` callback when it
    /// must be consistent with concurrent execution.
    pub fn is_readonly(&self) -> bool {
        // SAFETY: the handle is open; this only reads a flag
        unsafe { ffi::sqlite3_db_readonly(self.handle.as_ptr(), c"main".as_ptr()) == 1 }
    }

    /// Rows changed by the most recently completed statement.
    pub fn change_count(&self) -> i32 {
        // SAFETY: the handle is open
        unsafe { ffi::sqlite3_changes(self.handle.as_ptr()) }
    }

    /// Cumulative rows changed since the handle was opened.
    pub fn total_change_count(&self) -> i32 {
        // SAFETY: the handle is open
        unsafe { ffi::sqlite3_total_changes(self.handle.as_ptr()) }
    }

    /// Rowid of the most recent successful insert.
    pub fn last_insert_rowid(&self) -> i64 {
        // SAFETY: the handle is open
        unsafe { ffi::sqlite3_last_insert_rowid(self.handle.as_ptr()) }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        tracing::debug!(location = %self.location, "closing sqlite connection");
        // Exclusive access at drop means no callback is in flight and no
        // statements are outstanding; the handle is closed exactly once,
        // here.
        // SAFETY: opened in `open` and never closed elsewhere
        unsafe { ffi::sqlite3_close(self.handle.as_ptr()) };
    }
}
