//! Per-table error reporting.
//!
//! A failed insertion is handed to the table's [`ErrorReporter`] before the
//! error is returned to the caller. The reporter is chosen at construction,
//! so two tables in one process can treat failures differently: one logs and
//! carries on, another aborts the current thread.

use crate::error::Error;

/// Receives every error produced by a failed insertion.
pub trait ErrorReporter {
    fn report(&self, error: &Error);
}

/// Logs errors through `tracing` and lets the caller handle the `Err`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, error: &Error) {
        tracing::error!(%error, "hash table insertion failed");
    }
}

/// Treats every reported error as fatal and panics with its message.
#[derive(Clone, Copy, Debug, Default)]
pub struct PanicReporter;

impl ErrorReporter for PanicReporter {
    fn report(&self, error: &Error) {
        panic!("hash table insertion failed: {error}");
    }
}

impl<F> ErrorReporter for F
where
    F: Fn(&Error),
{
    fn report(&self, error: &Error) {
        self(error)
    }
}
