//! Single-connection exclusivity.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{AppError, StoreSide};

/// Marks the connection as busy while a result stream is open.
///
/// Postgres answers requests strictly in order, so a second statement sent
/// while a stream is only partly consumed would never complete.
pub(crate) struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    pub(crate) fn acquire(
        flag: &Arc<AtomicBool>,
        side: StoreSide,
        sql: &str,
    ) -> Result<Self, AppError> {
        if flag.swap(true, Ordering::SeqCst) {
            return Err(AppError::statement(
                side,
                "connection is still streaming a previous result",
                sql,
            ));
        }
        Ok(Self(flag.clone()))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
