//! Shared claim cursor
//!
//! Workers take turns pulling the next unit from one forward-only source.
//! The lock is held only for a single `next()` call, so slow submissions
//! never stop other workers from claiming.

use bootstrap_common::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

type Source<U> = Box<dyn Iterator<Item = Result<U>> + Send>;

/// Mutex-guarded cursor handing out each unit to exactly one claimer
pub struct ClaimCursor<U> {
    source: Mutex<Option<Source<U>>>,
    claimed: AtomicUsize,
}

impl<U: 'static> ClaimCursor<U> {
    pub fn new<I>(source: I) -> Self
    where
        I: Iterator<Item = Result<U>> + Send + 'static,
    {
        Self {
            source: Mutex::new(Some(Box::new(source))),
            claimed: AtomicUsize::new(0),
        }
    }

    /// Cursor over an infallible source
    pub fn from_units<I>(units: I) -> Self
    where
        I: IntoIterator<Item = U>,
        I::IntoIter: Send + 'static,
    {
        Self::new(units.into_iter().map(Ok))
    }

    fn lock(&self) -> MutexGuard<'_, Option<Source<U>>> {
        // The guarded state is a plain Option; a panic elsewhere cannot leave it torn.
        self.source.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the next unit, or `None` once the source is exhausted or closed
    ///
    /// A source error is handed to the one caller that hit it and closes
    /// the cursor for everyone else.
    pub fn claim(&self) -> Result<Option<U>> {
        let mut guard = self.lock();
        let Some(source) = guard.as_mut() else {
            return Ok(None);
        };

        match source.next() {
            Some(Ok(unit)) => {
                self.claimed.fetch_add(1, Ordering::Relaxed);
                Ok(Some(unit))
            },
            Some(Err(e)) => {
                *guard = None;
                Err(e)
            },
            None => {
                debug!("Claim cursor exhausted");
                *guard = None;
                Ok(None)
            },
        }
    }

    /// Stop handing out units; later claims see exhaustion
    pub fn close(&self) {
        *self.lock() = None;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    /// Units handed out so far
    pub fn claimed(&self) -> usize {
        self.claimed.load(Ordering::Relaxed)
    }
}
