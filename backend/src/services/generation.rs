use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;

/// Tracks the newest search per client session so superseded results can be
/// discarded when they finally arrive.
///
/// In-flight work is never cancelled; the caller settles its ticket at
/// completion and drops the result if a newer search began meanwhile.
#[derive(Debug, Default)]
pub struct SearchGenerations {
    next: AtomicU64,
    latest: Mutex<HashMap<String, u64>>,
}

impl SearchGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new search for `session`, superseding any in flight.
    pub fn begin(&self, session: &str) -> SearchTicket<'_> {
        let generation = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest.lock().insert(session.to_string(), generation);
        SearchTicket {
            generations: self,
            session: session.to_string(),
            generation,
            settled: false,
        }
    }

    /// Sessions with a search still in flight.
    pub fn active_sessions(&self) -> usize {
        self.latest.lock().len()
    }

    /// Forget `session` if `generation` is still its newest search.
    fn release(&self, session: &str, generation: u64) -> bool {
        let mut latest = self.latest.lock();
        if latest.get(session) == Some(&generation) {
            latest.remove(session);
            true
        } else {
            false
        }
    }
}

/// Handle for one in-flight search. Dropping it unsettled (e.g. when the
/// request is abandoned) releases the session entry.
#[derive(Debug)]
pub struct SearchTicket<'a> {
    generations: &'a SearchGenerations,
    session: String,
    generation: u64,
    settled: bool,
}

impl SearchTicket<'_> {
    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Finish the search. Returns `false` when it was superseded, in which
    /// case the result must be discarded.
    pub fn settle(mut self) -> bool {
        self.settled = true;
        self.generations.release(&self.session, self.generation)
    }
}

impl Drop for SearchTicket<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.generations.release(&self.session, self.generation);
        }
    }
}
