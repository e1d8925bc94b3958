//! Client-side owners of the scan and user collections.
//!
//! Each orchestrator keeps its state in a [`Store`] behind a mutex. The lock is never
//! held across an `.await`: an operation records its start, performs the remote call,
//! then applies the whole outcome under one lock acquisition. Readers only ever get
//! cloned snapshots.
//!
//! Overlapping list and delete calls are reconciled as follows: a list response is only
//! applied when no newer list was issued after it, and ids deleted while a list was in
//! flight are filtered out of that list's result.

/// User administration.
pub mod admin;
/// Scan lifecycle.
pub mod scans;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Public state types expose their loading flag and error through this trait so the
/// shared bookkeeping can update them.
pub(crate) trait Observable {
    fn set_loading(&mut self, loading: bool);
    fn set_error(&mut self, error: Option<String>);
}

#[derive(Debug, Default)]
pub(crate) struct Store<S> {
    pub(crate) state: S,
    pub(crate) disposed: bool,
    in_flight: usize,
    latest_list: u64,
    lists_in_flight: usize,
    deleted_during_list: HashSet<String>,
}

impl<S: Observable> Store<S> {
    fn begin_operation(&mut self) {
        self.in_flight += 1;
        self.state.set_loading(true);
        self.state.set_error(None);
    }

    fn end_operation(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.state.set_loading(self.in_flight > 0);
    }

    fn begin_list(&mut self) -> u64 {
        self.latest_list += 1;
        self.lists_in_flight += 1;
        self.latest_list
    }

    fn end_list(&mut self) {
        self.lists_in_flight = self.lists_in_flight.saturating_sub(1);
        if self.lists_in_flight == 0 {
            self.deleted_during_list.clear();
        }
    }

    pub(crate) fn is_latest_list(&self, seq: u64) -> bool {
        seq == self.latest_list
    }

    /// Remembers a deletion so list responses already in flight cannot resurrect it.
    pub(crate) fn note_deleted(&mut self, id: &str) {
        if self.lists_in_flight > 0 {
            self.deleted_during_list.insert(id.to_string());
        }
    }

    pub(crate) fn deleted_during_list(&self, id: &str) -> bool {
        self.deleted_during_list.contains(id)
    }
}

pub(crate) type SharedStore<S> = Arc<Mutex<Store<S>>>;

/// Locks a store. A poisoned lock still holds consistent data because every write
/// happens in a single critical section, so the poison is ignored.
pub(crate) fn lock<S>(store: &Mutex<Store<S>>) -> MutexGuard<'_, Store<S>> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps the loading flag raised for as long as it lives, including when the
/// surrounding future is dropped mid-flight.
pub(crate) struct OperationGuard<S: Observable> {
    store: SharedStore<S>,
}

impl<S: Observable> OperationGuard<S> {
    pub(crate) fn begin(store: &SharedStore<S>) -> Self {
        lock(store).begin_operation();
        Self { store: Arc::clone(store) }
    }
}

impl<S: Observable> Drop for OperationGuard<S> {
    fn drop(&mut self) {
        lock(&self.store).end_operation();
    }
}

/// Tracks one in-flight list request and its sequence number.
pub(crate) struct ListGuard<S: Observable> {
    store: SharedStore<S>,
    pub(crate) seq: u64,
}

impl<S: Observable> ListGuard<S> {
    pub(crate) fn begin(store: &SharedStore<S>) -> Self {
        let seq = lock(store).begin_list();
        Self {
            store: Arc::clone(store),
            seq,
        }
    }
}

impl<S: Observable> Drop for ListGuard<S> {
    fn drop(&mut self) {
        lock(&self.store).end_list();
    }
}
