//! Observable state container shared by the room, user and message loaders.
//!
//! A [`Loader`] owns a `watch` channel of [`LoadState`]. Every load cycle
//! marks the state busy, awaits a fetch, applies the payload (if any) and
//! clears the busy mark; each transition notifies subscribers. Loads may
//! overlap: each one is numbered, and a response older than the last
//! applied one is dropped instead of overwriting newer data.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use agora_utils::utils::log_internal_error;

use crate::room_service::{Fetched, Payload};

#[derive(Clone, PartialEq, Debug)]
pub struct LoadState<T> {
    data: T,
    in_flight: usize,
    last_applied: u64,
    last_error: Option<String>,
}

impl<T: Default> Default for LoadState<T> {
    fn default() -> Self {
        LoadState { data: T::default(), in_flight: 0, last_applied: 0, last_error: None }
    }
}

impl<T> LoadState<T> {
    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Message of the most recent failed fetch, cleared by the next fetch
    /// that resolves without error.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoadOutcome {
    /// The payload replaced the held data.
    Replaced,
    /// The service had nothing to apply; data is unchanged.
    Unchanged,
    /// The fetch failed; data is unchanged.
    Failed,
    /// A newer load already resolved; this response was discarded.
    Stale,
}

/// Holds one unit of `in_flight` for a running load. Finishing applies the
/// result and releases it in one transition; dropping an unfinished guard
/// (the load future was cancelled) only releases it.
struct InFlight<'a, T> {
    state: &'a watch::Sender<LoadState<T>>,
    finished: bool,
}

impl<'a, T> InFlight<'a, T> {
    fn start(state: &'a watch::Sender<LoadState<T>>) -> Self {
        state.send_modify(|state| state.in_flight += 1);
        InFlight { state, finished: false }
    }

    fn finish(mut self, apply: impl FnOnce(&mut LoadState<T>)) {
        self.finished = true;
        self.state.send_modify(|state| {
            state.in_flight = state.in_flight.saturating_sub(1);
            apply(state);
        });
    }
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            self.state.send_modify(|state| state.in_flight = state.in_flight.saturating_sub(1));
        }
    }
}

#[derive(Clone)]
pub struct Loader<T> {
    name: &'static str,
    state: Arc<watch::Sender<LoadState<T>>>,
    requests: Arc<AtomicU64>,
}

impl<T: Clone + Default + Send + Sync + 'static> Loader<T> {
    pub fn new(name: &'static str) -> Self {
        let (state, _) = watch::channel(LoadState::default());
        Loader { name, state: Arc::new(state), requests: Arc::new(AtomicU64::new(0)) }
    }

    pub fn state(&self) -> LoadState<T> {
        self.state.borrow().clone()
    }

    pub fn data(&self) -> T {
        self.state.borrow().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState<T>> {
        self.state.subscribe()
    }

    pub async fn load<F, E>(&self, fetch: F) -> LoadOutcome
    where
        F: Future<Output = Result<Fetched<T>, E>>,
        E: std::fmt::Display,
    {
        let request = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        let in_flight = InFlight::start(&self.state);
        tracing::debug!(loader = self.name, request, "load started");

        let result = fetch.await;
        if let Err(e) = &result {
            log_internal_error(format!("{} load #{request} failed: {e}", self.name));
        }

        let mut outcome = LoadOutcome::Stale;
        in_flight.finish(|state| {
            if request <= state.last_applied {
                return;
            }
            state.last_applied = request;
            outcome = match result {
                Ok(fetched) => {
                    state.last_error = None;
                    match fetched.and_then(Payload::into_data) {
                        Some(data) => {
                            state.data = data;
                            LoadOutcome::Replaced
                        },
                        None => LoadOutcome::Unchanged,
                    }
                },
                Err(e) => {
                    state.last_error = Some(e.to_string());
                    LoadOutcome::Failed
                },
            };
        });

        tracing::debug!(loader = self.name, request, ?outcome, "load finished");
        outcome
    }
}
