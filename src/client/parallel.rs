//! Bounded-concurrency fetching with per-item failure isolation.
//!
//! Every id gets its own result slot. A failed fetch is recorded against its
//! id and never cancels the remaining work, unless the failure is fatal: then
//! no further fetches are started and only those in flight are drained.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use futures::stream::{FuturesUnordered, StreamExt};
use log::debug;

use crate::error::{Error, Result};

/// Default width of the fetch worker pool
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Type alias for boxed futures used in parallel fetching
type SlotFuture<'a, T> = Pin<Box<dyn Future<Output = (i64, Result<T>)> + Send + 'a>>;

/// Results of a [`fetch_all`] batch, keyed by object id
#[derive(Debug)]
pub struct FetchOutcome<T> {
    pub successes: BTreeMap<i64, T>,
    pub failures: BTreeMap<i64, Error>,
}

impl<T> Default for FetchOutcome<T> {
    fn default() -> Self {
        Self {
            successes: BTreeMap::new(),
            failures: BTreeMap::new(),
        }
    }
}

impl<T> FetchOutcome<T> {
    /// Remove and return the first fatal failure, if any.
    pub fn take_fatal(&mut self) -> Option<Error> {
        let id = self
            .failures
            .iter()
            .find(|(_, err)| err.is_fatal())
            .map(|(id, _)| *id)?;
        self.failures.remove(&id)
    }
}

/// Run `fetch_one` for every id with at most `max_concurrent` in flight.
///
/// Returns once every started fetch has completed. Completion order is not
/// preserved; results are keyed by id. After the first fatal failure the
/// remaining ids are never fetched and appear in neither map.
///
/// # Example
///
/// ```ignore
/// let outcome = fetch_all(
///     policies.iter().map(|p| p.id).collect(),
///     |id| fetch_policy_insight(api, id),
///     DEFAULT_CONCURRENCY,
/// ).await;
/// ```
pub async fn fetch_all<'a, T, F, Fut>(
    ids: Vec<i64>,
    fetch_one: F,
    max_concurrent: usize,
) -> FetchOutcome<T>
where
    T: Send + 'a,
    F: Fn(i64) -> Fut + Send + Sync + 'a,
    Fut: Future<Output = Result<T>> + Send + 'a,
{
    let mut outcome = FetchOutcome::default();
    if ids.is_empty() {
        return outcome;
    }

    let max_concurrent = max_concurrent.max(1);
    debug!(
        "Fetching {} objects with max {} concurrent",
        ids.len(),
        max_concurrent
    );

    let mut futures: FuturesUnordered<SlotFuture<'a, T>> = FuturesUnordered::new();
    let mut pending = ids.into_iter();

    let make_future = |id: i64, f: &F| -> SlotFuture<'a, T> {
        let fut = f(id);
        Box::pin(async move { (id, fut.await) })
    };

    // Seed initial batch up to max_concurrent
    for id in pending.by_ref().take(max_concurrent) {
        futures.push(make_future(id, &fetch_one));
    }

    let mut halted = false;

    while let Some((id, result)) = futures.next().await {
        match result {
            Ok(value) => {
                outcome.successes.insert(id, value);
            }
            Err(err) => {
                debug!("Fetch for id {} failed: {}", id, err);
                if err.is_fatal() && !halted {
                    debug!("Fatal failure, not starting remaining fetches");
                    halted = true;
                }
                outcome.failures.insert(id, err);
            }
        }

        if halted {
            continue;
        }
        if let Some(next) = pending.next() {
            futures.push(make_future(next, &fetch_one));
        }
    }

    debug!(
        "Fetched {} objects, {} failed",
        outcome.successes.len(),
        outcome.failures.len()
    );
    outcome
}
