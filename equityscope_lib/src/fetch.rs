//! Bounded-concurrency bulk fetch with per-call timeouts.
//!
//! Uses the Semaphore + JoinSet + mpsc pattern: every symbol is spawned as
//! a task that waits for a permit, runs the fetch under a timeout and sends
//! its outcome to a single receiver. The receiver reassembles results in
//! input order, so completion order never leaks into the output.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::config::MAX_CONCURRENCY;
use crate::error::EquityScopeError;

/// Limits applied to a bulk fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub concurrency: usize,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout: Duration::from_secs(15),
        }
    }
}

/// A symbol left out of the result table, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Outcome of a bulk fetch: successful rows in input order plus what was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchReport<T> {
    pub rows: Vec<T>,
    pub skipped: Vec<SkippedSymbol>,
}

impl<T> FetchReport<T> {
    pub fn attempted(&self) -> usize {
        self.rows.len() + self.skipped.len()
    }
}

/// Progress notification sent after each symbol completes.
#[derive(Debug, Clone, Copy)]
pub struct FetchProgress<'a> {
    pub symbol: &'a str,
    pub ok: bool,
    pub done: usize,
    pub total: usize,
}

struct FetchOutcome<T> {
    index: usize,
    symbol: String,
    result: Result<T, String>,
}

/// Runs `fetch` for every symbol with at most `options.concurrency` calls in
/// flight (clamped to `1..=MAX_CONCURRENCY`). Failures, timeouts and
/// panicked tasks are recorded in `skipped`; they never abort the batch.
pub async fn fetch_all<T, F, Fut, P>(
    symbols: &[String],
    options: FetchOptions,
    fetch: F,
    mut on_progress: P,
) -> FetchReport<T>
where
    T: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, EquityScopeError>> + Send + 'static,
    P: FnMut(FetchProgress<'_>),
{
    let total = symbols.len();
    let concurrency = options.concurrency.clamp(1, MAX_CONCURRENCY);
    let fetch = Arc::new(fetch);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let (tx, mut rx) = mpsc::channel::<FetchOutcome<T>>(concurrency * 2);
    let mut join_set = JoinSet::new();

    for (index, symbol) in symbols.iter().enumerate() {
        let sem = Arc::clone(&semaphore);
        let sender = tx.clone();
        let fetch = Arc::clone(&fetch);
        let symbol = symbol.clone();
        let timeout = options.timeout;

        join_set.spawn(async move {
            let result = match sem.acquire_owned().await {
                Ok(_permit) => match tokio::time::timeout(timeout, fetch(symbol.clone())).await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("timed out after {:.1}s", timeout.as_secs_f64())),
                },
                Err(_) => Err("fetch pool closed".to_string()),
            };
            let _ = sender
                .send(FetchOutcome {
                    index,
                    symbol,
                    result,
                })
                .await;
        });
    }
    drop(tx);

    let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
    let mut reported = vec![false; total];
    let mut failures: Vec<(usize, SkippedSymbol)> = Vec::new();
    let mut done = 0usize;

    while let Some(outcome) = rx.recv().await {
        done += 1;
        reported[outcome.index] = true;
        let ok = outcome.result.is_ok();
        on_progress(FetchProgress {
            symbol: &outcome.symbol,
            ok,
            done,
            total,
        });
        match outcome.result {
            Ok(value) => slots[outcome.index] = Some(value),
            Err(reason) => {
                tracing::debug!("Skipping {}: {}", outcome.symbol, reason);
                failures.push((
                    outcome.index,
                    SkippedSymbol {
                        symbol: outcome.symbol,
                        reason,
                    },
                ));
            }
        }
    }

    while let Some(joined) = join_set.join_next().await {
        if let Err(e) = joined {
            tracing::warn!("Fetch task failed: {}", e);
        }
    }

    // A task that panicked never sent an outcome.
    for (index, symbol) in symbols.iter().enumerate() {
        if !reported[index] {
            failures.push((
                index,
                SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: "fetch task failed".to_string(),
                },
            ));
        }
    }

    failures.sort_by_key(|(index, _)| *index);
    let rows: Vec<T> = slots.into_iter().flatten().collect();
    let skipped: Vec<SkippedSymbol> = failures.into_iter().map(|(_, s)| s).collect();

    if !skipped.is_empty() {
        tracing::warn!(
            "Fetched {} of {} symbols, skipped {}",
            rows.len(),
            total,
            skipped.len()
        );
    }

    FetchReport { rows, skipped }
}
