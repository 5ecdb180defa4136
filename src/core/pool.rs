//! Bounded worker pool and deadline helpers for blocking git work.
//!
//! [`run_bounded`] spreads items over a fixed number of scoped threads that drain
//! a shared queue, one item at a time, and fans results back in over a channel.
//! A panic while processing one item is caught and handed to the caller's
//! fallback so one bad repository never takes down the batch.
//!
//! [`call_with_timeout`] bounds a blocking call that has no timeout of its own
//! (libgit2 status reads). On timeout the call keeps running on its detached
//! thread and its result is discarded.

use crate::core::error::{GitFleetError, Result};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Default number of workers for scans and bulk pulls
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Process every item on at most `width` threads.
///
/// Results come back in completion order, paired with the item's input index.
/// `on_panic` builds the result for an item whose worker call panicked.
pub fn run_bounded<T, R, F, P>(items: Vec<T>, width: usize, work: F, on_panic: P) -> Vec<(usize, R)>
where
    T: Clone + Send,
    R: Send,
    F: Fn(T) -> R + Sync,
    P: Fn(T, String) -> R + Sync,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }
    let workers = width.max(1).min(total);
    log::debug!("Processing {total} items on {workers} workers");

    let queue = Mutex::new(items.into_iter().enumerate());
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            let work = &work;
            let on_panic = &on_panic;
            scope.spawn(move || loop {
                // the guard is dropped before the item is processed
                let next = queue.lock().next();
                let Some((index, item)) = next else {
                    break;
                };
                let result = match panic::catch_unwind(AssertUnwindSafe(|| work(item.clone()))) {
                    Ok(result) => result,
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        log::error!("Worker panicked on item {index}: {message}");
                        on_panic(item, message)
                    }
                };
                if tx.send((index, result)).is_err() {
                    break;
                }
            });
        }
    });
    drop(tx);

    rx.into_iter().collect()
}

/// Run `call` on a helper thread and give up waiting after `timeout`
pub fn call_with_timeout<T, F>(operation: &str, timeout: Duration, call: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    let label = operation.to_string();
    thread::Builder::new()
        .name(format!("git-fleet: {operation}"))
        .spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
                Err(GitFleetError::inspection(format!(
                    "{label} panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });
            let _ = tx.send(result);
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            log::warn!("{operation} did not finish within {timeout:?}");
            Err(GitFleetError::timeout(operation, timeout.as_secs()))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(GitFleetError::inspection(format!(
            "{operation} stopped without a result"
        ))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
