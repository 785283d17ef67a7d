//! Bounded parallel fan-out over a set of independent items.
//!
//! Used by the status back-reporter to mirror many manifests' reported status concurrently
//! without unbounded concurrency, and by any other reconciler step that needs to perform the
//! same store operation across several keys in one cycle.

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

/// Default worker width when a caller has not configured one explicitly.
pub const DEFAULT_WORKER_COUNT: usize = 1;

/// Runs `work` for every item in `items` with at most `worker_count` futures in flight at once,
/// collecting the results in arbitrary completion order.
///
/// If `cancellation` becomes cancelled, outstanding work is allowed to drain but no further
/// items beyond those already dispatched are started; items not yet started are silently
/// omitted from the result rather than run after cancellation.
pub async fn fan_out<I, F, Fut, T>(
    items: I,
    worker_count: usize,
    cancellation: &CancellationToken,
    work: F,
) -> Vec<T>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: std::future::Future<Output = T>,
{
    let worker_count = worker_count.max(1);

    stream::iter(items)
        .take_while(|_| {
            let cancelled = cancellation.is_cancelled();
            async move { !cancelled }
        })
        .map(work)
        .buffer_unordered(worker_count)
        .collect()
        .await
}
