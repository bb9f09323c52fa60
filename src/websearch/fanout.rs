//! Fail-fast fan-out shared by the search, scoring and scrape stages.

use std::future::Future;

use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Runs every task concurrently and joins them.
///
/// Results come back in task order, one slot per task. The first task to fail
/// wins: its error is returned and the remaining in-flight tasks are dropped.
/// Cancelling `cancel` drops all tasks and yields [`Cancelled`].
///
/// `tasks` is drained before the returned future is first polled.
pub(crate) fn join_fail_fast<I, T, E>(
    cancel: &CancellationToken,
    tasks: I,
) -> impl Future<Output = Result<Vec<T>, E>>
where
    I: IntoIterator,
    I::Item: Future<Output = Result<T, E>>,
    E: From<Cancelled>,
{
    let all = try_join_all(tasks);
    async move {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Cancelled.into()),
            outcome = all => outcome,
        }
    }
}

/// Races a single call against `cancel`.
pub(crate) async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    task: F,
) -> Result<F::Output, Cancelled> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Cancelled),
        output = task => Ok(output),
    }
}
