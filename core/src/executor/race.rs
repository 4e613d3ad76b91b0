use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::RemoteError;

/// Resolve with whichever comes first: `op` or cancellation.
///
/// For operations that cannot be aborted from the inside. Once `cancel` has
/// fired the result is always [`RemoteError::Cancelled`], even if `op`
/// finished in the same poll; the losing future is dropped.
pub async fn first_of<T, F>(op: F, cancel: &CancellationToken) -> Result<T, RemoteError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    if cancel.is_cancelled() {
        return Err(RemoteError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RemoteError::Cancelled),
        res = op => {
            if cancel.is_cancelled() {
                Err(RemoteError::Cancelled)
            } else {
                res
            }
        }
    }
}
