use crate::error::DispatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDirective {
    Requeue,
    DeadLetter,
    Drop,
}

/// Maps a dispatch failure to the worker's next move. Everything transient
/// requeues until the attempt cap is reached, after which the request is
/// dead-lettered instead of cycling forever.
pub fn directive_for(
    error: &DispatchError,
    retry_count: u32,
    max_retry_attempts: u32,
) -> RetryDirective {
    match error {
        DispatchError::Terminal { .. } => RetryDirective::Drop,
        _ if retry_count >= max_retry_attempts => RetryDirective::DeadLetter,
        _ => RetryDirective::Requeue,
    }
}
