//! Database Retry Logic
//!
//! Exponential backoff for writes that hit SQLite's "database is locked",
//! e.g. while another process holds the write lock. Retries stop once
//! `max_lock_wait_ms` has elapsed.

use crate::error::{IngestError, IngestResult};
use std::time::{Duration, Instant};

const INITIAL_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 1000;

/// Whether the error is a transient SQLite lock conflict
pub fn is_lock_error(err: &IngestError) -> bool {
    match err {
        IngestError::Persistence(msg) => {
            msg.contains("database is locked") || msg.contains("database table is locked")
        }
        _ => false,
    }
}

/// Retry a database operation with exponential backoff until max_wait_ms elapses.
///
/// Lock errors are retried with a delay starting at 10ms and doubling up to
/// 1s. Any other error is returned immediately. When the wait budget is used
/// up, the last lock error is returned as a record-scoped persistence error.
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g. "program upsert")
/// * `max_wait_ms` - Maximum total time to keep retrying
/// * `operation` - Async closure that performs the database operation
pub async fn retry_on_lock<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> IngestResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = IngestResult<T>>,
{
    let start_time = Instant::now();
    let max_duration = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Database operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if !is_lock_error(&err) => return Err(err),
            Err(err) => {
                let elapsed = start_time.elapsed();

                if elapsed >= max_duration {
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        max_wait_ms,
                        "Database still locked, giving up"
                    );
                    return Err(IngestError::Persistence(format!(
                        "{} failed: database locked after {} attempts ({} ms): {}",
                        operation_name,
                        attempt,
                        elapsed.as_millis(),
                        err
                    )));
                }

                tracing::debug!(
                    operation = operation_name,
                    attempt,
                    backoff_ms,
                    remaining_ms = max_duration.saturating_sub(elapsed).as_millis() as u64,
                    "Database locked, will retry after backoff"
                );

                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
        }
    }
}
