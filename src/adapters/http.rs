use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::ports::ClientError;

/// Bounded timeout applied to every collaborator call.
pub(crate) const CALL_TIMEOUT: Duration = Duration::from_secs(10);

const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// Retries `op` on transient failures with exponential backoff. Only used
/// for read-only calls; delta-writes are attempted once.
pub(crate) async fn with_retry<T, F, Fut>(
    service: &'static str,
    attempts: u32,
    op: F,
) -> Result<T, ClientError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut delay = RETRY_BASE_DELAY;
    let mut tries = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && tries + 1 < attempts => {
                tries += 1;
                warn!("{} call failed ({}), retry {}/{}", service, e, tries, attempts - 1);
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}
