use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::application::ports::RepositoryError;

const BACKOFF_STEP: Duration = Duration::from_millis(250);
const BACKOFF_CAP: Duration = Duration::from_secs(5);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Startup-time bootstrap for the job store pool. Like the external
/// tool checks, an unreachable database fails the boot instead of
/// letting jobs queue against a store that cannot hold them; the
/// attempt budget comes from the database settings.
pub async fn create_pool(
    url: &str,
    max_connections: u32,
    connect_attempts: u32,
) -> Result<PgPool, RepositoryError> {
    let attempts = connect_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await
        {
            Ok(pool) => {
                tracing::info!(attempt, max_connections, "Job store database ready");
                return Ok(pool);
            }
            Err(e) => {
                last_error = e.to_string();
                if attempt < attempts {
                    let wait = (BACKOFF_STEP * attempt).min(BACKOFF_CAP);
                    tracing::warn!(
                        attempt,
                        attempts,
                        error = %e,
                        wait_ms = wait.as_millis() as u64,
                        "Job store database not ready"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    Err(RepositoryError::ConnectionFailed(format!(
        "gave up after {} attempts: {}",
        attempts, last_error
    )))
}
