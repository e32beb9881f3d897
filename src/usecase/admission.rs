use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::domain::error::DomainError;

/// Admission limit for password hashing.
///
/// Every hash or verify reserves the full Argon2 memory cost while it runs,
/// so the number of derivations in flight is capped. Each one runs on the
/// blocking pool and holds its permit until it finishes, even if the caller
/// stops waiting.
///
/// Verification runs with the parameters stored in each hash, so rows
/// written under costlier settings than the current ones can push the real
/// peak above `limit() * HashParams::memory_bytes()`.
#[derive(Clone)]
pub struct HashAdmission {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl HashAdmission {
    pub fn new(max_in_flight: usize) -> Self {
        let limit = max_in_flight.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub async fn run<T, F>(&self, task: F) -> Result<T, DomainError>
    where
        F: FnOnce() -> Result<T, DomainError> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DomainError::HashingUnavailable)?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            task()
        })
        .await
        .map_err(|e| {
            tracing::error!("password hashing task failed: {e}");
            DomainError::HashingUnavailable
        })?
    }
}
