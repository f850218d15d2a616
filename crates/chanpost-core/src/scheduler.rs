//! Delayed one-shot publication.
//!
//! - `parse_delay` turns `1d12h30m`-style specs into a duration
//! - `JobScheduler::schedule(delay, payload, on_fire)` runs `on_fire` once
//!   after `delay` on its own tokio task
//!
//! Jobs live in memory only; anything pending at shutdown is dropped.

use std::{
    collections::HashSet,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, Local};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{errors::Error, Result};

const MAX_DELAY_SECS: u64 = 366 * 86_400;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DelayError {
    #[error("no delay given")]
    Empty,
    #[error("unexpected `{0}`")]
    Unexpected(String),
    #[error("unit `{0}` given more than once")]
    RepeatedUnit(char),
    #[error("delay must be greater than zero")]
    Zero,
    #[error("delay is longer than a year")]
    TooLong,
}

/// Parse `<n>d`, `<n>h` and `<n>m` components (any subset, each at most once).
///
/// `"1d12h30m"` → 131400s, `"90m"` → 5400s. Anything else is an error; a
/// bare number without a unit is rejected rather than read as zero.
pub fn parse_delay(spec: &str) -> std::result::Result<Duration, DelayError> {
    let spec = spec.trim().to_ascii_lowercase();
    if spec.is_empty() {
        return Err(DelayError::Empty);
    }

    let mut rest = spec.as_str();
    let mut seen = [false; 3];
    let mut total: u64 = 0;

    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = rest[digits..].chars().next();
        let (slot, unit_secs) = match (digits, unit) {
            (0, _) | (_, None) => return Err(DelayError::Unexpected(rest.to_string())),
            (_, Some('d')) => (0, 86_400),
            (_, Some('h')) => (1, 3_600),
            (_, Some('m')) => (2, 60),
            (_, Some(_)) => return Err(DelayError::Unexpected(rest.to_string())),
        };
        let unit = unit.unwrap_or_default();

        if seen[slot] {
            return Err(DelayError::RepeatedUnit(unit));
        }
        seen[slot] = true;

        let n: u64 = rest[..digits].parse().map_err(|_| DelayError::TooLong)?;
        total = n
            .checked_mul(unit_secs)
            .and_then(|secs| total.checked_add(secs))
            .ok_or(DelayError::TooLong)?;

        rest = &rest[digits + unit.len_utf8()..];
    }

    if total == 0 {
        return Err(DelayError::Zero);
    }
    if total > MAX_DELAY_SECS {
        return Err(DelayError::TooLong);
    }
    Ok(Duration::from_secs(total))
}

/// Process-unique handle of a scheduled job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

/// Handed to `on_fire` when the delay elapses.
#[derive(Clone, Debug)]
pub struct ScheduledJob<P> {
    pub id: JobId,
    pub payload: P,
}

/// Returned at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobTicket {
    pub id: JobId,
    pub fire_at: DateTime<Local>,
}

#[derive(Clone, Default)]
pub struct JobScheduler {
    inner: Arc<SchedulerInner>,
}

#[derive(Default)]
struct SchedulerInner {
    next_id: AtomicU64,
    cancel: CancellationToken,
    pending: tokio::sync::Mutex<HashSet<JobId>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `on_fire` once, `delay` from now, with the captured `payload`.
    pub async fn schedule<P, F, Fut>(&self, delay: Duration, payload: P, on_fire: F) -> Result<JobTicket>
    where
        P: Send + 'static,
        F: FnOnce(ScheduledJob<P>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.inner.cancel.is_cancelled() {
            return Err(Error::External("scheduler is shut down".to_string()));
        }

        let id = JobId(self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let fire_at = Local::now() + chrono::Duration::seconds(delay.as_secs() as i64);
        let job = ScheduledJob { id, payload };

        // Hold the table while spawning so the task can't remove its entry first.
        let mut pending = self.inner.pending.lock().await;
        let inner = self.inner.clone();
        tokio::spawn(async move {
            tokio::select! {
              _ = inner.cancel.cancelled() => {
                debug!(job = id.0, "scheduled job dropped at shutdown");
              }
              _ = sleep(delay) => {
                inner.pending.lock().await.remove(&id);
                info!(job = id.0, "scheduled job firing");
                on_fire(job).await;
              }
            }
        });
        pending.insert(id);

        info!(job = id.0, delay_secs = delay.as_secs(), %fire_at, "job scheduled");
        Ok(JobTicket { id, fire_at })
    }

    pub async fn pending(&self) -> usize {
        self.inner.pending.lock().await.len()
    }

    /// Drop every pending job. Returns how many were abandoned.
    pub async fn shutdown(&self) -> usize {
        self.inner.cancel.cancel();
        let mut pending = self.inner.pending.lock().await;
        let dropped = pending.len();
        pending.clear();
        if dropped > 0 {
            warn!(dropped, "scheduler stopped with pending jobs");
        }
        dropped
    }
}
