//! Bounded wait for a run to reach a terminal status.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{FerryError, Result};
use crate::service::RunExecutor;
use crate::types::Run;

/// How often to check a run and how long to wait in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Poll `run` until it is terminal.
///
/// Returns the final run when it produced output (`completed`/`incomplete`),
/// `RunFailed` for any other terminal status, `RunTimedOut` once
/// `policy.timeout` elapses and `Cancelled` if `cancel` fires first.
pub async fn wait_for_run<R>(
    runs: &R,
    run: Run,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<Run>
where
    R: RunExecutor + ?Sized,
{
    let run_id = run.id.clone();
    let poll = async {
        let mut run = run;
        while !run.status.is_terminal() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(FerryError::Cancelled),
                _ = tokio::time::sleep(policy.interval) => {}
            }
            run = runs.get_run(&run.thread_id, &run.id).await?;
            debug!(run_id = %run.id, status = %run.status, "polled run");
        }
        Ok(run)
    };

    let run = match tokio::time::timeout(policy.timeout, poll).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(FerryError::RunTimedOut {
                run_id,
                timeout_ms: policy.timeout.as_millis() as u64,
            })
        }
    };

    if run.status.has_output() {
        Ok(run)
    } else {
        Err(FerryError::RunFailed {
            message: run.failure_message(),
            status: run.status.to_string(),
            run_id: run.id,
        })
    }
}
