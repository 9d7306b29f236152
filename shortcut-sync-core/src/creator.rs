//! Shortcut creation: the per-item retry state machine and the bounded worker pool.
//!
//! Each item is owned by one worker from its first call until it reaches a terminal
//! outcome. The per-item loop:
//!
//! - 200/201: created.
//! - 429: wait `Retry-After` + margin (or the default wait) and repeat the same attempt;
//!   rate-limit waits never use up the retry budget.
//! - 400 "already exists": skipped. 400 "access denied" and 403: failed, no retry.
//! - anything else, including transport errors: retried up to `max_retries` attempts with
//!   `2^attempt` seconds between them.
//!
//! At most `max_workers` items are in flight. Cancelling the token stops dispatch of new
//! items; in-flight items still run to a terminal outcome.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::classify::{classify_response, ResponseClass};
use crate::config::CreationConfig;
use crate::contract::{ConflictPolicy, NormalizedShortcutRequest, ShortcutApi};
use crate::report::{FailureReason, ItemReport, Outcome, Tally};

/// Drives one request to a terminal outcome.
pub async fn create_with_retry<A>(
    api: &A,
    request: &NormalizedShortcutRequest,
    config: &CreationConfig,
    policy: ConflictPolicy,
) -> ItemReport
where
    A: ShortcutApi + ?Sized,
{
    let mut calls = 0u32;
    let mut rate_limit_waits = 0u32;
    let finish = |outcome: Outcome, calls: u32, rate_limit_waits: u32| ItemReport {
        schema_name: request.schema_name.clone(),
        table_name: request.table_name.clone(),
        outcome,
        calls,
        rate_limit_waits,
    };

    for attempt in 0..config.max_retries {
        let reason = loop {
            calls += 1;
            let response = match api.create_shortcut(request, policy).await {
                Ok(response) => response,
                Err(e) => break e.to_string(),
            };
            match classify_response(&response) {
                ResponseClass::Created { name } => {
                    let name = name.unwrap_or_else(|| request.desired_name.clone());
                    info!(
                        table = %request.table_name,
                        path = %request.target_path,
                        shortcut = %name,
                        "[CREATE] Shortcut created"
                    );
                    return finish(Outcome::Created { name }, calls, rate_limit_waits);
                }
                ResponseClass::RateLimited { retry_after_secs } => {
                    let wait = config.rate_limit_wait(retry_after_secs);
                    warn!(
                        table = %request.table_name,
                        retry_after = ?retry_after_secs,
                        wait_secs = wait.as_secs(),
                        "[CREATE] Rate limited (429), waiting before repeating the attempt"
                    );
                    rate_limit_waits += 1;
                    tokio::time::sleep(wait).await;
                }
                ResponseClass::AlreadyExists => {
                    info!(
                        table = %request.table_name,
                        path = %request.target_path,
                        "[CREATE] Shortcut with the same name exists, skipping"
                    );
                    return finish(Outcome::SkippedExisting, calls, rate_limit_waits);
                }
                ResponseClass::AccessDenied { message } => {
                    error!(
                        table = %request.table_name,
                        location = %request.location(),
                        message = %message,
                        "[CREATE][ERROR] Access to target location denied"
                    );
                    return finish(
                        Outcome::Failed(FailureReason::AccessDenied),
                        calls,
                        rate_limit_waits,
                    );
                }
                ResponseClass::Forbidden => {
                    error!(table = %request.table_name, "[CREATE][ERROR] Forbidden (403)");
                    return finish(
                        Outcome::Failed(FailureReason::Forbidden),
                        calls,
                        rate_limit_waits,
                    );
                }
                ResponseClass::Unexpected { status, detail } => {
                    break format!("status {status}: {detail}");
                }
            }
        };

        warn!(
            table = %request.table_name,
            attempt,
            reason = %reason,
            "[CREATE] Create attempt failed"
        );
        if attempt + 1 < config.max_retries {
            let delay = config.backoff(attempt);
            debug!(
                table = %request.table_name,
                delay_secs = delay.as_secs(),
                "[CREATE] Retrying after backoff"
            );
            tokio::time::sleep(delay).await;
        }
    }

    error!(
        table = %request.table_name,
        max_retries = config.max_retries,
        "[CREATE][ERROR] Max retries reached"
    );
    finish(
        Outcome::Failed(FailureReason::MaxRetriesExceeded),
        calls,
        rate_limit_waits,
    )
}

enum Slot {
    Running {
        schema_name: String,
        table_name: String,
        handle: JoinHandle<ItemReport>,
    },
    Done(ItemReport),
}

/// Bounded pool of creation workers sharing one [`Tally`].
pub struct ShortcutCreator<A> {
    api: Arc<A>,
    config: CreationConfig,
    policy: ConflictPolicy,
    tally: Arc<Tally>,
}

impl<A> ShortcutCreator<A>
where
    A: ShortcutApi + 'static,
{
    pub fn new(api: Arc<A>, config: CreationConfig, policy: ConflictPolicy) -> Self {
        Self {
            api,
            config,
            policy,
            tally: Arc::new(Tally::default()),
        }
    }

    /// Counters for every item this creator has finished.
    pub fn tally(&self) -> Arc<Tally> {
        Arc::clone(&self.tally)
    }

    /// Creates every request; reports come back in input order.
    pub async fn create_all(
        &self,
        requests: Vec<NormalizedShortcutRequest>,
        cancel: &CancellationToken,
    ) -> Vec<ItemReport> {
        let workers = self.config.max_workers.max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        info!(
            items = requests.len(),
            workers,
            "[CREATE] Dispatching shortcut creation"
        );

        let mut slots = Vec::with_capacity(requests.len());
        for request in requests {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                slots.push(Slot::Done(self.cancelled(&request)));
                continue;
            };

            let api = Arc::clone(&self.api);
            let config = self.config.clone();
            let policy = self.policy;
            let tally = Arc::clone(&self.tally);
            let schema_name = request.schema_name.clone();
            let table_name = request.table_name.clone();
            let handle = tokio::spawn(async move {
                let report = create_with_retry(api.as_ref(), &request, &config, policy).await;
                tally.record(&report.outcome);
                drop(permit);
                report
            });
            slots.push(Slot::Running {
                schema_name,
                table_name,
                handle,
            });
        }

        let mut reports = Vec::with_capacity(slots.len());
        for slot in slots {
            let report = match slot {
                Slot::Done(report) => report,
                Slot::Running {
                    schema_name,
                    table_name,
                    handle,
                } => match handle.await {
                    Ok(report) => report,
                    Err(e) => {
                        error!(error = %e, table = %table_name, "[CREATE][ERROR] Worker panicked");
                        let outcome = Outcome::Failed(FailureReason::WorkerPanicked);
                        self.tally.record(&outcome);
                        ItemReport::without_calls(&schema_name, &table_name, outcome)
                    }
                },
            };
            reports.push(report);
        }
        reports
    }

    fn cancelled(&self, request: &NormalizedShortcutRequest) -> ItemReport {
        warn!(table = %request.table_name, "[CREATE] Run cancelled, item not dispatched");
        let outcome = Outcome::Failed(FailureReason::Cancelled);
        self.tally.record(&outcome);
        ItemReport::without_calls(&request.schema_name, &request.table_name, outcome)
    }
}
