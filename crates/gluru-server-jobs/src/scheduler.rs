// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::{CancellationToken, JobContext};
use crate::error::{JobError, Result};
use crate::health::{HealthState, JobHealthStatus, JobsHealthStatus, LastRunInfo};
use crate::job::Job;
use crate::retry::RetryPolicy;
use crate::types::{JobStatus, TriggerSource};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

struct RegisteredJob {
	job: Arc<dyn Job>,
	interval: Duration,
	cancellation_token: CancellationToken,
}

#[derive(Debug, Clone, Default)]
struct RunHistory {
	last_run: Option<LastRunInfo>,
	consecutive_failures: u32,
}

type RunLedger = Arc<Mutex<HashMap<String, RunHistory>>>;

/// Runs registered jobs on their intervals. Run history is kept in memory.
pub struct JobScheduler {
	jobs: HashMap<String, RegisteredJob>,
	retry: RetryPolicy,
	runs: RunLedger,
	shutdown_tx: broadcast::Sender<()>,
	handles: Mutex<Vec<JoinHandle<()>>>,
}

impl JobScheduler {
	pub fn new() -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			jobs: HashMap::new(),
			retry: RetryPolicy::default(),
			runs: Arc::new(Mutex::new(HashMap::new())),
			shutdown_tx,
			handles: Mutex::new(Vec::new()),
		}
	}

	pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;
		self
	}

	pub fn register_periodic(&mut self, job: Arc<dyn Job>, interval: Duration) {
		let id = job.id().to_string();
		self.jobs.insert(
			id,
			RegisteredJob {
				job,
				interval,
				cancellation_token: CancellationToken::new(),
			},
		);
	}

	#[instrument(skip(self))]
	pub async fn start(&self) -> Result<()> {
		let mut handles = self.handles.lock().await;

		for (job_id, registered) in &self.jobs {
			let interval = registered.interval;
			let job = Arc::clone(&registered.job);
			let runs = Arc::clone(&self.runs);
			let retry = self.retry;
			let mut shutdown_rx = self.shutdown_tx.subscribe();
			let cancellation_token = registered.cancellation_token.clone();
			let job_id = job_id.clone();

			let handle = tokio::spawn(async move {
				loop {
					tokio::select! {
						_ = tokio::time::sleep(interval) => {
							let _ = run_job_with_retry(
								&job,
								&runs,
								&retry,
								TriggerSource::Schedule,
								&cancellation_token,
							)
							.await;
						}
						_ = shutdown_rx.recv() => {
							info!(job_id = %job_id, "Shutting down periodic job");
							break;
						}
					}
				}
			});

			handles.push(handle);
		}

		info!(job_count = handles.len(), "Job scheduler started");
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		for registered in self.jobs.values() {
			registered.cancellation_token.cancel();
		}
		let _ = self.shutdown_tx.send(());

		let mut handles = self.handles.lock().await;
		for handle in handles.drain(..) {
			let _ = handle.await;
		}

		info!("Job scheduler shut down");
	}

	pub async fn job_status(&self, job_id: &str) -> Option<JobHealthStatus> {
		let registered = self.jobs.get(job_id)?;
		let history = self.runs.lock().await.get(job_id).cloned().unwrap_or_default();

		Some(JobHealthStatus {
			job_id: job_id.to_string(),
			name: registered.job.name().to_string(),
			status: determine_health_state(history.last_run.as_ref(), history.consecutive_failures),
			last_run: history.last_run,
			consecutive_failures: history.consecutive_failures,
		})
	}

	pub async fn health_status(&self) -> JobsHealthStatus {
		let mut jobs = Vec::new();
		for job_id in self.jobs.keys() {
			if let Some(status) = self.job_status(job_id).await {
				jobs.push(status);
			}
		}

		JobsHealthStatus {
			status: HealthState::worst(jobs.iter().map(|j| j.status)),
			jobs,
		}
	}
}

impl Default for JobScheduler {
	fn default() -> Self {
		Self::new()
	}
}

fn determine_health_state(last_run: Option<&LastRunInfo>, consecutive_failures: u32) -> HealthState {
	match last_run.map(|r| r.status) {
		Some(JobStatus::Failed) => HealthState::from_consecutive_failures(consecutive_failures),
		_ => HealthState::Healthy,
	}
}

async fn record_run(runs: &RunLedger, job_id: &str, info: LastRunInfo) {
	let mut runs = runs.lock().await;
	let history = runs.entry(job_id.to_string()).or_default();
	match info.status {
		JobStatus::Failed => history.consecutive_failures += 1,
		JobStatus::Succeeded => history.consecutive_failures = 0,
		// Cancelled runs leave history untouched.
		JobStatus::Running | JobStatus::Cancelled => return,
	}
	history.last_run = Some(info);
}

async fn run_job_with_retry(
	job: &Arc<dyn Job>,
	runs: &RunLedger,
	retry: &RetryPolicy,
	triggered_by: TriggerSource,
	cancellation_token: &CancellationToken,
) -> Result<String> {
	let mut retry_count = 0u32;
	let run_id = uuid::Uuid::new_v4().to_string();
	let started_at = Utc::now();

	loop {
		let ctx = JobContext {
			run_id: run_id.clone(),
			triggered_by,
			cancellation_token: cancellation_token.clone(),
		};

		let result = job.run(&ctx).await;
		let duration_ms = Some((Utc::now() - started_at).num_milliseconds());
		let mut info = LastRunInfo {
			run_id: run_id.clone(),
			status: JobStatus::Succeeded,
			started_at,
			duration_ms,
			error: None,
		};

		match result {
			Ok(output) => {
				info!(
					job_id = %job.id(),
					run_id = %run_id,
					retry_count,
					message = %output.message,
					"Job completed successfully"
				);
				record_run(runs, job.id(), info).await;
				return Ok(run_id);
			}
			Err(JobError::Cancelled) => {
				info!(job_id = %job.id(), run_id = %run_id, "Job cancelled");
				info.status = JobStatus::Cancelled;
				record_run(runs, job.id(), info).await;
				return Err(JobError::Cancelled);
			}
			Err(JobError::Failed { message, retryable }) => {
				if retry.should_retry(retryable, retry_count) {
					retry_count += 1;
					let delay = retry.backoff_delay(retry_count);
					warn!(
						job_id = %job.id(),
						run_id = %run_id,
						retry_count,
						delay_ms = delay.as_millis() as u64,
						error = %message,
						"Job failed, retrying"
					);
					tokio::time::sleep(delay).await;
					continue;
				}

				warn!(job_id = %job.id(), run_id = %run_id, retry_count, error = %message, "Job failed");
				info.status = JobStatus::Failed;
				info.error = Some(message.clone());
				record_run(runs, job.id(), info).await;
				return Err(JobError::Failed { message, retryable });
			}
			Err(e) => {
				warn!(job_id = %job.id(), run_id = %run_id, error = %e, "Job failed");
				info.status = JobStatus::Failed;
				info.error = Some(e.to_string());
				record_run(runs, job.id(), info).await;
				return Err(e);
			}
		}
	}
}
