// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::Utc;
use gluru_server_jobs::{Job, JobContext, JobError, JobOutput};
use tracing::instrument;

use crate::events::EventDispatcher;

/// Reminds support about urgent tickets nobody has picked up.
pub struct OutageReminderJob {
	events: EventDispatcher,
}

impl OutageReminderJob {
	pub fn new(events: EventDispatcher) -> Self {
		Self { events }
	}
}

#[async_trait]
impl Job for OutageReminderJob {
	fn id(&self) -> &str {
		"outage-reminder"
	}

	fn name(&self) -> &str {
		"Outage Reminder"
	}

	fn description(&self) -> &str {
		"Remind support about urgent tickets waiting past their plan's response time"
	}

	#[instrument(skip(self, ctx), fields(job_id = "outage-reminder"))]
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		if ctx.cancellation_token.is_cancelled() {
			return Err(JobError::Cancelled);
		}

		let reminders = self
			.events
			.remind_stale_tickets(Utc::now())
			.await
			.map_err(|e| JobError::Failed {
				message: e.to_string(),
				retryable: true,
			})?;

		if reminders > 0 {
			tracing::info!(reminders, "stale ticket reminders scheduled");
		}

		Ok(JobOutput {
			message: format!("Scheduled {reminders} reminders"),
			metadata: Some(serde_json::json!({ "reminders": reminders })),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::Harness;
	use chrono::Duration;
	use gluru_server_db::testing::insert_test_principal;
	use gluru_server_db::TicketStore;
	use gluru_server_jobs::{CancellationToken, TriggerSource};
	use gluru_server_notify::Template;
	use gluru_server_tickets::{IssueType, Ticket};

	fn context() -> JobContext {
		JobContext {
			run_id: "test-run".to_string(),
			triggered_by: TriggerSource::Manual,
			cancellation_token: CancellationToken::new(),
		}
	}

	#[tokio::test]
	async fn test_reminds_about_stale_outage_only() {
		let h = Harness::new().await;
		let creator = insert_test_principal(&h.pool, "user@community.test").await;

		let mut stale = Ticket::new("Everything is down", "body", IssueType::ProductionOutage, creator.id);
		stale.updated_at = Utc::now() - Duration::hours(3);
		h.stores.tickets.create_ticket(&stale).await.unwrap();

		let fresh = Ticket::new("Also down", "body", IssueType::ProductionOutage, creator.id);
		h.stores.tickets.create_ticket(&fresh).await.unwrap();

		let mut minor = Ticket::new("Typo", "body", IssueType::Minor, creator.id);
		minor.updated_at = Utc::now() - Duration::days(2);
		h.stores.tickets.create_ticket(&minor).await.unwrap();

		let output = OutageReminderJob::new(h.events.clone()).run(&context()).await.unwrap();

		assert_eq!(output.metadata, Some(serde_json::json!({ "reminders": 1 })));
		let intents = h.queue.take();
		assert_eq!(intents.len(), 1);
		assert_eq!(intents[0].template, Template::StaleTicketReminder);
		assert_eq!(intents[0].recipients, vec!["support@gluu.test".to_string()]);
	}

	#[tokio::test]
	async fn test_cancelled_before_start() {
		let h = Harness::new().await;
		let ctx = context();
		ctx.cancellation_token.cancel();

		let result = OutageReminderJob::new(h.events.clone()).run(&ctx).await;
		assert!(matches!(result, Err(JobError::Cancelled)));
	}
}
