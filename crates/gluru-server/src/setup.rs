// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gluru_server_config::{DispatchConfig, HttpConfig, NotificationsConfig};
use gluru_server_jobs::JobScheduler;
use gluru_server_notify::{NotificationRecipients, SmsContact};
use std::sync::Arc;
use std::time::Duration;

use crate::events::EventDispatcher;
use crate::jobs::OutageReminderJob;

/// Fixed notification targets from the loaded configuration.
pub fn recipients_from_config(notifications: &NotificationsConfig, http: &HttpConfig) -> NotificationRecipients {
	let contacts = notifications
		.sms_contacts
		.iter()
		.map(|c| SmsContact {
			enabled: c.enabled,
			..SmsContact::new(c.name.clone(), c.number.clone())
		})
		.collect();

	let mut recipients =
		NotificationRecipients::new(notifications.support_addresses.clone(), http.base_url.clone())
			.with_sms_contacts(contacts);
	recipients.site_name = notifications.site_name.clone();
	recipients
}

/// Scheduler with the background jobs enabled in `dispatch`. Not started.
pub fn build_scheduler(dispatch: &DispatchConfig, events: EventDispatcher) -> JobScheduler {
	let mut scheduler = JobScheduler::new();
	if dispatch.reminder_enabled {
		scheduler.register_periodic(
			Arc::new(OutageReminderJob::new(events)),
			Duration::from_secs(dispatch.reminder_interval_secs),
		);
		tracing::info!(
			interval_secs = dispatch.reminder_interval_secs,
			"Registered outage reminder background job"
		);
	}
	scheduler
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::Harness;
	use gluru_server_config::SmsContactConfig;

	#[test]
	fn carries_disabled_contacts_through() {
		let notifications = NotificationsConfig {
			support_addresses: vec!["support@gluu.test".into()],
			sms_contacts: vec![
				SmsContactConfig {
					name: "On call".into(),
					number: "+15550100".into(),
					enabled: true,
				},
				SmsContactConfig {
					name: "Backup".into(),
					number: "+15550101".into(),
					enabled: false,
				},
			],
			site_name: "Gluu Support".into(),
		};
		let http = HttpConfig {
			host: "127.0.0.1".into(),
			port: 8080,
			base_url: "https://support.gluu.test".into(),
		};

		let recipients = recipients_from_config(&notifications, &http);

		assert_eq!(recipients.base_url, "https://support.gluu.test");
		assert_eq!(recipients.sms_contacts.len(), 2);
		assert_eq!(recipients.enabled_sms_contacts().count(), 1);
	}

	#[tokio::test]
	async fn scheduler_carries_reminder_only_when_enabled() {
		let h = Harness::new().await;

		let enabled = build_scheduler(&DispatchConfig::default(), h.events.clone());
		let health = enabled.health_status().await;
		assert_eq!(health.jobs.len(), 1);
		assert_eq!(health.jobs[0].job_id, "outage-reminder");

		let dispatch = DispatchConfig {
			reminder_enabled: false,
			..DispatchConfig::default()
		};
		let disabled = build_scheduler(&dispatch, h.events.clone());
		assert!(disabled.health_status().await.jobs.is_empty());
	}
}
