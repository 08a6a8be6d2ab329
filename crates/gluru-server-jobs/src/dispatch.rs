// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Priority dispatch of notification intents.
//!
//! ```text
//! schedule() --try_send--> [high] [normal] [low]  (bounded mpsc)
//!                               \     |     /
//!                             biased select loop
//!                                     |
//!                      semaphore(workers) -> delivery task
//!                                     |
//!                  render -> EmailSender / SmsSender, retry w/ backoff
//! ```

use crate::context::CancellationToken;
use crate::error::{JobError, Result};
use crate::health::{DispatchCounters, DispatchHealth};
use crate::retry::RetryPolicy;
use chrono::{DateTime, Utc};
use gluru_server_config::DispatchConfig;
use gluru_server_notify::{
	Channel, EmailMessage, EmailSender, NotificationIntent, Priority, SmsSender, TemplateRenderer,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Accepts notification intents for asynchronous delivery.
pub trait NotificationQueue: Send + Sync {
	/// Must return immediately; no network I/O.
	fn schedule(&self, intent: NotificationIntent) -> ScheduleOutcome;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
	NoTransport,
	NoRecipients,
	QueueFull,
	Closed,
}

impl fmt::Display for RejectReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NoTransport => write!(f, "no transport configured for channel"),
			Self::NoRecipients => write!(f, "intent has no recipients"),
			Self::QueueFull => write!(f, "queue full"),
			Self::Closed => write!(f, "dispatcher shut down"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
	Accepted(Uuid),
	Rejected(RejectReason),
}

impl ScheduleOutcome {
	pub fn is_accepted(&self) -> bool {
		matches!(self, ScheduleOutcome::Accepted(_))
	}
}

#[derive(Debug, Clone)]
pub struct QueuedIntent {
	pub id: Uuid,
	pub intent: NotificationIntent,
	pub enqueued_at: DateTime<Utc>,
}

impl QueuedIntent {
	fn new(intent: NotificationIntent) -> Self {
		Self {
			id: Uuid::new_v4(),
			intent,
			enqueued_at: Utc::now(),
		}
	}
}

/// Delivery collaborators. A channel without a sender rejects its intents.
#[derive(Clone)]
pub struct Transports {
	pub renderer: Arc<dyn TemplateRenderer>,
	pub email: Option<Arc<dyn EmailSender>>,
	pub sms: Option<Arc<dyn SmsSender>>,
}

impl Transports {
	pub fn new(renderer: Arc<dyn TemplateRenderer>) -> Self {
		Self {
			renderer,
			email: None,
			sms: None,
		}
	}

	pub fn with_email(mut self, sender: Arc<dyn EmailSender>) -> Self {
		self.email = Some(sender);
		self
	}

	pub fn with_sms(mut self, sender: Arc<dyn SmsSender>) -> Self {
		self.sms = Some(sender);
		self
	}

	fn supports(&self, channel: Channel) -> bool {
		match channel {
			Channel::Email => self.email.is_some(),
			Channel::Sms => self.sms.is_some(),
		}
	}
}

/// Cloneable, non-blocking handle onto the priority queues.
#[derive(Clone)]
pub struct DispatchQueue {
	high: mpsc::Sender<QueuedIntent>,
	normal: mpsc::Sender<QueuedIntent>,
	low: mpsc::Sender<QueuedIntent>,
	email_enabled: bool,
	sms_enabled: bool,
	counters: Arc<DispatchCounters>,
}

impl DispatchQueue {
	fn sender(&self, priority: Priority) -> &mpsc::Sender<QueuedIntent> {
		match priority {
			Priority::High => &self.high,
			Priority::Normal => &self.normal,
			Priority::Low => &self.low,
		}
	}

	fn reject(&self, channel: Channel, reason: RejectReason) -> ScheduleOutcome {
		self.counters.record_rejected(channel);
		ScheduleOutcome::Rejected(reason)
	}

	pub fn schedule(&self, intent: NotificationIntent) -> ScheduleOutcome {
		let channel = intent.channel;
		let enabled = match channel {
			Channel::Email => self.email_enabled,
			Channel::Sms => self.sms_enabled,
		};
		if !enabled {
			warn!(channel = %channel, template = %intent.template, "No transport configured, dropping notification");
			return self.reject(channel, RejectReason::NoTransport);
		}
		if intent.recipients.is_empty() {
			warn!(channel = %channel, template = %intent.template, "Notification has no recipients");
			return self.reject(channel, RejectReason::NoRecipients);
		}

		let queued = QueuedIntent::new(intent);
		let job_id = queued.id;
		let priority = queued.intent.priority;
		match self.sender(priority).try_send(queued) {
			Ok(()) => {
				self.counters.record_scheduled(channel);
				debug!(job_id = %job_id, channel = %channel, priority = %priority, "Notification scheduled");
				ScheduleOutcome::Accepted(job_id)
			}
			Err(TrySendError::Full(rejected)) => {
				warn!(
					job_id = %job_id,
					channel = %channel,
					priority = %priority,
					template = %rejected.intent.template,
					"Dispatch queue full, notification rejected"
				);
				self.reject(channel, RejectReason::QueueFull)
			}
			Err(TrySendError::Closed(_)) => {
				warn!(job_id = %job_id, channel = %channel, "Dispatcher closed, notification rejected");
				self.reject(channel, RejectReason::Closed)
			}
		}
	}

	pub fn health(&self) -> DispatchHealth {
		self.counters.snapshot()
	}
}

impl NotificationQueue for DispatchQueue {
	fn schedule(&self, intent: NotificationIntent) -> ScheduleOutcome {
		DispatchQueue::schedule(self, intent)
	}
}

struct Receivers {
	high: mpsc::Receiver<QueuedIntent>,
	normal: mpsc::Receiver<QueuedIntent>,
	low: mpsc::Receiver<QueuedIntent>,
}

impl Receivers {
	fn close(&mut self) -> usize {
		self.high.close();
		self.normal.close();
		self.low.close();
		let mut dropped = 0;
		for rx in [&mut self.high, &mut self.normal, &mut self.low] {
			while rx.try_recv().is_ok() {
				dropped += 1;
			}
		}
		dropped
	}
}

/// Owns the queues and the delivery loop.
pub struct Dispatcher {
	queue: DispatchQueue,
	receivers: Mutex<Option<Receivers>>,
	transports: Transports,
	retry: RetryPolicy,
	counters: Arc<DispatchCounters>,
	workers: usize,
	cancellation_token: CancellationToken,
	shutdown_tx: broadcast::Sender<()>,
	handle: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
	pub fn new(config: &DispatchConfig, transports: Transports) -> Self {
		let capacity = config.queue_capacity.max(1);
		let (high_tx, high_rx) = mpsc::channel(capacity);
		let (normal_tx, normal_rx) = mpsc::channel(capacity);
		let (low_tx, low_rx) = mpsc::channel(capacity);
		let (shutdown_tx, _) = broadcast::channel(1);
		let counters = Arc::new(DispatchCounters::default());

		let queue = DispatchQueue {
			high: high_tx,
			normal: normal_tx,
			low: low_tx,
			email_enabled: transports.supports(Channel::Email),
			sms_enabled: transports.supports(Channel::Sms),
			counters: Arc::clone(&counters),
		};

		Self {
			queue,
			receivers: Mutex::new(Some(Receivers {
				high: high_rx,
				normal: normal_rx,
				low: low_rx,
			})),
			transports,
			retry: RetryPolicy::from_config(config),
			counters,
			workers: config.workers.max(1),
			cancellation_token: CancellationToken::new(),
			shutdown_tx,
			handle: Mutex::new(None),
		}
	}

	pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;
		self
	}

	pub fn queue(&self) -> DispatchQueue {
		self.queue.clone()
	}

	pub fn health(&self) -> DispatchHealth {
		self.counters.snapshot()
	}

	#[instrument(skip(self), fields(workers = self.workers))]
	pub async fn start(&self) -> Result<()> {
		let receivers = self
			.receivers
			.lock()
			.await
			.take()
			.ok_or_else(|| JobError::Rejected("dispatcher already started".to_string()))?;

		let permits = Arc::new(Semaphore::new(self.workers));
		let deliverer = Arc::new(Deliverer {
			transports: self.transports.clone(),
			retry: self.retry,
			counters: Arc::clone(&self.counters),
			permits: Arc::clone(&permits),
			cancellation_token: self.cancellation_token.clone(),
			shutdown_tx: self.shutdown_tx.clone(),
		});
		let shutdown_rx = self.shutdown_tx.subscribe();
		let handle = tokio::spawn(run_dispatch_loop(receivers, deliverer, permits, shutdown_rx));

		*self.handle.lock().await = Some(handle);
		info!("Notification dispatcher started");
		Ok(())
	}

	/// Stops pulling from the queues, abandons pending retries and waits for
	/// in-flight attempts. Intents still queued are dropped.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		self.cancellation_token.cancel();
		let _ = self.shutdown_tx.send(());

		if let Some(handle) = self.handle.lock().await.take() {
			let _ = handle.await;
		}

		info!("Notification dispatcher shut down");
	}
}

async fn run_dispatch_loop(
	mut receivers: Receivers,
	deliverer: Arc<Deliverer>,
	permits: Arc<Semaphore>,
	mut shutdown_rx: broadcast::Receiver<()>,
) {
	let mut in_flight = JoinSet::new();

	loop {
		// Take a worker slot first so a busy pool leaves intents in their
		// priority queues instead of committing to one early.
		let permit = tokio::select! {
			biased;
			_ = shutdown_rx.recv() => break,
			permit = Arc::clone(&permits).acquire_owned() => match permit {
				Ok(permit) => permit,
				Err(_) => break,
			},
		};

		let queued = tokio::select! {
			biased;
			_ = shutdown_rx.recv() => break,
			Some(queued) = receivers.high.recv() => queued,
			Some(queued) = receivers.normal.recv() => queued,
			Some(queued) = receivers.low.recv() => queued,
			else => break,
		};

		let deliverer = Arc::clone(&deliverer);
		in_flight.spawn(async move {
			let _ = deliverer.deliver(queued, permit).await;
		});

		while in_flight.try_join_next().is_some() {}
	}

	let dropped = receivers.close();
	if dropped > 0 {
		warn!(dropped, "Dropping undelivered notifications on shutdown");
	}
	while in_flight.join_next().await.is_some() {}
}

struct Deliverer {
	transports: Transports,
	retry: RetryPolicy,
	counters: Arc<DispatchCounters>,
	permits: Arc<Semaphore>,
	cancellation_token: CancellationToken,
	shutdown_tx: broadcast::Sender<()>,
}

impl Deliverer {
	#[instrument(
		level = "debug",
		skip(self, queued),
		fields(job_id = %queued.id, channel = %queued.intent.channel, template = %queued.intent.template)
	)]
	async fn deliver(&self, queued: QueuedIntent, mut permit: OwnedSemaphorePermit) -> Result<()> {
		let channel = queued.intent.channel;
		let mut retry_count = 0u32;

		loop {
			if self.cancellation_token.is_cancelled() {
				return Err(JobError::Cancelled);
			}

			match self.attempt(&queued.intent).await {
				Ok(()) => {
					self.counters.record_delivered(channel);
					info!(
						job_id = %queued.id,
						channel = %channel,
						template = %queued.intent.template,
						recipients = queued.intent.recipients.len(),
						retry_count,
						"Notification delivered"
					);
					return Ok(());
				}
				Err(JobError::Failed { message, retryable }) => {
					if self.retry.should_retry(retryable, retry_count) {
						retry_count += 1;
						let delay = self.retry.backoff_delay(retry_count);
						warn!(
							job_id = %queued.id,
							channel = %channel,
							retry_count,
							delay_ms = delay.as_millis() as u64,
							error = %message,
							"Notification delivery failed, retrying"
						);
						permit = match self.back_off(permit, delay).await {
							Some(permit) => permit,
							None => return Err(JobError::Cancelled),
						};
						continue;
					}

					self.counters.record_failed(channel);
					warn!(
						job_id = %queued.id,
						channel = %channel,
						retry_count,
						error = %message,
						"Notification delivery failed"
					);
					return Err(JobError::Failed { message, retryable });
				}
				Err(e) => {
					self.counters.record_failed(channel);
					warn!(job_id = %queued.id, channel = %channel, retry_count, error = %e, "Notification delivery aborted");
					return Err(e);
				}
			}
		}
	}

	/// Gives the worker slot back for the backoff and takes one again
	/// afterwards. Returns None if shutdown arrives first.
	async fn back_off(
		&self,
		permit: OwnedSemaphorePermit,
		delay: std::time::Duration,
	) -> Option<OwnedSemaphorePermit> {
		drop(permit);
		let mut shutdown_rx = self.shutdown_tx.subscribe();
		if self.cancellation_token.is_cancelled() {
			return None;
		}
		tokio::select! {
			_ = tokio::time::sleep(delay) => {}
			_ = shutdown_rx.recv() => return None,
		}
		tokio::select! {
			permit = Arc::clone(&self.permits).acquire_owned() => permit.ok(),
			_ = shutdown_rx.recv() => None,
		}
	}

	async fn attempt(&self, intent: &NotificationIntent) -> Result<()> {
		let rendered = self.transports.renderer.render(intent.template, &intent.context)?;

		match intent.channel {
			Channel::Email => {
				let sender = self
					.transports
					.email
					.as_ref()
					.ok_or_else(|| JobError::failed("no email transport configured", false))?;
				let message = EmailMessage::new(intent.recipients.clone(), rendered);
				sender.send(&message).await?;
			}
			Channel::Sms => {
				let sender = self
					.transports
					.sms
					.as_ref()
					.ok_or_else(|| JobError::failed("no sms transport configured", false))?;
				for number in &intent.recipients {
					sender.send(number, &rendered.body_text).await?;
				}
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::health::HealthState;
	use async_trait::async_trait;
	use gluru_server_notify::{Context, DeliveryError, RenderedMessage, Template};
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Mutex as StdMutex;
	use std::time::Duration;

	struct EchoRenderer;

	impl TemplateRenderer for EchoRenderer {
		fn render(&self, template: Template, context: &Context) -> gluru_server_notify::Result<RenderedMessage> {
			let ticket = context
				.get("ticket_id")
				.and_then(|v| v.as_str())
				.ok_or_else(|| DeliveryError::Rendering("missing ticket_id".to_string()))?;
			Ok(RenderedMessage {
				subject: template.path().to_string(),
				body_text: ticket.to_string(),
				body_html: None,
			})
		}
	}

	#[derive(Default)]
	struct RecordingEmail {
		sent: StdMutex<Vec<EmailMessage>>,
		failures_left: AtomicU32,
	}

	impl RecordingEmail {
		fn failing(times: u32) -> Self {
			Self {
				sent: StdMutex::new(Vec::new()),
				failures_left: AtomicU32::new(times),
			}
		}

		fn bodies(&self) -> Vec<String> {
			self.sent.lock().unwrap().iter().map(|m| m.body_text.clone()).collect()
		}
	}

	#[async_trait]
	impl EmailSender for RecordingEmail {
		async fn send(&self, message: &EmailMessage) -> gluru_server_notify::Result<()> {
			if self
				.failures_left
				.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
				.is_ok()
			{
				return Err(DeliveryError::Transport("connection refused".to_string()));
			}
			self.sent.lock().unwrap().push(message.clone());
			Ok(())
		}
	}

	#[derive(Default)]
	struct RecordingSms {
		sent: StdMutex<Vec<(String, String)>>,
	}

	#[async_trait]
	impl SmsSender for RecordingSms {
		async fn send(&self, to: &str, body: &str) -> gluru_server_notify::Result<()> {
			self.sent.lock().unwrap().push((to.to_string(), body.to_string()));
			Ok(())
		}
	}

	fn config(workers: usize, capacity: usize) -> DispatchConfig {
		DispatchConfig {
			workers,
			queue_capacity: capacity,
			..DispatchConfig::default()
		}
	}

	fn fast_retry(max_retries: u32) -> RetryPolicy {
		RetryPolicy {
			max_retries,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(5),
			factor: 2.0,
		}
	}

	fn email_intent(ticket: &str, priority: Priority) -> NotificationIntent {
		let mut intent = NotificationIntent::email(
			vec!["support@gluu.org".to_string()],
			Template::NewTicketForStaff,
			Context::new(),
		)
		.with_context("ticket_id", ticket);
		intent.priority = priority;
		intent
	}

	async fn eventually(mut check: impl FnMut() -> bool) {
		let waited = tokio::time::timeout(Duration::from_secs(5), async {
			while !check() {
				tokio::time::sleep(Duration::from_millis(5)).await;
			}
		})
		.await;
		assert!(waited.is_ok(), "condition not met in time");
	}

	mod scheduling {
		use super::*;

		#[tokio::test]
		async fn test_schedule_returns_without_workers() {
			let email = Arc::new(RecordingEmail::default());
			let dispatcher = Dispatcher::new(
				&config(1, 4),
				Transports::new(Arc::new(EchoRenderer)).with_email(email.clone()),
			);

			let outcome = dispatcher.queue().schedule(email_intent("t-1", Priority::Low));
			assert!(outcome.is_accepted());
			assert!(email.bodies().is_empty());
			assert_eq!(dispatcher.health().channels[0].scheduled, 1);
		}

		#[tokio::test]
		async fn test_full_queue_rejects() {
			let dispatcher = Dispatcher::new(
				&config(1, 1),
				Transports::new(Arc::new(EchoRenderer)).with_email(Arc::new(RecordingEmail::default())),
			);
			let queue = dispatcher.queue();

			assert!(queue.schedule(email_intent("t-1", Priority::Low)).is_accepted());
			assert_eq!(
				queue.schedule(email_intent("t-2", Priority::Low)),
				ScheduleOutcome::Rejected(RejectReason::QueueFull)
			);
			// Other priorities have their own capacity.
			assert!(queue.schedule(email_intent("t-3", Priority::High)).is_accepted());
		}

		#[tokio::test]
		async fn test_missing_transport_rejects() {
			let dispatcher = Dispatcher::new(&config(1, 4), Transports::new(Arc::new(EchoRenderer)));
			let intent = NotificationIntent::sms(
				"+15550100",
				Template::SmsNewTicket,
				Context::new(),
				Priority::High,
			);
			assert_eq!(
				dispatcher.queue().schedule(intent),
				ScheduleOutcome::Rejected(RejectReason::NoTransport)
			);
			let sms = dispatcher
				.health()
				.channels
				.into_iter()
				.find(|c| c.channel == Channel::Sms)
				.unwrap();
			assert_eq!(sms.rejected, 1);
		}

		#[tokio::test]
		async fn test_empty_recipients_rejected() {
			let dispatcher = Dispatcher::new(
				&config(1, 4),
				Transports::new(Arc::new(EchoRenderer)).with_email(Arc::new(RecordingEmail::default())),
			);
			let intent = NotificationIntent::email(Vec::new(), Template::NewAnswer, Context::new());
			assert_eq!(
				dispatcher.queue().schedule(intent),
				ScheduleOutcome::Rejected(RejectReason::NoRecipients)
			);
		}

		#[tokio::test]
		async fn test_start_twice_is_rejected() {
			let dispatcher = Dispatcher::new(&config(1, 4), Transports::new(Arc::new(EchoRenderer)));
			dispatcher.start().await.unwrap();
			assert!(matches!(dispatcher.start().await, Err(JobError::Rejected(_))));
			dispatcher.shutdown().await;
		}

		#[tokio::test]
		async fn test_schedule_after_shutdown_is_rejected() {
			let dispatcher = Dispatcher::new(
				&config(1, 4),
				Transports::new(Arc::new(EchoRenderer)).with_email(Arc::new(RecordingEmail::default())),
			);
			dispatcher.start().await.unwrap();
			dispatcher.shutdown().await;

			assert_eq!(
				dispatcher.queue().schedule(email_intent("t-1", Priority::Low)),
				ScheduleOutcome::Rejected(RejectReason::Closed)
			);
		}
	}

	mod delivery {
		use super::*;

		#[tokio::test]
		async fn test_higher_priority_delivered_first() {
			let email = Arc::new(RecordingEmail::default());
			let dispatcher = Dispatcher::new(
				&config(1, 8),
				Transports::new(Arc::new(EchoRenderer)).with_email(email.clone()),
			);
			let queue = dispatcher.queue();
			queue.schedule(email_intent("low", Priority::Low));
			queue.schedule(email_intent("normal", Priority::Normal));
			queue.schedule(email_intent("high", Priority::High));

			dispatcher.start().await.unwrap();
			eventually(|| email.bodies().len() == 3).await;
			dispatcher.shutdown().await;

			assert_eq!(email.bodies(), vec!["high", "normal", "low"]);
		}

		#[tokio::test]
		async fn test_sms_sent_to_each_number() {
			let sms = Arc::new(RecordingSms::default());
			let dispatcher = Dispatcher::new(
				&config(2, 8),
				Transports::new(Arc::new(EchoRenderer)).with_sms(sms.clone()),
			);
			dispatcher.start().await.unwrap();

			let mut intent = NotificationIntent::sms(
				"+15550100",
				Template::SmsNewTicket,
				Context::new(),
				Priority::High,
			)
			.with_context("ticket_id", "t-9");
			intent.recipients.push("+15550101".to_string());
			assert!(dispatcher.queue().schedule(intent).is_accepted());

			eventually(|| sms.sent.lock().unwrap().len() == 2).await;
			dispatcher.shutdown().await;

			let sent = sms.sent.lock().unwrap().clone();
			assert_eq!(sent[0], ("+15550100".to_string(), "t-9".to_string()));
			assert_eq!(sent[1], ("+15550101".to_string(), "t-9".to_string()));
		}

		#[tokio::test]
		async fn test_transport_failure_is_retried() {
			let email = Arc::new(RecordingEmail::failing(2));
			let dispatcher = Dispatcher::new(
				&config(1, 8),
				Transports::new(Arc::new(EchoRenderer)).with_email(email.clone()),
			)
			.with_retry_policy(fast_retry(3));
			dispatcher.start().await.unwrap();

			dispatcher.queue().schedule(email_intent("t-1", Priority::Low));
			eventually(|| email.bodies().len() == 1).await;
			dispatcher.shutdown().await;

			let health = dispatcher.health();
			assert_eq!(health.status, HealthState::Healthy);
			assert_eq!(health.channels[0].delivered, 1);
			assert_eq!(health.channels[0].failed, 0);
		}

		#[tokio::test]
		async fn test_backoff_frees_worker_for_other_intents() {
			let email = Arc::new(RecordingEmail::failing(10));
			let sms = Arc::new(RecordingSms::default());
			let dispatcher = Dispatcher::new(
				&config(1, 8),
				Transports::new(Arc::new(EchoRenderer))
					.with_email(email.clone())
					.with_sms(sms.clone()),
			)
			.with_retry_policy(RetryPolicy {
				max_retries: 3,
				base_delay: Duration::from_secs(30),
				max_delay: Duration::from_secs(30),
				factor: 2.0,
			});
			dispatcher.start().await.unwrap();

			dispatcher.queue().schedule(email_intent("t-1", Priority::Normal));
			eventually(|| email.failures_left.load(Ordering::SeqCst) == 9).await;

			let page = NotificationIntent::sms(
				"+15550100",
				Template::SmsNewTicket,
				Context::new(),
				Priority::High,
			)
			.with_context("ticket_id", "t-2");
			assert!(dispatcher.queue().schedule(page).is_accepted());

			eventually(|| sms.sent.lock().unwrap().len() == 1).await;
			assert!(email.bodies().is_empty());
			dispatcher.shutdown().await;
		}

		#[tokio::test]
		async fn test_retries_exhausted_marks_failure() {
			let email = Arc::new(RecordingEmail::failing(10));
			let dispatcher = Dispatcher::new(
				&config(1, 8),
				Transports::new(Arc::new(EchoRenderer)).with_email(email.clone()),
			)
			.with_retry_policy(fast_retry(2));
			dispatcher.start().await.unwrap();

			dispatcher.queue().schedule(email_intent("t-1", Priority::Low));
			eventually(|| dispatcher.health().channels[0].failed == 1).await;
			dispatcher.shutdown().await;

			// One attempt plus two retries.
			assert_eq!(email.failures_left.load(Ordering::SeqCst), 7);
			assert!(email.bodies().is_empty());
			assert_eq!(dispatcher.health().status, HealthState::Degraded);
		}

		#[tokio::test]
		async fn test_rendering_failure_not_retried() {
			let email = Arc::new(RecordingEmail::default());
			let dispatcher = Dispatcher::new(
				&config(1, 8),
				Transports::new(Arc::new(EchoRenderer)).with_email(email.clone()),
			)
			.with_retry_policy(fast_retry(3));
			dispatcher.start().await.unwrap();

			let intent = NotificationIntent::email(
				vec!["support@gluu.org".to_string()],
				Template::NewTicketForStaff,
				Context::new(),
			);
			dispatcher.queue().schedule(intent);
			dispatcher.queue().schedule(email_intent("t-2", Priority::Low));

			eventually(|| email.bodies().len() == 1).await;
			dispatcher.shutdown().await;

			let email_health = &dispatcher.health().channels[0];
			assert_eq!(email_health.failed, 1);
			assert_eq!(email_health.delivered, 1);
			assert_eq!(email_health.consecutive_failures, 0);
		}

		#[tokio::test]
		async fn test_shutdown_abandons_pending_retry() {
			let email = Arc::new(RecordingEmail::failing(u32::MAX));
			let dispatcher = Dispatcher::new(
				&config(1, 8),
				Transports::new(Arc::new(EchoRenderer)).with_email(email.clone()),
			)
			.with_retry_policy(RetryPolicy {
				max_retries: 3,
				base_delay: Duration::from_secs(30),
				max_delay: Duration::from_secs(60),
				factor: 2.0,
			});
			dispatcher.start().await.unwrap();
			dispatcher.queue().schedule(email_intent("t-1", Priority::Low));
			eventually(|| email.failures_left.load(Ordering::SeqCst) < u32::MAX).await;

			let shutdown = tokio::time::timeout(Duration::from_secs(5), dispatcher.shutdown()).await;
			assert!(shutdown.is_ok());
		}
	}
}
