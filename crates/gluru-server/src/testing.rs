// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gluru_server_auth::{BuiltinRole, RoleId, RoleRegistry};
use gluru_server_db::testing::create_test_pool;
use gluru_server_db::{RoleStore, SqlitePool};
use gluru_server_jobs::{NotificationQueue, ScheduleOutcome};
use gluru_server_notify::{NotificationIntent, NotificationPlanner, NotificationRecipients};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::events::EventDispatcher;
use crate::service::TicketService;
use crate::stores::Stores;

/// Accepts everything and remembers it.
#[derive(Default)]
pub struct RecordingQueue {
	intents: Mutex<Vec<NotificationIntent>>,
}

impl RecordingQueue {
	pub fn take(&self) -> Vec<NotificationIntent> {
		std::mem::take(&mut *self.intents.lock().unwrap())
	}
}

impl NotificationQueue for RecordingQueue {
	fn schedule(&self, intent: NotificationIntent) -> ScheduleOutcome {
		self.intents.lock().unwrap().push(intent);
		ScheduleOutcome::Accepted(Uuid::new_v4())
	}
}

pub struct Harness {
	pub pool: SqlitePool,
	pub stores: Stores,
	pub roles: Arc<RoleRegistry>,
	pub queue: Arc<RecordingQueue>,
	pub events: EventDispatcher,
	pub service: TicketService,
}

impl Harness {
	pub async fn new() -> Self {
		let pool = create_test_pool().await;
		let stores = Stores::new(pool.clone());
		stores.roles.seed_builtin_roles().await.unwrap();
		let roles = Arc::new(stores.roles.load_registry().await.unwrap());

		let recipients = NotificationRecipients::new(vec!["support@gluu.test".to_string()], "https://support.gluu.test");
		let planner = Arc::new(NotificationPlanner::new(recipients));
		let queue = Arc::new(RecordingQueue::default());
		let events = EventDispatcher::new(stores.clone(), roles.clone(), planner, queue.clone());
		let service = TicketService::new(stores.clone(), roles.clone(), events.clone());

		Self {
			pool,
			stores,
			roles,
			queue,
			events,
			service,
		}
	}

	pub fn role(&self, kind: BuiltinRole) -> RoleId {
		self.roles.builtin(kind).unwrap().id
	}
}
