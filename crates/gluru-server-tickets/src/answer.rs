// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use gluru_server_auth::{AnswerId, PrincipalId, TicketId};
use serde::{Deserialize, Serialize};

/// A reply on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
	pub id: AnswerId,
	pub ticket_id: TicketId,
	pub body: String,
	pub created_by: PrincipalId,
	/// Visible to staff only.
	pub is_private: bool,
	pub is_deleted: bool,
	pub created_at: DateTime<Utc>,
}

impl Answer {
	pub fn new(ticket_id: TicketId, body: impl Into<String>, created_by: PrincipalId) -> Self {
		Self {
			id: AnswerId::generate(),
			ticket_id,
			body: body.into(),
			created_by,
			is_private: false,
			is_deleted: false,
			created_at: Utc::now(),
		}
	}

	pub fn private(mut self) -> Self {
		self.is_private = true;
		self
	}

	/// Link to the answer within its ticket page.
	pub fn link(&self, ticket_link: &str) -> String {
		format!("{}#at{}", ticket_link, self.id)
	}
}
