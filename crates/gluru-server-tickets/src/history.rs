// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Append-only audit trail of watched ticket fields.

use crate::ticket::Ticket;
use chrono::{DateTime, Utc};
use gluru_server_auth::{PrincipalId, TicketId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryId(pub Uuid);

impl HistoryId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for HistoryId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for HistoryId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Ticket fields whose every change is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchedField {
	Assignee,
	Status,
	IsDeleted,
	IssueType,
	Title,
	Body,
	CreatedFor,
}

impl WatchedField {
	pub fn all() -> &'static [WatchedField] {
		&[
			Self::Assignee,
			Self::Status,
			Self::IsDeleted,
			Self::IssueType,
			Self::Title,
			Self::Body,
			Self::CreatedFor,
		]
	}

	/// Storage form of the field's value on `ticket`. `None` for an unset optional.
	pub fn value_of(&self, ticket: &Ticket) -> Option<String> {
		match self {
			Self::Assignee => ticket.assignee.map(|p| p.to_string()),
			Self::Status => Some(ticket.status.to_string()),
			Self::IsDeleted => Some(ticket.is_deleted.to_string()),
			Self::IssueType => Some(ticket.issue_type.to_string()),
			Self::Title => Some(ticket.title.clone()),
			Self::Body => Some(ticket.body.clone()),
			Self::CreatedFor => ticket.created_for.map(|p| p.to_string()),
		}
	}
}

impl fmt::Display for WatchedField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Assignee => write!(f, "assignee"),
			Self::Status => write!(f, "status"),
			Self::IsDeleted => write!(f, "is_deleted"),
			Self::IssueType => write!(f, "issue_type"),
			Self::Title => write!(f, "title"),
			Self::Body => write!(f, "body"),
			Self::CreatedFor => write!(f, "created_for"),
		}
	}
}

impl FromStr for WatchedField {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all()
			.iter()
			.copied()
			.find(|field| field.to_string() == s)
			.ok_or_else(|| format!("unknown watched field: {}", s))
	}
}

/// One recorded field change. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketHistory {
	pub id: HistoryId,
	pub ticket_id: TicketId,
	pub changed_by: PrincipalId,
	pub field: WatchedField,
	pub before_value: Option<String>,
	pub after_value: Option<String>,
	pub created_at: DateTime<Utc>,
}

/// Compares every watched field and returns one history row per change, in
/// [`WatchedField::all`] order. Unwatched changes produce nothing.
pub fn record_history_if_changed(
	before: &Ticket,
	after: &Ticket,
	changed_by: PrincipalId,
) -> Vec<TicketHistory> {
	let now = Utc::now();
	let rows: Vec<TicketHistory> = WatchedField::all()
		.iter()
		.filter_map(|field| {
			let before_value = field.value_of(before);
			let after_value = field.value_of(after);
			(before_value != after_value).then(|| TicketHistory {
				id: HistoryId::new(),
				ticket_id: after.id,
				changed_by,
				field: *field,
				before_value,
				after_value,
				created_at: now,
			})
		})
		.collect();

	if !rows.is_empty() {
		tracing::debug!(ticket_id = %after.id, changes = rows.len(), "ticket fields changed");
	}
	rows
}
