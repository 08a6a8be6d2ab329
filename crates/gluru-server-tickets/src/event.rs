// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lifecycle events derived from a ticket mutation.
//!
//! Creation and answers are explicit operations and need no detection. Reopen
//! and assignment are inferred by comparing the stored ticket with the updated
//! one, after the update has been authorized.

use crate::history::{TicketHistory, WatchedField};
use crate::ticket::{Ticket, TicketStatus};
use gluru_server_auth::PrincipalId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TicketEvent {
	/// Status moved away from closed.
	Reopened { by: PrincipalId },
	/// Assignee changed to a principal.
	Assigned {
		assignee: PrincipalId,
		by: PrincipalId,
		/// No assignee was ever recorded before this one.
		first_assignment: bool,
	},
}

/// Derives the lifecycle events caused by `actor` changing `before` into `after`.
///
/// `prior_history` is the ticket's history before this mutation and decides
/// whether an assignment is the first ever. Unassigning produces no event.
pub fn detect_events(
	before: &Ticket,
	after: &Ticket,
	actor: PrincipalId,
	prior_history: &[TicketHistory],
) -> Vec<TicketEvent> {
	let mut events = Vec::new();

	if before.status == TicketStatus::Closed && after.status != TicketStatus::Closed {
		events.push(TicketEvent::Reopened { by: actor });
	}

	if let Some(assignee) = after.assignee.filter(|a| before.assignee != Some(*a)) {
		let first_assignment = before.assignee.is_none()
			&& !prior_history
				.iter()
				.any(|row| row.field == WatchedField::Assignee);
		events.push(TicketEvent::Assigned {
			assignee,
			by: actor,
			first_assignment,
		});
	}

	events
}
