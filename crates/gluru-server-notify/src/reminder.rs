// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reminders for urgent tickets nobody has picked up.

use crate::context::ticket_context;
use crate::event::{effective_plan, Participant};
use crate::intent::NotificationIntent;
use crate::planner::NotificationPlanner;
use crate::template::Template;
use chrono::{DateTime, Duration, Utc};
use gluru_server_auth::{Company, SupportPlan};
use gluru_server_tickets::{IssueType, Ticket, TicketStatus};
use tracing::instrument;

/// An open ticket with what the reminder needs to describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTicket {
	pub ticket: Ticket,
	pub creator: Participant,
	pub company: Option<Company>,
}

/// How long an urgent ticket may wait before support is reminded.
pub fn reminder_delay(issue_type: IssueType, plan: SupportPlan) -> Option<Duration> {
	let minutes = match (issue_type, plan) {
		(IssueType::ProductionOutage, SupportPlan::Enterprise) => 5,
		(IssueType::ProductionOutage, SupportPlan::Premium) => 30,
		(IssueType::ProductionOutage, SupportPlan::Standard) => 60,
		(IssueType::ProductionOutage, _) => 120,
		(IssueType::ProductionImpaired, SupportPlan::Enterprise | SupportPlan::Premium) => 30,
		(IssueType::ProductionImpaired, _) => 120,
		_ => return None,
	};
	Some(Duration::minutes(minutes))
}

impl NotificationPlanner {
	/// One reminder to the support list per urgent, unhandled ticket whose
	/// last update is older than its plan's delay.
	#[instrument(level = "debug", skip(self, tickets), fields(candidates = tickets.len()))]
	pub fn plan_stale_ticket_reminders(&self, tickets: &[OpenTicket], now: DateTime<Utc>) -> Vec<NotificationIntent> {
		tickets
			.iter()
			.filter(|t| !t.ticket.is_deleted)
			.filter(|t| matches!(t.ticket.status, TicketStatus::Submitted | TicketStatus::Assigned))
			.filter_map(|t| {
				let plan = effective_plan(t.company.as_ref(), &t.creator);
				let delay = reminder_delay(t.ticket.issue_type, plan)?;
				let waited = now - t.ticket.updated_at;
				(waited >= delay).then(|| {
					let context = ticket_context(&t.ticket, &t.creator, plan, self.recipients());
					NotificationIntent::email(
						self.recipients().support_addresses.clone(),
						Template::StaleTicketReminder,
						context,
					)
					.with_context("waiting_minutes", waited.num_minutes())
				})
			})
			.collect()
	}
}
