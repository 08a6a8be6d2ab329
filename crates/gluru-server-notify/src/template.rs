// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message templates, each identified by a stable path stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
	/// To `created_for` when staff open a ticket on their behalf.
	NewTicketOwner,
	NewTicketForStaff,
	NewTicketForNamed,
	NewTicketByStaff,
	NewTicketNoteForUser,
	NewTicketSupportForUser,
	NewTicketNoteForNamed,
	NewTicketSupportForNamed,
	TicketReopened,
	AssignedToAssignee,
	AssignedToCreator,
	NewAnswer,
	NewAnswerSubscribers,
	TaggedStaffMember,
	StaleTicketReminder,
	SmsNewTicket,
}

impl Template {
	pub fn all() -> &'static [Template] {
		&[
			Self::NewTicketOwner,
			Self::NewTicketForStaff,
			Self::NewTicketForNamed,
			Self::NewTicketByStaff,
			Self::NewTicketNoteForUser,
			Self::NewTicketSupportForUser,
			Self::NewTicketNoteForNamed,
			Self::NewTicketSupportForNamed,
			Self::TicketReopened,
			Self::AssignedToAssignee,
			Self::AssignedToCreator,
			Self::NewAnswer,
			Self::NewAnswerSubscribers,
			Self::TaggedStaffMember,
			Self::StaleTicketReminder,
			Self::SmsNewTicket,
		]
	}

	pub fn path(&self) -> &'static str {
		match self {
			Self::NewTicketOwner => "new_ticket/ticket_owner",
			Self::NewTicketForStaff => "new_ticket/for_staff",
			Self::NewTicketForNamed => "new_ticket/for_named",
			Self::NewTicketByStaff => "new_ticket/by_staff",
			Self::NewTicketNoteForUser => "new_ticket/note_for_user",
			Self::NewTicketSupportForUser => "new_ticket/support_for_user",
			Self::NewTicketNoteForNamed => "new_ticket/note_for_named",
			Self::NewTicketSupportForNamed => "new_ticket/support_for_named",
			Self::TicketReopened => "new_ticket/reopened",
			Self::AssignedToAssignee => "ticket_assigned/to_assignee",
			Self::AssignedToCreator => "ticket_assigned/to_creator",
			Self::NewAnswer => "new_answer/new_answer",
			Self::NewAnswerSubscribers => "new_answer/subscribers",
			Self::TaggedStaffMember => "new_answer/tagged_staff_member",
			Self::StaleTicketReminder => "reminder/stale_ticket",
			Self::SmsNewTicket => "sms/new_ticket",
		}
	}

	pub fn is_sms(&self) -> bool {
		matches!(self, Self::SmsNewTicket)
	}
}

impl fmt::Display for Template {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.path())
	}
}

impl FromStr for Template {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all()
			.iter()
			.copied()
			.find(|t| t.path() == s)
			.ok_or_else(|| format!("unknown template: {}", s))
	}
}
