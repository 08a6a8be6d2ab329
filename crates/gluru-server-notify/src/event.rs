// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Planner inputs.
//!
//! An event is a complete snapshot of everything the planner needs: the
//! ticket, the principals involved with their classification, and the
//! candidate colleagues and subscribers. Loading that snapshot is the
//! caller's job; the planner itself performs no lookups.

use gluru_server_auth::{Company, CompanyId, Principal, PrincipalClass, PrincipalId, SupportPlan};
use gluru_server_tickets::{Answer, Ticket};

/// A principal as the planner sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
	pub principal: Principal,
	pub class: PrincipalClass,
	/// Company of the primary membership, if any.
	pub company: Option<Company>,
}

impl Participant {
	pub fn new(principal: Principal, class: PrincipalClass) -> Self {
		Self {
			principal,
			class,
			company: None,
		}
	}

	pub fn with_company(mut self, company: Company) -> Self {
		self.company = Some(company);
		self
	}

	pub fn id(&self) -> PrincipalId {
		self.principal.id
	}

	pub fn is_named(&self) -> bool {
		self.class == PrincipalClass::Named
	}

	pub fn company_id(&self) -> Option<CompanyId> {
		self.company.as_ref().map(|c| c.id)
	}

	pub fn company_name(&self) -> Option<&str> {
		self.company.as_ref().map(|c| c.name.as_str())
	}
}

/// A member of a company considered for colleague notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyMember {
	pub principal: Principal,
	pub company_id: CompanyId,
	pub class: PrincipalClass,
	pub receive_notification: bool,
}

impl CompanyMember {
	/// Active, opted in and named.
	pub fn wants_company_notifications(&self) -> bool {
		self.principal.is_active && self.receive_notification && self.class == PrincipalClass::Named
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketCreated {
	pub ticket: Ticket,
	pub creator: Participant,
	/// Present when the ticket was opened on someone's behalf.
	pub created_for: Option<Participant>,
	/// The ticket's company.
	pub company: Option<Company>,
	/// Members of the creator's and the owner's companies.
	pub colleagues: Vec<CompanyMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketReopened {
	pub ticket: Ticket,
	pub actor: Participant,
	pub creator: Participant,
	pub company: Option<Company>,
	pub assignee: Option<Principal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketAssigned {
	pub ticket: Ticket,
	pub actor: Participant,
	pub assignee: Principal,
	pub creator: Participant,
	pub company: Option<Company>,
	/// `created_for` if set, otherwise the creator.
	pub owner: Principal,
	pub first_assignment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCreated {
	pub ticket: Ticket,
	pub answer: Answer,
	pub author: Participant,
	pub owner: Principal,
	pub assignee: Option<Principal>,
	pub company: Option<Company>,
	/// Principals holding a subscription record on the ticket that is still subscribed.
	pub subscribers: Vec<Principal>,
	/// Members of the ticket's company.
	pub company_members: Vec<CompanyMember>,
	/// Principals resolved from `@handle` mentions in the answer body.
	pub mentioned: Vec<Principal>,
}

/// A completed, committed change that may trigger notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
	TicketCreated(TicketCreated),
	TicketReopened(TicketReopened),
	TicketAssigned(TicketAssigned),
	AnswerCreated(AnswerCreated),
}

impl LifecycleEvent {
	pub fn kind(&self) -> &'static str {
		match self {
			Self::TicketCreated(_) => "ticket_created",
			Self::TicketReopened(_) => "ticket_reopened",
			Self::TicketAssigned(_) => "ticket_assigned",
			Self::AnswerCreated(_) => "answer_created",
		}
	}

	pub fn ticket(&self) -> &Ticket {
		match self {
			Self::TicketCreated(e) => &e.ticket,
			Self::TicketReopened(e) => &e.ticket,
			Self::TicketAssigned(e) => &e.ticket,
			Self::AnswerCreated(e) => &e.ticket,
		}
	}
}

/// Plan used for SLA text and SMS priority: the ticket's company first,
/// then the creator's, otherwise community.
pub fn effective_plan(company: Option<&Company>, creator: &Participant) -> SupportPlan {
	company
		.or(creator.company.as_ref())
		.map(|c| c.support_plan)
		.unwrap_or_default()
}
