// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ticket, answer and membership operations.
//!
//! Every operation follows the same order: load, authorize, persist (a ticket
//! row and its history share one transaction), then hand the committed change
//! to the [`EventDispatcher`]. Authorization and validation errors abort
//! before anything is written; notification problems never surface here.

use chrono::Utc;
use gluru_server_auth::{
	require, validate_created_for, Action, AuthError, CompanyId, Invitation, Membership, MembershipDirectory,
	Principal, PrincipalId, ResourceAttrs, RoleId, RoleRegistry, TicketId,
};
use gluru_server_db::{AnswerStore, IdentityStore, MembershipStore, SubscriptionStore, TicketStore};
use gluru_server_tickets::{record_history_if_changed, Answer, IssueType, Ticket, TicketStatus, TicketSubscription};
use std::sync::Arc;
use tracing::instrument;

use crate::error::{Result, ServiceError};
use crate::events::{EventDispatcher, TicketChange};
use crate::stores::Stores;

#[derive(Debug, Clone)]
pub struct NewTicket {
	pub title: String,
	pub body: String,
	pub issue_type: IssueType,
	pub category: Option<String>,
	pub company_id: Option<CompanyId>,
	/// Open the ticket on behalf of this principal.
	pub created_for: Option<PrincipalId>,
}

impl NewTicket {
	pub fn new(title: impl Into<String>, body: impl Into<String>, issue_type: IssueType) -> Self {
		Self {
			title: title.into(),
			body: body.into(),
			issue_type,
			category: None,
			company_id: None,
			created_for: None,
		}
	}

	pub fn in_company(mut self, company_id: CompanyId) -> Self {
		self.company_id = Some(company_id);
		self
	}

	pub fn on_behalf_of(mut self, principal: PrincipalId) -> Self {
		self.created_for = Some(principal);
		self
	}
}

/// Fields to change; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct TicketUpdate {
	pub title: Option<String>,
	pub body: Option<String>,
	pub category: Option<Option<String>>,
	pub issue_type: Option<IssueType>,
	pub status: Option<TicketStatus>,
	/// `Some(None)` unassigns.
	pub assignee: Option<Option<PrincipalId>>,
	pub is_deleted: Option<bool>,
}

impl TicketUpdate {
	pub fn status(status: TicketStatus) -> Self {
		Self {
			status: Some(status),
			..Self::default()
		}
	}

	pub fn assign(assignee: PrincipalId) -> Self {
		Self {
			assignee: Some(Some(assignee)),
			..Self::default()
		}
	}

	fn apply(&self, ticket: &mut Ticket) {
		if let Some(title) = &self.title {
			ticket.title = title.clone();
		}
		if let Some(body) = &self.body {
			ticket.body = body.clone();
		}
		if let Some(category) = &self.category {
			ticket.category = category.clone();
		}
		if let Some(issue_type) = self.issue_type {
			ticket.issue_type = issue_type;
		}
		if let Some(status) = self.status {
			ticket.status = status;
		}
		if let Some(assignee) = self.assignee {
			ticket.assignee = assignee;
		}
		if let Some(is_deleted) = self.is_deleted {
			ticket.is_deleted = is_deleted;
		}
	}
}

pub struct TicketService {
	stores: Stores,
	roles: Arc<RoleRegistry>,
	events: EventDispatcher,
}

impl TicketService {
	pub fn new(stores: Stores, roles: Arc<RoleRegistry>, events: EventDispatcher) -> Self {
		Self { stores, roles, events }
	}

	/// Loads the memberships the decision needs and applies the engine.
	async fn authorize(
		&self,
		actor: Option<&Principal>,
		action: Action,
		resource: &ResourceAttrs,
		principals: &[PrincipalId],
	) -> Result<MembershipDirectory> {
		let mut ids: Vec<PrincipalId> = actor.map(|p| p.id).into_iter().collect();
		ids.extend_from_slice(principals);
		let companies: Vec<CompanyId> = resource.company_id.into_iter().collect();

		let directory = self.stores.memberships.load_directory(&ids, &companies).await?;
		require(&self.roles, &directory, actor, action, resource)?;
		Ok(directory)
	}

	async fn load_ticket(&self, id: TicketId) -> Result<Ticket> {
		self
			.stores
			.tickets
			.get_ticket(id)
			.await?
			.filter(|t| !t.is_deleted)
			.ok_or_else(|| ServiceError::NotFound(format!("ticket {id}")))
	}

	async fn ensure_principal(&self, id: PrincipalId) -> Result<()> {
		match self.stores.identity.get_principal_by_id(id).await? {
			Some(_) => Ok(()),
			None => Err(ServiceError::NotFound(format!("principal {id}"))),
		}
	}

	#[instrument(skip(self, actor), fields(principal_id = ?actor.map(|p| p.id), ticket_id = %id))]
	pub async fn get_ticket(&self, actor: Option<&Principal>, id: TicketId) -> Result<Ticket> {
		let ticket = self.load_ticket(id).await?;
		let resource = ResourceAttrs::ticket(ticket.company_id, ticket.created_by, ticket.created_for);
		self.authorize(actor, Action::Retrieve, &resource, &[]).await?;
		Ok(ticket)
	}

	#[instrument(skip(self, actor, request), fields(principal_id = ?actor.map(|p| p.id), issue_type = %request.issue_type))]
	pub async fn create_ticket(&self, actor: Option<&Principal>, request: NewTicket) -> Result<Ticket> {
		let resource = ResourceAttrs::new_ticket(request.company_id);
		let on_behalf: Vec<PrincipalId> = request.created_for.into_iter().collect();
		let directory = self.authorize(actor, Action::Create, &resource, &on_behalf).await?;
		let actor = actor.ok_or(AuthError::AuthenticationRequired)?;

		validate_created_for(&directory, request.company_id, request.created_for)?;
		if let Some(created_for) = request.created_for {
			self.ensure_principal(created_for).await?;
		}

		let mut ticket = Ticket::new(request.title, request.body, request.issue_type, actor.id);
		ticket.category = request.category;
		ticket.company_id = request.company_id;
		ticket.created_for = request.created_for;

		self.stores.tickets.create_ticket(&ticket).await?;
		tracing::info!(ticket_id = %ticket.id, "ticket created");

		self.events.ticket_created(&ticket, actor).await;
		Ok(ticket)
	}

	#[instrument(skip(self, actor, update), fields(principal_id = ?actor.map(|p| p.id), ticket_id = %id))]
	pub async fn update_ticket(&self, actor: Option<&Principal>, id: TicketId, update: TicketUpdate) -> Result<Ticket> {
		let before = self.load_ticket(id).await?;
		let resource = ResourceAttrs::ticket(before.company_id, before.created_by, before.created_for);
		let action = if update.is_deleted == Some(true) {
			Action::Destroy
		} else {
			Action::Update
		};
		self.authorize(actor, action, &resource, &[]).await?;
		let actor = actor.ok_or(AuthError::AuthenticationRequired)?;

		if let Some(Some(assignee)) = update.assignee {
			self.ensure_principal(assignee).await?;
		}

		let mut after = before.clone();
		update.apply(&mut after);
		if after == before {
			return Ok(after);
		}
		after.updated_at = Utc::now();

		let prior_history = self.stores.tickets.list_history(id).await?;
		let history = record_history_if_changed(&before, &after, actor.id);
		self.stores.tickets.update_ticket(&after, &history).await?;
		tracing::info!(changes = history.len(), "ticket updated");

		let change = TicketChange {
			before,
			after,
			actor: actor.clone(),
			prior_history,
		};
		self.events.ticket_changed(&change).await;
		Ok(change.after)
	}

	#[instrument(skip(self, actor, body), fields(principal_id = ?actor.map(|p| p.id), ticket_id = %ticket_id))]
	pub async fn add_answer(
		&self,
		actor: Option<&Principal>,
		ticket_id: TicketId,
		body: impl Into<String>,
		is_private: bool,
	) -> Result<Answer> {
		let ticket = self.load_ticket(ticket_id).await?;
		let resource = ResourceAttrs::answer(ticket.company_id, ticket.created_by, ticket.created_for);
		self.authorize(actor, Action::Create, &resource, &[]).await?;
		let actor = actor.ok_or(AuthError::AuthenticationRequired)?;

		let mut answer = Answer::new(ticket.id, body, actor.id);
		answer.is_private = is_private;
		self.stores.answers.create_answer(&answer).await?;
		tracing::info!(answer_id = %answer.id, "answer created");

		self.events.answer_created(&ticket, &answer, actor).await;
		Ok(answer)
	}

	/// Subscribes or unsubscribes `actor` from answer notifications.
	#[instrument(skip(self, actor), fields(principal_id = %actor.id, ticket_id = %ticket_id))]
	pub async fn set_subscription(&self, actor: &Principal, ticket_id: TicketId, subscribed: bool) -> Result<()> {
		self.get_ticket(Some(actor), ticket_id).await?;
		let subscription = if subscribed {
			TicketSubscription::subscribe(ticket_id, actor.id)
		} else {
			TicketSubscription::unsubscribe(ticket_id, actor.id)
		};
		self.stores.subscriptions.upsert_subscription(&subscription).await?;
		Ok(())
	}

	#[instrument(skip(self, actor, email), fields(principal_id = %actor.id, company_id = %company))]
	pub async fn invite(
		&self,
		actor: &Principal,
		company: CompanyId,
		email: impl Into<String>,
		role: Option<RoleId>,
	) -> Result<Invitation> {
		self
			.authorize(Some(actor), Action::Invite, &ResourceAttrs::company(company), &[])
			.await?;
		if let Some(role) = role.filter(|r| self.roles.get(*r).is_none()) {
			return Err(AuthError::ValidationFailed(format!("unknown role {role}")).into());
		}

		let invitation = Invitation::new(email, company, actor.id, role);
		self.stores.memberships.create_invitation(&invitation).await?;
		tracing::info!(invitation_id = %invitation.id, "invitation created");
		Ok(invitation)
	}

	#[instrument(skip(self, actor, key), fields(principal_id = %actor.id))]
	pub async fn accept_invitation(&self, actor: &Principal, key: &str) -> Result<Membership> {
		let invitation = self
			.stores
			.memberships
			.get_invitation_by_key(key)
			.await?
			.ok_or_else(|| AuthError::InvitationInvalid("unknown activation key".to_string()))?;
		self
			.authorize(
				Some(actor),
				Action::AcceptInvite,
				&ResourceAttrs::company(invitation.company_id),
				&[],
			)
			.await?;

		let membership = self.stores.memberships.accept_invitation(actor, key).await?;
		tracing::info!(company_id = %membership.company_id, primary = membership.is_primary, "invitation accepted");
		Ok(membership)
	}

	/// Removes `member` from `company`. A removed primary membership is not
	/// replaced.
	#[instrument(skip(self, actor), fields(principal_id = %actor.id, company_id = %company, member = %member))]
	pub async fn remove_member(&self, actor: &Principal, company: CompanyId, member: PrincipalId) -> Result<()> {
		self
			.authorize(Some(actor), Action::RemoveMember, &ResourceAttrs::company(company), &[])
			.await?;

		if !self.stores.memberships.remove_member(member, company).await? {
			return Err(ServiceError::NotFound(format!("membership of {member} in {company}")));
		}
		tracing::info!("member removed");
		Ok(())
	}
}
