// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Post-commit event emission.
//!
//! The ticket service commits a mutation and its history first, then hands
//! the [`EventDispatcher`] a description of what happened. The dispatcher
//! loads the snapshot the planner needs, plans, and schedules every intent on
//! the notification queue. Nothing here can fail the originating request:
//! assembly and scheduling problems are logged and counted as zero intents.

use chrono::{DateTime, Utc};
use gluru_server_auth::{classify, Company, CompanyId, MembershipResolver, Principal, PrincipalId, RoleRegistry};
use gluru_server_db::{IdentityStore, MembershipStore, SubscriptionStore, TicketStore};
use gluru_server_jobs::{NotificationQueue, ScheduleOutcome};
use gluru_server_notify::{
	resolve_mentions, AnswerCreated, CompanyMember, LifecycleEvent, NotificationIntent, NotificationPlanner,
	OpenTicket, Participant, TicketAssigned, TicketCreated, TicketReopened,
};
use gluru_server_tickets::{active_subscribers, detect_events, Answer, Ticket, TicketEvent, TicketHistory};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::instrument;

use crate::error::{Result, ServiceError};
use crate::stores::Stores;

/// A committed ticket mutation.
#[derive(Debug, Clone)]
pub struct TicketChange {
	pub before: Ticket,
	pub after: Ticket,
	pub actor: Principal,
	/// History of the ticket as it was before this change.
	pub prior_history: Vec<TicketHistory>,
}

#[derive(Clone)]
pub struct EventDispatcher {
	stores: Stores,
	roles: Arc<RoleRegistry>,
	planner: Arc<NotificationPlanner>,
	queue: Arc<dyn NotificationQueue>,
}

impl EventDispatcher {
	pub fn new(
		stores: Stores,
		roles: Arc<RoleRegistry>,
		planner: Arc<NotificationPlanner>,
		queue: Arc<dyn NotificationQueue>,
	) -> Self {
		Self {
			stores,
			roles,
			planner,
			queue,
		}
	}

	/// Plans `event` and schedules the result. Returns how many intents the
	/// queue accepted.
	pub fn publish(&self, event: &LifecycleEvent) -> usize {
		let intents = self.planner.plan(event);
		self.schedule_all(event.kind(), intents)
	}

	fn schedule_all(&self, source: &str, intents: Vec<NotificationIntent>) -> usize {
		let mut accepted = 0;
		for intent in intents {
			let channel = intent.channel;
			let template = intent.template.path();
			match self.queue.schedule(intent) {
				ScheduleOutcome::Accepted(job_id) => {
					accepted += 1;
					tracing::debug!(source, %job_id, %channel, template, "notification scheduled");
				}
				ScheduleOutcome::Rejected(reason) => {
					tracing::warn!(source, %channel, template, %reason, "notification intent rejected");
				}
			}
		}
		accepted
	}

	#[instrument(skip(self, ticket, creator), fields(ticket_id = %ticket.id))]
	pub async fn ticket_created(&self, ticket: &Ticket, creator: &Principal) -> usize {
		match self.assemble_ticket_created(ticket, creator).await {
			Ok(event) => self.publish(&event),
			Err(e) => {
				tracing::warn!(error = %e, "could not assemble ticket-created notifications");
				0
			}
		}
	}

	/// Emits the reopen and assignment events a change implies.
	#[instrument(skip(self, change), fields(ticket_id = %change.after.id))]
	pub async fn ticket_changed(&self, change: &TicketChange) -> usize {
		let events = detect_events(&change.before, &change.after, change.actor.id, &change.prior_history);
		if events.is_empty() {
			return 0;
		}

		match self.assemble_ticket_events(change, &events).await {
			Ok(events) => events.iter().map(|event| self.publish(event)).sum(),
			Err(e) => {
				tracing::warn!(error = %e, "could not assemble ticket-change notifications");
				0
			}
		}
	}

	#[instrument(skip(self, ticket, answer, author), fields(ticket_id = %ticket.id, answer_id = %answer.id))]
	pub async fn answer_created(&self, ticket: &Ticket, answer: &Answer, author: &Principal) -> usize {
		match self.assemble_answer_created(ticket, answer, author).await {
			Ok(event) => self.publish(&event),
			Err(e) => {
				tracing::warn!(error = %e, "could not assemble answer notifications");
				0
			}
		}
	}

	/// Schedules reminders for urgent tickets that have waited too long.
	/// Tickets whose snapshot cannot be loaded are skipped.
	#[instrument(skip(self))]
	pub async fn remind_stale_tickets(&self, now: DateTime<Utc>) -> Result<usize> {
		let candidates = self.stores.tickets.list_reminder_candidates().await?;

		let mut open = Vec::with_capacity(candidates.len());
		for ticket in candidates {
			let ticket_id = ticket.id;
			match self.open_ticket(ticket).await {
				Ok(t) => open.push(t),
				Err(e) => tracing::warn!(%ticket_id, error = %e, "skipping reminder candidate"),
			}
		}

		let intents = self.planner.plan_stale_ticket_reminders(&open, now);
		Ok(self.schedule_all("stale_ticket_reminder", intents))
	}

	async fn open_ticket(&self, ticket: Ticket) -> Result<OpenTicket> {
		let creator = self.participant(self.principal(ticket.created_by).await?).await?;
		let company = self.company(ticket.company_id).await?;
		Ok(OpenTicket {
			ticket,
			creator,
			company,
		})
	}

	async fn assemble_ticket_created(&self, ticket: &Ticket, creator: &Principal) -> Result<LifecycleEvent> {
		let creator = self.participant(creator.clone()).await?;
		let created_for = match ticket.created_for {
			Some(id) => Some(self.participant(self.principal(id).await?).await?),
			None => None,
		};
		let company = self.company(ticket.company_id).await?;

		let companies: BTreeSet<CompanyId> = [creator.company_id(), created_for.as_ref().and_then(Participant::company_id)]
			.into_iter()
			.flatten()
			.collect();
		let colleagues = self.company_members(&companies).await?;

		Ok(LifecycleEvent::TicketCreated(TicketCreated {
			ticket: ticket.clone(),
			creator,
			created_for,
			company,
			colleagues,
		}))
	}

	async fn assemble_ticket_events(&self, change: &TicketChange, events: &[TicketEvent]) -> Result<Vec<LifecycleEvent>> {
		let ticket = &change.after;
		let actor = self.participant(change.actor.clone()).await?;
		let creator = self.participant(self.principal(ticket.created_by).await?).await?;
		let company = self.company(ticket.company_id).await?;

		let mut assembled = Vec::with_capacity(events.len());
		for event in events {
			let event = match *event {
				TicketEvent::Reopened { .. } => {
					let assignee = match ticket.assignee {
						Some(id) => Some(self.principal(id).await?),
						None => None,
					};
					LifecycleEvent::TicketReopened(TicketReopened {
						ticket: ticket.clone(),
						actor: actor.clone(),
						creator: creator.clone(),
						company: company.clone(),
						assignee,
					})
				}
				TicketEvent::Assigned {
					assignee,
					first_assignment,
					..
				} => LifecycleEvent::TicketAssigned(TicketAssigned {
					ticket: ticket.clone(),
					actor: actor.clone(),
					assignee: self.principal(assignee).await?,
					creator: creator.clone(),
					company: company.clone(),
					owner: self.principal(ticket.owner()).await?,
					first_assignment,
				}),
			};
			assembled.push(event);
		}
		Ok(assembled)
	}

	async fn assemble_answer_created(&self, ticket: &Ticket, answer: &Answer, author: &Principal) -> Result<LifecycleEvent> {
		let subscriptions = self.stores.subscriptions.list_subscriptions(ticket.id).await?;
		let subscriber_ids: Vec<PrincipalId> = active_subscribers(ticket.id, &subscriptions).into_iter().collect();
		let subscribers = self.stores.identity.list_principals(&subscriber_ids).await?;

		let assignee = match ticket.assignee {
			Some(id) => Some(self.principal(id).await?),
			None => None,
		};
		let companies: BTreeSet<CompanyId> = ticket.company_id.into_iter().collect();

		Ok(LifecycleEvent::AnswerCreated(AnswerCreated {
			ticket: ticket.clone(),
			answer: answer.clone(),
			author: self.participant(author.clone()).await?,
			owner: self.principal(ticket.owner()).await?,
			assignee,
			company: self.company(ticket.company_id).await?,
			subscribers,
			company_members: self.company_members(&companies).await?,
			mentioned: resolve_mentions(&answer.body, &self.stores.identity).await,
		}))
	}

	async fn principal(&self, id: PrincipalId) -> Result<Principal> {
		self
			.stores
			.identity
			.get_principal_by_id(id)
			.await?
			.ok_or_else(|| ServiceError::NotFound(format!("principal {id}")))
	}

	async fn company(&self, id: Option<CompanyId>) -> Result<Option<Company>> {
		match id {
			Some(id) => Ok(self.stores.identity.get_company_by_id(id).await?),
			None => Ok(None),
		}
	}

	/// The principal with its class and the company of its primary membership.
	async fn participant(&self, principal: Principal) -> Result<Participant> {
		let directory = self.stores.memberships.load_directory(&[principal.id], &[]).await?;
		let class = classify(&principal, &directory, &self.roles);
		let company_id = directory.primary_membership(principal.id).map(|m| m.company_id);
		let participant = Participant::new(principal, class);

		Ok(match self.company(company_id).await? {
			Some(company) => participant.with_company(company),
			None => participant,
		})
	}

	async fn company_members(&self, companies: &BTreeSet<CompanyId>) -> Result<Vec<CompanyMember>> {
		let mut memberships = Vec::new();
		for company in companies {
			memberships.extend(self.stores.memberships.list_members(*company).await?);
		}
		if memberships.is_empty() {
			return Ok(Vec::new());
		}

		let ids: Vec<PrincipalId> = memberships
			.iter()
			.map(|m| m.principal_id)
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect();
		let principals: HashMap<PrincipalId, Principal> = self
			.stores
			.identity
			.list_principals(&ids)
			.await?
			.into_iter()
			.map(|p| (p.id, p))
			.collect();
		// Classification needs each member's primary membership, wherever it is.
		let directory = self.stores.memberships.load_directory(&ids, &[]).await?;

		Ok(memberships
			.into_iter()
			.filter_map(|m| {
				let principal = principals.get(&m.principal_id)?.clone();
				let class = classify(&principal, &directory, &self.roles);
				Some(CompanyMember {
					principal,
					company_id: m.company_id,
					class,
					receive_notification: m.receive_notification,
				})
			})
			.collect())
	}
}
