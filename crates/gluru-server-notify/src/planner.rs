// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification planning.
//!
//! [`NotificationPlanner::plan`] maps a committed [`LifecycleEvent`] to the
//! intents that must be delivered. It is a pure function of the event and the
//! configured [`NotificationRecipients`]: planning the same event twice yields
//! the same intents.
//!
//! # Recipient rules
//!
//! | event | recipients |
//! |---|---|
//! | ticket created for someone | owner, support list, named colleagues of creator and owner if the owner is named |
//! | ticket created by staff | support list |
//! | ticket created by basic | creator, support list |
//! | ticket created by named | creator, support list, named colleagues |
//! | urgent ticket created | every enabled SMS contact |
//! | reopened | assignee, unless the assignee reopened it |
//! | assigned | assignee unless self-assigned; owner on first assignment by someone else when the creator is named |
//! | answer created | owner and assignee; subscribers in one batch; mentioned principals one each |

use crate::context::{answer_context, company_label, ticket_context};
use crate::event::{
	effective_plan, AnswerCreated, CompanyMember, LifecycleEvent, TicketAssigned, TicketCreated, TicketReopened,
};
use crate::intent::{Context, NotificationIntent, Priority};
use crate::recipients::NotificationRecipients;
use crate::template::Template;
use gluru_server_auth::{CompanyId, Principal, PrincipalClass, PrincipalId};
use std::collections::BTreeSet;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct NotificationPlanner {
	recipients: NotificationRecipients,
}

impl NotificationPlanner {
	pub fn new(recipients: NotificationRecipients) -> Self {
		Self { recipients }
	}

	pub fn recipients(&self) -> &NotificationRecipients {
		&self.recipients
	}

	#[instrument(
		level = "debug",
		skip(self, event),
		fields(event = event.kind(), ticket_id = %event.ticket().id, intents = tracing::field::Empty)
	)]
	pub fn plan(&self, event: &LifecycleEvent) -> Vec<NotificationIntent> {
		let intents = match event {
			LifecycleEvent::TicketCreated(e) => self.plan_ticket_created(e),
			LifecycleEvent::TicketReopened(e) => self.plan_ticket_reopened(e),
			LifecycleEvent::TicketAssigned(e) => self.plan_ticket_assigned(e),
			LifecycleEvent::AnswerCreated(e) => self.plan_answer_created(e),
		};

		tracing::Span::current().record("intents", intents.len());
		intents
	}

	fn support(&self, template: Template, context: &Context) -> NotificationIntent {
		NotificationIntent::email(self.recipients.support_addresses.clone(), template, context.clone())
	}

	fn plan_ticket_created(&self, e: &TicketCreated) -> Vec<NotificationIntent> {
		let plan = effective_plan(e.company.as_ref(), &e.creator);
		let mut context = ticket_context(&e.ticket, &e.creator, plan, &self.recipients);
		let mut intents = Vec::new();

		match &e.created_for {
			Some(owner) => {
				context.insert("ticket_created_for".into(), owner.principal.full_name().into());
				context.insert(
					"ticket_created_for_company".into(),
					owner.company_name().unwrap_or_default().into(),
				);
				intents.push(to_principal(&owner.principal, Template::NewTicketOwner, &context));
				intents.push(self.support(Template::NewTicketForStaff, &context));

				if owner.is_named() {
					let companies = [e.creator.company_id(), owner.company_id()];
					let excluded = [e.creator.id(), owner.id()];
					intents.extend(
						named_colleagues(&e.colleagues, &companies, &excluded)
							.map(|member| colleague_intent(member, &context)),
					);
				}
			}
			None => match e.creator.class {
				PrincipalClass::Staff => {
					intents.push(self.support(Template::NewTicketByStaff, &context));
				}
				PrincipalClass::Basic => {
					intents.push(to_principal(&e.creator.principal, Template::NewTicketNoteForUser, &context));
					intents.push(self.support(Template::NewTicketSupportForUser, &context));
				}
				PrincipalClass::Named => {
					intents.push(to_principal(&e.creator.principal, Template::NewTicketNoteForNamed, &context));
					intents.push(self.support(Template::NewTicketSupportForNamed, &context));
					intents.extend(
						named_colleagues(&e.colleagues, &[e.creator.company_id()], &[e.creator.id()])
							.map(|member| colleague_intent(member, &context)),
					);
				}
			},
		}

		intents.extend(self.plan_sms_alerts(e, &context, Priority::for_sms(plan)));
		intents
	}

	/// One SMS per enabled on-call contact for urgent tickets.
	fn plan_sms_alerts(&self, e: &TicketCreated, context: &Context, priority: Priority) -> Vec<NotificationIntent> {
		if !e.ticket.issue_type.is_urgent() {
			return Vec::new();
		}

		let company = e.company.as_ref().or(e.creator.company.as_ref());
		self
			.recipients
			.enabled_sms_contacts()
			.map(|contact| {
				NotificationIntent::sms(contact.number.clone(), Template::SmsNewTicket, context.clone(), priority)
					.with_context("contact_name", contact.name.clone())
					.with_context("creator_company_label", company_label(company))
			})
			.collect()
	}

	fn plan_ticket_reopened(&self, e: &TicketReopened) -> Vec<NotificationIntent> {
		let Some(assignee) = e.assignee.as_ref().filter(|a| a.id != e.actor.id()) else {
			return Vec::new();
		};

		let plan = effective_plan(e.company.as_ref(), &e.creator);
		let mut context = ticket_context(&e.ticket, &e.creator, plan, &self.recipients);
		context.insert("reopened_by".into(), e.actor.principal.full_name().into());
		context.insert(
			"reopened_by_company".into(),
			e.actor.company_name().unwrap_or_default().into(),
		);
		vec![to_principal(assignee, Template::TicketReopened, &context)]
	}

	fn plan_ticket_assigned(&self, e: &TicketAssigned) -> Vec<NotificationIntent> {
		let plan = effective_plan(e.company.as_ref(), &e.creator);
		let mut context = ticket_context(&e.ticket, &e.creator, plan, &self.recipients);
		context.insert("assigned_by".into(), e.actor.principal.full_name().into());
		context.insert("assigned_to".into(), e.assignee.full_name().into());

		let mut intents = Vec::new();
		if e.assignee.id != e.actor.id() {
			let mut context = context.clone();
			context.insert("first_name".into(), e.assignee.first_name.clone().into());
			intents.push(to_principal(&e.assignee, Template::AssignedToAssignee, &context));
		}

		if e.first_assignment && e.owner.id != e.actor.id() && e.creator.is_named() {
			let mut context = context;
			context.insert("first_name".into(), e.owner.first_name.clone().into());
			intents.push(to_principal(&e.owner, Template::AssignedToCreator, &context));
		}
		intents
	}

	fn plan_answer_created(&self, e: &AnswerCreated) -> Vec<NotificationIntent> {
		let plan = effective_plan(e.company.as_ref(), &e.author);
		let context = answer_context(&e.ticket, &e.answer, &e.author, plan, &self.recipients);
		let author = e.author.id();
		let mut intents = Vec::new();

		// Owner and assignee.
		let mut primary = Recipients::default();
		for party in std::iter::once(&e.owner).chain(e.assignee.as_ref()) {
			if party.is_active && party.id != author {
				primary.add(party);
			}
		}
		if !primary.is_empty() {
			intents.push(NotificationIntent::email(primary.addresses, Template::NewAnswer, context.clone()));
		}

		// Subscribers, batched.
		let mut subscribers = Recipients::excluding([Some(author), Some(e.owner.id), e.assignee.as_ref().map(|a| a.id)]);
		for principal in e.subscribers.iter().filter(|p| p.is_active) {
			subscribers.add(principal);
		}
		if let Some(company) = e.ticket.company_id {
			for member in named_colleagues(&e.company_members, &[Some(company)], &[]) {
				subscribers.add(&member.principal);
			}
		}
		if !subscribers.is_empty() {
			intents.push(NotificationIntent::email(
				subscribers.addresses,
				Template::NewAnswerSubscribers,
				context.clone(),
			));
		}

		// Mentions, one intent each.
		let mut mentioned = Recipients::excluding([Some(author)]);
		for principal in &e.mentioned {
			if mentioned.add(principal) {
				intents.push(to_principal(principal, Template::TaggedStaffMember, &context));
			}
		}

		intents
	}
}

fn to_principal(principal: &Principal, template: Template, context: &Context) -> NotificationIntent {
	NotificationIntent::email(vec![principal.email.clone()], template, context.clone())
}

fn colleague_intent(member: &CompanyMember, context: &Context) -> NotificationIntent {
	to_principal(&member.principal, Template::NewTicketForNamed, context)
		.with_context("recipient_name", member.principal.full_name())
}

/// Members of any of `companies` that want company notifications, deduplicated
/// by principal and without the `excluded` principals.
fn named_colleagues<'a>(
	members: &'a [CompanyMember],
	companies: &[Option<CompanyId>],
	excluded: &[PrincipalId],
) -> impl Iterator<Item = &'a CompanyMember> {
	let companies: BTreeSet<CompanyId> = companies.iter().flatten().copied().collect();
	let mut seen: BTreeSet<PrincipalId> = excluded.iter().copied().collect();
	members.iter().filter(move |m| {
		companies.contains(&m.company_id) && m.wants_company_notifications() && seen.insert(m.principal.id)
	})
}

/// Ordered, deduplicated address list.
#[derive(Default)]
struct Recipients {
	seen: BTreeSet<PrincipalId>,
	addresses: Vec<String>,
}

impl Recipients {
	fn excluding(ids: impl IntoIterator<Item = Option<PrincipalId>>) -> Self {
		Self {
			seen: ids.into_iter().flatten().collect(),
			addresses: Vec::new(),
		}
	}

	fn add(&mut self, principal: &Principal) -> bool {
		let added = self.seen.insert(principal.id);
		if added {
			self.addresses.push(principal.email.clone());
		}
		added
	}

	fn is_empty(&self) -> bool {
		self.addresses.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::context_str;
	use crate::event::Participant;
	use crate::intent::Channel;
	use crate::recipients::SmsContact;
	use gluru_server_auth::{Company, SupportPlan};
	use gluru_server_tickets::{Answer, IssueType, Ticket, TicketStatus};
	use proptest::prelude::*;
	use std::collections::HashSet;

	const SUPPORT: &str = "support@gluu.org";

	fn planner() -> NotificationPlanner {
		NotificationPlanner::new(NotificationRecipients::new(vec![SUPPORT.to_string()], "https://support.gluu.org"))
	}

	fn person(email: &str) -> Principal {
		Principal::new(PrincipalId::generate(), email)
	}

	fn participant(email: &str, class: PrincipalClass) -> Participant {
		Participant::new(person(email), class)
	}

	fn company(plan: SupportPlan) -> Company {
		Company::new(CompanyId::generate(), "Acme", plan)
	}

	fn member(principal: &Principal, company: &Company, class: PrincipalClass) -> CompanyMember {
		CompanyMember {
			principal: principal.clone(),
			company_id: company.id,
			class,
			receive_notification: true,
		}
	}

	fn created(creator: Participant, ticket: Ticket) -> TicketCreated {
		TicketCreated {
			ticket,
			company: creator.company.clone(),
			creator,
			created_for: None,
			colleagues: Vec::new(),
		}
	}

	fn recipients_of(intents: &[NotificationIntent]) -> Vec<&str> {
		intents
			.iter()
			.flat_map(|i| i.recipients.iter().map(String::as_str))
			.collect()
	}

	fn templates_of(intents: &[NotificationIntent]) -> Vec<Template> {
		intents.iter().map(|i| i.template).collect()
	}

	mod ticket_created {
		use super::*;

		#[test]
		fn community_user_gets_ack_and_support_is_told() {
			let user = participant("user@example.com", PrincipalClass::Basic);
			let ticket = Ticket::new("Cannot log in", "details", IssueType::Minor, user.id());
			assert_eq!(ticket.status, TicketStatus::Submitted);

			let intents = planner().plan(&LifecycleEvent::TicketCreated(created(user, ticket)));
			assert_eq!(intents.len(), 2);
			assert_eq!(
				templates_of(&intents),
				[Template::NewTicketNoteForUser, Template::NewTicketSupportForUser]
			);
			assert_eq!(recipients_of(&intents), ["user@example.com", SUPPORT]);
			assert!(intents.iter().all(|i| i.template != Template::NewTicketForNamed));
			assert!(intents.iter().all(|i| i.priority == Priority::Low && i.channel == Channel::Email));
		}

		#[test]
		fn staff_creator_only_notifies_support() {
			let staff = participant("s@gluu.org", PrincipalClass::Staff);
			let ticket = Ticket::new("Internal", "b", IssueType::Minor, staff.id());
			let intents = planner().plan(&LifecycleEvent::TicketCreated(created(staff, ticket)));
			assert_eq!(templates_of(&intents), [Template::NewTicketByStaff]);
			assert_eq!(recipients_of(&intents), [SUPPORT]);
		}

		#[test]
		fn named_creator_notifies_subscribed_named_colleagues() {
			let acme = company(SupportPlan::Premium);
			let creator = participant("creator@acme.test", PrincipalClass::Named).with_company(acme.clone());
			let colleague = person("colleague@acme.test").with_name("Col", "League");
			let muted = person("muted@acme.test");
			let basic = person("basic@acme.test");
			let inactive = person("inactive@acme.test").inactive();

			let mut event = created(creator.clone(), Ticket::new("t", "b", IssueType::Minor, creator.id()).with_company(acme.id));
			event.colleagues = vec![
				member(&creator.principal, &acme, PrincipalClass::Named),
				member(&colleague, &acme, PrincipalClass::Named),
				CompanyMember { receive_notification: false, ..member(&muted, &acme, PrincipalClass::Named) },
				member(&basic, &acme, PrincipalClass::Basic),
				member(&inactive, &acme, PrincipalClass::Named),
			];

			let intents = planner().plan(&LifecycleEvent::TicketCreated(event));
			assert_eq!(
				templates_of(&intents),
				[Template::NewTicketNoteForNamed, Template::NewTicketSupportForNamed, Template::NewTicketForNamed]
			);
			assert_eq!(intents[2].recipients, ["colleague@acme.test"]);
			assert_eq!(context_str(&intents[2].context, "recipient_name"), "Col League");
		}

		#[test]
		fn created_for_named_deduplicates_across_companies() {
			let a = company(SupportPlan::Enterprise);
			let b = company(SupportPlan::Basic);
			let creator = participant("staff@gluu.org", PrincipalClass::Staff).with_company(a.clone());
			let owner = participant("owner@b.test", PrincipalClass::Named).with_company(b.clone());
			let shared = person("shared@both.test");
			let only_a = person("a@a.test");

			let ticket = Ticket::new("t", "b", IssueType::Minor, creator.id())
				.with_company(b.id)
				.with_created_for(owner.id());
			let mut event = created(creator.clone(), ticket);
			event.company = Some(b.clone());
			event.created_for = Some(owner.clone());
			event.colleagues = vec![
				member(&shared, &a, PrincipalClass::Named),
				member(&shared, &b, PrincipalClass::Named),
				member(&only_a, &a, PrincipalClass::Named),
				member(&owner.principal, &b, PrincipalClass::Named),
			];

			let intents = planner().plan(&LifecycleEvent::TicketCreated(event));
			assert_eq!(
				templates_of(&intents),
				[
					Template::NewTicketOwner,
					Template::NewTicketForStaff,
					Template::NewTicketForNamed,
					Template::NewTicketForNamed
				]
			);
			assert_eq!(recipients_of(&intents), ["owner@b.test", SUPPORT, "shared@both.test", "a@a.test"]);
			assert_eq!(context_str(&intents[0].context, "ticket_created_for"), "owner@b.test");
		}

		#[test]
		fn created_for_basic_owner_skips_colleagues() {
			let acme = company(SupportPlan::Basic);
			let creator = participant("staff@gluu.org", PrincipalClass::Staff);
			let owner = participant("owner@acme.test", PrincipalClass::Basic).with_company(acme.clone());
			let colleague = person("named@acme.test");

			let mut event = created(creator.clone(), Ticket::new("t", "b", IssueType::Minor, creator.id()));
			event.created_for = Some(owner);
			event.colleagues = vec![member(&colleague, &acme, PrincipalClass::Named)];

			let intents = planner().plan(&LifecycleEvent::TicketCreated(event));
			assert_eq!(templates_of(&intents), [Template::NewTicketOwner, Template::NewTicketForStaff]);
		}

		#[test]
		fn urgent_ticket_pages_enabled_contacts_at_plan_priority() {
			let recipients = NotificationRecipients::new(vec![SUPPORT.into()], "https://support.gluu.org").with_sms_contacts(vec![
				SmsContact::new("Alice", "+15550001"),
				SmsContact { enabled: false, ..SmsContact::new("Bob", "+15550002") },
			]);
			let acme = company(SupportPlan::Enterprise);
			let creator = participant("named@acme.test", PrincipalClass::Basic).with_company(acme.clone());
			let event = created(
				creator.clone(),
				Ticket::new("Down", "b", IssueType::ProductionOutage, creator.id()).with_company(acme.id),
			);

			let intents = NotificationPlanner::new(recipients).plan(&LifecycleEvent::TicketCreated(event));
			let sms: Vec<_> = intents.iter().filter(|i| i.channel == Channel::Sms).collect();
			assert_eq!(sms.len(), 1);
			assert_eq!(sms[0].recipients, ["+15550001"]);
			assert_eq!(sms[0].priority, Priority::High);
			assert_eq!(sms[0].template, Template::SmsNewTicket);
			assert_eq!(context_str(&sms[0].context, "contact_name"), "Alice");
			assert_eq!(context_str(&sms[0].context, "creator_company_label"), " from Acme");
		}

		#[test]
		fn minor_ticket_sends_no_sms() {
			let recipients = NotificationRecipients::new(vec![SUPPORT.into()], "https://x.test")
				.with_sms_contacts(vec![SmsContact::new("Alice", "+15550001")]);
			let creator = participant("u@x.test", PrincipalClass::Basic);
			let event = created(creator.clone(), Ticket::new("t", "b", IssueType::Minor, creator.id()));
			let intents = NotificationPlanner::new(recipients).plan(&LifecycleEvent::TicketCreated(event));
			assert!(intents.iter().all(|i| i.channel == Channel::Email));
		}
	}

	mod ticket_updates {
		use super::*;

		fn reopened(actor: &Participant, assignee: Option<Principal>) -> LifecycleEvent {
			let creator = participant("c@x.test", PrincipalClass::Basic);
			LifecycleEvent::TicketReopened(TicketReopened {
				ticket: Ticket::new("t", "b", IssueType::Minor, creator.id()),
				actor: actor.clone(),
				creator,
				company: None,
				assignee,
			})
		}

		#[test]
		fn reopen_by_staff_notifies_assignee() {
			let staff = participant("s@gluu.org", PrincipalClass::Staff);
			let assignee = person("a@gluu.org");
			let intents = planner().plan(&reopened(&staff, Some(assignee)));
			assert_eq!(intents.len(), 1);
			assert_eq!(intents[0].recipients, ["a@gluu.org"]);
			assert_eq!(intents[0].template, Template::TicketReopened);
			assert_eq!(context_str(&intents[0].context, "reopened_by"), "s@gluu.org");
		}

		#[test]
		fn reopen_by_assignee_or_unassigned_is_silent() {
			let assignee = participant("a@gluu.org", PrincipalClass::Staff);
			assert!(planner().plan(&reopened(&assignee, Some(assignee.principal.clone()))).is_empty());
			assert!(planner().plan(&reopened(&assignee, None)).is_empty());
		}

		fn assigned(actor: &Participant, assignee: &Principal, creator: Participant, first: bool) -> LifecycleEvent {
			LifecycleEvent::TicketAssigned(TicketAssigned {
				ticket: Ticket::new("t", "b", IssueType::Minor, creator.id()),
				actor: actor.clone(),
				assignee: assignee.clone(),
				owner: creator.principal.clone(),
				creator,
				company: None,
				first_assignment: first,
			})
		}

		#[test]
		fn first_assignment_of_named_ticket_tells_creator() {
			let staff = participant("lead@gluu.org", PrincipalClass::Staff);
			let assignee = person("eng@gluu.org").with_name("Eng", "Ineer");
			let creator = participant("named@acme.test", PrincipalClass::Named);

			let intents = planner().plan(&assigned(&staff, &assignee, creator, true));
			assert_eq!(templates_of(&intents), [Template::AssignedToAssignee, Template::AssignedToCreator]);
			assert_eq!(recipients_of(&intents), ["eng@gluu.org", "named@acme.test"]);
			assert_eq!(context_str(&intents[0].context, "first_name"), "Eng");
			assert_eq!(context_str(&intents[0].context, "assigned_by"), "lead@gluu.org");
		}

		#[test]
		fn later_assignment_or_basic_creator_only_tells_assignee() {
			let staff = participant("lead@gluu.org", PrincipalClass::Staff);
			let assignee = person("eng@gluu.org");

			let named = participant("named@acme.test", PrincipalClass::Named);
			assert_eq!(
				templates_of(&planner().plan(&assigned(&staff, &assignee, named, false))),
				[Template::AssignedToAssignee]
			);
			let basic = participant("basic@x.test", PrincipalClass::Basic);
			assert_eq!(
				templates_of(&planner().plan(&assigned(&staff, &assignee, basic, true))),
				[Template::AssignedToAssignee]
			);
		}

		#[test]
		fn self_assignment_is_silent_for_assignee() {
			let staff = participant("eng@gluu.org", PrincipalClass::Staff);
			let creator = participant("basic@x.test", PrincipalClass::Basic);
			assert!(planner().plan(&assigned(&staff, &staff.principal, creator, true)).is_empty());
		}
	}

	mod answers {
		use super::*;

		struct Setup {
			owner: Principal,
			assignee: Principal,
			company: Company,
		}

		fn setup() -> Setup {
			Setup {
				owner: person("owner@acme.test"),
				assignee: person("eng@gluu.org"),
				company: company(SupportPlan::Standard),
			}
		}

		fn answered(s: &Setup, author: &Participant) -> AnswerCreated {
			let ticket = Ticket::new("t", "b", IssueType::Minor, s.owner.id)
				.with_company(s.company.id)
				.with_assignee(s.assignee.id);
			let answer = Answer::new(ticket.id, "body", author.id());
			AnswerCreated {
				ticket,
				answer,
				author: author.clone(),
				owner: s.owner.clone(),
				assignee: Some(s.assignee.clone()),
				company: Some(s.company.clone()),
				subscribers: Vec::new(),
				company_members: Vec::new(),
				mentioned: Vec::new(),
			}
		}

		#[test]
		fn owner_and_assignee_get_primary_notification() {
			let s = setup();
			let staff = participant("other@gluu.org", PrincipalClass::Staff);
			let intents = planner().plan(&LifecycleEvent::AnswerCreated(answered(&s, &staff)));
			assert_eq!(intents.len(), 1);
			assert_eq!(intents[0].template, Template::NewAnswer);
			assert_eq!(intents[0].recipients, ["owner@acme.test", "eng@gluu.org"]);
		}

		#[test]
		fn author_excluded_and_inactive_skipped() {
			let s = setup();
			let author = Participant::new(s.assignee.clone(), PrincipalClass::Staff);
			let intents = planner().plan(&LifecycleEvent::AnswerCreated(answered(&s, &author)));
			assert_eq!(recipients_of(&intents), ["owner@acme.test"]);

			let mut s = setup();
			s.owner = s.owner.inactive();
			let author = Participant::new(s.assignee.clone(), PrincipalClass::Staff);
			assert!(planner().plan(&LifecycleEvent::AnswerCreated(answered(&s, &author))).is_empty());
		}

		#[test]
		fn subscribers_batched_and_deduplicated() {
			let s = setup();
			let staff = participant("other@gluu.org", PrincipalClass::Staff);
			let watcher = person("watcher@x.test");
			let colleague = person("colleague@acme.test");
			let mut event = answered(&s, &staff);
			event.subscribers = vec![watcher.clone(), s.owner.clone(), colleague.clone(), person("gone@x.test").inactive()];
			event.company_members = vec![
				member(&colleague, &s.company, PrincipalClass::Named),
				member(&s.assignee, &s.company, PrincipalClass::Named),
				member(&person("basic@acme.test"), &s.company, PrincipalClass::Basic),
			];

			let intents = planner().plan(&LifecycleEvent::AnswerCreated(event));
			assert_eq!(templates_of(&intents), [Template::NewAnswer, Template::NewAnswerSubscribers]);
			assert_eq!(intents[1].recipients, ["watcher@x.test", "colleague@acme.test"]);
		}

		#[test]
		fn mentions_one_intent_each() {
			let s = setup();
			let staff = participant("other@gluu.org", PrincipalClass::Staff);
			let mike = person("mike@gluu.org");
			let mut event = answered(&s, &staff);
			event.mentioned = vec![mike.clone(), mike.clone(), staff.principal.clone(), person("ann@gluu.org")];

			let intents = planner().plan(&LifecycleEvent::AnswerCreated(event));
			let tagged: Vec<_> = intents.iter().filter(|i| i.template == Template::TaggedStaffMember).collect();
			assert_eq!(tagged.len(), 2);
			assert_eq!(tagged[0].recipients, ["mike@gluu.org"]);
			assert_eq!(tagged[1].recipients, ["ann@gluu.org"]);
		}
	}

	mod properties {
		use super::*;

		#[derive(Debug, Clone)]
		struct Roster {
			author: usize,
			owner: usize,
			assignee: Option<usize>,
			subscribers: Vec<usize>,
			members: Vec<(usize, bool, bool)>,
			mentioned: Vec<usize>,
			inactive: Vec<usize>,
		}

		fn arb_roster() -> impl Strategy<Value = Roster> {
			(
				0..6usize,
				0..6usize,
				proptest::option::of(0..6usize),
				proptest::collection::vec(0..6usize, 0..6),
				proptest::collection::vec((0..6usize, any::<bool>(), any::<bool>()), 0..6),
				proptest::collection::vec(0..6usize, 0..4),
				proptest::collection::vec(0..6usize, 0..2),
			)
				.prop_map(|(author, owner, assignee, subscribers, members, mentioned, inactive)| Roster {
					author,
					owner,
					assignee,
					subscribers,
					members,
					mentioned,
					inactive,
				})
		}

		fn build(roster: &Roster) -> LifecycleEvent {
			let acme = Company::new(CompanyId::generate(), "Acme", SupportPlan::Premium);
			let people: Vec<Principal> = (0..6)
				.map(|i| {
					let p = person(&format!("p{i}@x.test"));
					if roster.inactive.contains(&i) { p.inactive() } else { p }
				})
				.collect();
			let mut ticket = Ticket::new("t", "b", IssueType::Minor, people[roster.owner].id).with_company(acme.id);
			ticket.assignee = roster.assignee.map(|i| people[i].id);
			let answer = Answer::new(ticket.id, "b", people[roster.author].id);

			LifecycleEvent::AnswerCreated(AnswerCreated {
				ticket,
				answer,
				author: Participant::new(people[roster.author].clone(), PrincipalClass::Basic),
				owner: people[roster.owner].clone(),
				assignee: roster.assignee.map(|i| people[i].clone()),
				company: Some(acme.clone()),
				subscribers: roster.subscribers.iter().map(|i| people[*i].clone()).collect(),
				company_members: roster
					.members
					.iter()
					.map(|(i, named, opted_in)| CompanyMember {
						principal: people[*i].clone(),
						company_id: acme.id,
						class: if *named { PrincipalClass::Named } else { PrincipalClass::Basic },
						receive_notification: *opted_in,
					})
					.collect(),
				mentioned: roster.mentioned.iter().map(|i| people[*i].clone()).collect(),
			})
		}

		proptest! {
			#[test]
			fn author_never_notified_about_own_answer(roster in arb_roster()) {
				let event = build(&roster);
				let author = format!("p{}@x.test", roster.author);
				for intent in planner().plan(&event) {
					prop_assert!(!intent.recipients.contains(&author), "{:?}", intent.template);
				}
			}

			#[test]
			fn subscriber_batch_disjoint_from_primary(roster in arb_roster()) {
				let intents = planner().plan(&build(&roster));
				let primary: HashSet<_> = intents.iter().filter(|i| i.template == Template::NewAnswer)
					.flat_map(|i| i.recipients.clone()).collect();
				let batch: Vec<_> = intents.iter().filter(|i| i.template == Template::NewAnswerSubscribers)
					.flat_map(|i| i.recipients.clone()).collect();
				let unique: HashSet<_> = batch.iter().cloned().collect();
				prop_assert_eq!(unique.len(), batch.len());
				prop_assert!(unique.is_disjoint(&primary));
			}

			#[test]
			fn planning_is_idempotent(roster in arb_roster()) {
				let event = build(&roster);
				let p = planner();
				prop_assert_eq!(p.plan(&event), p.plan(&event));
			}

			#[test]
			fn created_for_named_recipients_complete(
				members in proptest::collection::vec((0..5usize, any::<bool>(), any::<bool>(), any::<bool>()), 0..8),
			) {
				let a = Company::new(CompanyId::generate(), "A", SupportPlan::Basic);
				let b = Company::new(CompanyId::generate(), "B", SupportPlan::Basic);
				let people: Vec<Principal> = (0..5).map(|i| person(&format!("m{i}@x.test"))).collect();
				// people[0] creates for people[1].
				let creator = Participant::new(people[0].clone(), PrincipalClass::Staff).with_company(a.clone());
				let owner = Participant::new(people[1].clone(), PrincipalClass::Named).with_company(b.clone());
				let colleagues: Vec<CompanyMember> = members
					.iter()
					.map(|(i, in_a, named, opted_in)| CompanyMember {
						principal: people[*i].clone(),
						company_id: if *in_a { a.id } else { b.id },
						class: if *named { PrincipalClass::Named } else { PrincipalClass::Basic },
						receive_notification: *opted_in,
					})
					.collect();
				let expected_colleagues: HashSet<String> = colleagues
					.iter()
					.filter(|m| m.wants_company_notifications() && m.principal.email != people[0].email && m.principal.email != people[1].email)
					.map(|m| m.principal.email.clone())
					.collect();

				let event = TicketCreated {
					ticket: Ticket::new("t", "b", IssueType::Minor, creator.id()).with_created_for(owner.id()),
					creator,
					created_for: Some(owner),
					company: Some(b.clone()),
					colleagues,
				};
				let intents = planner().plan(&LifecycleEvent::TicketCreated(event));
				let all = recipients_of(&intents);
				let distinct: HashSet<&str> = all.iter().copied().collect();
				prop_assert_eq!(distinct.len(), all.len());

				let mut expected: HashSet<String> = expected_colleagues;
				expected.insert(people[1].email.clone());
				expected.insert(SUPPORT.to_string());
				let actual: HashSet<String> = distinct.into_iter().map(str::to_string).collect();
				prop_assert_eq!(actual, expected);
			}
		}
	}
}
