// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rendering context builders.

use crate::event::Participant;
use crate::intent::Context;
use crate::recipients::NotificationRecipients;
use gluru_server_auth::{Company, SupportPlan};
use gluru_server_tickets::{Answer, IssueType, Ticket};
use serde_json::Value;

/// Customer SLA text for a plan and issue type. Community and partner plans have none.
pub fn sla(plan: SupportPlan, issue_type: IssueType) -> Option<&'static str> {
	use IssueType::*;
	use SupportPlan::*;

	let text = match (issue_type, plan) {
		(_, Community | Partner) => return None,
		(ProductionOutage, Basic) => "12 hours",
		(ProductionOutage, Standard) => "3 hours",
		(ProductionOutage, Premium) => "2 hours",
		(ProductionOutage, Enterprise) => "1 hour",
		(ProductionImpaired, Basic) => "1 business day",
		(ProductionImpaired, Standard) => "6 hours",
		(ProductionImpaired, Premium | Enterprise) => "4 hours",
		(PreProduction, Basic | Standard) => "1 business day",
		(PreProduction, Premium | Enterprise) => "12 hours",
		(Minor, _) => "1 business day",
		(NewDevelopment, Basic) => "3 business days",
		(NewDevelopment, Standard) => "1 business day",
		(NewDevelopment, Premium | Enterprise) => "2 business days",
	};
	Some(text)
}

/// Context shared by every ticket-level template.
pub fn ticket_context(
	ticket: &Ticket,
	creator: &Participant,
	plan: SupportPlan,
	recipients: &NotificationRecipients,
) -> Context {
	let link = ticket.link(&recipients.base_url);
	let mut context = Context::new();
	context.insert("site_name".into(), recipients.site_name.clone().into());
	context.insert("ticket_id".into(), ticket.id.to_string().into());
	context.insert("ticket_title".into(), ticket.title.clone().into());
	context.insert("ticket_link".into(), link.clone().into());
	context.insert("subscription_link".into(), format!("{link}?subscribe=").into());
	context.insert("ticket_created_by".into(), creator.principal.full_name().into());
	context.insert(
		"ticket_created_by_company".into(),
		creator.company_name().unwrap_or_default().into(),
	);
	context.insert("ticket_body".into(), ticket.body.clone().into());
	context.insert("issue_type".into(), ticket.issue_type.label().into());
	insert_plan(&mut context, plan, ticket.issue_type);
	context
}

/// Context for answer templates. `ticket_link` points at the answer anchor.
pub fn answer_context(
	ticket: &Ticket,
	answer: &Answer,
	author: &Participant,
	plan: SupportPlan,
	recipients: &NotificationRecipients,
) -> Context {
	let link = answer.link(&ticket.link(&recipients.base_url));
	let mut context = Context::new();
	context.insert("site_name".into(), recipients.site_name.clone().into());
	context.insert("ticket_id".into(), ticket.id.to_string().into());
	context.insert("ticket_title".into(), ticket.title.clone().into());
	context.insert("ticket_link".into(), link.clone().into());
	context.insert("subscription_link".into(), format!("{link}?subscribe=").into());
	context.insert("answer_created_by".into(), author.principal.full_name().into());
	context.insert(
		"answer_created_by_company".into(),
		author.company_name().unwrap_or_default().into(),
	);
	context.insert("answer_body".into(), answer.body.clone().into());
	insert_plan(&mut context, plan, ticket.issue_type);
	context
}

fn insert_plan(context: &mut Context, plan: SupportPlan, issue_type: IssueType) {
	context.insert("support_plan".into(), plan.label().into());
	if let Some(sla) = sla(plan, issue_type) {
		context.insert("sla".into(), format!("Customer SLA: {sla}.").into());
	}
}

/// Reads a string value, empty when absent.
pub fn context_str<'a>(context: &'a Context, key: &str) -> &'a str {
	context.get(key).and_then(Value::as_str).unwrap_or_default()
}

pub fn company_label(company: Option<&Company>) -> String {
	company.map(|c| format!(" from {}", c.name)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;
	use gluru_server_auth::{CompanyId, Principal, PrincipalClass, PrincipalId};

	#[test]
	fn sla_matrix() {
		assert_eq!(sla(SupportPlan::Enterprise, IssueType::ProductionOutage), Some("1 hour"));
		assert_eq!(sla(SupportPlan::Basic, IssueType::ProductionOutage), Some("12 hours"));
		assert_eq!(sla(SupportPlan::Standard, IssueType::ProductionImpaired), Some("6 hours"));
		assert_eq!(sla(SupportPlan::Basic, IssueType::NewDevelopment), Some("3 business days"));
		assert_eq!(sla(SupportPlan::Community, IssueType::ProductionOutage), None);
		assert_eq!(sla(SupportPlan::Partner, IssueType::Minor), None);
	}

	#[test]
	fn ticket_context_keys() {
		let creator = Participant::new(
			Principal::new(PrincipalId::generate(), "jane@acme.test").with_name("Jane", "Doe"),
			PrincipalClass::Named,
		)
		.with_company(Company::new(CompanyId::generate(), "Acme", SupportPlan::Premium));
		let ticket = Ticket::new("Outage", "All down", IssueType::ProductionOutage, creator.id());
		let recipients = NotificationRecipients::new(vec!["support@gluu.org".into()], "https://support.gluu.org");

		let ctx = ticket_context(&ticket, &creator, SupportPlan::Premium, &recipients);
		assert_eq!(context_str(&ctx, "ticket_created_by"), "Jane Doe");
		assert_eq!(context_str(&ctx, "ticket_created_by_company"), "Acme");
		assert_eq!(context_str(&ctx, "issue_type"), "Production Outage");
		assert_eq!(context_str(&ctx, "support_plan"), "Premium");
		assert_eq!(context_str(&ctx, "sla"), "Customer SLA: 2 hours.");
		assert_eq!(
			context_str(&ctx, "ticket_link"),
			format!("https://support.gluu.org/tickets/{}", ticket.id)
		);
		assert!(context_str(&ctx, "subscription_link").ends_with("?subscribe="));
	}

	#[test]
	fn answer_context_links_to_anchor() {
		let author = Participant::new(Principal::new(PrincipalId::generate(), "s@gluu.org"), PrincipalClass::Staff);
		let ticket = Ticket::new("t", "b", IssueType::Minor, PrincipalId::generate());
		let answer = Answer::new(ticket.id, "Try restarting", author.id());
		let recipients = NotificationRecipients::new(vec![], "https://support.gluu.org");

		let ctx = answer_context(&ticket, &answer, &author, SupportPlan::Community, &recipients);
		assert!(context_str(&ctx, "ticket_link").ends_with(&format!("#at{}", answer.id)));
		assert_eq!(context_str(&ctx, "answer_body"), "Try restarting");
		assert!(!ctx.contains_key("sla"));
	}
}
