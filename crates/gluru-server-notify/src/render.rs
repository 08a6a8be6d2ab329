// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Built-in plain-text and HTML templates.

use crate::error::{DeliveryError, Result};
use crate::intent::Context;
use crate::template::Template;
use crate::transport::{RenderedMessage, TemplateRenderer};
use serde_json::Value;

/// Renders every [`Template`] with `format!`. Fails when a required context
/// key is missing.
#[derive(Debug, Clone, Default)]
pub struct BuiltinRenderer;

impl BuiltinRenderer {
	pub fn new() -> Self {
		Self
	}
}

struct Fields<'a> {
	template: Template,
	context: &'a Context,
}

impl<'a> Fields<'a> {
	fn required(&self, key: &str) -> Result<String> {
		match self.context.get(key) {
			Some(Value::String(s)) => Ok(s.clone()),
			Some(Value::Number(n)) => Ok(n.to_string()),
			_ => Err(DeliveryError::Rendering(format!(
				"template {} needs context key '{}'",
				self.template, key
			))),
		}
	}

	fn optional(&self, key: &str) -> String {
		self.required(key).unwrap_or_default()
	}
}

impl TemplateRenderer for BuiltinRenderer {
	fn render(&self, template: Template, context: &Context) -> Result<RenderedMessage> {
		let f = Fields { template, context };
		match template {
			Template::SmsNewTicket => render_sms(&f),
			_ => render_email(&f),
		}
	}
}

fn render_sms(f: &Fields<'_>) -> Result<RenderedMessage> {
	let body = format!(
		"Hello {}, {}{} has just opened a {} on support: ({}). Please respond ASAP.",
		f.required("contact_name")?,
		f.required("ticket_created_by")?,
		f.optional("creator_company_label"),
		f.required("issue_type")?,
		f.required("ticket_link")?,
	);
	Ok(RenderedMessage {
		subject: String::new(),
		body_text: body,
		body_html: None,
	})
}

fn render_email(f: &Fields<'_>) -> Result<RenderedMessage> {
	let site = f.optional("site_name");
	let id = f.required("ticket_id")?;
	let title = f.required("ticket_title")?;
	let link = f.required("ticket_link")?;

	let (subject, lead, excerpt) = match f.template {
		Template::NewTicketOwner => (
			format!("[{site}] A ticket was opened for you: {title}"),
			format!("{} opened this ticket on your behalf.", f.required("ticket_created_by")?),
			f.required("ticket_body")?,
		),
		Template::NewTicketForStaff => (
			format!("[{site}] New ticket #{id}: {title}"),
			format!(
				"{} opened this ticket for {}.",
				f.required("ticket_created_by")?,
				f.required("ticket_created_for")?
			),
			f.required("ticket_body")?,
		),
		Template::NewTicketForNamed => (
			format!("[{site}] New ticket from your company: {title}"),
			format!(
				"Hi {}, {} from {} opened a new ticket.",
				f.required("recipient_name")?,
				f.required("ticket_created_by")?,
				f.optional("ticket_created_by_company")
			),
			f.required("ticket_body")?,
		),
		Template::NewTicketByStaff => (
			format!("[{site}] Staff ticket #{id}: {title}"),
			format!("{} opened an internal ticket.", f.required("ticket_created_by")?),
			f.required("ticket_body")?,
		),
		Template::NewTicketNoteForUser | Template::NewTicketNoteForNamed => (
			format!("[{site}] We received your ticket: {title}"),
			"Thanks for contacting support. We will get back to you soon.".to_string(),
			f.required("ticket_body")?,
		),
		Template::NewTicketSupportForUser | Template::NewTicketSupportForNamed => (
			format!("[{site}] New {} ticket #{id}: {title}", f.optional("support_plan")),
			format!(
				"{} ({}) opened a {} ticket. {}",
				f.required("ticket_created_by")?,
				f.optional("ticket_created_by_company"),
				f.required("issue_type")?,
				f.optional("sla")
			),
			f.required("ticket_body")?,
		),
		Template::TicketReopened => (
			format!("[{site}] Ticket #{id} reopened: {title}"),
			format!("{} reopened this ticket.", f.required("reopened_by")?),
			String::new(),
		),
		Template::AssignedToAssignee => (
			format!("[{site}] Ticket #{id} assigned to you: {title}"),
			format!(
				"Hi {}, {} assigned this ticket to you.",
				f.optional("first_name"),
				f.required("assigned_by")?
			),
			f.required("ticket_body")?,
		),
		Template::AssignedToCreator => (
			format!("[{site}] Your ticket is being handled: {title}"),
			format!(
				"Hi {}, {} is now working on your ticket.",
				f.optional("first_name"),
				f.required("assigned_to")?
			),
			String::new(),
		),
		Template::NewAnswer | Template::NewAnswerSubscribers => (
			format!("[{site}] New answer on ticket #{id}: {title}"),
			format!("{} answered:", f.required("answer_created_by")?),
			f.required("answer_body")?,
		),
		Template::TaggedStaffMember => (
			format!("[{site}] You were mentioned on ticket #{id}"),
			format!("{} mentioned you:", f.required("answer_created_by")?),
			f.required("answer_body")?,
		),
		Template::StaleTicketReminder => (
			format!("[{site}] Reminder: {} #{id} is waiting", f.required("issue_type")?),
			format!(
				"This ticket has waited {} minutes without a response. {}",
				f.required("waiting_minutes")?,
				f.optional("sla")
			),
			String::new(),
		),
		Template::SmsNewTicket => return render_sms(f),
	};

	let lead = lead.trim_end().to_string();
	let mut body_text = format!("{lead}\n\n");
	if !excerpt.is_empty() {
		body_text.push_str(&excerpt);
		body_text.push_str("\n\n");
	}
	body_text.push_str(&link);

	let body_html = format!(
		r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{subject}</title></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <p>{lead}</p>
    <div style="white-space: pre-wrap; border-left: 3px solid #ddd; padding-left: 12px;">{excerpt}</div>
    <a href="{link}" style="display: inline-block; margin-top: 20px;">Ticket #{id}</a>
</body>
</html>"#,
		subject = escape_html(&subject),
		lead = escape_html(&lead),
		excerpt = escape_html(&excerpt),
		link = escape_html(&link),
		id = escape_html(&id),
	);

	Ok(RenderedMessage {
		subject,
		body_text,
		body_html: Some(body_html),
	})
}

fn escape_html(input: &str) -> String {
	input
		.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
		.replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn context(pairs: &[(&str, &str)]) -> Context {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
			.collect()
	}

	#[test]
	fn sms_body_matches_alert_text() {
		let ctx = context(&[
			("contact_name", "Alice"),
			("ticket_created_by", "Jane Doe"),
			("creator_company_label", " from Acme"),
			("issue_type", "Production Outage"),
			("ticket_link", "https://support.gluu.org/tickets/1"),
		]);
		let rendered = BuiltinRenderer::new().render(Template::SmsNewTicket, &ctx).unwrap();
		assert_eq!(
			rendered.body_text,
			"Hello Alice, Jane Doe from Acme has just opened a Production Outage on support: (https://support.gluu.org/tickets/1). Please respond ASAP."
		);
		assert!(rendered.body_html.is_none());
	}

	#[test]
	fn reopened_email_renders_subject_and_link() {
		let ctx = context(&[
			("site_name", "Gluu Support"),
			("ticket_id", "42"),
			("ticket_title", "SSO broken"),
			("ticket_link", "https://support.gluu.org/tickets/42"),
			("reopened_by", "Jane"),
		]);
		let rendered = BuiltinRenderer::new().render(Template::TicketReopened, &ctx).unwrap();
		assert_eq!(rendered.subject, "[Gluu Support] Ticket #42 reopened: SSO broken");
		assert!(rendered.body_text.starts_with("Jane reopened this ticket."));
		assert!(rendered.body_text.ends_with("https://support.gluu.org/tickets/42"));
	}

	#[test]
	fn missing_key_is_rendering_error() {
		let ctx = context(&[("ticket_id", "1"), ("ticket_title", "t"), ("ticket_link", "l")]);
		let err = BuiltinRenderer::new().render(Template::NewAnswer, &ctx).unwrap_err();
		assert!(matches!(err, DeliveryError::Rendering(_)));
		assert!(!err.is_retryable());
	}

	#[test]
	fn html_is_escaped() {
		let ctx = context(&[
			("ticket_id", "1"),
			("ticket_title", "t"),
			("ticket_link", "l"),
			("answer_created_by", "Eve"),
			("answer_body", "<script>alert(1)</script>"),
		]);
		let rendered = BuiltinRenderer::new().render(Template::NewAnswer, &ctx).unwrap();
		let html = rendered.body_html.unwrap();
		assert!(html.contains("&lt;script&gt;"));
		assert!(!html.contains("<script>"));
	}

	#[test]
	fn link_and_quotes_are_escaped_in_html() {
		let ctx = context(&[
			("ticket_id", "7"),
			("ticket_title", "Can't log in"),
			("ticket_link", "https://support.gluu.test/t/7?a=1&b=\"><img src=x onerror=alert(1)>"),
			("answer_created_by", "O'Brien"),
			("answer_body", "it's broken"),
		]);
		let rendered = BuiltinRenderer::new().render(Template::NewAnswer, &ctx).unwrap();
		let html = rendered.body_html.unwrap();

		assert!(html.contains(r#"href="https://support.gluu.test/t/7?a=1&amp;b=&quot;&gt;&lt;img src=x onerror=alert(1)&gt;""#));
		assert!(!html.contains("<img"));
		assert!(html.contains("O&#39;Brien"));
		assert!(html.contains("it&#39;s broken"));
		assert!(rendered.body_text.ends_with("https://support.gluu.test/t/7?a=1&b=\"><img src=x onerror=alert(1)>"));
	}
}
