// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery collaborators.
//!
//! The dispatch workers render an intent with a [`TemplateRenderer`] and hand
//! the result to an [`EmailSender`] or [`SmsSender`]. Implementations live in
//! the smtp and sms crates; tests use in-memory fakes.

use crate::error::Result;
use crate::intent::Context;
use crate::template::Template;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
	pub filename: String,
	pub content_type: String,
	pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
	pub to: Vec<String>,
	pub subject: String,
	pub body_text: String,
	pub body_html: Option<String>,
	pub attachments: Vec<Attachment>,
}

impl EmailMessage {
	pub fn new(to: Vec<String>, rendered: RenderedMessage) -> Self {
		Self {
			to,
			subject: rendered.subject,
			body_text: rendered.body_text,
			body_html: rendered.body_html,
			attachments: Vec::new(),
		}
	}
}

/// Output of a renderer. SMS templates leave `subject` empty and `body_html` unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
	pub subject: String,
	pub body_text: String,
	pub body_html: Option<String>,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
	async fn send(&self, message: &EmailMessage) -> Result<()>;
}

#[async_trait]
pub trait SmsSender: Send + Sync {
	async fn send(&self, to: &str, body: &str) -> Result<()>;
}

pub trait TemplateRenderer: Send + Sync {
	fn render(&self, template: Template, context: &Context) -> Result<RenderedMessage>;
}
