// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Planned, undelivered notifications.

use crate::template::Template;
use gluru_server_auth::SupportPlan;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
	Email,
	Sms,
}

impl fmt::Display for Channel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Email => write!(f, "email"),
			Self::Sms => write!(f, "sms"),
		}
	}
}

/// Queue priority. Orders `Low < Normal < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
	#[default]
	Low,
	Normal,
	High,
}

impl Priority {
	/// SMS priority follows the company's support plan.
	pub fn for_sms(plan: SupportPlan) -> Self {
		match plan {
			SupportPlan::Enterprise => Priority::High,
			SupportPlan::Premium => Priority::Normal,
			_ => Priority::Low,
		}
	}
}

impl fmt::Display for Priority {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Low => write!(f, "low"),
			Self::Normal => write!(f, "normal"),
			Self::High => write!(f, "high"),
		}
	}
}

pub type Context = Map<String, Value>;

/// One notification to deliver: who, how, what and how urgently.
///
/// Self-contained; the dispatch layer needs nothing else to deliver it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationIntent {
	/// Email addresses or phone numbers, depending on `channel`.
	pub recipients: Vec<String>,
	pub channel: Channel,
	pub template: Template,
	pub context: Context,
	pub priority: Priority,
}

impl NotificationIntent {
	/// Email intents are always low priority.
	pub fn email(recipients: Vec<String>, template: Template, context: Context) -> Self {
		Self {
			recipients,
			channel: Channel::Email,
			template,
			context,
			priority: Priority::Low,
		}
	}

	pub fn sms(number: impl Into<String>, template: Template, context: Context, priority: Priority) -> Self {
		Self {
			recipients: vec![number.into()],
			channel: Channel::Sms,
			template,
			context,
			priority,
		}
	}

	pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.context.insert(key.to_string(), value.into());
		self
	}
}
