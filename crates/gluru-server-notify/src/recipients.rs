// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

/// Fixed notification targets supplied at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecipients {
	/// The support distribution list.
	pub support_addresses: Vec<String>,
	/// On-call contacts paged for urgent tickets.
	pub sms_contacts: Vec<SmsContact>,
	/// Front-end base URL used to build ticket links.
	pub base_url: String,
	pub site_name: String,
}

impl NotificationRecipients {
	pub fn new(support_addresses: Vec<String>, base_url: impl Into<String>) -> Self {
		Self {
			support_addresses,
			sms_contacts: Vec::new(),
			base_url: base_url.into(),
			site_name: "Gluu Support".to_string(),
		}
	}

	pub fn with_sms_contacts(mut self, contacts: Vec<SmsContact>) -> Self {
		self.sms_contacts = contacts;
		self
	}

	pub fn enabled_sms_contacts(&self) -> impl Iterator<Item = &SmsContact> {
		self.sms_contacts.iter().filter(|c| c.enabled)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsContact {
	pub name: String,
	pub number: String,
	pub enabled: bool,
}

impl SmsContact {
	pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			number: number.into(),
			enabled: true,
		}
	}
}
