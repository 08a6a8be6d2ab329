// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification recipients injected at startup.
//!
//! The support distribution list and the on-call SMS contacts are deployment
//! data. They are read from the config file or environment and handed to the
//! planner; nothing in the planner carries a literal address.

use serde::{Deserialize, Serialize};

const DEFAULT_SITE_NAME: &str = "Gluu Support";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsContactLayer {
	pub name: Option<String>,
	pub number: Option<String>,
	pub enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsContactConfig {
	pub name: String,
	pub number: String,
	pub enabled: bool,
}

impl SmsContactLayer {
	/// Parses the `Name:+15550100` form used by the environment variable.
	pub fn parse(entry: &str) -> Option<Self> {
		let (name, number) = entry.split_once(':')?;
		Some(Self {
			name: Some(name.trim().to_string()),
			number: Some(number.trim().to_string()),
			enabled: Some(true),
		})
	}

	fn finalize(self) -> SmsContactConfig {
		SmsContactConfig {
			name: self.name.unwrap_or_default(),
			number: self.number.unwrap_or_default(),
			enabled: self.enabled.unwrap_or(true),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationsConfigLayer {
	#[serde(default)]
	pub support_addresses: Option<Vec<String>>,
	#[serde(default)]
	pub sms_contacts: Option<Vec<SmsContactLayer>>,
	#[serde(default)]
	pub site_name: Option<String>,
}

impl NotificationsConfigLayer {
	pub fn merge(&mut self, other: NotificationsConfigLayer) {
		if other.support_addresses.is_some() {
			self.support_addresses = other.support_addresses;
		}
		if other.sms_contacts.is_some() {
			self.sms_contacts = other.sms_contacts;
		}
		if other.site_name.is_some() {
			self.site_name = other.site_name;
		}
	}

	pub fn finalize(self) -> NotificationsConfig {
		NotificationsConfig {
			support_addresses: self
				.support_addresses
				.unwrap_or_default()
				.into_iter()
				.map(|a| a.trim().to_string())
				.filter(|a| !a.is_empty())
				.collect(),
			sms_contacts: self
				.sms_contacts
				.unwrap_or_default()
				.into_iter()
				.map(SmsContactLayer::finalize)
				.collect(),
			site_name: self
				.site_name
				.unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationsConfig {
	/// The support team distribution list. Must not be empty.
	pub support_addresses: Vec<String>,
	pub sms_contacts: Vec<SmsContactConfig>,
	pub site_name: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn blank_addresses_are_dropped() {
		let config = NotificationsConfigLayer {
			support_addresses: Some(vec![
				" support@gluu.org ".to_string(),
				"".to_string(),
			]),
			..Default::default()
		}
		.finalize();

		assert_eq!(config.support_addresses, vec!["support@gluu.org".to_string()]);
		assert_eq!(config.site_name, "Gluu Support");
	}

	#[test]
	fn parses_env_contact_form() {
		let contact = SmsContactLayer::parse("On Call: +15550100").unwrap().finalize();
		assert_eq!(contact.name, "On Call");
		assert_eq!(contact.number, "+15550100");
		assert!(contact.enabled);
		assert!(SmsContactLayer::parse("missing-separator").is_none());
	}

	#[test]
	fn deserializes_from_toml() {
		let layer: NotificationsConfigLayer = toml::from_str(
			r#"
support_addresses = ["support@gluu.org", "ops@gluu.org"]

[[sms_contacts]]
name = "Mike"
number = "+15550100"
enabled = false
"#,
		)
		.unwrap();

		let config = layer.finalize();
		assert_eq!(config.support_addresses.len(), 2);
		assert_eq!(config.sms_contacts.len(), 1);
		assert!(!config.sms_contacts[0].enabled);
	}
}
