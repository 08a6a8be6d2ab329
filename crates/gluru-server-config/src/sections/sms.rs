// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SMS gateway configuration (Twilio-compatible REST API).

use crate::error::ConfigError;
use gluru_common_secret::SecretString;
use serde::{Deserialize, Serialize};

const DEFAULT_API_BASE: &str = "https://api.twilio.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmsConfigLayer {
	pub account_sid: Option<String>,
	#[serde(skip_serializing)]
	pub auth_token: Option<SecretString>,
	pub from_number: Option<String>,
	pub api_base: Option<String>,
}

impl SmsConfigLayer {
	pub fn merge(&mut self, other: SmsConfigLayer) {
		if other.account_sid.is_some() {
			self.account_sid = other.account_sid;
		}
		if other.auth_token.is_some() {
			self.auth_token = other.auth_token;
		}
		if other.from_number.is_some() {
			self.from_number = other.from_number;
		}
		if other.api_base.is_some() {
			self.api_base = other.api_base;
		}
	}

	/// `Ok(None)` when no account is configured.
	pub fn build(self) -> Result<Option<SmsConfig>, ConfigError> {
		let Some(account_sid) = self.account_sid.filter(|s| !s.is_empty()) else {
			return Ok(None);
		};

		let auth_token = self.auth_token.ok_or_else(|| {
			ConfigError::Validation("sms.auth_token is required when sms.account_sid is set".to_string())
		})?;
		let from_number = self.from_number.filter(|n| !n.is_empty()).ok_or_else(|| {
			ConfigError::Validation("sms.from_number is required when sms.account_sid is set".to_string())
		})?;

		Ok(Some(SmsConfig {
			account_sid,
			auth_token,
			from_number,
			api_base: self
				.api_base
				.map(|b| b.trim_end_matches('/').to_string())
				.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
		}))
	}
}

#[derive(Debug, Clone)]
pub struct SmsConfig {
	pub account_sid: String,
	pub auth_token: SecretString,
	pub from_number: String,
	pub api_base: String,
}
