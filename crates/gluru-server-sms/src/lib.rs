// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SMS transport for on-call alerts.
//!
//! [`SmsClient`] posts to a Twilio-compatible `Messages.json` endpoint with
//! HTTP basic auth (account SID and auth token). It implements
//! [`SmsSender`] so the dispatch queue can deliver `sms/new_ticket` intents.
//!
//! Server errors, rate limiting and network failures map to
//! [`DeliveryError::Transport`] and are retried by the dispatcher; any other
//! 4xx means the provider refused the message and it is not retried.

use async_trait::async_trait;
use gluru_server_config::SmsConfig;
use gluru_server_notify::{DeliveryError, SmsSender};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

static PHONE_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{6,14}$").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
	#[error("invalid configuration: {0}")]
	Config(String),

	#[error("invalid phone number: {0}")]
	InvalidNumber(String),

	#[error("request failed: {0}")]
	Request(#[from] reqwest::Error),

	/// The provider answered with a status that may succeed later (5xx, 429).
	#[error("provider unavailable ({status}): {message}")]
	Unavailable { status: u16, message: String },

	/// The provider refused the message.
	#[error("provider rejected message ({status}): {message}")]
	Rejected { status: u16, message: String },
}

impl From<SmsError> for DeliveryError {
	fn from(err: SmsError) -> Self {
		match err {
			SmsError::InvalidNumber(n) => DeliveryError::InvalidRecipient(n),
			SmsError::Rejected { .. } | SmsError::Config(_) => DeliveryError::InvalidRecipient(err.to_string()),
			SmsError::Request(_) | SmsError::Unavailable { .. } => DeliveryError::Transport(err.to_string()),
		}
	}
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
	sid: Option<String>,
	status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
	message: Option<String>,
	code: Option<i64>,
}

pub struct SmsClient {
	http: Client,
	endpoint: Url,
	account_sid: String,
	auth_token: gluru_common_secret::SecretString,
	from_number: String,
}

impl SmsClient {
	#[tracing::instrument(name = "sms_client_new", skip(config), fields(api_base = %config.api_base))]
	pub fn new(config: &SmsConfig) -> Result<Self, SmsError> {
		if !is_valid_phone_number(&config.from_number) {
			return Err(SmsError::Config(format!(
				"from_number '{}' is not an E.164 number",
				config.from_number
			)));
		}

		let http = Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.user_agent(concat!("gluru-server/", env!("CARGO_PKG_VERSION")))
			.build()
			.map_err(|e| SmsError::Config(format!("failed to build HTTP client: {e}")))?;

		Ok(Self {
			http,
			endpoint: messages_endpoint(&config.api_base, &config.account_sid)?,
			account_sid: config.account_sid.clone(),
			auth_token: config.auth_token.clone(),
			from_number: config.from_number.clone(),
		})
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Send one message. Returns the provider's message id when it reports one.
	#[tracing::instrument(name = "sms_send", skip(self, body), fields(to = %to, body_len = body.len()))]
	pub async fn send_sms(&self, to: &str, body: &str) -> Result<Option<String>, SmsError> {
		if !is_valid_phone_number(to) {
			return Err(SmsError::InvalidNumber(to.to_string()));
		}

		let response = self
			.http
			.post(self.endpoint.clone())
			.basic_auth(&self.account_sid, Some(self.auth_token.expose()))
			.form(&[
				("To", to),
				("From", self.from_number.as_str()),
				("Body", body),
			])
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			let text = response.text().await.unwrap_or_default();
			let message = provider_message(&text);
			return Err(classify_failure(status, message));
		}

		let parsed: MessageResponse = response.json().await?;
		tracing::info!(sid = ?parsed.sid, status = ?parsed.status, "sms accepted by provider");
		Ok(parsed.sid)
	}
}

#[async_trait]
impl SmsSender for SmsClient {
	async fn send(&self, to: &str, body: &str) -> gluru_server_notify::Result<()> {
		self.send_sms(to, body).await.map(|_| ()).map_err(DeliveryError::from)
	}
}

/// `{api_base}/2010-04-01/Accounts/{sid}/Messages.json`
pub fn messages_endpoint(api_base: &str, account_sid: &str) -> Result<Url, SmsError> {
	if account_sid.is_empty() || !account_sid.chars().all(|c| c.is_ascii_alphanumeric()) {
		return Err(SmsError::Config(format!("account_sid '{account_sid}' is invalid")));
	}
	let base = format!("{}/", api_base.trim_end_matches('/'));
	Url::parse(&base)
		.and_then(|url| url.join(&format!("2010-04-01/Accounts/{account_sid}/Messages.json")))
		.map_err(|e| SmsError::Config(format!("invalid api_base '{api_base}': {e}")))
}

pub fn is_valid_phone_number(number: &str) -> bool {
	PHONE_NUMBER_REGEX.is_match(number)
}

fn provider_message(body: &str) -> String {
	match serde_json::from_str::<ProviderError>(body) {
		Ok(ProviderError { message: Some(message), code }) => match code {
			Some(code) => format!("{message} (code {code})"),
			None => message,
		},
		_ => body.chars().take(200).collect(),
	}
}

fn classify_failure(status: StatusCode, message: String) -> SmsError {
	if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
		SmsError::Unavailable {
			status: status.as_u16(),
			message,
		}
	} else {
		SmsError::Rejected {
			status: status.as_u16(),
			message,
		}
	}
}
