// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SMTP email transport for gluru notifications.
//!
//! [`SmtpClient`] implements [`EmailSender`] on top of [`lettre`]. A message
//! with an HTML body is sent as `multipart/alternative`; attachments wrap it
//! in `multipart/mixed`. The password comes from the config as a
//! [`gluru_common_secret::SecretString`] and is never logged.
//!
//! # Example
//!
//! ```no_run
//! use gluru_server_smtp::SmtpClient;
//! use gluru_server_config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config()?;
//! if let Some(smtp) = &config.smtp {
//!     let client = SmtpClient::new(smtp)?;
//!     client.check_health().await?;
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use gluru_server_config::{SmtpConfig, TlsMode};
use gluru_server_notify::{DeliveryError, EmailMessage, EmailSender};
use lettre::{
	message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
	transport::smtp::authentication::Credentials,
	AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// Errors that can occur during SMTP operations.
#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
	/// Failed to connect to the SMTP server.
	#[error("connection failed: {0}")]
	Connection(String),

	/// Failed to build or send a message.
	#[error("send failed: {0}")]
	Send(String),

	/// Invalid email address format.
	#[error("invalid email address: {0}")]
	Address(String),
}

impl From<SmtpError> for DeliveryError {
	fn from(err: SmtpError) -> Self {
		match err {
			SmtpError::Address(msg) => DeliveryError::InvalidRecipient(msg),
			other => DeliveryError::Transport(other.to_string()),
		}
	}
}

/// Async SMTP client. The connection is made lazily when sending.
pub struct SmtpClient {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	from_mailbox: Mailbox,
}

impl SmtpClient {
	#[tracing::instrument(
		name = "smtp_client_new",
		skip(config),
		fields(host = %config.host, port = %config.port, tls_mode = ?config.tls_mode)
	)]
	pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
		let from_mailbox = sender_mailbox(config)?;

		let builder = match config.tls_mode {
			TlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
				.map_err(|e| SmtpError::Connection(format!("{e}")))?,
			TlsMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
				.map_err(|e| SmtpError::Connection(format!("{e}")))?,
			TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
		};

		let mut builder = builder.port(config.port);

		if let (Some(username), Some(password)) = (&config.username, &config.password) {
			builder = builder.credentials(Credentials::new(username.clone(), password.expose().clone()));
		}

		tracing::debug!(authenticated = config.has_auth(), "SMTP client initialized");

		Ok(Self {
			transport: builder.build(),
			from_mailbox,
		})
	}

	/// Opens a connection to the server; used at startup.
	#[tracing::instrument(name = "smtp_check_health", skip(self))]
	pub async fn check_health(&self) -> Result<(), SmtpError> {
		let reachable = self
			.transport
			.test_connection()
			.await
			.map_err(|e| SmtpError::Connection(format!("{e}")))?;
		if !reachable {
			return Err(SmtpError::Connection("server did not accept the connection".to_string()));
		}
		tracing::debug!("SMTP server is healthy");
		Ok(())
	}

	#[tracing::instrument(
		name = "smtp_send_email",
		skip(self, message),
		fields(recipients = message.to.len(), subject = %message.subject)
	)]
	pub async fn send_message(&self, message: &EmailMessage) -> Result<(), SmtpError> {
		let built = build_message(&self.from_mailbox, message)?;

		self
			.transport
			.send(built)
			.await
			.map_err(|e| SmtpError::Send(format!("{e}")))?;

		tracing::info!("email sent successfully");
		Ok(())
	}
}

#[async_trait]
impl EmailSender for SmtpClient {
	async fn send(&self, message: &EmailMessage) -> gluru_server_notify::Result<()> {
		self.send_message(message).await.map_err(DeliveryError::from)
	}
}

fn sender_mailbox(config: &SmtpConfig) -> Result<Mailbox, SmtpError> {
	format!("{} <{}>", config.from_name, config.from_address)
		.parse()
		.map_err(|e| SmtpError::Address(format!("{e}")))
}

/// Build a lettre message. Every recipient goes on the `To` header.
pub fn build_message(from: &Mailbox, message: &EmailMessage) -> Result<Message, SmtpError> {
	if message.to.is_empty() {
		return Err(SmtpError::Address("no recipients".to_string()));
	}

	let mut builder = Message::builder().from(from.clone()).subject(message.subject.as_str());
	for to in &message.to {
		let mailbox: Mailbox = to
			.parse()
			.map_err(|e| SmtpError::Address(format!("{to}: {e}")))?;
		builder = builder.to(mailbox);
	}

	let text = SinglePart::builder()
		.header(ContentType::TEXT_PLAIN)
		.body(message.body_text.clone());

	let body = match &message.body_html {
		Some(html) => MultiPart::alternative().singlepart(text).singlepart(
			SinglePart::builder()
				.header(ContentType::TEXT_HTML)
				.body(html.clone()),
		),
		None => MultiPart::mixed().singlepart(text),
	};

	let body = if message.attachments.is_empty() {
		body
	} else {
		let mut mixed = match &message.body_html {
			Some(_) => MultiPart::mixed().multipart(body),
			None => body,
		};
		for attachment in &message.attachments {
			let content_type = ContentType::parse(&attachment.content_type)
				.map_err(|e| SmtpError::Send(format!("invalid attachment content type: {e}")))?;
			mixed = mixed.singlepart(
				Attachment::new(attachment.filename.clone()).body(attachment.data.clone(), content_type),
			);
		}
		mixed
	};

	builder
		.multipart(body)
		.map_err(|e| SmtpError::Send(format!("failed to build message: {e}")))
}

/// Validate an email address format. Does not check the address exists.
pub fn is_valid_email(email: &str) -> bool {
	email.parse::<Mailbox>().is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use gluru_common_secret::SecretString;
	use gluru_server_notify::{Attachment as MailAttachment, RenderedMessage};

	fn config() -> SmtpConfig {
		SmtpConfig {
			host: "smtp.gluu.org".to_string(),
			port: 587,
			username: Some("support".to_string()),
			password: Some(SecretString::new("super-secret-password".to_string())),
			from_address: "support@gluu.org".to_string(),
			from_name: "Gluu Support".to_string(),
			tls_mode: TlsMode::StartTls,
		}
	}

	fn message(to: &[&str], html: Option<&str>) -> EmailMessage {
		EmailMessage::new(
			to.iter().map(|s| s.to_string()).collect(),
			RenderedMessage {
				subject: "New ticket #42".to_string(),
				body_text: "A ticket was opened.".to_string(),
				body_html: html.map(str::to_string),
			},
		)
	}

	fn formatted(message: &EmailMessage) -> String {
		let from = sender_mailbox(&config()).unwrap();
		String::from_utf8(build_message(&from, message).unwrap().formatted()).unwrap()
	}

	mod email_validation {
		use super::*;

		#[test]
		fn valid_addresses() {
			assert!(is_valid_email("user@gluu.org"));
			assert!(is_valid_email("Support Team <support@gluu.org>"));
			assert!(is_valid_email("user+tag@mail.gluu.org"));
		}

		#[test]
		fn invalid_addresses() {
			assert!(!is_valid_email(""));
			assert!(!is_valid_email("gluu.org"));
			assert!(!is_valid_email("user@"));
			assert!(!is_valid_email("@gluu.org"));
		}
	}

	mod messages {
		use super::*;

		#[test]
		fn html_body_is_alternative() {
			let raw = formatted(&message(&["a@gluu.org"], Some("<p>A ticket was opened.</p>")));
			assert!(raw.contains("multipart/alternative"));
			assert!(raw.contains("Subject: New ticket #42"));
			assert!(raw.contains("text/html"));
		}

		#[test]
		fn text_only_body_has_no_html_part() {
			let raw = formatted(&message(&["a@gluu.org"], None));
			assert!(!raw.contains("text/html"));
			assert!(raw.contains("A ticket was opened."));
		}

		#[test]
		fn every_recipient_is_addressed() {
			let raw = formatted(&message(&["a@gluu.org", "b@gluu.org"], None));
			assert!(raw.contains("a@gluu.org"));
			assert!(raw.contains("b@gluu.org"));
		}

		#[test]
		fn attachments_are_mixed_in() {
			let mut msg = message(&["a@gluu.org"], Some("<p>hi</p>"));
			msg.attachments.push(MailAttachment {
				filename: "oxauth.log".to_string(),
				content_type: "text/plain".to_string(),
				data: b"stack trace".to_vec(),
			});
			let raw = formatted(&msg);
			assert!(raw.contains("multipart/mixed"));
			assert!(raw.contains("oxauth.log"));
		}

		#[test]
		fn invalid_recipient_maps_to_invalid_recipient() {
			let from = sender_mailbox(&config()).unwrap();
			let err = build_message(&from, &message(&["not-an-address"], None)).unwrap_err();
			assert!(matches!(DeliveryError::from(err), DeliveryError::InvalidRecipient(_)));
		}

		#[test]
		fn empty_recipients_rejected() {
			let from = sender_mailbox(&config()).unwrap();
			assert!(matches!(build_message(&from, &message(&[], None)), Err(SmtpError::Address(_))));
		}
	}

	mod client {
		use super::*;

		#[test]
		fn builds_for_each_tls_mode() {
			for tls_mode in [TlsMode::Tls, TlsMode::StartTls, TlsMode::None] {
				let cfg = SmtpConfig { tls_mode, ..config() };
				assert!(SmtpClient::new(&cfg).is_ok());
			}
		}

		#[test]
		fn config_debug_does_not_leak_password() {
			let debug = format!("{:?}", config());
			assert!(!debug.contains("super-secret-password"));
			assert!(debug.contains("[REDACTED]"));
		}

		#[test]
		fn connection_errors_are_retryable() {
			let err: DeliveryError = SmtpError::Connection("refused".to_string()).into();
			assert!(err.is_retryable());
		}
	}

	mod property_tests {
		use super::*;
		use proptest::prelude::*;

		proptest! {
			#[test]
			fn valid_emails_are_accepted(
				local in "[a-zA-Z][a-zA-Z0-9]{0,30}",
				domain in "[a-zA-Z][a-zA-Z0-9]{0,20}",
				tld in "(com|org|net|io)"
			) {
				let email = format!("{local}@{domain}.{tld}");
				prop_assert!(is_valid_email(&email), "Expected valid: {}", email);
			}

			#[test]
			fn no_at_symbol_is_invalid(s in "[a-zA-Z0-9._%+-]{1,50}") {
				prop_assume!(!s.contains('@'));
				prop_assert!(!is_valid_email(&s));
			}
		}
	}
}
