// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration for the gluru support server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe sections with validation
//! - Consistent environment variable naming (`GLURU_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use gluru_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("support list: {:?}", config.notifications.support_addresses);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{load_secret_env, ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub smtp: Option<SmtpConfig>,
	pub sms: Option<SmsConfig>,
	pub notifications: NotificationsConfig,
	pub dispatch: DispatchConfig,
}

impl ServerConfig {
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`GLURU_SERVER_*`)
/// 2. Config file (`GLURU_SERVER_CONFIG_FILE` or `/etc/gluru/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with an explicit config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Finalize a merged layer into resolved, validated config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let notifications = layer.notifications.unwrap_or_default().finalize();
	let dispatch = layer.dispatch.unwrap_or_default().finalize();
	let smtp = layer.smtp.unwrap_or_default().build()?;
	let sms = layer.sms.unwrap_or_default().build()?;

	validate_config(&notifications, &dispatch)?;

	info!(
		host = %http.host,
		port = http.port,
		base_url = %http.base_url,
		database = %database.url,
		smtp_configured = smtp.is_some(),
		sms_configured = sms.is_some(),
		support_addresses = notifications.support_addresses.len(),
		sms_contacts = notifications.sms_contacts.len(),
		workers = dispatch.workers,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		database,
		logging,
		smtp,
		sms,
		notifications,
		dispatch,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(
	notifications: &NotificationsConfig,
	dispatch: &DispatchConfig,
) -> Result<(), ConfigError> {
	if notifications.support_addresses.is_empty() {
		return Err(ConfigError::Validation(
			"notifications.support_addresses must list at least one address \
			 (GLURU_SERVER_SUPPORT_ADDRESSES)"
				.to_string(),
		));
	}

	if let Some(contact) = notifications
		.sms_contacts
		.iter()
		.find(|c| c.number.trim().is_empty())
	{
		return Err(ConfigError::Validation(format!(
			"sms contact '{}' has no number",
			contact.name
		)));
	}

	if dispatch.workers == 0 {
		return Err(ConfigError::Validation(
			"dispatch.workers must be at least 1".to_string(),
		));
	}

	if dispatch.queue_capacity == 0 {
		return Err(ConfigError::Validation(
			"dispatch.queue_capacity must be at least 1".to_string(),
		));
	}

	if dispatch.base_retry_delay_secs > dispatch.max_retry_delay_secs {
		return Err(ConfigError::Validation(
			"dispatch.base_retry_delay_secs cannot exceed dispatch.max_retry_delay_secs".to_string(),
		));
	}

	Ok(())
}
