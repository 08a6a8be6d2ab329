// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::{Path, PathBuf};

use gluru_common_secret::SecretString;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	DatabaseConfigLayer, DispatchConfigLayer, HttpConfigLayer, LogFormat, LoggingConfigLayer,
	NotificationsConfigLayer, SmsConfigLayer, SmsContactLayer, SmtpConfigLayer, TlsMode,
};

/// Default location of the system config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/gluru/server.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// `GLURU_SERVER_CONFIG_FILE` when set, otherwise [`SYSTEM_CONFIG_PATH`].
	pub fn system() -> Self {
		Self::new(env_var("GLURU_SERVER_CONFIG_FILE").unwrap_or_else(|| SYSTEM_CONFIG_PATH.to_string()))
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: GLURU_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			database: Some(load_database_from_env()?),
			logging: Some(load_logging_from_env()?),
			smtp: Some(load_smtp_from_env()?),
			sms: Some(load_sms_from_env()?),
			notifications: Some(load_notifications_from_env()),
			dispatch: Some(load_dispatch_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_list(name: &str) -> Option<Vec<String>> {
	env_var(name).map(|s| {
		s.split(',')
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect()
	})
}

fn env_parse<T: std::str::FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}

/// Loads a secret from `VAR`, or from the file named by `VAR_FILE`.
///
/// The file form wins when both are set. One trailing newline is stripped
/// from file contents.
pub fn load_secret_env(name: &str) -> Result<Option<SecretString>, ConfigError> {
	if let Some(path) = env_var(&format!("{name}_FILE")) {
		return read_secret_file(Path::new(&path)).map(Some);
	}
	Ok(SecretString::from_setting(env_var(name)))
}

fn read_secret_file(path: &Path) -> Result<SecretString, ConfigError> {
	let mut content = std::fs::read_to_string(path).map_err(|e| ConfigError::SecretFile {
		path: path.to_path_buf(),
		source: e,
	})?;
	if content.ends_with('\n') {
		content.pop();
		if content.ends_with('\r') {
			content.pop();
		}
	}
	Ok(SecretString::new(content))
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("GLURU_SERVER_HOST"),
		port: env_parse("GLURU_SERVER_PORT", "u16")?,
		base_url: env_var("GLURU_SERVER_BASE_URL"),
	})
}

fn load_database_from_env() -> Result<DatabaseConfigLayer, ConfigError> {
	Ok(DatabaseConfigLayer {
		url: env_var("GLURU_SERVER_DATABASE_URL"),
		max_connections: env_parse("GLURU_SERVER_DATABASE_MAX_CONNECTIONS", "u32")?,
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("GLURU_SERVER_LOG_FORMAT") {
		Some(v) => Some(LogFormat::parse(&v).ok_or_else(|| ConfigError::InvalidValue {
			key: "GLURU_SERVER_LOG_FORMAT".to_string(),
			message: format!("'{v}' is not one of: pretty, json"),
		})?),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("GLURU_SERVER_LOG_LEVEL"),
		format,
	})
}

fn load_smtp_from_env() -> Result<SmtpConfigLayer, ConfigError> {
	let tls_mode = match env_var("GLURU_SERVER_SMTP_TLS") {
		Some(v) => Some(TlsMode::from_str_value(&v)?),
		None => None,
	};

	Ok(SmtpConfigLayer {
		host: env_var("GLURU_SERVER_SMTP_HOST"),
		port: env_parse("GLURU_SERVER_SMTP_PORT", "u16")?,
		username: env_var("GLURU_SERVER_SMTP_USERNAME"),
		password: load_secret_env("GLURU_SERVER_SMTP_PASSWORD")?,
		from_address: env_var("GLURU_SERVER_SMTP_FROM_ADDRESS"),
		from_name: env_var("GLURU_SERVER_SMTP_FROM_NAME"),
		tls_mode,
	})
}

fn load_sms_from_env() -> Result<SmsConfigLayer, ConfigError> {
	Ok(SmsConfigLayer {
		account_sid: env_var("GLURU_SERVER_SMS_ACCOUNT_SID"),
		auth_token: load_secret_env("GLURU_SERVER_SMS_AUTH_TOKEN")?,
		from_number: env_var("GLURU_SERVER_SMS_FROM_NUMBER"),
		api_base: env_var("GLURU_SERVER_SMS_API_BASE"),
	})
}

fn load_notifications_from_env() -> NotificationsConfigLayer {
	let sms_contacts = env_list("GLURU_SERVER_SMS_CONTACTS")
		.map(|entries| entries.iter().filter_map(|e| SmsContactLayer::parse(e)).collect());

	NotificationsConfigLayer {
		support_addresses: env_list("GLURU_SERVER_SUPPORT_ADDRESSES"),
		sms_contacts,
		site_name: env_var("GLURU_SERVER_SITE_NAME"),
	}
}

fn load_dispatch_from_env() -> Result<DispatchConfigLayer, ConfigError> {
	Ok(DispatchConfigLayer {
		workers: env_parse("GLURU_SERVER_DISPATCH_WORKERS", "usize")?,
		queue_capacity: env_parse("GLURU_SERVER_DISPATCH_QUEUE_CAPACITY", "usize")?,
		max_retries: env_parse("GLURU_SERVER_DISPATCH_MAX_RETRIES", "u32")?,
		base_retry_delay_secs: env_parse("GLURU_SERVER_DISPATCH_BASE_RETRY_DELAY_SECS", "u64")?,
		max_retry_delay_secs: env_parse("GLURU_SERVER_DISPATCH_MAX_RETRY_DELAY_SECS", "u64")?,
		reminder_enabled: env_bool("GLURU_SERVER_REMINDER_ENABLED"),
		reminder_interval_secs: env_parse("GLURU_SERVER_REMINDER_INTERVAL_SECS", "u64")?,
	})
}
