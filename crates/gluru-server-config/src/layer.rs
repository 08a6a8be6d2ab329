// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	DatabaseConfigLayer, DispatchConfigLayer, HttpConfigLayer, LoggingConfigLayer,
	NotificationsConfigLayer, SmsConfigLayer, SmtpConfigLayer,
};

/// Server configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub smtp: Option<SmtpConfigLayer>,
	#[serde(default)]
	pub sms: Option<SmsConfigLayer>,
	#[serde(default)]
	pub notifications: Option<NotificationsConfigLayer>,
	#[serde(default)]
	pub dispatch: Option<DispatchConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_option(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_option(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_option(&mut self.smtp, other.smtp, SmtpConfigLayer::merge);
		merge_option(&mut self.sms, other.sms, SmsConfigLayer::merge);
		merge_option(
			&mut self.notifications,
			other.notifications,
			NotificationsConfigLayer::merge,
		);
		merge_option(&mut self.dispatch, other.dispatch, DispatchConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_empty_layers() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer::default());
		assert!(base.http.is_none());
		assert!(base.notifications.is_none());
	}

	#[test]
	fn test_merge_other_overwrites_field_by_field() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(9000),
				host: Some("127.0.0.1".to_string()),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(8080),
				..Default::default()
			}),
			..Default::default()
		});

		let http = base.http.unwrap();
		assert_eq!(http.port, Some(8080));
		assert_eq!(http.host.as_deref(), Some("127.0.0.1"));
	}

	#[test]
	fn test_merge_adds_missing_sections() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer {
			notifications: Some(NotificationsConfigLayer {
				support_addresses: Some(vec!["support@gluu.org".to_string()]),
				..Default::default()
			}),
			..Default::default()
		});
		assert!(base.notifications.is_some());
	}

	#[test]
	fn test_deserialize_full_file() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
[http]
base_url = "https://support.gluu.org"

[notifications]
support_addresses = ["support@gluu.org"]

[dispatch]
workers = 2
"#,
		)
		.unwrap();

		assert_eq!(
			layer.http.unwrap().base_url.as_deref(),
			Some("https://support.gluu.org")
		);
		assert_eq!(layer.dispatch.unwrap().workers, Some(2));
	}
}
