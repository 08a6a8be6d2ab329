// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for gluru-server.

pub mod database;
pub mod dispatch;
pub mod http;
pub mod logging;
pub mod notifications;
pub mod sms;
pub mod smtp;

pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use dispatch::{DispatchConfig, DispatchConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use notifications::{
	NotificationsConfig, NotificationsConfigLayer, SmsContactConfig, SmsContactLayer,
};
pub use sms::{SmsConfig, SmsConfigLayer};
pub use smtp::{SmtpConfig, SmtpConfigLayer, TlsMode};
