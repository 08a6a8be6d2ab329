// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gluru_server_auth::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// A domain rule rejected the write.
	#[error(transparent)]
	Auth(#[from] AuthError),
}

impl DbError {
	/// Maps unique-constraint violations to `Conflict`, leaving other errors as is.
	pub(crate) fn on_unique(err: sqlx::Error, message: impl Into<String>) -> Self {
		match &err {
			sqlx::Error::Database(db) if db.is_unique_violation() => DbError::Conflict(message.into()),
			_ => DbError::Sqlx(err),
		}
	}
}

impl From<DbError> for AuthError {
	fn from(err: DbError) -> Self {
		match err {
			DbError::NotFound(what) => AuthError::NotFound(what),
			DbError::Conflict(what) => AuthError::Conflict(what),
			DbError::Auth(err) => err,
			other => AuthError::Lookup(other.to_string()),
		}
	}
}

pub type Result<T> = std::result::Result<T, DbError>;
