// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gluru_server_auth::AuthError;
use gluru_server_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
	#[error(transparent)]
	Auth(#[from] AuthError),

	#[error("Storage error: {0}")]
	Storage(DbError),

	#[error("Not found: {0}")]
	NotFound(String),
}

impl From<DbError> for ServiceError {
	fn from(err: DbError) -> Self {
		match err {
			DbError::Auth(auth) => ServiceError::Auth(auth),
			DbError::NotFound(what) => ServiceError::NotFound(what),
			DbError::Conflict(what) => ServiceError::Auth(AuthError::Conflict(what)),
			other => ServiceError::Storage(other),
		}
	}
}

impl ServiceError {
	/// HTTP status for the caller-facing layer.
	pub fn status_code(&self) -> u16 {
		match self {
			ServiceError::Auth(err) => err.status_code(),
			ServiceError::NotFound(_) => 404,
			ServiceError::Storage(_) => 500,
		}
	}
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn db_errors_map_to_caller_errors() {
		let err: ServiceError = DbError::NotFound("ticket".into()).into();
		assert_eq!(err.status_code(), 404);

		let err: ServiceError = DbError::Auth(AuthError::InvitationInvalid("used".into())).into();
		assert!(matches!(err, ServiceError::Auth(AuthError::InvitationInvalid(_))));

		let err: ServiceError = DbError::Internal("bad row".into()).into();
		assert_eq!(err.status_code(), 500);
	}
}
