// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gluru_server_notify::DeliveryError;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
	#[error("Job failed: {message}")]
	Failed { message: String, retryable: bool },

	#[error("Job cancelled")]
	Cancelled,

	#[error("Job rejected: {0}")]
	Rejected(String),
}

impl JobError {
	pub fn failed(message: impl Into<String>, retryable: bool) -> Self {
		Self::Failed {
			message: message.into(),
			retryable,
		}
	}
}

impl From<DeliveryError> for JobError {
	fn from(err: DeliveryError) -> Self {
		Self::Failed {
			retryable: err.is_retryable(),
			message: err.to_string(),
		}
	}
}

pub type Result<T> = std::result::Result<T, JobError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn transport_errors_are_retryable() {
		let err: JobError = DeliveryError::Transport("connection reset".to_string()).into();
		assert!(matches!(err, JobError::Failed { retryable: true, .. }));
	}

	#[test]
	fn rendering_errors_are_final() {
		let err: JobError = DeliveryError::Rendering("missing ticket_link".to_string()).into();
		match err {
			JobError::Failed { message, retryable } => {
				assert!(!retryable);
				assert!(message.contains("ticket_link"));
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}
}
