// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Failure to deliver one notification. Never reaches the originating request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
	/// The email or SMS transport refused or could not be reached.
	#[error("transport error: {0}")]
	Transport(String),

	/// The template could not be rendered with the given context.
	#[error("rendering error: {0}")]
	Rendering(String),

	#[error("invalid recipient: {0}")]
	InvalidRecipient(String),
}

impl DeliveryError {
	/// Only transport failures may succeed on a later attempt.
	pub fn is_retryable(&self) -> bool {
		matches!(self, DeliveryError::Transport(_))
	}
}

pub type Result<T> = std::result::Result<T, DeliveryError>;
