// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization, validation and membership error types.

use thiserror::Error;

/// Errors raised synchronously on the request path.
///
/// None of these are retried; the caller corrects its input or credentials.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
	// =========================================================================
	// Authorization
	// =========================================================================
	/// No (active) principal for an action that needs one.
	#[error("authentication required")]
	AuthenticationRequired,

	/// Principal is known but lacks the flag, membership or role grant.
	#[error("permission denied: {0}")]
	PermissionDenied(String),

	// =========================================================================
	// Input
	// =========================================================================
	/// Request is authorized but its content is inconsistent.
	#[error("validation failed: {0}")]
	ValidationFailed(String),

	/// Invitation could not be accepted.
	#[error("invalid invitation: {0}")]
	InvitationInvalid(String),

	// =========================================================================
	// Lookup
	// =========================================================================
	#[error("{0} not found")]
	NotFound(String),

	/// A uniqueness rule (membership, role name, permission triple) was violated.
	#[error("conflict: {0}")]
	Conflict(String),

	/// Identity collaborator failed for a reason other than a missing record.
	#[error("identity lookup failed: {0}")]
	Lookup(String),
}

impl AuthError {
	/// HTTP-equivalent status for the routing collaborator.
	pub fn status_code(&self) -> u16 {
		match self {
			AuthError::AuthenticationRequired | AuthError::PermissionDenied(_) => 403,
			AuthError::ValidationFailed(_) | AuthError::InvitationInvalid(_) => 400,
			AuthError::NotFound(_) => 404,
			AuthError::Conflict(_) => 409,
			AuthError::Lookup(_) => 502,
		}
	}
}
