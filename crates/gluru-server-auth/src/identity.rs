// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity collaborators.
//!
//! Principals and companies are owned by the identity provider. The server
//! only holds references, so every lookup goes through these traits. The
//! database crate provides the production implementations.

use crate::error::AuthError;
use crate::principal::{Company, Principal};
use crate::types::{CompanyId, PrincipalId};
use async_trait::async_trait;

#[async_trait]
pub trait IdentityLookup: Send + Sync {
	/// Returns `AuthError::NotFound` for an unknown id.
	async fn fetch_principal(&self, id: PrincipalId) -> Result<Principal, AuthError>;

	/// Returns `AuthError::NotFound` for an unknown id.
	async fn fetch_company(&self, id: CompanyId) -> Result<Company, AuthError>;
}

/// Resolves `@handle` mentions to principals.
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
	/// `Ok(None)` when nobody owns the handle.
	async fn resolve_mention(&self, handle: &str) -> Result<Option<Principal>, AuthError>;
}
