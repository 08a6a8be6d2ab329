// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Company memberships and the resolver used by authorization.
//!
//! Memberships are owned by their company: [`MembershipDirectory`] stores them
//! in per-company buckets keyed by [`CompanyId`], and removing a company drops
//! its bucket. The directory enforces the two membership invariants:
//!
//! - at most one membership per (principal, company)
//! - at most one primary membership per principal across all companies

use crate::error::AuthError;
use crate::principal::Principal;
use crate::role::RoleRegistry;
use crate::types::{CompanyId, InvitationId, MembershipId, PrincipalId, RoleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
	pub id: MembershipId,
	pub principal_id: PrincipalId,
	pub company_id: CompanyId,
	/// A membership without a role grants nothing.
	pub role_id: Option<RoleId>,
	pub is_primary: bool,
	/// Subscribed to company-wide ticket notifications.
	pub receive_notification: bool,
	pub joined_at: DateTime<Utc>,
}

impl Membership {
	pub fn new(principal_id: PrincipalId, company_id: CompanyId, role_id: Option<RoleId>) -> Self {
		Self {
			id: MembershipId::generate(),
			principal_id,
			company_id,
			role_id,
			is_primary: false,
			receive_notification: true,
			joined_at: Utc::now(),
		}
	}

	pub fn primary(mut self) -> Self {
		self.is_primary = true;
		self
	}

	pub fn muted(mut self) -> Self {
		self.receive_notification = false;
		self
	}
}

/// Finds memberships for authorization and notification planning.
pub trait MembershipResolver: Send + Sync {
	/// The unique membership of `principal` in `company`, if any.
	fn resolve(&self, principal: PrincipalId, company: CompanyId) -> Option<&Membership>;

	/// The membership flagged primary. `None` means a community principal.
	fn primary_membership(&self, principal: PrincipalId) -> Option<&Membership>;

	/// Every membership of `company`.
	fn members_of(&self, company: CompanyId) -> Vec<&Membership>;
}

/// How the notification planner treats a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalClass {
	Staff,
	/// Primary membership carries an elevated role (admin or named).
	Named,
	/// Everyone else, including community principals with no company.
	Basic,
}

/// Classifies a principal from its flags and primary membership.
pub fn classify(
	principal: &Principal,
	memberships: &dyn MembershipResolver,
	roles: &RoleRegistry,
) -> PrincipalClass {
	if principal.is_staff {
		return PrincipalClass::Staff;
	}
	let named = memberships
		.primary_membership(principal.id)
		.and_then(|m| m.role_id)
		.is_some_and(|role| roles.is_elevated(role));
	if named {
		PrincipalClass::Named
	} else {
		PrincipalClass::Basic
	}
}

/// In-memory membership store keyed by company.
#[derive(Debug, Clone, Default)]
pub struct MembershipDirectory {
	by_company: HashMap<CompanyId, Vec<Membership>>,
}

impl MembershipDirectory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a directory from stored rows, validating both invariants.
	pub fn from_memberships(memberships: impl IntoIterator<Item = Membership>) -> Result<Self, AuthError> {
		let mut directory = Self::new();
		for membership in memberships {
			directory.insert(membership)?;
		}
		Ok(directory)
	}

	/// Adds a membership.
	///
	/// Fails with `Conflict` if the principal already belongs to the company
	/// or if the membership is primary while another primary exists.
	#[instrument(level = "debug", skip(self, membership), fields(principal = %membership.principal_id, company = %membership.company_id))]
	pub fn insert(&mut self, membership: Membership) -> Result<(), AuthError> {
		if self
			.resolve(membership.principal_id, membership.company_id)
			.is_some()
		{
			return Err(AuthError::Conflict(format!(
				"principal {} is already a member of company {}",
				membership.principal_id, membership.company_id
			)));
		}
		if membership.is_primary && self.primary_membership(membership.principal_id).is_some() {
			return Err(AuthError::Conflict(format!(
				"principal {} already has a primary membership",
				membership.principal_id
			)));
		}
		self
			.by_company
			.entry(membership.company_id)
			.or_default()
			.push(membership);
		Ok(())
	}

	/// Removes and returns the membership. A removed primary is not replaced.
	pub fn remove(&mut self, principal: PrincipalId, company: CompanyId) -> Option<Membership> {
		let bucket = self.by_company.get_mut(&company)?;
		let index = bucket.iter().position(|m| m.principal_id == principal)?;
		let removed = bucket.remove(index);
		if bucket.is_empty() {
			self.by_company.remove(&company);
		}
		Some(removed)
	}

	/// Drops every membership of a company.
	pub fn remove_company(&mut self, company: CompanyId) -> Vec<Membership> {
		self.by_company.remove(&company).unwrap_or_default()
	}

	/// Moves the primary flag to the membership in `company`.
	pub fn set_primary(&mut self, principal: PrincipalId, company: CompanyId) -> Result<(), AuthError> {
		if self.resolve(principal, company).is_none() {
			return Err(AuthError::NotFound(format!(
				"membership of {principal} in {company}"
			)));
		}
		for membership in self.by_company.values_mut().flatten() {
			if membership.principal_id == principal {
				membership.is_primary = membership.company_id == company;
			}
		}
		Ok(())
	}

	/// Accepts an invitation for `principal`.
	///
	/// The key and the invited email must match, the invitation must still be
	/// open and the principal must not already belong to the company. The new
	/// membership becomes primary when the principal has none.
	#[instrument(skip(self, principal, invitation, key), fields(principal = %principal.id, invitation = %invitation.id))]
	pub fn accept_invitation(
		&mut self,
		principal: &Principal,
		invitation: &mut Invitation,
		key: &str,
	) -> Result<Membership, AuthError> {
		if invitation.is_accepted {
			return Err(AuthError::InvitationInvalid("invitation was already accepted".to_string()));
		}
		if invitation.activation_key != key {
			return Err(AuthError::InvitationInvalid("activation key does not match".to_string()));
		}
		if !invitation.email.eq_ignore_ascii_case(&principal.email) {
			return Err(AuthError::InvitationInvalid(
				"invitation was sent to a different email address".to_string(),
			));
		}
		if self.resolve(principal.id, invitation.company_id).is_some() {
			return Err(AuthError::InvitationInvalid(
				"principal is already a member of this company".to_string(),
			));
		}

		let mut membership = Membership::new(principal.id, invitation.company_id, invitation.role_id);
		membership.is_primary = self.primary_membership(principal.id).is_none();
		self.insert(membership.clone())?;
		invitation.is_accepted = true;

		tracing::info!(company = %invitation.company_id, primary = membership.is_primary, "invitation accepted");
		Ok(membership)
	}

	pub fn len(&self) -> usize {
		self.by_company.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.by_company.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Membership> {
		self.by_company.values().flatten()
	}
}

impl MembershipResolver for MembershipDirectory {
	fn resolve(&self, principal: PrincipalId, company: CompanyId) -> Option<&Membership> {
		self
			.by_company
			.get(&company)?
			.iter()
			.find(|m| m.principal_id == principal)
	}

	fn primary_membership(&self, principal: PrincipalId) -> Option<&Membership> {
		self
			.by_company
			.values()
			.flatten()
			.find(|m| m.principal_id == principal && m.is_primary)
	}

	fn members_of(&self, company: CompanyId) -> Vec<&Membership> {
		self
			.by_company
			.get(&company)
			.map(|bucket| bucket.iter().collect())
			.unwrap_or_default()
	}
}

/// An open invitation to join a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
	pub id: InvitationId,
	pub email: String,
	pub company_id: CompanyId,
	pub invited_by: PrincipalId,
	pub role_id: Option<RoleId>,
	pub activation_key: String,
	pub is_accepted: bool,
	pub created_at: DateTime<Utc>,
}

impl Invitation {
	pub fn new(
		email: impl Into<String>,
		company_id: CompanyId,
		invited_by: PrincipalId,
		role_id: Option<RoleId>,
	) -> Self {
		Self {
			id: InvitationId::generate(),
			email: email.into(),
			company_id,
			invited_by,
			role_id,
			activation_key: uuid::Uuid::new_v4().simple().to_string(),
			is_accepted: false,
			created_at: Utc::now(),
		}
	}
}
