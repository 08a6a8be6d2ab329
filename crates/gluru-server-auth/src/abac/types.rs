// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subject and resource attributes fed to the policy evaluators.

use crate::error::AuthError;
use crate::membership::MembershipResolver;
use crate::permission::{Action, AppArea, EntityType};
use crate::principal::Principal;
use crate::role::RoleRegistry;
use crate::types::{CompanyId, PrincipalId};
use std::fmt;

/// The authenticated, active principal together with what it needs to
/// answer membership questions.
pub struct SubjectAttrs<'a> {
	pub principal: &'a Principal,
	pub roles: &'a RoleRegistry,
	pub memberships: &'a dyn MembershipResolver,
}

impl<'a> SubjectAttrs<'a> {
	pub fn new(
		principal: &'a Principal,
		roles: &'a RoleRegistry,
		memberships: &'a dyn MembershipResolver,
	) -> Self {
		Self {
			principal,
			roles,
			memberships,
		}
	}

	pub fn id(&self) -> PrincipalId {
		self.principal.id
	}

	/// True iff the principal belongs to `company` through a membership whose
	/// role grants `action` on (area, entity). A role-less membership grants
	/// nothing; so does a role id missing from the registry.
	pub fn company_grants(
		&self,
		company: CompanyId,
		area: AppArea,
		entity_type: EntityType,
		action: Action,
	) -> bool {
		self
			.memberships
			.resolve(self.principal.id, company)
			.and_then(|m| m.role_id)
			.and_then(|role| self.roles.get(role))
			.is_some_and(|role| role.has_permission(area, entity_type, action))
	}

	pub fn is_member_of(&self, company: CompanyId) -> bool {
		self.memberships.resolve(self.principal.id, company).is_some()
	}
}

impl fmt::Debug for SubjectAttrs<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SubjectAttrs")
			.field("principal", &self.principal.id)
			.field("is_staff", &self.principal.is_staff)
			.field("is_superuser", &self.principal.is_superuser)
			.finish()
	}
}

/// What is being acted on.
///
/// Collection targets (`is_collection`) stand for list and create requests
/// that have no object yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceAttrs {
	pub entity_type: EntityType,
	pub company_id: Option<CompanyId>,
	pub created_by: Option<PrincipalId>,
	/// Principal the ticket was opened for (`created_for`), if different from the creator.
	pub owner: Option<PrincipalId>,
	pub is_collection: bool,
}

impl ResourceAttrs {
	fn object(entity_type: EntityType, company_id: Option<CompanyId>) -> Self {
		Self {
			entity_type,
			company_id,
			created_by: None,
			owner: None,
			is_collection: false,
		}
	}

	fn collection(entity_type: EntityType) -> Self {
		Self {
			is_collection: true,
			..Self::object(entity_type, None)
		}
	}

	/// An existing ticket.
	pub fn ticket(
		company_id: Option<CompanyId>,
		created_by: PrincipalId,
		created_for: Option<PrincipalId>,
	) -> Self {
		Self {
			created_by: Some(created_by),
			owner: created_for,
			..Self::object(EntityType::Ticket, company_id)
		}
	}

	/// A ticket about to be created in `company_id`.
	pub fn new_ticket(company_id: Option<CompanyId>) -> Self {
		Self {
			company_id,
			..Self::collection(EntityType::Ticket)
		}
	}

	pub fn tickets() -> Self {
		Self::collection(EntityType::Ticket)
	}

	/// An answer, carrying the attributes of its parent ticket.
	pub fn answer(
		company_id: Option<CompanyId>,
		ticket_created_by: PrincipalId,
		ticket_created_for: Option<PrincipalId>,
	) -> Self {
		Self {
			created_by: Some(ticket_created_by),
			owner: ticket_created_for,
			..Self::object(EntityType::Answer, company_id)
		}
	}

	pub fn company(company_id: CompanyId) -> Self {
		Self::object(EntityType::Company, Some(company_id))
	}

	pub fn companies() -> Self {
		Self::collection(EntityType::Company)
	}

	/// Any info taxonomy record or collection.
	pub fn info(entity_type: EntityType) -> Self {
		Self::collection(entity_type)
	}

	/// The entity type whose grants decide `action`.
	///
	/// Reading a single answer is checked against ticket grants; every other
	/// answer action uses answer grants.
	pub fn permission_entity(&self, action: Action) -> EntityType {
		match (self.entity_type, action) {
			(EntityType::Answer, Action::Retrieve) => EntityType::Ticket,
			(entity, _) => entity,
		}
	}

	pub fn is_created_by(&self, principal: PrincipalId) -> bool {
		self.created_by == Some(principal)
	}

	/// The ticket owner is `created_for` when set, otherwise the creator.
	pub fn is_owned_by(&self, principal: PrincipalId) -> bool {
		self.owner.or(self.created_by) == Some(principal)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
	Unauthenticated,
	Insufficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
	Allow,
	Deny(DenyReason),
}

impl Decision {
	pub fn is_allowed(&self) -> bool {
		matches!(self, Decision::Allow)
	}

	pub(crate) fn from_grant(granted: bool) -> Self {
		if granted {
			Decision::Allow
		} else {
			Decision::Deny(DenyReason::Insufficient)
		}
	}

	/// Maps a denial to the error surfaced to the caller.
	pub fn into_result(self, action: Action, entity_type: EntityType) -> Result<(), AuthError> {
		match self {
			Decision::Allow => Ok(()),
			Decision::Deny(DenyReason::Unauthenticated) => Err(AuthError::AuthenticationRequired),
			Decision::Deny(DenyReason::Insufficient) => Err(AuthError::PermissionDenied(format!(
				"{action} on {entity_type}"
			))),
		}
	}
}
