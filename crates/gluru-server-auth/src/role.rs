// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Roles and the role registry.
//!
//! A [`Role`] is a named bundle of [`Permission`] grants. The
//! [`RoleRegistry`] holds every role and resolves the built-in ones (the
//! `staff` role in particular) once, when it is built, so decisions use an
//! enum-keyed lookup instead of a name search.

use crate::error::AuthError;
use crate::permission::{Action, AppArea, EntityType, Permission};
use crate::types::RoleId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Roles the system relies on by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinRole {
	/// Consulted for every principal with the staff flag.
	Staff,
	/// Company administrator.
	Admin,
	/// Named contact of a paying company.
	Named,
	User,
	Partner,
	NonUser,
}

impl BuiltinRole {
	pub fn all() -> &'static [BuiltinRole] {
		&[
			BuiltinRole::Staff,
			BuiltinRole::Admin,
			BuiltinRole::Named,
			BuiltinRole::User,
			BuiltinRole::Partner,
			BuiltinRole::NonUser,
		]
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::all().iter().copied().find(|r| r.to_string() == name)
	}

	/// Membership roles that make their holder a "named" principal.
	pub fn is_elevated(&self) -> bool {
		matches!(self, BuiltinRole::Admin | BuiltinRole::Named)
	}

	/// Grants a freshly provisioned installation gives this role.
	///
	/// Every role may read the info taxonomies. Staff holds every action on
	/// every entity type.
	pub fn default_grants(&self) -> Vec<Permission> {
		use Action::*;

		let read = [List, Retrieve];
		let write = [List, Retrieve, Create, Update];
		let mut grants: Vec<Permission> = EntityType::all()
			.iter()
			.filter(|e| e.is_info())
			.map(|e| Permission::new(AppArea::Info, *e, read))
			.collect();

		let mut content = |actions: &[Action]| {
			for entity in [EntityType::Ticket, EntityType::Answer] {
				grants.push(Permission::new(AppArea::Tickets, entity, actions.iter().copied()));
			}
		};
		match self {
			BuiltinRole::Staff => {
				return EntityType::all()
					.iter()
					.map(|e| Permission::new(e.area(), *e, Action::all().iter().copied()))
					.collect();
			}
			BuiltinRole::Admin => content(&[List, Retrieve, Create, Update, Destroy]),
			BuiltinRole::Named | BuiltinRole::User | BuiltinRole::Partner => content(&write),
			BuiltinRole::NonUser => content(&read),
		}

		let company: &[Action] = match self {
			BuiltinRole::Admin => &[List, Retrieve, Invite, RemoveMember],
			BuiltinRole::Named => &[List, Retrieve, Invite],
			_ => &read,
		};
		grants.push(Permission::new(
			AppArea::Profiles,
			EntityType::Company,
			company.iter().copied(),
		));
		grants
	}

	/// A role of this kind carrying [`Self::default_grants`].
	pub fn default_role(&self) -> Role {
		let role = self
			.default_grants()
			.into_iter()
			.fold(Role::new(self.to_string()), Role::with_grant);
		match self {
			BuiltinRole::Staff => role.not_company_associated(),
			_ => role,
		}
	}
}

impl fmt::Display for BuiltinRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BuiltinRole::Staff => write!(f, "staff"),
			BuiltinRole::Admin => write!(f, "admin"),
			BuiltinRole::Named => write!(f, "named"),
			BuiltinRole::User => write!(f, "user"),
			BuiltinRole::Partner => write!(f, "partner"),
			BuiltinRole::NonUser => write!(f, "nonuser"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
	pub id: RoleId,
	pub name: String,
	/// Whether the role is meant to be attached to company memberships.
	pub company_associated: bool,
	pub permissions: Vec<Permission>,
}

impl Role {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			id: RoleId::generate(),
			name: name.into(),
			company_associated: true,
			permissions: Vec::new(),
		}
	}

	pub fn with_grant(mut self, permission: Permission) -> Self {
		self.permissions.push(permission);
		self
	}

	pub fn not_company_associated(mut self) -> Self {
		self.company_associated = false;
		self
	}

	/// True iff any grant on (area, entity type) contains `action`.
	pub fn has_permission(&self, area: AppArea, entity_type: EntityType, action: Action) -> bool {
		self
			.permissions
			.iter()
			.any(|p| p.grants(area, entity_type, action))
	}

	pub fn builtin(&self) -> Option<BuiltinRole> {
		BuiltinRole::from_name(&self.name)
	}
}

/// All roles, with built-ins resolved up front.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
	roles: HashMap<RoleId, Role>,
	builtin: HashMap<BuiltinRole, RoleId>,
}

impl RoleRegistry {
	/// Builds the registry. Role names must be unique.
	pub fn new(roles: impl IntoIterator<Item = Role>) -> Result<Self, AuthError> {
		let mut registry = Self::default();
		for role in roles {
			if registry.roles.values().any(|r| r.name == role.name) {
				return Err(AuthError::Conflict(format!("role '{}' already exists", role.name)));
			}
			if let Some(kind) = role.builtin() {
				registry.builtin.insert(kind, role.id);
			}
			registry.roles.insert(role.id, role);
		}

		if !registry.builtin.contains_key(&BuiltinRole::Staff) {
			tracing::warn!("no 'staff' role defined; staff principals will be denied all role-based actions");
		}

		Ok(registry)
	}

	pub fn get(&self, id: RoleId) -> Option<&Role> {
		self.roles.get(&id)
	}

	pub fn builtin(&self, kind: BuiltinRole) -> Option<&Role> {
		self.builtin.get(&kind).and_then(|id| self.roles.get(id))
	}

	pub fn staff_role(&self) -> Option<&Role> {
		self.builtin(BuiltinRole::Staff)
	}

	/// True when the role is one of the elevated built-ins.
	pub fn is_elevated(&self, id: RoleId) -> bool {
		self
			.get(id)
			.and_then(Role::builtin)
			.is_some_and(|kind| kind.is_elevated())
	}

	pub fn roles(&self) -> impl Iterator<Item = &Role> {
		self.roles.values()
	}

	pub fn len(&self) -> usize {
		self.roles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.roles.is_empty()
	}
}
