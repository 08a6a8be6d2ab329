// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The permission matrix.
//!
//! A [`Permission`] grants a set of [`Action`]s on one entity type inside one
//! application area. The [`PermissionMatrix`] is the catalogue of all grants
//! and enforces that each (area, entity type, action set) triple exists once.
//! Roles are assembled from grants in the matrix.

use crate::error::AuthError;
use crate::types::PermissionId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Application areas, mirroring how the API is partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppArea {
	Tickets,
	Profiles,
	Info,
}

impl AppArea {
	pub fn all() -> &'static [AppArea] {
		&[AppArea::Tickets, AppArea::Profiles, AppArea::Info]
	}

	pub fn parse(value: &str) -> Option<Self> {
		Self::all().iter().copied().find(|a| a.to_string() == value)
	}
}

impl fmt::Display for AppArea {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AppArea::Tickets => write!(f, "tickets"),
			AppArea::Profiles => write!(f, "profiles"),
			AppArea::Info => write!(f, "info"),
		}
	}
}

/// Entity types that can be the target of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
	Ticket,
	Answer,
	Company,
	/// Info taxonomies: server versions, operating systems, products,
	/// ticket categories and issue types.
	Server,
	OperatingSystem,
	Product,
	Category,
	IssueType,
}

impl EntityType {
	pub fn area(&self) -> AppArea {
		match self {
			EntityType::Ticket | EntityType::Answer => AppArea::Tickets,
			EntityType::Company => AppArea::Profiles,
			EntityType::Server
			| EntityType::OperatingSystem
			| EntityType::Product
			| EntityType::Category
			| EntityType::IssueType => AppArea::Info,
		}
	}

	pub fn is_info(&self) -> bool {
		self.area() == AppArea::Info
	}

	pub fn all() -> &'static [EntityType] {
		&[
			EntityType::Ticket,
			EntityType::Answer,
			EntityType::Company,
			EntityType::Server,
			EntityType::OperatingSystem,
			EntityType::Product,
			EntityType::Category,
			EntityType::IssueType,
		]
	}

	pub fn parse(value: &str) -> Option<Self> {
		Self::all().iter().copied().find(|e| e.to_string() == value)
	}
}

impl fmt::Display for EntityType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			EntityType::Ticket => "ticket",
			EntityType::Answer => "answer",
			EntityType::Company => "company",
			EntityType::Server => "server",
			EntityType::OperatingSystem => "operating_system",
			EntityType::Product => "product",
			EntityType::Category => "category",
			EntityType::IssueType => "issue_type",
		};
		f.write_str(name)
	}
}

/// Request-level actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
	List,
	Retrieve,
	Create,
	Update,
	Destroy,
	Invite,
	AcceptInvite,
	RemoveMember,
}

impl Action {
	pub fn is_read(&self) -> bool {
		matches!(self, Action::List | Action::Retrieve)
	}

	pub fn all() -> &'static [Action] {
		&[
			Action::List,
			Action::Retrieve,
			Action::Create,
			Action::Update,
			Action::Destroy,
			Action::Invite,
			Action::AcceptInvite,
			Action::RemoveMember,
		]
	}

	pub fn parse(value: &str) -> Option<Self> {
		Self::all()
			.iter()
			.copied()
			.find(|a| a.to_string() == value.trim())
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Action::List => "list",
			Action::Retrieve => "retrieve",
			Action::Create => "create",
			Action::Update => "update",
			Action::Destroy => "destroy",
			Action::Invite => "invite",
			Action::AcceptInvite => "accept_invite",
			Action::RemoveMember => "remove_member",
		};
		f.write_str(name)
	}
}

/// One grant: `actions` on `entity_type` within `area`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
	pub id: PermissionId,
	pub area: AppArea,
	pub entity_type: EntityType,
	pub actions: BTreeSet<Action>,
	pub description: String,
}

impl Permission {
	pub fn new(
		area: AppArea,
		entity_type: EntityType,
		actions: impl IntoIterator<Item = Action>,
	) -> Self {
		Self {
			id: PermissionId::generate(),
			area,
			entity_type,
			actions: actions.into_iter().collect(),
			description: String::new(),
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	pub fn applies_to(&self, area: AppArea, entity_type: EntityType) -> bool {
		self.area == area && self.entity_type == entity_type
	}

	pub fn grants(&self, area: AppArea, entity_type: EntityType, action: Action) -> bool {
		self.applies_to(area, entity_type) && self.actions.contains(&action)
	}

	/// Comma-separated action names, the storage form of the action set.
	pub fn actions_csv(&self) -> String {
		self.actions
			.iter()
			.map(ToString::to_string)
			.collect::<Vec<_>>()
			.join(",")
	}

	pub fn parse_actions(csv: &str) -> Result<BTreeSet<Action>, AuthError> {
		csv.split(',')
			.filter(|s| !s.trim().is_empty())
			.map(|s| {
				Action::parse(s)
					.ok_or_else(|| AuthError::ValidationFailed(format!("unknown action '{}'", s.trim())))
			})
			.collect()
	}

	fn key(&self) -> (AppArea, EntityType, BTreeSet<Action>) {
		(self.area, self.entity_type, self.actions.clone())
	}
}

/// Catalogue of every grant known to the system.
#[derive(Debug, Clone, Default)]
pub struct PermissionMatrix {
	permissions: BTreeMap<PermissionId, Permission>,
}

impl PermissionMatrix {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a grant. A second grant with the same (area, entity type, action
	/// set) is a conflict.
	pub fn insert(&mut self, permission: Permission) -> Result<PermissionId, AuthError> {
		let key = permission.key();
		if self.permissions.values().any(|p| p.key() == key) {
			return Err(AuthError::Conflict(format!(
				"permission {}.{} [{}] already exists",
				permission.area,
				permission.entity_type,
				permission.actions_csv()
			)));
		}
		let id = permission.id;
		self.permissions.insert(id, permission);
		Ok(id)
	}

	pub fn get(&self, id: PermissionId) -> Option<&Permission> {
		self.permissions.get(&id)
	}

	/// All grants covering the given (area, entity type).
	pub fn find(&self, area: AppArea, entity_type: EntityType) -> impl Iterator<Item = &Permission> {
		self
			.permissions
			.values()
			.filter(move |p| p.applies_to(area, entity_type))
	}

	/// Resolves a list of grant ids, failing on the first unknown id.
	pub fn resolve(&self, ids: &[PermissionId]) -> Result<Vec<Permission>, AuthError> {
		ids
			.iter()
			.map(|id| {
				self
					.get(*id)
					.cloned()
					.ok_or_else(|| AuthError::NotFound(format!("permission {id}")))
			})
			.collect()
	}

	pub fn len(&self) -> usize {
		self.permissions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.permissions.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn entity_areas() {
		assert_eq!(EntityType::Ticket.area(), AppArea::Tickets);
		assert_eq!(EntityType::Answer.area(), AppArea::Tickets);
		assert_eq!(EntityType::Company.area(), AppArea::Profiles);
		assert!(EntityType::IssueType.is_info());
		assert!(!EntityType::Company.is_info());
	}

	#[test]
	fn action_names_round_trip_through_parse() {
		for action in Action::all() {
			assert_eq!(Action::parse(&action.to_string()), Some(*action));
		}
		assert_eq!(Action::parse("approve"), None);
	}

	#[test]
	fn grants_requires_matching_area_entity_and_action() {
		let p = Permission::new(AppArea::Tickets, EntityType::Ticket, [Action::Retrieve, Action::Update]);

		assert!(p.grants(AppArea::Tickets, EntityType::Ticket, Action::Update));
		assert!(!p.grants(AppArea::Tickets, EntityType::Ticket, Action::Destroy));
		assert!(!p.grants(AppArea::Tickets, EntityType::Answer, Action::Update));
		assert!(!p.grants(AppArea::Profiles, EntityType::Ticket, Action::Update));
	}

	#[test]
	fn actions_csv_parses_back() {
		let p = Permission::new(AppArea::Tickets, EntityType::Answer, [Action::Create, Action::List]);
		let csv = p.actions_csv();
		assert_eq!(csv, "list,create");
		assert_eq!(Permission::parse_actions(&csv).unwrap(), p.actions);
		assert!(Permission::parse_actions("list,fly").is_err());
	}

	#[test]
	fn matrix_rejects_duplicate_triple() {
		let mut matrix = PermissionMatrix::new();
		matrix
			.insert(Permission::new(AppArea::Tickets, EntityType::Ticket, [Action::Retrieve]))
			.unwrap();

		let err = matrix
			.insert(Permission::new(AppArea::Tickets, EntityType::Ticket, [Action::Retrieve]))
			.unwrap_err();
		assert!(matches!(err, AuthError::Conflict(_)));

		matrix
			.insert(Permission::new(
				AppArea::Tickets,
				EntityType::Ticket,
				[Action::Retrieve, Action::Update],
			))
			.unwrap();
		assert_eq!(matrix.len(), 2);
		assert_eq!(matrix.find(AppArea::Tickets, EntityType::Ticket).count(), 2);
	}

	#[test]
	fn resolve_reports_unknown_id() {
		let matrix = PermissionMatrix::new();
		let err = matrix.resolve(&[PermissionId::generate()]).unwrap_err();
		assert!(matches!(err, AuthError::NotFound(_)));
	}
}
