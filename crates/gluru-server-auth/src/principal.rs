// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Principals and companies as seen by the support core.
//!
//! Both records are owned by the identity provider; the server only holds
//! a local copy and refers to them by id.

use crate::types::{CompanyId, PrincipalId, SupportPlan};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
	pub id: PrincipalId,
	pub email: String,
	pub first_name: String,
	pub last_name: String,
	pub phone_number: Option<String>,
	/// Mention handle used in answer bodies (`@handle`).
	pub handle: Option<String>,
	pub is_active: bool,
	pub is_staff: bool,
	pub is_superuser: bool,
}

impl Principal {
	/// An active, non-privileged principal.
	pub fn new(id: PrincipalId, email: impl Into<String>) -> Self {
		Self {
			id,
			email: email.into(),
			first_name: String::new(),
			last_name: String::new(),
			phone_number: None,
			handle: None,
			is_active: true,
			is_staff: false,
			is_superuser: false,
		}
	}

	pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
		self.first_name = first.into();
		self.last_name = last.into();
		self
	}

	pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
		self.handle = Some(handle.into());
		self
	}

	pub fn staff(mut self) -> Self {
		self.is_staff = true;
		self
	}

	pub fn superuser(mut self) -> Self {
		self.is_superuser = true;
		self
	}

	pub fn inactive(mut self) -> Self {
		self.is_active = false;
		self
	}

	/// "First Last", falling back to the email when no name is recorded.
	pub fn full_name(&self) -> String {
		let name = format!("{} {}", self.first_name, self.last_name);
		let name = name.trim();
		if name.is_empty() {
			self.email.clone()
		} else {
			name.to_string()
		}
	}
}

/// A customer organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
	pub id: CompanyId,
	pub name: String,
	pub support_plan: SupportPlan,
}

impl Company {
	pub fn new(id: CompanyId, name: impl Into<String>, support_plan: SupportPlan) -> Self {
		Self {
			id,
			name: name.into(),
			support_plan,
		}
	}
}
