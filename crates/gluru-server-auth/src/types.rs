// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identifier newtypes and small shared enums.
//!
//! Every entity id is a distinct UUID wrapper so a [`CompanyId`] can never be
//! passed where a [`PrincipalId`] is expected. All of them serialize
//! transparently as UUID strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			pub fn into_inner(self) -> Uuid {
				self.0
			}

			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(PrincipalId, "Unique identifier for a principal (user or staff member).");
define_id_type!(CompanyId, "Unique identifier for a customer company.");
define_id_type!(MembershipId, "Unique identifier for a company membership.");
define_id_type!(InvitationId, "Unique identifier for a company invitation.");
define_id_type!(RoleId, "Unique identifier for a role.");
define_id_type!(PermissionId, "Unique identifier for a permission grant.");
define_id_type!(TicketId, "Unique identifier for a support ticket.");
define_id_type!(AnswerId, "Unique identifier for an answer on a ticket.");

// =============================================================================
// Support plans
// =============================================================================

/// Commercial support plan attached to a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportPlan {
	#[default]
	Community,
	Basic,
	Standard,
	Premium,
	Enterprise,
	Partner,
}

impl SupportPlan {
	pub fn all() -> &'static [SupportPlan] {
		&[
			SupportPlan::Community,
			SupportPlan::Basic,
			SupportPlan::Standard,
			SupportPlan::Premium,
			SupportPlan::Enterprise,
			SupportPlan::Partner,
		]
	}

	/// Display label used in notification bodies.
	pub fn label(&self) -> &'static str {
		match self {
			SupportPlan::Community => "Community",
			SupportPlan::Basic => "Basic",
			SupportPlan::Standard => "Standard",
			SupportPlan::Premium => "Premium",
			SupportPlan::Enterprise => "Enterprise",
			SupportPlan::Partner => "Partner",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		Self::all()
			.iter()
			.copied()
			.find(|plan| plan.to_string() == value || plan.label() == value)
	}
}

impl fmt::Display for SupportPlan {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SupportPlan::Community => write!(f, "community"),
			SupportPlan::Basic => write!(f, "basic"),
			SupportPlan::Standard => write!(f, "standard"),
			SupportPlan::Premium => write!(f, "premium"),
			SupportPlan::Enterprise => write!(f, "enterprise"),
			SupportPlan::Partner => write!(f, "partner"),
		}
	}
}
