// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Principals, roles, memberships and request authorization.
//!
//! - [`permission`]: the permission matrix of (area, entity type, action set) grants
//! - [`role`]: named bundles of grants and the registry resolving built-in roles
//! - [`membership`]: company memberships, invitations and principal classification
//! - [`abac`]: the request-level decision function
//! - [`identity`]: lookups against the identity provider

pub mod abac;
pub mod error;
pub mod identity;
pub mod membership;
pub mod permission;
pub mod principal;
pub mod role;
pub mod types;

pub use abac::{authorize, require, validate_created_for, Decision, DenyReason, ResourceAttrs, SubjectAttrs};
pub use error::AuthError;
pub use identity::{DirectoryLookup, IdentityLookup};
pub use membership::{classify, Invitation, Membership, MembershipDirectory, MembershipResolver, PrincipalClass};
pub use permission::{Action, AppArea, EntityType, Permission, PermissionMatrix};
pub use principal::{Company, Principal};
pub use role::{BuiltinRole, Role, RoleRegistry};
pub use types::{AnswerId, CompanyId, InvitationId, MembershipId, PermissionId, PrincipalId, RoleId, SupportPlan, TicketId};
