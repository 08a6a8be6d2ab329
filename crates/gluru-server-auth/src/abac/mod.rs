// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request authorization.
//!
//! Decisions are pure functions of the acting principal, the role registry,
//! the membership resolver and the target resource. Nothing here performs
//! I/O; identity lookups happen before [`authorize`] is called.
//!
//! # Evaluation Flow
//!
//! ```text
//! authorize(roles, memberships, principal, action, resource)
//!     │
//!     ├── No active principal → reads on public resources only
//!     ├── Superuser           → always allowed
//!     ├── Staff               → staff role grant on (area, entity, action)
//!     │
//!     └── Route to entity policy:
//!         ├── Ticket  → ticket::evaluate()
//!         ├── Answer  → answer::evaluate()
//!         ├── Company → company::evaluate()
//!         └── Info    → info::evaluate()
//! ```
//!
//! # Example
//!
//! ```
//! use gluru_server_auth::abac::{authorize, ResourceAttrs};
//! use gluru_server_auth::{Action, MembershipDirectory, Principal, PrincipalId, RoleRegistry};
//!
//! let roles = RoleRegistry::default();
//! let memberships = MembershipDirectory::new();
//! let user = Principal::new(PrincipalId::generate(), "user@example.com");
//!
//! // A community ticket may be edited by its creator only.
//! let ticket = ResourceAttrs::ticket(None, user.id, None);
//! assert!(authorize(&roles, &memberships, Some(&user), Action::Update, &ticket).is_allowed());
//! ```

pub mod engine;
pub mod policies;
pub mod types;

pub use engine::*;
pub use types::*;
