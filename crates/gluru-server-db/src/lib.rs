// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for the gluru support server.
//!
//! Each aggregate has a `*Store` trait and a `*Repository` implementing it
//! over a [`sqlx::SqlitePool`]. Ids are stored as UUID text and timestamps as
//! RFC 3339 strings.

pub mod answer;
pub mod error;
pub mod identity;
pub mod membership;
pub mod migrations;
pub mod pool;
pub mod role;
mod rows;
pub mod subscription;
pub mod testing;
pub mod ticket;

pub use answer::{AnswerRepository, AnswerStore};
pub use error::{DbError, Result};
pub use identity::{IdentityRepository, IdentityStore};
pub use membership::{MembershipRepository, MembershipStore};
pub use migrations::run_migrations;
pub use pool::create_pool;
pub use role::{RoleRepository, RoleStore};
pub use subscription::{SubscriptionRepository, SubscriptionStore};
pub use ticket::{TicketRepository, TicketStore};

pub use sqlx::SqlitePool;
