// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory database helpers for tests in this and downstream crates.

use gluru_server_auth::{Company, CompanyId, Principal, PrincipalId, SupportPlan};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::identity::{IdentityRepository, IdentityStore};
use crate::migrations::run_migrations;

/// A migrated in-memory database. Pinned to one connection so every query
/// sees the same database.
pub async fn create_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str("sqlite::memory:")
		.unwrap()
		.foreign_keys(true);
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await
		.unwrap();
	run_migrations(&pool).await.unwrap();
	pool
}

pub async fn insert_test_principal(pool: &SqlitePool, email: &str) -> Principal {
	let principal = Principal::new(PrincipalId::generate(), email);
	IdentityRepository::new(pool.clone())
		.create_principal(&principal)
		.await
		.unwrap();
	principal
}

pub async fn insert_test_company(pool: &SqlitePool, name: &str, plan: SupportPlan) -> Company {
	let company = Company::new(CompanyId::generate(), name, plan);
	IdentityRepository::new(pool.clone())
		.create_company(&company)
		.await
		.unwrap();
	company
}
