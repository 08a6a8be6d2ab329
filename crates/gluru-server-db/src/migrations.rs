// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::SqlitePool;

use crate::error::Result;

const MIGRATIONS: &[(&str, &str)] = &[
	("001_identity", include_str!("../migrations/001_identity.sql")),
	("002_tickets", include_str!("../migrations/002_tickets.sql")),
];

/// Apply the schema. Every statement is idempotent, so this runs on each start.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
	for (name, sql) in MIGRATIONS {
		for stmt in sql.split(';').filter(|s| !s.trim().is_empty()) {
			sqlx::query(stmt).execute(pool).await?;
		}
		tracing::debug!(migration = name, "migration applied");
	}
	Ok(())
}
