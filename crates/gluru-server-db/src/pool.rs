// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;

use crate::error::DbError;

/// Create a SqlitePool with WAL mode and foreign keys enabled.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./gluru.db")
/// * `max_connections` - upper bound on pooled connections
///
/// # Errors
/// Returns `DbError::Internal` if the URL is not a `sqlite:` URL or does not
/// parse, and `DbError::Sqlx` if the database cannot be opened.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, DbError> {
	if !database_url.starts_with("sqlite:") {
		return Err(DbError::Internal(format!(
			"Invalid database URL: expected a sqlite: URL, got '{database_url}'"
		)));
	}

	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.foreign_keys(true)
		.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(max_connections.max(1))
		.connect_with(options)
		.await?;

	tracing::debug!("database pool created");
	Ok(pool)
}
