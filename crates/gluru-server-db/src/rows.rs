// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Column decoding shared by the repositories. Ids are UUID strings and
//! timestamps RFC 3339 strings.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{DbError, Result};

pub(crate) fn uuid_col(row: &SqliteRow, column: &str) -> Result<Uuid> {
	let raw: String = row.try_get(column)?;
	Uuid::parse_str(&raw).map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

pub(crate) fn opt_uuid_col(row: &SqliteRow, column: &str) -> Result<Option<Uuid>> {
	let raw: Option<String> = row.try_get(column)?;
	raw.map(|s| Uuid::parse_str(&s).map_err(|e| DbError::Internal(format!("Invalid {column}: {e}"))))
		.transpose()
}

pub(crate) fn datetime_col(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
	let raw: String = row.try_get(column)?;
	DateTime::parse_from_rfc3339(&raw)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

pub(crate) fn bool_col(row: &SqliteRow, column: &str) -> Result<bool> {
	let raw: i64 = row.try_get(column)?;
	Ok(raw != 0)
}

pub(crate) fn enum_col<T>(row: &SqliteRow, column: &str) -> Result<T>
where
	T: FromStr<Err = String>,
{
	let raw: String = row.try_get(column)?;
	raw.parse().map_err(DbError::Internal)
}
