// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use gluru_server_auth::{AnswerId, PrincipalId, TicketId};
use gluru_server_tickets::Answer;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use crate::error::Result;
use crate::rows::{bool_col, datetime_col, uuid_col};

#[async_trait]
pub trait AnswerStore: Send + Sync {
	async fn create_answer(&self, answer: &Answer) -> Result<()>;
	async fn get_answer(&self, id: AnswerId) -> Result<Option<Answer>>;
	/// Answers of a ticket, oldest first. Private answers are included only
	/// when asked for.
	async fn list_answers(&self, ticket_id: TicketId, include_private: bool) -> Result<Vec<Answer>>;
}

#[derive(Clone)]
pub struct AnswerRepository {
	pool: SqlitePool,
}

const ANSWER_COLUMNS: &str = "id, ticket_id, body, created_by, is_private, is_deleted, created_at";

impl AnswerRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	fn row_to_answer(row: &SqliteRow) -> Result<Answer> {
		Ok(Answer {
			id: AnswerId::new(uuid_col(row, "id")?),
			ticket_id: TicketId::new(uuid_col(row, "ticket_id")?),
			body: row.try_get("body")?,
			created_by: PrincipalId::new(uuid_col(row, "created_by")?),
			is_private: bool_col(row, "is_private")?,
			is_deleted: bool_col(row, "is_deleted")?,
			created_at: datetime_col(row, "created_at")?,
		})
	}
}

#[async_trait]
impl AnswerStore for AnswerRepository {
	#[tracing::instrument(skip(self, answer), fields(answer_id = %answer.id, ticket_id = %answer.ticket_id))]
	async fn create_answer(&self, answer: &Answer) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO answers (id, ticket_id, body, created_by, is_private, is_deleted, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(answer.id.to_string())
		.bind(answer.ticket_id.to_string())
		.bind(&answer.body)
		.bind(answer.created_by.to_string())
		.bind(answer.is_private as i32)
		.bind(answer.is_deleted as i32)
		.bind(answer.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(private = answer.is_private, "answer created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(answer_id = %id))]
	async fn get_answer(&self, id: AnswerId) -> Result<Option<Answer>> {
		let row = sqlx::query(&format!("SELECT {ANSWER_COLUMNS} FROM answers WHERE id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| Self::row_to_answer(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(ticket_id = %ticket_id))]
	async fn list_answers(&self, ticket_id: TicketId, include_private: bool) -> Result<Vec<Answer>> {
		sqlx::query(&format!(
			r#"
			SELECT {ANSWER_COLUMNS} FROM answers
			WHERE ticket_id = ? AND is_deleted = 0 AND (is_private = 0 OR ?)
			ORDER BY created_at, rowid
			"#
		))
		.bind(ticket_id.to_string())
		.bind(include_private as i32)
		.fetch_all(&self.pool)
		.await?
		.iter()
		.map(Self::row_to_answer)
		.collect()
	}
}
