// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tickets and their change history.
//!
//! A ticket update and the history rows describing it are written in one
//! transaction: either both are visible or neither is.

use async_trait::async_trait;
use gluru_server_auth::{CompanyId, PrincipalId, TicketId};
use gluru_server_tickets::{IssueType, Ticket, TicketHistory, TicketStatus};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use crate::error::{DbError, Result};
use crate::rows::{bool_col, datetime_col, enum_col, opt_uuid_col, uuid_col};

#[async_trait]
pub trait TicketStore: Send + Sync {
	async fn create_ticket(&self, ticket: &Ticket) -> Result<()>;
	async fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>>;
	/// Stores `ticket` and appends `history`, atomically.
	async fn update_ticket(&self, ticket: &Ticket, history: &[TicketHistory]) -> Result<()>;
	async fn list_history(&self, ticket_id: TicketId) -> Result<Vec<TicketHistory>>;
	async fn list_company_tickets(&self, company: CompanyId) -> Result<Vec<Ticket>>;
	/// Open, urgent, not deleted tickets nobody has started on.
	async fn list_reminder_candidates(&self) -> Result<Vec<Ticket>>;
}

#[derive(Clone)]
pub struct TicketRepository {
	pool: SqlitePool,
}

const TICKET_COLUMNS: &str = "id, title, body, category, issue_type, status, company_id, created_by, \
	created_for, assignee, is_deleted, created_at, updated_at";

impl TicketRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	fn row_to_ticket(row: &SqliteRow) -> Result<Ticket> {
		Ok(Ticket {
			id: TicketId::new(uuid_col(row, "id")?),
			title: row.try_get("title")?,
			body: row.try_get("body")?,
			category: row.try_get("category")?,
			issue_type: enum_col(row, "issue_type")?,
			status: enum_col(row, "status")?,
			company_id: opt_uuid_col(row, "company_id")?.map(CompanyId::new),
			created_by: PrincipalId::new(uuid_col(row, "created_by")?),
			created_for: opt_uuid_col(row, "created_for")?.map(PrincipalId::new),
			assignee: opt_uuid_col(row, "assignee")?.map(PrincipalId::new),
			is_deleted: bool_col(row, "is_deleted")?,
			created_at: datetime_col(row, "created_at")?,
			updated_at: datetime_col(row, "updated_at")?,
		})
	}

	fn row_to_history(row: &SqliteRow) -> Result<TicketHistory> {
		Ok(TicketHistory {
			id: gluru_server_tickets::HistoryId(uuid_col(row, "id")?),
			ticket_id: TicketId::new(uuid_col(row, "ticket_id")?),
			changed_by: PrincipalId::new(uuid_col(row, "changed_by")?),
			field: enum_col(row, "field")?,
			before_value: row.try_get("before_value")?,
			after_value: row.try_get("after_value")?,
			created_at: datetime_col(row, "created_at")?,
		})
	}
}

#[async_trait]
impl TicketStore for TicketRepository {
	#[tracing::instrument(skip(self, ticket), fields(ticket_id = %ticket.id, issue_type = %ticket.issue_type))]
	async fn create_ticket(&self, ticket: &Ticket) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO tickets (id, title, body, category, issue_type, status, company_id, created_by,
				created_for, assignee, is_deleted, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(ticket.id.to_string())
		.bind(&ticket.title)
		.bind(&ticket.body)
		.bind(&ticket.category)
		.bind(ticket.issue_type.to_string())
		.bind(ticket.status.to_string())
		.bind(ticket.company_id.map(|c| c.to_string()))
		.bind(ticket.created_by.to_string())
		.bind(ticket.created_for.map(|p| p.to_string()))
		.bind(ticket.assignee.map(|p| p.to_string()))
		.bind(ticket.is_deleted as i32)
		.bind(ticket.created_at.to_rfc3339())
		.bind(ticket.updated_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!("ticket created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(ticket_id = %id))]
	async fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>> {
		let row = sqlx::query(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| Self::row_to_ticket(&r)).transpose()
	}

	#[tracing::instrument(skip(self, ticket, history), fields(ticket_id = %ticket.id, changes = history.len()))]
	async fn update_ticket(&self, ticket: &Ticket, history: &[TicketHistory]) -> Result<()> {
		let mut tx = self.pool.begin().await?;

		let result = sqlx::query(
			r#"
			UPDATE tickets
			SET title = ?, body = ?, category = ?, issue_type = ?, status = ?, company_id = ?,
				created_for = ?, assignee = ?, is_deleted = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&ticket.title)
		.bind(&ticket.body)
		.bind(&ticket.category)
		.bind(ticket.issue_type.to_string())
		.bind(ticket.status.to_string())
		.bind(ticket.company_id.map(|c| c.to_string()))
		.bind(ticket.created_for.map(|p| p.to_string()))
		.bind(ticket.assignee.map(|p| p.to_string()))
		.bind(ticket.is_deleted as i32)
		.bind(ticket.updated_at.to_rfc3339())
		.bind(ticket.id.to_string())
		.execute(&mut *tx)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("ticket {}", ticket.id)));
		}

		for row in history {
			sqlx::query(
				r#"
				INSERT INTO ticket_history (id, ticket_id, changed_by, field, before_value, after_value, created_at)
				VALUES (?, ?, ?, ?, ?, ?, ?)
				"#,
			)
			.bind(row.id.to_string())
			.bind(row.ticket_id.to_string())
			.bind(row.changed_by.to_string())
			.bind(row.field.to_string())
			.bind(&row.before_value)
			.bind(&row.after_value)
			.bind(row.created_at.to_rfc3339())
			.execute(&mut *tx)
			.await?;
		}

		tx.commit().await?;
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(ticket_id = %ticket_id))]
	async fn list_history(&self, ticket_id: TicketId) -> Result<Vec<TicketHistory>> {
		sqlx::query(
			r#"
			SELECT id, ticket_id, changed_by, field, before_value, after_value, created_at
			FROM ticket_history
			WHERE ticket_id = ?
			ORDER BY created_at, rowid
			"#,
		)
		.bind(ticket_id.to_string())
		.fetch_all(&self.pool)
		.await?
		.iter()
		.map(Self::row_to_history)
		.collect()
	}

	#[tracing::instrument(skip(self), fields(company_id = %company))]
	async fn list_company_tickets(&self, company: CompanyId) -> Result<Vec<Ticket>> {
		sqlx::query(&format!(
			"SELECT {TICKET_COLUMNS} FROM tickets WHERE company_id = ? AND is_deleted = 0 ORDER BY created_at DESC"
		))
		.bind(company.to_string())
		.fetch_all(&self.pool)
		.await?
		.iter()
		.map(Self::row_to_ticket)
		.collect()
	}

	#[tracing::instrument(skip(self))]
	async fn list_reminder_candidates(&self) -> Result<Vec<Ticket>> {
		let urgent: Vec<String> = IssueType::all()
			.iter()
			.filter(|t| t.is_urgent())
			.map(ToString::to_string)
			.collect();
		let statuses = [TicketStatus::Submitted.to_string(), TicketStatus::Assigned.to_string()];

		let sql = format!(
			"SELECT {TICKET_COLUMNS} FROM tickets WHERE is_deleted = 0 AND status IN (?, ?) AND issue_type IN ({}) ORDER BY updated_at",
			vec!["?"; urgent.len()].join(", ")
		);
		let mut query = sqlx::query(&sql);
		for value in statuses.iter().chain(urgent.iter()) {
			query = query.bind(value);
		}

		query
			.fetch_all(&self.pool)
			.await?
			.iter()
			.map(Self::row_to_ticket)
			.collect()
	}
}
