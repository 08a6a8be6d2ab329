// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Principals and companies.
//!
//! [`IdentityRepository`] is also the production [`IdentityLookup`] and
//! [`DirectoryLookup`]: mention handles resolve to active staff only.

use async_trait::async_trait;
use chrono::Utc;
use gluru_server_auth::{
	AuthError, Company, CompanyId, DirectoryLookup, IdentityLookup, Principal, PrincipalId, SupportPlan,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use crate::error::{DbError, Result};
use crate::rows::{bool_col, uuid_col};

#[async_trait]
pub trait IdentityStore: Send + Sync {
	async fn create_principal(&self, principal: &Principal) -> Result<()>;
	async fn update_principal(&self, principal: &Principal) -> Result<()>;
	async fn get_principal_by_id(&self, id: PrincipalId) -> Result<Option<Principal>>;
	async fn get_principal_by_email(&self, email: &str) -> Result<Option<Principal>>;
	async fn get_staff_by_handle(&self, handle: &str) -> Result<Option<Principal>>;
	async fn list_principals(&self, ids: &[PrincipalId]) -> Result<Vec<Principal>>;
	async fn create_company(&self, company: &Company) -> Result<()>;
	async fn get_company_by_id(&self, id: CompanyId) -> Result<Option<Company>>;
}

#[derive(Clone)]
pub struct IdentityRepository {
	pool: SqlitePool,
}

impl IdentityRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	fn row_to_principal(row: &SqliteRow) -> Result<Principal> {
		Ok(Principal {
			id: PrincipalId::new(uuid_col(row, "id")?),
			email: row.try_get("email")?,
			first_name: row.try_get("first_name")?,
			last_name: row.try_get("last_name")?,
			phone_number: row.try_get("phone_number")?,
			handle: row.try_get("handle")?,
			is_active: bool_col(row, "is_active")?,
			is_staff: bool_col(row, "is_staff")?,
			is_superuser: bool_col(row, "is_superuser")?,
		})
	}

	fn row_to_company(row: &SqliteRow) -> Result<Company> {
		let plan: String = row.try_get("support_plan")?;
		let support_plan = SupportPlan::parse(&plan)
			.ok_or_else(|| DbError::Internal(format!("Invalid support_plan: {plan}")))?;
		Ok(Company {
			id: CompanyId::new(uuid_col(row, "id")?),
			name: row.try_get("name")?,
			support_plan,
		})
	}
}

const PRINCIPAL_COLUMNS: &str =
	"id, email, first_name, last_name, phone_number, handle, is_active, is_staff, is_superuser";

#[async_trait]
impl IdentityStore for IdentityRepository {
	#[tracing::instrument(skip(self, principal), fields(principal_id = %principal.id))]
	async fn create_principal(&self, principal: &Principal) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO principals (id, email, first_name, last_name, phone_number, handle, is_active, is_staff, is_superuser, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(principal.id.to_string())
		.bind(&principal.email)
		.bind(&principal.first_name)
		.bind(&principal.last_name)
		.bind(&principal.phone_number)
		.bind(&principal.handle)
		.bind(principal.is_active as i32)
		.bind(principal.is_staff as i32)
		.bind(principal.is_superuser as i32)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| DbError::on_unique(e, format!("principal with email {} already exists", principal.email)))?;

		tracing::debug!(principal_id = %principal.id, "principal created");
		Ok(())
	}

	#[tracing::instrument(skip(self, principal), fields(principal_id = %principal.id))]
	async fn update_principal(&self, principal: &Principal) -> Result<()> {
		let result = sqlx::query(
			r#"
			UPDATE principals
			SET email = ?, first_name = ?, last_name = ?, phone_number = ?, handle = ?,
				is_active = ?, is_staff = ?, is_superuser = ?
			WHERE id = ?
			"#,
		)
		.bind(&principal.email)
		.bind(&principal.first_name)
		.bind(&principal.last_name)
		.bind(&principal.phone_number)
		.bind(&principal.handle)
		.bind(principal.is_active as i32)
		.bind(principal.is_staff as i32)
		.bind(principal.is_superuser as i32)
		.bind(principal.id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("principal {}", principal.id)));
		}
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(principal_id = %id))]
	async fn get_principal_by_id(&self, id: PrincipalId) -> Result<Option<Principal>> {
		let row = sqlx::query(&format!("SELECT {PRINCIPAL_COLUMNS} FROM principals WHERE id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| Self::row_to_principal(&r)).transpose()
	}

	#[tracing::instrument(skip(self))]
	async fn get_principal_by_email(&self, email: &str) -> Result<Option<Principal>> {
		let row = sqlx::query(&format!("SELECT {PRINCIPAL_COLUMNS} FROM principals WHERE email = ?"))
			.bind(email)
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| Self::row_to_principal(&r)).transpose()
	}

	#[tracing::instrument(skip(self))]
	async fn get_staff_by_handle(&self, handle: &str) -> Result<Option<Principal>> {
		let row = sqlx::query(&format!(
			"SELECT {PRINCIPAL_COLUMNS} FROM principals WHERE handle = ? AND is_staff = 1 AND is_active = 1"
		))
		.bind(handle)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| Self::row_to_principal(&r)).transpose()
	}

	#[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
	async fn list_principals(&self, ids: &[PrincipalId]) -> Result<Vec<Principal>> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let placeholders = vec!["?"; ids.len()].join(", ");
		let sql = format!("SELECT {PRINCIPAL_COLUMNS} FROM principals WHERE id IN ({placeholders})");
		let mut query = sqlx::query(&sql);
		for id in ids {
			query = query.bind(id.to_string());
		}

		query
			.fetch_all(&self.pool)
			.await?
			.iter()
			.map(Self::row_to_principal)
			.collect()
	}

	#[tracing::instrument(skip(self, company), fields(company_id = %company.id))]
	async fn create_company(&self, company: &Company) -> Result<()> {
		sqlx::query("INSERT INTO companies (id, name, support_plan, created_at) VALUES (?, ?, ?, ?)")
			.bind(company.id.to_string())
			.bind(&company.name)
			.bind(company.support_plan.to_string())
			.bind(Utc::now().to_rfc3339())
			.execute(&self.pool)
			.await?;

		tracing::debug!(company_id = %company.id, "company created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(company_id = %id))]
	async fn get_company_by_id(&self, id: CompanyId) -> Result<Option<Company>> {
		let row = sqlx::query("SELECT id, name, support_plan FROM companies WHERE id = ?")
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| Self::row_to_company(&r)).transpose()
	}
}

#[async_trait]
impl IdentityLookup for IdentityRepository {
	async fn fetch_principal(&self, id: PrincipalId) -> std::result::Result<Principal, AuthError> {
		self
			.get_principal_by_id(id)
			.await?
			.ok_or_else(|| AuthError::NotFound(format!("principal {id}")))
	}

	async fn fetch_company(&self, id: CompanyId) -> std::result::Result<Company, AuthError> {
		self
			.get_company_by_id(id)
			.await?
			.ok_or_else(|| AuthError::NotFound(format!("company {id}")))
	}
}

#[async_trait]
impl DirectoryLookup for IdentityRepository {
	async fn resolve_mention(&self, handle: &str) -> std::result::Result<Option<Principal>, AuthError> {
		Ok(self.get_staff_by_handle(handle).await?)
	}
}
