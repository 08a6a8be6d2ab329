// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Company memberships and invitations.
//!
//! Authorization works against an in-memory [`MembershipDirectory`];
//! [`MembershipStore::load_directory`] builds the snapshot a request needs.
//! The one-primary-per-principal invariant is also enforced by a partial
//! unique index.

use async_trait::async_trait;
use gluru_server_auth::{
	AuthError, CompanyId, Invitation, InvitationId, Membership, MembershipDirectory, MembershipId, Principal,
	PrincipalId, RoleId,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use crate::error::{DbError, Result};
use crate::rows::{bool_col, datetime_col, opt_uuid_col, uuid_col};

#[async_trait]
pub trait MembershipStore: Send + Sync {
	async fn add_member(&self, membership: &Membership) -> Result<()>;
	async fn get_membership(&self, principal: PrincipalId, company: CompanyId) -> Result<Option<Membership>>;
	async fn get_primary_membership(&self, principal: PrincipalId) -> Result<Option<Membership>>;
	async fn list_members(&self, company: CompanyId) -> Result<Vec<Membership>>;
	async fn list_memberships_for_principal(&self, principal: PrincipalId) -> Result<Vec<Membership>>;
	/// Deletes the membership. A removed primary is not replaced.
	async fn remove_member(&self, principal: PrincipalId, company: CompanyId) -> Result<bool>;
	async fn set_primary(&self, principal: PrincipalId, company: CompanyId) -> Result<()>;
	/// Every membership of the given principals and every member of the
	/// given companies.
	async fn load_directory(
		&self,
		principals: &[PrincipalId],
		companies: &[CompanyId],
	) -> Result<MembershipDirectory>;
	async fn create_invitation(&self, invitation: &Invitation) -> Result<()>;
	async fn get_invitation(&self, id: InvitationId) -> Result<Option<Invitation>>;
	async fn get_invitation_by_key(&self, key: &str) -> Result<Option<Invitation>>;
	/// Validates and accepts an invitation, storing the new membership and the
	/// accepted flag in one transaction.
	async fn accept_invitation(&self, principal: &Principal, key: &str) -> Result<Membership>;
}

#[derive(Clone)]
pub struct MembershipRepository {
	pool: SqlitePool,
}

const MEMBERSHIP_COLUMNS: &str = "id, principal_id, company_id, role_id, is_primary, receive_notification, joined_at";
const INVITATION_COLUMNS: &str =
	"id, email, company_id, invited_by, role_id, activation_key, is_accepted, created_at";

impl MembershipRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	fn row_to_membership(row: &SqliteRow) -> Result<Membership> {
		Ok(Membership {
			id: MembershipId::new(uuid_col(row, "id")?),
			principal_id: PrincipalId::new(uuid_col(row, "principal_id")?),
			company_id: CompanyId::new(uuid_col(row, "company_id")?),
			role_id: opt_uuid_col(row, "role_id")?.map(RoleId::new),
			is_primary: bool_col(row, "is_primary")?,
			receive_notification: bool_col(row, "receive_notification")?,
			joined_at: datetime_col(row, "joined_at")?,
		})
	}

	fn row_to_invitation(row: &SqliteRow) -> Result<Invitation> {
		Ok(Invitation {
			id: InvitationId::new(uuid_col(row, "id")?),
			email: row.try_get("email")?,
			company_id: CompanyId::new(uuid_col(row, "company_id")?),
			invited_by: PrincipalId::new(uuid_col(row, "invited_by")?),
			role_id: opt_uuid_col(row, "role_id")?.map(RoleId::new),
			activation_key: row.try_get("activation_key")?,
			is_accepted: bool_col(row, "is_accepted")?,
			created_at: datetime_col(row, "created_at")?,
		})
	}

	async fn insert_membership<'e, E>(executor: E, membership: &Membership) -> Result<()>
	where
		E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
	{
		sqlx::query(
			r#"
			INSERT INTO memberships (id, principal_id, company_id, role_id, is_primary, receive_notification, joined_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(membership.id.to_string())
		.bind(membership.principal_id.to_string())
		.bind(membership.company_id.to_string())
		.bind(membership.role_id.map(|r| r.to_string()))
		.bind(membership.is_primary as i32)
		.bind(membership.receive_notification as i32)
		.bind(membership.joined_at.to_rfc3339())
		.execute(executor)
		.await
		.map_err(|e| {
			DbError::on_unique(
				e,
				format!(
					"principal {} already belongs to company {} or already has a primary membership",
					membership.principal_id, membership.company_id
				),
			)
		})?;
		Ok(())
	}
}

#[async_trait]
impl MembershipStore for MembershipRepository {
	#[tracing::instrument(skip(self, membership), fields(principal_id = %membership.principal_id, company_id = %membership.company_id))]
	async fn add_member(&self, membership: &Membership) -> Result<()> {
		Self::insert_membership(&self.pool, membership).await?;
		tracing::debug!(primary = membership.is_primary, "member added");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(principal_id = %principal, company_id = %company))]
	async fn get_membership(&self, principal: PrincipalId, company: CompanyId) -> Result<Option<Membership>> {
		let row = sqlx::query(&format!(
			"SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE principal_id = ? AND company_id = ?"
		))
		.bind(principal.to_string())
		.bind(company.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| Self::row_to_membership(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(principal_id = %principal))]
	async fn get_primary_membership(&self, principal: PrincipalId) -> Result<Option<Membership>> {
		let row = sqlx::query(&format!(
			"SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE principal_id = ? AND is_primary = 1"
		))
		.bind(principal.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| Self::row_to_membership(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(company_id = %company))]
	async fn list_members(&self, company: CompanyId) -> Result<Vec<Membership>> {
		sqlx::query(&format!(
			"SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE company_id = ? ORDER BY joined_at"
		))
		.bind(company.to_string())
		.fetch_all(&self.pool)
		.await?
		.iter()
		.map(Self::row_to_membership)
		.collect()
	}

	#[tracing::instrument(skip(self), fields(principal_id = %principal))]
	async fn list_memberships_for_principal(&self, principal: PrincipalId) -> Result<Vec<Membership>> {
		sqlx::query(&format!(
			"SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE principal_id = ? ORDER BY joined_at"
		))
		.bind(principal.to_string())
		.fetch_all(&self.pool)
		.await?
		.iter()
		.map(Self::row_to_membership)
		.collect()
	}

	#[tracing::instrument(skip(self), fields(principal_id = %principal, company_id = %company))]
	async fn remove_member(&self, principal: PrincipalId, company: CompanyId) -> Result<bool> {
		let result = sqlx::query("DELETE FROM memberships WHERE principal_id = ? AND company_id = ?")
			.bind(principal.to_string())
			.bind(company.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	#[tracing::instrument(skip(self), fields(principal_id = %principal, company_id = %company))]
	async fn set_primary(&self, principal: PrincipalId, company: CompanyId) -> Result<()> {
		let mut tx = self.pool.begin().await?;

		sqlx::query("UPDATE memberships SET is_primary = 0 WHERE principal_id = ?")
			.bind(principal.to_string())
			.execute(&mut *tx)
			.await?;

		let result = sqlx::query("UPDATE memberships SET is_primary = 1 WHERE principal_id = ? AND company_id = ?")
			.bind(principal.to_string())
			.bind(company.to_string())
			.execute(&mut *tx)
			.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("membership of {principal} in {company}")));
		}

		tx.commit().await?;
		Ok(())
	}

	#[tracing::instrument(skip(self, principals, companies), fields(principals = principals.len(), companies = companies.len()))]
	async fn load_directory(
		&self,
		principals: &[PrincipalId],
		companies: &[CompanyId],
	) -> Result<MembershipDirectory> {
		let mut clauses = Vec::new();
		if !principals.is_empty() {
			clauses.push(format!("principal_id IN ({})", vec!["?"; principals.len()].join(", ")));
		}
		if !companies.is_empty() {
			clauses.push(format!("company_id IN ({})", vec!["?"; companies.len()].join(", ")));
		}
		if clauses.is_empty() {
			return Ok(MembershipDirectory::new());
		}

		let sql = format!(
			"SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE {}",
			clauses.join(" OR ")
		);
		let mut query = sqlx::query(&sql);
		for id in principals {
			query = query.bind(id.to_string());
		}
		for id in companies {
			query = query.bind(id.to_string());
		}

		let memberships = query
			.fetch_all(&self.pool)
			.await?
			.iter()
			.map(Self::row_to_membership)
			.collect::<Result<Vec<_>>>()?;

		MembershipDirectory::from_memberships(memberships).map_err(|e| DbError::Internal(e.to_string()))
	}

	#[tracing::instrument(skip(self, invitation), fields(invitation_id = %invitation.id, company_id = %invitation.company_id))]
	async fn create_invitation(&self, invitation: &Invitation) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO invitations (id, email, company_id, invited_by, role_id, activation_key, is_accepted, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(invitation.id.to_string())
		.bind(&invitation.email)
		.bind(invitation.company_id.to_string())
		.bind(invitation.invited_by.to_string())
		.bind(invitation.role_id.map(|r| r.to_string()))
		.bind(&invitation.activation_key)
		.bind(invitation.is_accepted as i32)
		.bind(invitation.created_at.to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| DbError::on_unique(e, "activation key already in use"))?;

		tracing::debug!("invitation created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(invitation_id = %id))]
	async fn get_invitation(&self, id: InvitationId) -> Result<Option<Invitation>> {
		let row = sqlx::query(&format!("SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| Self::row_to_invitation(&r)).transpose()
	}

	#[tracing::instrument(skip(self, key))]
	async fn get_invitation_by_key(&self, key: &str) -> Result<Option<Invitation>> {
		let row = sqlx::query(&format!(
			"SELECT {INVITATION_COLUMNS} FROM invitations WHERE activation_key = ?"
		))
		.bind(key)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| Self::row_to_invitation(&r)).transpose()
	}

	#[tracing::instrument(skip(self, principal, key), fields(principal_id = %principal.id))]
	async fn accept_invitation(&self, principal: &Principal, key: &str) -> Result<Membership> {
		let mut invitation = self
			.get_invitation_by_key(key)
			.await?
			.ok_or_else(|| DbError::NotFound("invitation".to_string()))?;

		let mut directory = MembershipDirectory::from_memberships(
			self.list_memberships_for_principal(principal.id).await?,
		)
		.map_err(|e| DbError::Internal(e.to_string()))?;

		let membership = directory.accept_invitation(principal, &mut invitation, key)?;

		let mut tx = self.pool.begin().await?;
		Self::insert_membership(&mut *tx, &membership).await?;

		let result = sqlx::query("UPDATE invitations SET is_accepted = 1 WHERE id = ? AND is_accepted = 0")
			.bind(invitation.id.to_string())
			.execute(&mut *tx)
			.await?;
		if result.rows_affected() == 0 {
			return Err(AuthError::InvitationInvalid("invitation was already accepted".to_string()).into());
		}

		tx.commit().await?;
		Ok(membership)
	}
}
