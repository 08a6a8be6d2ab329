// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Roles and their permission grants.
//!
//! Grants are stored once per (area, entity type, action set) and linked to
//! roles through `role_permissions`, so two roles holding the same grant
//! share a row.

use async_trait::async_trait;
use gluru_server_auth::{
	AppArea, BuiltinRole, EntityType, Permission, PermissionId, Role, RoleId, RoleRegistry,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use std::collections::HashMap;

use crate::error::{DbError, Result};
use crate::rows::{bool_col, uuid_col};

#[async_trait]
pub trait RoleStore: Send + Sync {
	async fn create_role(&self, role: &Role) -> Result<()>;
	async fn list_roles(&self) -> Result<Vec<Role>>;
	async fn load_registry(&self) -> Result<RoleRegistry>;
	/// Creates every missing built-in role with its default grants. Returns
	/// how many roles were created.
	async fn seed_builtin_roles(&self) -> Result<usize>;
}

#[derive(Clone)]
pub struct RoleRepository {
	pool: SqlitePool,
}

impl RoleRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	fn row_to_permission(row: &SqliteRow) -> Result<Permission> {
		let area: String = row.try_get("area")?;
		let entity: String = row.try_get("entity_type")?;
		let actions: String = row.try_get("actions")?;
		Ok(Permission {
			id: PermissionId::new(uuid_col(row, "permission_id")?),
			area: AppArea::parse(&area).ok_or_else(|| DbError::Internal(format!("Invalid area: {area}")))?,
			entity_type: EntityType::parse(&entity)
				.ok_or_else(|| DbError::Internal(format!("Invalid entity_type: {entity}")))?,
			actions: Permission::parse_actions(&actions).map_err(|e| DbError::Internal(e.to_string()))?,
			description: row.try_get("description")?,
		})
	}

	/// Returns the id of the stored grant equal to `permission`, inserting it
	/// when absent.
	async fn ensure_permission(tx: &mut Transaction<'_, Sqlite>, permission: &Permission) -> Result<String> {
		let actions = permission.actions_csv();
		sqlx::query(
			r#"
			INSERT INTO permissions (id, area, entity_type, actions, description)
			VALUES (?, ?, ?, ?, ?)
			ON CONFLICT(area, entity_type, actions) DO NOTHING
			"#,
		)
		.bind(permission.id.to_string())
		.bind(permission.area.to_string())
		.bind(permission.entity_type.to_string())
		.bind(&actions)
		.bind(&permission.description)
		.execute(&mut **tx)
		.await?;

		let id: String =
			sqlx::query_scalar("SELECT id FROM permissions WHERE area = ? AND entity_type = ? AND actions = ?")
				.bind(permission.area.to_string())
				.bind(permission.entity_type.to_string())
				.bind(&actions)
				.fetch_one(&mut **tx)
				.await?;
		Ok(id)
	}
}

#[async_trait]
impl RoleStore for RoleRepository {
	#[tracing::instrument(skip(self, role), fields(role_id = %role.id, role = %role.name))]
	async fn create_role(&self, role: &Role) -> Result<()> {
		let mut tx = self.pool.begin().await?;

		sqlx::query("INSERT INTO roles (id, name, company_associated) VALUES (?, ?, ?)")
			.bind(role.id.to_string())
			.bind(&role.name)
			.bind(role.company_associated as i32)
			.execute(&mut *tx)
			.await
			.map_err(|e| DbError::on_unique(e, format!("role '{}' already exists", role.name)))?;

		for permission in &role.permissions {
			let permission_id = Self::ensure_permission(&mut tx, permission).await?;
			sqlx::query("INSERT OR IGNORE INTO role_permissions (role_id, permission_id) VALUES (?, ?)")
				.bind(role.id.to_string())
				.bind(permission_id)
				.execute(&mut *tx)
				.await?;
		}

		tx.commit().await?;
		tracing::debug!(grants = role.permissions.len(), "role created");
		Ok(())
	}

	#[tracing::instrument(skip(self))]
	async fn list_roles(&self) -> Result<Vec<Role>> {
		let role_rows = sqlx::query("SELECT id, name, company_associated FROM roles ORDER BY name")
			.fetch_all(&self.pool)
			.await?;

		let grant_rows = sqlx::query(
			r#"
			SELECT rp.role_id, p.id AS permission_id, p.area, p.entity_type, p.actions, p.description
			FROM role_permissions rp
			JOIN permissions p ON p.id = rp.permission_id
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		let mut grants: HashMap<uuid::Uuid, Vec<Permission>> = HashMap::new();
		for row in &grant_rows {
			grants
				.entry(uuid_col(row, "role_id")?)
				.or_default()
				.push(Self::row_to_permission(row)?);
		}

		role_rows
			.iter()
			.map(|row| {
				let id = uuid_col(row, "id")?;
				Ok(Role {
					id: RoleId::new(id),
					name: row.try_get("name")?,
					company_associated: bool_col(row, "company_associated")?,
					permissions: grants.remove(&id).unwrap_or_default(),
				})
			})
			.collect()
	}

	#[tracing::instrument(skip(self))]
	async fn load_registry(&self) -> Result<RoleRegistry> {
		let roles = self.list_roles().await?;
		RoleRegistry::new(roles).map_err(|e| DbError::Internal(e.to_string()))
	}

	#[tracing::instrument(skip(self))]
	async fn seed_builtin_roles(&self) -> Result<usize> {
		let existing: Vec<String> = sqlx::query_scalar("SELECT name FROM roles")
			.fetch_all(&self.pool)
			.await?;

		let mut created = 0;
		for kind in BuiltinRole::all() {
			if existing.iter().any(|name| BuiltinRole::from_name(name) == Some(*kind)) {
				continue;
			}
			self.create_role(&kind.default_role()).await?;
			created += 1;
		}

		if created > 0 {
			tracing::info!(created, "seeded built-in roles");
		}
		Ok(created)
	}
}
