// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use gluru_server_auth::{PrincipalId, TicketId};
use gluru_server_tickets::TicketSubscription;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use crate::error::Result;
use crate::rows::{bool_col, datetime_col, uuid_col};

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
	/// Inserts or replaces the (ticket, principal) subscription.
	async fn upsert_subscription(&self, subscription: &TicketSubscription) -> Result<()>;
	async fn list_subscriptions(&self, ticket_id: TicketId) -> Result<Vec<TicketSubscription>>;
}

#[derive(Clone)]
pub struct SubscriptionRepository {
	pool: SqlitePool,
}

impl SubscriptionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	fn row_to_subscription(row: &SqliteRow) -> Result<TicketSubscription> {
		Ok(TicketSubscription {
			ticket_id: TicketId::new(uuid_col(row, "ticket_id")?),
			principal_id: PrincipalId::new(uuid_col(row, "principal_id")?),
			is_subscribed: bool_col(row, "is_subscribed")?,
			updated_at: datetime_col(row, "updated_at")?,
		})
	}
}

#[async_trait]
impl SubscriptionStore for SubscriptionRepository {
	#[tracing::instrument(skip(self, subscription), fields(ticket_id = %subscription.ticket_id, principal_id = %subscription.principal_id))]
	async fn upsert_subscription(&self, subscription: &TicketSubscription) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO ticket_subscriptions (ticket_id, principal_id, is_subscribed, updated_at)
			VALUES (?, ?, ?, ?)
			ON CONFLICT(ticket_id, principal_id) DO UPDATE SET
				is_subscribed = excluded.is_subscribed,
				updated_at = excluded.updated_at
			"#,
		)
		.bind(subscription.ticket_id.to_string())
		.bind(subscription.principal_id.to_string())
		.bind(subscription.is_subscribed as i32)
		.bind(subscription.updated_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self), fields(ticket_id = %ticket_id))]
	async fn list_subscriptions(&self, ticket_id: TicketId) -> Result<Vec<TicketSubscription>> {
		sqlx::query(
			"SELECT ticket_id, principal_id, is_subscribed, updated_at FROM ticket_subscriptions WHERE ticket_id = ?",
		)
		.bind(ticket_id.to_string())
		.fetch_all(&self.pool)
		.await?
		.iter()
		.map(Self::row_to_subscription)
		.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_test_pool, insert_test_principal};
	use crate::ticket::{TicketRepository, TicketStore};
	use gluru_server_tickets::{active_subscribers, IssueType, Ticket};

	#[tokio::test]
	async fn test_resubscribe_flips_single_row() {
		let pool = create_test_pool().await;
		let repo = SubscriptionRepository::new(pool.clone());
		let p = insert_test_principal(&pool, "p@acme.com").await;
		let ticket = Ticket::new("t", "b", IssueType::Minor, p.id);
		TicketRepository::new(pool.clone()).create_ticket(&ticket).await.unwrap();

		repo.upsert_subscription(&TicketSubscription::subscribe(ticket.id, p.id))
			.await
			.unwrap();
		repo.upsert_subscription(&TicketSubscription::unsubscribe(ticket.id, p.id))
			.await
			.unwrap();

		let stored = repo.list_subscriptions(ticket.id).await.unwrap();
		assert_eq!(stored.len(), 1);
		assert!(active_subscribers(ticket.id, &stored).is_empty());

		repo.upsert_subscription(&TicketSubscription::subscribe(ticket.id, p.id))
			.await
			.unwrap();
		let stored = repo.list_subscriptions(ticket.id).await.unwrap();
		assert!(active_subscribers(ticket.id, &stored).contains(&p.id));
	}
}
