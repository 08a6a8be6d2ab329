// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gluru_server_db::{
	AnswerRepository, IdentityRepository, MembershipRepository, RoleRepository, SqlitePool,
	SubscriptionRepository, TicketRepository,
};

/// Every repository over one pool.
#[derive(Clone)]
pub struct Stores {
	pub identity: IdentityRepository,
	pub roles: RoleRepository,
	pub memberships: MembershipRepository,
	pub tickets: TicketRepository,
	pub answers: AnswerRepository,
	pub subscriptions: SubscriptionRepository,
}

impl Stores {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			identity: IdentityRepository::new(pool.clone()),
			roles: RoleRepository::new(pool.clone()),
			memberships: MembershipRepository::new(pool.clone()),
			tickets: TicketRepository::new(pool.clone()),
			answers: AnswerRepository::new(pool.clone()),
			subscriptions: SubscriptionRepository::new(pool),
		}
	}
}
