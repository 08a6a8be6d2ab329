// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use gluru_server_auth::{PrincipalId, TicketId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A principal's opt-in or opt-out for answer notifications on one ticket.
///
/// Unique on (ticket, principal); subscribing again flips `is_subscribed` back
/// rather than adding a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSubscription {
	pub ticket_id: TicketId,
	pub principal_id: PrincipalId,
	pub is_subscribed: bool,
	pub updated_at: DateTime<Utc>,
}

impl TicketSubscription {
	pub fn subscribe(ticket_id: TicketId, principal_id: PrincipalId) -> Self {
		Self {
			ticket_id,
			principal_id,
			is_subscribed: true,
			updated_at: Utc::now(),
		}
	}

	pub fn unsubscribe(ticket_id: TicketId, principal_id: PrincipalId) -> Self {
		Self {
			is_subscribed: false,
			..Self::subscribe(ticket_id, principal_id)
		}
	}
}

/// Principals currently subscribed to `ticket_id`.
pub fn active_subscribers<'a>(
	ticket_id: TicketId,
	subscriptions: impl IntoIterator<Item = &'a TicketSubscription>,
) -> BTreeSet<PrincipalId> {
	subscriptions
		.into_iter()
		.filter(|s| s.ticket_id == ticket_id && s.is_subscribed)
		.map(|s| s.principal_id)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unsubscribed_and_other_tickets_excluded() {
		let ticket = TicketId::generate();
		let (a, b, c) = (PrincipalId::generate(), PrincipalId::generate(), PrincipalId::generate());
		let subs = [
			TicketSubscription::subscribe(ticket, a),
			TicketSubscription::unsubscribe(ticket, b),
			TicketSubscription::subscribe(TicketId::generate(), c),
		];

		assert_eq!(active_subscribers(ticket, &subs), BTreeSet::from([a]));
	}
}
