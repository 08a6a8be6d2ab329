// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Answer access policies. Answers inherit company and ownership from their ticket.

use crate::abac::{Decision, ResourceAttrs, SubjectAttrs};
use crate::permission::{Action, AppArea};

pub fn evaluate(subject: &SubjectAttrs, action: Action, resource: &ResourceAttrs) -> Decision {
	let granted = match resource.company_id {
		None => {
			action.is_read()
				|| resource.is_created_by(subject.id())
				|| resource.is_owned_by(subject.id())
		}
		Some(company) => subject.company_grants(
			company,
			AppArea::Tickets,
			resource.permission_entity(action),
			action,
		),
	};
	Decision::from_grant(granted)
}
