// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ticket access policies.

use crate::abac::{Decision, ResourceAttrs, SubjectAttrs};
use crate::permission::{Action, AppArea, EntityType};

pub fn evaluate(subject: &SubjectAttrs, action: Action, resource: &ResourceAttrs) -> Decision {
	if resource.is_collection {
		return evaluate_collection(subject, action, resource);
	}

	let granted = match resource.company_id {
		None => match action {
			Action::List | Action::Retrieve => true,
			Action::Update | Action::Destroy => resource.is_created_by(subject.id()),
			_ => false,
		},
		Some(company) => subject.company_grants(company, AppArea::Tickets, EntityType::Ticket, action),
	};
	Decision::from_grant(granted)
}

fn evaluate_collection(subject: &SubjectAttrs, action: Action, resource: &ResourceAttrs) -> Decision {
	let granted = match action {
		Action::List => true,
		Action::Create => match resource.company_id {
			None => true,
			Some(company) => {
				subject.company_grants(company, AppArea::Tickets, EntityType::Ticket, Action::Create)
			}
		},
		_ => false,
	};
	Decision::from_grant(granted)
}
