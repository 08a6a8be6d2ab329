// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Info taxonomy policies: read by anyone, written by superusers.

use crate::abac::{Decision, ResourceAttrs, SubjectAttrs};
use crate::permission::Action;

pub fn evaluate(_subject: &SubjectAttrs, action: Action, _resource: &ResourceAttrs) -> Decision {
	Decision::from_grant(action.is_read())
}
