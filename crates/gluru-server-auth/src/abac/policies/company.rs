// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Company access policies.

use crate::abac::{Decision, ResourceAttrs, SubjectAttrs};
use crate::permission::{Action, AppArea, EntityType};

pub fn evaluate(subject: &SubjectAttrs, action: Action, resource: &ResourceAttrs) -> Decision {
	let granted = match action {
		// Superuser only; handled before policy routing.
		Action::Create | Action::Update => false,
		Action::List | Action::Retrieve | Action::AcceptInvite => true,
		Action::Invite | Action::RemoveMember | Action::Destroy => resource
			.company_id
			.is_some_and(|company| subject.company_grants(company, AppArea::Profiles, EntityType::Company, action)),
	};
	Decision::from_grant(granted)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::membership::{Membership, MembershipDirectory};
	use crate::permission::Permission;
	use crate::principal::Principal;
	use crate::role::{Role, RoleRegistry};
	use crate::types::{CompanyId, PrincipalId};

	fn admin_of(company: CompanyId) -> (RoleRegistry, MembershipDirectory, Principal) {
		let role = Role::new("admin").with_grant(Permission::new(
			AppArea::Profiles,
			EntityType::Company,
			[Action::Invite, Action::RemoveMember],
		));
		let principal = Principal::new(PrincipalId::generate(), "admin@acme.test");
		let mut memberships = MembershipDirectory::new();
		memberships
			.insert(Membership::new(principal.id, company, Some(role.id)).primary())
			.unwrap();
		(RoleRegistry::new([role]).unwrap(), memberships, principal)
	}

	#[test]
	fn create_and_update_always_denied_here() {
		let company = CompanyId::generate();
		let (roles, memberships, principal) = admin_of(company);
		let subject = SubjectAttrs::new(&principal, &roles, &memberships);
		assert!(!evaluate(&subject, Action::Create, &ResourceAttrs::companies()).is_allowed());
		assert!(!evaluate(&subject, Action::Update, &ResourceAttrs::company(company)).is_allowed());
	}

	#[test]
	fn reads_and_accept_invite_open_to_any_principal() {
		let roles = RoleRegistry::default();
		let memberships = MembershipDirectory::new();
		let principal = Principal::new(PrincipalId::generate(), "anyone@x.test");
		let subject = SubjectAttrs::new(&principal, &roles, &memberships);
		let company = ResourceAttrs::company(CompanyId::generate());

		for action in [Action::List, Action::Retrieve, Action::AcceptInvite] {
			assert!(evaluate(&subject, action, &company).is_allowed(), "{action}");
		}
	}

	#[test]
	fn member_management_requires_profiles_grant() {
		let company = CompanyId::generate();
		let (roles, memberships, principal) = admin_of(company);
		let subject = SubjectAttrs::new(&principal, &roles, &memberships);

		assert!(evaluate(&subject, Action::RemoveMember, &ResourceAttrs::company(company)).is_allowed());
		assert!(evaluate(&subject, Action::Invite, &ResourceAttrs::company(company)).is_allowed());
		assert!(!evaluate(&subject, Action::Destroy, &ResourceAttrs::company(company)).is_allowed());
		assert!(!evaluate(&subject, Action::RemoveMember, &ResourceAttrs::company(CompanyId::generate())).is_allowed());
	}
}
