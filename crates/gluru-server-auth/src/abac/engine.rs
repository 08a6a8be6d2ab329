// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization decision function.
//!
//! [`authorize`] evaluates in three phases:
//!
//! 1. **Authentication**: a missing or inactive principal may only read public resources
//! 2. **Global flags**: superusers are always allowed, staff defer to the `staff` role
//! 3. **Entity policy**: membership and ownership rules per entity type
//!
//! Creation requests carrying a `created_for` principal are additionally
//! checked by [`validate_created_for`], after authorization succeeds.

use super::policies::{answer, company, info, ticket};
use super::types::{Decision, DenyReason, ResourceAttrs, SubjectAttrs};
use crate::error::AuthError;
use crate::membership::MembershipResolver;
use crate::permission::{Action, EntityType};
use crate::principal::Principal;
use crate::role::RoleRegistry;
use crate::types::{CompanyId, PrincipalId};
use tracing::instrument;

/// Decides whether `principal` may perform `action` on `resource`.
///
/// `None` stands for an unauthenticated request. Denials carry the reason so
/// callers can tell 'log in first' from 'not allowed'.
#[instrument(
	level = "debug",
	skip(roles, memberships, principal, resource),
	fields(
		principal_id = ?principal.map(|p| p.id),
		action = %action,
		entity_type = %resource.entity_type,
		decision = tracing::field::Empty,
	)
)]
pub fn authorize(
	roles: &RoleRegistry,
	memberships: &dyn MembershipResolver,
	principal: Option<&Principal>,
	action: Action,
	resource: &ResourceAttrs,
) -> Decision {
	let decision = match principal.filter(|p| p.is_active) {
		None => evaluate_anonymous(action, resource),
		Some(principal) => {
			let subject = SubjectAttrs::new(principal, roles, memberships);
			check_global_flags(&subject, action, resource)
				.unwrap_or_else(|| route_policy(&subject, action, resource))
		}
	};

	tracing::Span::current().record("decision", tracing::field::debug(&decision));
	decision
}

/// Convenience wrapper returning the caller-facing error on denial.
pub fn require(
	roles: &RoleRegistry,
	memberships: &dyn MembershipResolver,
	principal: Option<&Principal>,
	action: Action,
	resource: &ResourceAttrs,
) -> Result<(), AuthError> {
	authorize(roles, memberships, principal, action, resource).into_result(action, resource.entity_type)
}

fn evaluate_anonymous(action: Action, resource: &ResourceAttrs) -> Decision {
	let public = match resource.entity_type {
		EntityType::Ticket => resource.is_collection || resource.company_id.is_none(),
		EntityType::Answer => resource.company_id.is_none(),
		entity => entity.is_info(),
	};

	if action.is_read() && public {
		Decision::Allow
	} else {
		Decision::Deny(DenyReason::Unauthenticated)
	}
}

fn check_global_flags(subject: &SubjectAttrs, action: Action, resource: &ResourceAttrs) -> Option<Decision> {
	if subject.principal.is_superuser {
		return Some(Decision::Allow);
	}

	if subject.principal.is_staff {
		let entity_type = resource.permission_entity(action);
		let granted = subject
			.roles
			.staff_role()
			.is_some_and(|role| role.has_permission(entity_type.area(), entity_type, action));
		return Some(Decision::from_grant(granted));
	}

	None
}

fn route_policy(subject: &SubjectAttrs, action: Action, resource: &ResourceAttrs) -> Decision {
	match resource.entity_type {
		EntityType::Ticket => ticket::evaluate(subject, action, resource),
		EntityType::Answer => answer::evaluate(subject, action, resource),
		EntityType::Company => company::evaluate(subject, action, resource),
		EntityType::Server
		| EntityType::OperatingSystem
		| EntityType::Product
		| EntityType::Category
		| EntityType::IssueType => info::evaluate(subject, action, resource),
	}
}

/// Checks that a ticket opened on behalf of `created_for` targets one of
/// their companies. Fails with `ValidationFailed`, never a permission error.
pub fn validate_created_for(
	memberships: &dyn MembershipResolver,
	company: Option<CompanyId>,
	created_for: Option<PrincipalId>,
) -> Result<(), AuthError> {
	let (Some(company), Some(created_for)) = (company, created_for) else {
		return Ok(());
	};

	if memberships.resolve(created_for, company).is_some() {
		Ok(())
	} else {
		Err(AuthError::ValidationFailed(format!(
			"principal {created_for} is not a member of company {company}"
		)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::membership::{Membership, MembershipDirectory};
	use crate::permission::{AppArea, Permission};
	use crate::role::Role;

	fn principal(email: &str) -> Principal {
		Principal::new(PrincipalId::generate(), email)
	}

	fn staff_registry(grants: impl IntoIterator<Item = Permission>) -> RoleRegistry {
		let staff = grants
			.into_iter()
			.fold(Role::new("staff").not_company_associated(), Role::with_grant);
		RoleRegistry::new([staff]).unwrap()
	}

	mod anonymous {
		use super::*;

		#[test]
		fn reads_public_resources() {
			let roles = RoleRegistry::default();
			let memberships = MembershipDirectory::new();
			let creator = PrincipalId::generate();

			let cases = [
				ResourceAttrs::tickets(),
				ResourceAttrs::ticket(None, creator, None),
				ResourceAttrs::answer(None, creator, None),
				ResourceAttrs::info(EntityType::Category),
			];
			for resource in cases {
				assert_eq!(
					authorize(&roles, &memberships, None, Action::Retrieve, &resource),
					Decision::Allow,
					"{resource:?}"
				);
			}
		}

		#[test]
		fn denied_everything_else() {
			let roles = RoleRegistry::default();
			let memberships = MembershipDirectory::new();
			let unauth = Decision::Deny(DenyReason::Unauthenticated);

			let company_ticket = ResourceAttrs::ticket(Some(CompanyId::generate()), PrincipalId::generate(), None);
			assert_eq!(authorize(&roles, &memberships, None, Action::Retrieve, &company_ticket), unauth);
			assert_eq!(authorize(&roles, &memberships, None, Action::Create, &ResourceAttrs::new_ticket(None)), unauth);
			assert_eq!(authorize(&roles, &memberships, None, Action::Create, &ResourceAttrs::info(EntityType::Product)), unauth);
			assert_eq!(authorize(&roles, &memberships, None, Action::Retrieve, &ResourceAttrs::companies()), unauth);
		}

		#[test]
		fn inactive_principal_is_anonymous() {
			let roles = RoleRegistry::default();
			let memberships = MembershipDirectory::new();
			let p = principal("gone@x.test").superuser().inactive();
			let ticket = ResourceAttrs::ticket(None, p.id, None);

			assert_eq!(
				authorize(&roles, &memberships, Some(&p), Action::Update, &ticket),
				Decision::Deny(DenyReason::Unauthenticated)
			);
		}
	}

	mod global_flags {
		use super::*;

		#[test]
		fn superuser_allowed_everything() {
			let roles = RoleRegistry::default();
			let memberships = MembershipDirectory::new();
			let root = principal("root@gluu.org").superuser();

			for entity in EntityType::all() {
				for action in Action::all() {
					let resource = ResourceAttrs {
						entity_type: *entity,
						company_id: Some(CompanyId::generate()),
						created_by: None,
						owner: None,
						is_collection: false,
					};
					assert!(authorize(&roles, &memberships, Some(&root), *action, &resource).is_allowed());
				}
			}
		}

		#[test]
		fn staff_uses_staff_role_grants() {
			let roles = staff_registry([
				Permission::new(AppArea::Tickets, EntityType::Ticket, [Action::Retrieve, Action::Update]),
				Permission::new(AppArea::Info, EntityType::Product, [Action::Create]),
			]);
			let memberships = MembershipDirectory::new();
			let s = principal("s@gluu.org").staff();
			let ticket = ResourceAttrs::ticket(Some(CompanyId::generate()), PrincipalId::generate(), None);

			assert!(authorize(&roles, &memberships, Some(&s), Action::Update, &ticket).is_allowed());
			assert!(!authorize(&roles, &memberships, Some(&s), Action::Destroy, &ticket).is_allowed());
			assert!(authorize(&roles, &memberships, Some(&s), Action::Create, &ResourceAttrs::info(EntityType::Product)).is_allowed());
			assert!(!authorize(&roles, &memberships, Some(&s), Action::Create, &ResourceAttrs::info(EntityType::Server)).is_allowed());
		}

		#[test]
		fn staff_reading_answer_uses_ticket_grant() {
			let roles = staff_registry([Permission::new(AppArea::Tickets, EntityType::Ticket, [Action::Retrieve])]);
			let memberships = MembershipDirectory::new();
			let s = principal("s@gluu.org").staff();
			let answer = ResourceAttrs::answer(Some(CompanyId::generate()), PrincipalId::generate(), None);

			assert!(authorize(&roles, &memberships, Some(&s), Action::Retrieve, &answer).is_allowed());
			assert!(!authorize(&roles, &memberships, Some(&s), Action::List, &answer).is_allowed());
		}

		#[test]
		fn staff_without_staff_role_is_denied() {
			let roles = RoleRegistry::default();
			let memberships = MembershipDirectory::new();
			let s = principal("s@gluu.org").staff();
			let ticket = ResourceAttrs::ticket(None, s.id, None);

			// Staff never fall through to the creator rule.
			assert_eq!(
				authorize(&roles, &memberships, Some(&s), Action::Update, &ticket),
				Decision::Deny(DenyReason::Insufficient)
			);
		}
	}

	mod scenarios {
		use super::*;

		#[test]
		fn read_only_member_cannot_update_company_ticket() {
			let reader = Role::new("user").with_grant(Permission::new(
				AppArea::Tickets,
				EntityType::Ticket,
				[Action::List, Action::Retrieve],
			));
			let company = CompanyId::generate();
			let p = principal("reader@acme.test");
			let mut memberships = MembershipDirectory::new();
			memberships.insert(Membership::new(p.id, company, Some(reader.id)).primary()).unwrap();
			let roles = RoleRegistry::new([reader]).unwrap();

			let ticket = ResourceAttrs::ticket(Some(company), PrincipalId::generate(), None);
			let result = require(&roles, &memberships, Some(&p), Action::Update, &ticket);
			assert!(matches!(result, Err(AuthError::PermissionDenied(_))));
		}

		#[test]
		fn require_reports_authentication_required() {
			let roles = RoleRegistry::default();
			let memberships = MembershipDirectory::new();
			let result = require(&roles, &memberships, None, Action::Create, &ResourceAttrs::new_ticket(None));
			assert_eq!(result, Err(AuthError::AuthenticationRequired));
		}
	}

	mod created_for {
		use super::*;

		#[test]
		fn member_passes_and_outsider_fails_validation() {
			let company = CompanyId::generate();
			let member = PrincipalId::generate();
			let mut memberships = MembershipDirectory::new();
			memberships.insert(Membership::new(member, company, None)).unwrap();

			assert!(validate_created_for(&memberships, Some(company), Some(member)).is_ok());
			let err = validate_created_for(&memberships, Some(company), Some(PrincipalId::generate())).unwrap_err();
			assert!(matches!(err, AuthError::ValidationFailed(_)));
			assert_eq!(err.status_code(), 400);
		}

		#[test]
		fn missing_company_or_target_skips_check() {
			let memberships = MembershipDirectory::new();
			assert!(validate_created_for(&memberships, None, Some(PrincipalId::generate())).is_ok());
			assert!(validate_created_for(&memberships, Some(CompanyId::generate()), None).is_ok());
		}
	}

	mod properties {
		use super::*;
		use proptest::prelude::*;

		fn arb_mutation() -> impl Strategy<Value = Action> {
			prop_oneof![Just(Action::Update), Just(Action::Destroy)]
		}

		proptest! {
			#[test]
			fn non_member_never_mutates_company_ticket(
				action in arb_mutation(),
				granted in proptest::collection::btree_set(prop_oneof![
					Just(Action::Update), Just(Action::Destroy), Just(Action::Retrieve)
				], 0..3),
				is_creator in any::<bool>(),
			) {
				let role = Role::new("user").with_grant(Permission::new(AppArea::Tickets, EntityType::Ticket, granted));
				let p = principal("p@x.test");
				let mut memberships = MembershipDirectory::new();
				// Member of another company only.
				memberships.insert(Membership::new(p.id, CompanyId::generate(), Some(role.id)).primary()).unwrap();
				let roles = RoleRegistry::new([role]).unwrap();

				let creator = if is_creator { p.id } else { PrincipalId::generate() };
				let ticket = ResourceAttrs::ticket(Some(CompanyId::generate()), creator, None);
				prop_assert!(!authorize(&roles, &memberships, Some(&p), action, &ticket).is_allowed());
			}

			#[test]
			fn community_ticket_update_iff_creator(is_creator in any::<bool>(), action in arb_mutation()) {
				let roles = RoleRegistry::default();
				let memberships = MembershipDirectory::new();
				let p = principal("p@x.test");
				let creator = if is_creator { p.id } else { PrincipalId::generate() };
				let ticket = ResourceAttrs::ticket(None, creator, None);
				prop_assert_eq!(authorize(&roles, &memberships, Some(&p), action, &ticket).is_allowed(), is_creator);
			}
		}
	}
}
