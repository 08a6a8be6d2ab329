// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ticket types.

use chrono::{DateTime, Utc};
use gluru_server_auth::{CompanyId, PrincipalId, TicketId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A support request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
	pub id: TicketId,
	pub title: String,
	pub body: String,
	pub category: Option<String>,
	pub issue_type: IssueType,
	pub status: TicketStatus,

	pub company_id: Option<CompanyId>,
	pub created_by: PrincipalId,
	/// Set when staff open a ticket on behalf of a user.
	pub created_for: Option<PrincipalId>,
	pub assignee: Option<PrincipalId>,

	pub is_deleted: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Ticket {
	pub fn new(
		title: impl Into<String>,
		body: impl Into<String>,
		issue_type: IssueType,
		created_by: PrincipalId,
	) -> Self {
		let now = Utc::now();
		Self {
			id: TicketId::generate(),
			title: title.into(),
			body: body.into(),
			category: None,
			issue_type,
			status: TicketStatus::default(),
			company_id: None,
			created_by,
			created_for: None,
			assignee: None,
			is_deleted: false,
			created_at: now,
			updated_at: now,
		}
	}

	pub fn with_company(mut self, company_id: CompanyId) -> Self {
		self.company_id = Some(company_id);
		self
	}

	pub fn with_created_for(mut self, principal: PrincipalId) -> Self {
		self.created_for = Some(principal);
		self
	}

	pub fn with_assignee(mut self, principal: PrincipalId) -> Self {
		self.assignee = Some(principal);
		self
	}

	/// The principal the ticket is about: `created_for`, or the creator.
	pub fn owner(&self) -> PrincipalId {
		self.created_for.unwrap_or(self.created_by)
	}

	pub fn is_open(&self) -> bool {
		self.status != TicketStatus::Closed
	}

	/// Front-end link, e.g. `https://support.gluu.org/tickets/<id>`.
	pub fn link(&self, base_url: &str) -> String {
		format!("{}/tickets/{}", base_url.trim_end_matches('/'), self.id)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
	#[default]
	Submitted,
	Assigned,
	InProgress,
	/// Waiting on input from the ticket owner.
	Pending,
	Closed,
}

impl TicketStatus {
	pub fn label(&self) -> &'static str {
		match self {
			Self::Submitted => "Submitted",
			Self::Assigned => "Assigned",
			Self::InProgress => "In Progress",
			Self::Pending => "Pending Input",
			Self::Closed => "Closed",
		}
	}
}

impl fmt::Display for TicketStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Submitted => write!(f, "submitted"),
			Self::Assigned => write!(f, "assigned"),
			Self::InProgress => write!(f, "in_progress"),
			Self::Pending => write!(f, "pending"),
			Self::Closed => write!(f, "closed"),
		}
	}
}

impl FromStr for TicketStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"submitted" => Ok(Self::Submitted),
			"assigned" => Ok(Self::Assigned),
			"in_progress" => Ok(Self::InProgress),
			"pending" => Ok(Self::Pending),
			"closed" => Ok(Self::Closed),
			_ => Err(format!("unknown ticket status: {}", s)),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
	ProductionOutage,
	ProductionImpaired,
	PreProduction,
	#[default]
	Minor,
	NewDevelopment,
}

impl IssueType {
	pub fn all() -> &'static [IssueType] {
		&[
			Self::ProductionOutage,
			Self::ProductionImpaired,
			Self::PreProduction,
			Self::Minor,
			Self::NewDevelopment,
		]
	}

	/// Issue types that page the on-call contacts and get reminders.
	pub fn is_urgent(&self) -> bool {
		matches!(self, Self::ProductionOutage | Self::ProductionImpaired)
	}

	pub fn label(&self) -> &'static str {
		match self {
			Self::ProductionOutage => "Production Outage",
			Self::ProductionImpaired => "Production Impaired",
			Self::PreProduction => "Pre-Production Issue",
			Self::Minor => "Minor Issue",
			Self::NewDevelopment => "New Development Issue",
		}
	}
}

impl fmt::Display for IssueType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ProductionOutage => write!(f, "production_outage"),
			Self::ProductionImpaired => write!(f, "production_impaired"),
			Self::PreProduction => write!(f, "pre_production"),
			Self::Minor => write!(f, "minor"),
			Self::NewDevelopment => write!(f, "new_development"),
		}
	}
}

impl FromStr for IssueType {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all()
			.iter()
			.copied()
			.find(|t| t.to_string() == s)
			.ok_or_else(|| format!("unknown issue type: {}", s))
	}
}
