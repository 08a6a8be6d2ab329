// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::types::JobStatus;
use chrono::{DateTime, Utc};
use gluru_server_notify::Channel;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

const DEGRADED_AFTER: u32 = 1;
const UNHEALTHY_AFTER: u32 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct JobHealthStatus {
	pub job_id: String,
	pub name: String,
	pub status: HealthState,
	pub last_run: Option<LastRunInfo>,
	pub consecutive_failures: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastRunInfo {
	pub run_id: String,
	pub status: JobStatus,
	pub started_at: DateTime<Utc>,
	pub duration_ms: Option<i64>,
	pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
	Healthy,
	Degraded,
	Unhealthy,
}

impl HealthState {
	pub fn from_consecutive_failures(consecutive_failures: u32) -> Self {
		if consecutive_failures >= UNHEALTHY_AFTER {
			HealthState::Unhealthy
		} else if consecutive_failures >= DEGRADED_AFTER {
			HealthState::Degraded
		} else {
			HealthState::Healthy
		}
	}

	pub fn worst<I: IntoIterator<Item = HealthState>>(states: I) -> Self {
		states.into_iter().max().unwrap_or(HealthState::Healthy)
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct JobsHealthStatus {
	pub status: HealthState,
	pub jobs: Vec<JobHealthStatus>,
}

/// Snapshot of one delivery channel.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChannelHealth {
	pub channel: Channel,
	pub status: HealthState,
	pub scheduled: u64,
	pub rejected: u64,
	pub delivered: u64,
	pub failed: u64,
	pub consecutive_failures: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DispatchHealth {
	pub status: HealthState,
	pub channels: Vec<ChannelHealth>,
}

#[derive(Debug, Default)]
struct ChannelCounters {
	scheduled: AtomicU64,
	rejected: AtomicU64,
	delivered: AtomicU64,
	failed: AtomicU64,
	consecutive_failures: AtomicU32,
}

impl ChannelCounters {
	fn snapshot(&self, channel: Channel) -> ChannelHealth {
		let consecutive_failures = self.consecutive_failures.load(Ordering::Relaxed);
		ChannelHealth {
			channel,
			status: HealthState::from_consecutive_failures(consecutive_failures),
			scheduled: self.scheduled.load(Ordering::Relaxed),
			rejected: self.rejected.load(Ordering::Relaxed),
			delivered: self.delivered.load(Ordering::Relaxed),
			failed: self.failed.load(Ordering::Relaxed),
			consecutive_failures,
		}
	}
}

/// Lock-free delivery counters shared by the queue handle and the workers.
#[derive(Debug, Default)]
pub(crate) struct DispatchCounters {
	email: ChannelCounters,
	sms: ChannelCounters,
}

impl DispatchCounters {
	fn channel(&self, channel: Channel) -> &ChannelCounters {
		match channel {
			Channel::Email => &self.email,
			Channel::Sms => &self.sms,
		}
	}

	pub(crate) fn record_scheduled(&self, channel: Channel) {
		self.channel(channel).scheduled.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rejected(&self, channel: Channel) {
		self.channel(channel).rejected.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_delivered(&self, channel: Channel) {
		let counters = self.channel(channel);
		counters.delivered.fetch_add(1, Ordering::Relaxed);
		counters.consecutive_failures.store(0, Ordering::Relaxed);
	}

	pub(crate) fn record_failed(&self, channel: Channel) {
		let counters = self.channel(channel);
		counters.failed.fetch_add(1, Ordering::Relaxed);
		counters.consecutive_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn snapshot(&self) -> DispatchHealth {
		let channels = vec![
			self.email.snapshot(Channel::Email),
			self.sms.snapshot(Channel::Sms),
		];
		DispatchHealth {
			status: HealthState::worst(channels.iter().map(|c| c.status)),
			channels,
		}
	}
}
