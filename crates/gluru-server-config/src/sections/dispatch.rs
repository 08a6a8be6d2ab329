// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification dispatch queue and reminder job configuration.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
	/// Worker tasks draining the priority queues.
	pub workers: usize,
	/// Capacity of each priority queue; a full queue rejects new intents.
	pub queue_capacity: usize,
	pub max_retries: u32,
	pub base_retry_delay_secs: u64,
	pub max_retry_delay_secs: u64,
	pub reminder_enabled: bool,
	pub reminder_interval_secs: u64,
}

impl Default for DispatchConfig {
	fn default() -> Self {
		DispatchConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchConfigLayer {
	#[serde(default)]
	pub workers: Option<usize>,
	#[serde(default)]
	pub queue_capacity: Option<usize>,
	#[serde(default)]
	pub max_retries: Option<u32>,
	#[serde(default)]
	pub base_retry_delay_secs: Option<u64>,
	#[serde(default)]
	pub max_retry_delay_secs: Option<u64>,
	#[serde(default)]
	pub reminder_enabled: Option<bool>,
	#[serde(default)]
	pub reminder_interval_secs: Option<u64>,
}

impl DispatchConfigLayer {
	pub fn merge(&mut self, other: DispatchConfigLayer) {
		if other.workers.is_some() {
			self.workers = other.workers;
		}
		if other.queue_capacity.is_some() {
			self.queue_capacity = other.queue_capacity;
		}
		if other.max_retries.is_some() {
			self.max_retries = other.max_retries;
		}
		if other.base_retry_delay_secs.is_some() {
			self.base_retry_delay_secs = other.base_retry_delay_secs;
		}
		if other.max_retry_delay_secs.is_some() {
			self.max_retry_delay_secs = other.max_retry_delay_secs;
		}
		if other.reminder_enabled.is_some() {
			self.reminder_enabled = other.reminder_enabled;
		}
		if other.reminder_interval_secs.is_some() {
			self.reminder_interval_secs = other.reminder_interval_secs;
		}
	}

	pub fn finalize(self) -> DispatchConfig {
		DispatchConfig {
			workers: self.workers.unwrap_or(4),
			queue_capacity: self.queue_capacity.unwrap_or(1024),
			max_retries: self.max_retries.unwrap_or(3),
			base_retry_delay_secs: self.base_retry_delay_secs.unwrap_or(1),
			max_retry_delay_secs: self.max_retry_delay_secs.unwrap_or(60),
			reminder_enabled: self.reminder_enabled.unwrap_or(true),
			reminder_interval_secs: self.reminder_interval_secs.unwrap_or(300),
		}
	}
}
