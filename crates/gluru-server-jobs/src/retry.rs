// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gluru_server_config::DispatchConfig;
use std::time::Duration;

const BASE_RETRY_DELAY_SECS: u64 = 1;
const MAX_RETRY_DELAY_SECS: u64 = 60;
const RETRY_FACTOR: f64 = 2.0;
const MAX_RETRIES: u32 = 3;

/// Exponential backoff: `base * factor^(n-1)`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
	pub max_retries: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub factor: f64,
}

impl RetryPolicy {
	pub fn from_config(config: &DispatchConfig) -> Self {
		Self {
			max_retries: config.max_retries,
			base_delay: Duration::from_secs(config.base_retry_delay_secs),
			max_delay: Duration::from_secs(config.max_retry_delay_secs),
			factor: RETRY_FACTOR,
		}
	}

	/// No retries at all; the first failure is final.
	pub fn none() -> Self {
		Self {
			max_retries: 0,
			..Self::default()
		}
	}

	/// Delay before retry number `retry_count` (1-based).
	pub fn backoff_delay(&self, retry_count: u32) -> Duration {
		let exponent = retry_count.saturating_sub(1).min(i32::MAX as u32) as i32;
		let scaled = self.base_delay.as_secs_f64() * self.factor.powi(exponent);
		if !scaled.is_finite() || scaled >= self.max_delay.as_secs_f64() {
			return self.max_delay;
		}
		Duration::from_secs_f64(scaled)
	}

	pub fn should_retry(&self, retryable: bool, retry_count: u32) -> bool {
		retryable && retry_count < self.max_retries
	}
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: MAX_RETRIES,
			base_delay: Duration::from_secs(BASE_RETRY_DELAY_SECS),
			max_delay: Duration::from_secs(MAX_RETRY_DELAY_SECS),
			factor: RETRY_FACTOR,
		}
	}
}
