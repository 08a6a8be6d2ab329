// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background work for the gluru support server.
//!
//! Two pieces live here:
//! - [`Dispatcher`] owns three bounded priority queues and a pool of delivery
//!   tasks. [`DispatchQueue::schedule`] never blocks, so request handlers can
//!   hand off notification intents after commit without waiting on SMTP or SMS.
//! - [`JobScheduler`] runs periodic jobs such as the stale ticket reminder,
//!   with retry and per-job health.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod job;
pub mod retry;
pub mod scheduler;
pub mod types;

pub use context::{CancellationToken, JobContext};
pub use dispatch::{
	DispatchQueue, Dispatcher, NotificationQueue, QueuedIntent, RejectReason, ScheduleOutcome, Transports,
};
pub use error::{JobError, Result};
pub use health::{ChannelHealth, DispatchHealth, HealthState, JobHealthStatus, JobsHealthStatus, LastRunInfo};
pub use job::Job;
pub use retry::RetryPolicy;
pub use scheduler::JobScheduler;
pub use types::{JobOutput, JobStatus, TriggerSource};
