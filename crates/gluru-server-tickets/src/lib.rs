// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ticket domain types.
//!
//! A [`Ticket`] owns its [`Answer`]s and its [`TicketHistory`] rows. History is
//! append-only and is derived from a before/after pair of tickets by
//! [`record_history_if_changed`]. Lifecycle events that drive
//! notifications (reopen, assignment) are derived the same way by
//! [`detect_events`].

pub mod answer;
pub mod event;
pub mod history;
pub mod subscription;
pub mod ticket;

pub use answer::Answer;
pub use event::{detect_events, TicketEvent};
pub use history::{record_history_if_changed, HistoryId, TicketHistory, WatchedField};
pub use subscription::{active_subscribers, TicketSubscription};
pub use ticket::{IssueType, Ticket, TicketStatus};
