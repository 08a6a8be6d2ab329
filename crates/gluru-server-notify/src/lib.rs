// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification planning for the gluru support server.
//!
//! This crate decides who hears about a ticket change and how. It never
//! delivers anything itself: [`NotificationPlanner`] turns a committed
//! [`LifecycleEvent`] into [`NotificationIntent`]s, and the dispatch queue
//! delivers those through the [`EmailSender`], [`SmsSender`] and
//! [`TemplateRenderer`] collaborators defined here.

pub mod context;
pub mod error;
pub mod event;
pub mod intent;
pub mod mentions;
pub mod planner;
pub mod recipients;
pub mod reminder;
pub mod render;
pub mod template;
pub mod transport;

pub use error::{DeliveryError, Result};
pub use event::{
	effective_plan, AnswerCreated, CompanyMember, LifecycleEvent, Participant, TicketAssigned,
	TicketCreated, TicketReopened,
};
pub use intent::{Channel, Context, NotificationIntent, Priority};
pub use mentions::{extract_mentions, resolve_mentions};
pub use planner::NotificationPlanner;
pub use recipients::{NotificationRecipients, SmsContact};
pub use reminder::{reminder_delay, OpenTicket};
pub use render::BuiltinRenderer;
pub use template::Template;
pub use transport::{Attachment, EmailMessage, EmailSender, RenderedMessage, SmsSender, TemplateRenderer};
