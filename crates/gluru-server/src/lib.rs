// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Support ticketing server core.
//!
//! [`TicketService`] authorizes and persists ticket, answer and membership
//! operations; [`EventDispatcher`] turns the committed changes into
//! notification intents for the dispatch queue.

pub mod error;
pub mod events;
pub mod jobs;
pub mod service;
pub mod setup;
pub mod stores;
pub mod version;

#[cfg(test)]
mod testing;

pub use error::{Result, ServiceError};
pub use events::{EventDispatcher, TicketChange};
pub use service::{NewTicket, TicketService, TicketUpdate};
pub use setup::{build_scheduler, recipients_from_config};
pub use stores::Stores;
