// Copyright (c) 2025 - Cowboy AI, Inc.
//! Outbox Events
//!
//! This module defines the outbox event record and the request, listing and
//! statistics types built around it.
//!
//! # Event Flow
//!
//! ```text
//! Producer → NewEvent → EventStore (Pending) → Publisher → Webhook
//!                                                  ↓
//!                                   EventStore (Published | Failed)
//! ```
//!
//! # Module Organization
//!
//! - [`outbox_event`] - The event record, its status and the creation request
//! - [`query`] - Paging and aggregate statistics

pub mod outbox_event;
pub mod query;

pub use outbox_event::{Event, EventStatus, NewEvent};
pub use query::{EventPage, EventStats, ListQuery, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
