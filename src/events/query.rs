// Copyright (c) 2025 - Cowboy AI, Inc.
//! Listing and statistics types for the outbox

use serde::{Deserialize, Serialize};

use super::{Event, EventStatus};

/// Default page size for listings
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page size a caller may request
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Paged listing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Only return events with this status
    #[serde(default)]
    pub status: Option<EventStatus>,

    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u32,

    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            status: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl ListQuery {
    /// Query for one page
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            status: None,
            page,
            limit,
        }
    }

    /// Restrict to a single status
    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Clamp page to at least 1 and limit to `1..=MAX_PAGE_LIMIT`
    pub fn normalized(self) -> Self {
        Self {
            status: self.status,
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Number of rows to skip
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of events, newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<Event>,
    /// Number of events matching the filter across all pages
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Aggregate counts over the outbox
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStats {
    pub total_events: u64,
    pub pending_events: u64,
    pub published_events: u64,
    pub failed_events: u64,
    /// Sum of `retry_count` over all events
    pub retry_count: u64,
}

impl EventStats {
    /// Fold one event into the counts
    pub fn record(&mut self, event: &Event) {
        self.total_events += 1;
        match event.status {
            EventStatus::Pending => self.pending_events += 1,
            EventStatus::Published => self.published_events += 1,
            EventStatus::Failed => self.failed_events += 1,
            EventStatus::Retrying => {}
        }
        self.retry_count += u64::from(event.retry_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, 20 => 0; "first page")]
    #[test_case(3, 20 => 40; "third page")]
    #[test_case(0, 20 => 0; "page zero")]
    fn test_offset(page: u32, limit: u32) -> u64 {
        ListQuery::new(page, limit).offset()
    }

    #[test_case(0, 0 => (1, 1); "zero values")]
    #[test_case(2, 500 => (2, 100); "limit capped")]
    #[test_case(5, 50 => (5, 50); "in range")]
    fn test_normalized(page: u32, limit: u32) -> (u32, u32) {
        let query = ListQuery::new(page, limit).normalized();
        (query.page, query.limit)
    }

    #[test]
    fn test_query_defaults() {
        let query: ListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query, ListQuery::default());
        assert_eq!(query.limit, DEFAULT_PAGE_LIMIT);
    }
}
