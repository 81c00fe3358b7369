//! Services, HTTP surface and GraphQL schema of the BPO back office.

pub mod auth;
pub mod cash;
pub mod chart;
pub mod error;
pub mod graphql;
pub mod onboarding;
pub mod prospects;
pub mod registers;
pub mod rest;
pub mod seed;
pub mod users;

pub use error::{ApiError, ApiResult};
pub use rest::{router, AppState};

use serde::Serialize;

const DEFAULT_PAGE: u64 = 50;
const MAX_PAGE: u64 = 200;

#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Clamp caller supplied paging to sane bounds.
pub(crate) fn page_bounds(limit: Option<u64>, offset: Option<u64>) -> (u64, u64) {
    (
        limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE),
        offset.unwrap_or(0),
    )
}
