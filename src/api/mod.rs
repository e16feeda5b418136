//! HTTP API module for the shift roster service.
//!
//! This module provides the REST endpoints for shift versions, holidays,
//! the allocation ledger, project membership and allowance reports. Every
//! endpoint except `/health` requires a bearer token.

mod auth;
mod handlers;
mod request;
mod response;
mod state;

pub use auth::{Caller, Claims, issue_token, verify_token};
pub use handlers::create_router;
pub use request::{ApplyBatchRequest, ShiftVersionRequest};
pub use response::{ApiError, ApiErrorResponse, StatusResponse};
pub use state::AppState;
