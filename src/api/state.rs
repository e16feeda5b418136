//! Application state for the roster API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::AuthConfig;
use crate::service::RosterService;

/// Shared application state.
///
/// Holds the roster service and the token settings used by the
/// [`Caller`](super::Caller) extractor.
#[derive(Clone)]
pub struct AppState {
    service: RosterService,
    auth: Arc<AuthConfig>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(service: RosterService, auth: AuthConfig) -> Self {
        Self {
            service,
            auth: Arc::new(auth),
        }
    }

    /// Returns the roster service.
    pub fn service(&self) -> &RosterService {
        &self.service
    }

    /// Returns the token settings.
    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState>();
    }
}
