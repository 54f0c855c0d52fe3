//! Access-control services for the Pine-script platform
//!
//! This crate implements the authenticated-session lifecycle, the
//! access-state query/mutation protocol against the remote platform, and
//! the expiration arithmetic behind time-boxed grants. The web front-end
//! consumes it through the [`AccessService`] facade.

use pinegate_core::{ErrorContext, PinegateError, PinegateResult, PlatformConfig};

pub mod endpoints;
pub mod expiration;
pub mod mutation;
pub mod query;
pub mod service;
pub mod session;

pub use endpoints::PlatformEndpoints;
pub use mutation::AccessMutationService;
pub use query::AccessQueryService;
pub use service::AccessService;
pub use session::SessionManager;

/// Helper function to create the shared HTTP client
pub(crate) fn create_http_client(config: &PlatformConfig) -> PinegateResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            PinegateError::RemoteService {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?,
    );

    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json, text/plain, */*"),
    );

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| PinegateError::RemoteService {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })?;

    Ok(client)
}
