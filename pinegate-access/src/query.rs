//! Access-state lookups against the remote platform

use crate::endpoints::PlatformEndpoints;
use crate::session::SessionManager;
use chrono::{DateTime, Utc};
use pinegate_core::{
    remote_error, AccessRecord, ErrorContext, OperationStatus, PinegateError, PinegateResult,
};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// One entry of the platform's grantee listing. A null expiration means
/// the grant is non-expiring.
#[derive(Debug, Clone, Deserialize)]
pub struct Grantee {
    pub username: String,
    pub expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct GranteeListResponse {
    results: Vec<Grantee>,
}

pub struct AccessQueryService {
    client: reqwest::Client,
    endpoints: PlatformEndpoints,
    session: Arc<SessionManager>,
}

impl AccessQueryService {
    pub fn new(
        client: reqwest::Client,
        endpoints: PlatformEndpoints,
        session: Arc<SessionManager>,
    ) -> Self {
        Self {
            client,
            endpoints,
            session,
        }
    }

    /// Resolve the current access state of one (user, script) pair.
    ///
    /// Asks the platform for the most recent page of grantees and scans
    /// it for the target user. Failures are returned as tagged errors,
    /// never raised past this boundary.
    pub async fn get_access_details(
        &self,
        username: &str,
        pine_id: &str,
    ) -> PinegateResult<AccessRecord> {
        self.session.ensure_valid().await?;
        let headers = self.session.auth_headers().await?;

        debug!(username, pine_id, "Listing current grantees");

        let response = self
            .client
            .post(self.endpoints.list_users())
            .headers(headers)
            .form(&[("pine_id", pine_id), ("username", username)])
            .send()
            .await
            .map_err(|e| remote_error!(format!("Grantee listing failed: {}", e), "query", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(listing_failure(status));
        }

        let listing: GranteeListResponse = response
            .json()
            .await
            .map_err(|e| remote_error!(format!("Malformed grantee listing: {}", e), "query", e))?;

        Ok(resolve_record(
            username,
            pine_id,
            &listing.results,
            Utc::now(),
        ))
    }
}

/// Classify an unexpected listing status. A 403 means the platform
/// rejected the call as unauthenticated, which is recoverable once the
/// next probe re-establishes the session; anything else is a plain
/// remote failure.
fn listing_failure(status: StatusCode) -> PinegateError {
    if status == StatusCode::FORBIDDEN {
        PinegateError::Authorization {
            message: "Grantee listing rejected as unauthenticated".to_string(),
            context: ErrorContext::new("query").with_operation("list_grantees"),
        }
    } else {
        remote_error!(
            format!("Grantee listing returned HTTP {}", status.as_u16()),
            "query"
        )
    }
}

/// Scan a grantee page for the target user, case-insensitively.
///
/// Duplicates are not collapsed; the last matching entry wins, so a page
/// holding both an expiring and a non-expiring entry for the same user
/// reports whichever the platform listed last. When no expiration is
/// known, `current_expiration` is the call-time sentinel `now`, not a
/// platform value.
pub fn resolve_record(
    username: &str,
    pine_id: &str,
    grantees: &[Grantee],
    now: DateTime<Utc>,
) -> AccessRecord {
    let mut has_access = false;
    let mut non_expiring = false;
    let mut current_expiration = now;

    for grantee in grantees {
        if grantee.username.eq_ignore_ascii_case(username) {
            has_access = true;
            match grantee.expiration {
                Some(expiration) => {
                    non_expiring = false;
                    current_expiration = expiration;
                }
                None => {
                    non_expiring = true;
                    current_expiration = now;
                }
            }
        }
    }

    AccessRecord {
        pine_id: pine_id.to_string(),
        username: username.to_string(),
        has_access,
        non_expiring,
        current_expiration,
        new_expiration: None,
        status: OperationStatus::NotApplied,
    }
}
