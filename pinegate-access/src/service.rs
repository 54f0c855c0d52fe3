//! Facade consumed by the web front-end
//!
//! Bundles the session manager and the query/mutation services behind the
//! operations the HTTP layer marshals: identity validation, access
//! lookups, batch extension, and batch revocation.

use crate::endpoints::PlatformEndpoints;
use crate::mutation::AccessMutationService;
use crate::query::AccessQueryService;
use crate::session::SessionManager;
use crate::create_http_client;
use pinegate_core::{
    remote_error, AccessRecord, ExtensionDirective, IdentityCheck, OperationStatus,
    PinegateConfig, PinegateResult, SessionState,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// One entry of the platform's username directory lookup
#[derive(Debug, Clone, Deserialize)]
pub struct UsernameHint {
    pub username: String,
}

pub struct AccessService {
    client: reqwest::Client,
    endpoints: PlatformEndpoints,
    query: AccessQueryService,
    mutation: AccessMutationService,
    session: Arc<SessionManager>,
}

impl AccessService {
    pub fn new(config: &PinegateConfig) -> PinegateResult<Self> {
        let client = create_http_client(&config.platform)?;
        let endpoints = PlatformEndpoints::new(&config.platform.base_url);
        let session = Arc::new(SessionManager::new(
            client.clone(),
            endpoints.clone(),
            config.credentials.clone(),
        ));

        info!(base_url = %config.platform.base_url, "Created access service");

        Ok(Self {
            query: AccessQueryService::new(client.clone(), endpoints.clone(), session.clone()),
            mutation: AccessMutationService::new(
                client.clone(),
                endpoints.clone(),
                session.clone(),
            ),
            client,
            endpoints,
            session,
        })
    }

    /// Current lifecycle state of the privileged session
    pub async fn session_state(&self) -> SessionState {
        self.session.state().await
    }

    /// Check a username against the platform's directory and return its
    /// canonical casing. Unauthenticated; no session is consulted.
    pub async fn validate_identity(&self, username: &str) -> PinegateResult<IdentityCheck> {
        let response = self
            .client
            .get(self.endpoints.username_hint(username))
            .send()
            .await
            .map_err(|e| remote_error!(format!("Username lookup failed: {}", e), "identity", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(remote_error!(
                format!("Username lookup returned HTTP {}", status.as_u16()),
                "identity"
            ));
        }

        let hints: Vec<UsernameHint> = response
            .json()
            .await
            .map_err(|e| remote_error!(format!("Malformed username lookup: {}", e), "identity", e))?;

        Ok(resolve_identity(username, &hints))
    }

    /// Resolve the current access state of one (user, script) pair
    pub async fn query_access(
        &self,
        username: &str,
        pine_id: &str,
    ) -> PinegateResult<AccessRecord> {
        self.query.get_access_details(username, pine_id).await
    }

    /// Resolve a batch of script ids to access records. A failed lookup
    /// yields an absent record marked `Failure` so the batch preserves
    /// one result per requested script.
    pub async fn resolve_records(&self, username: &str, pine_ids: &[String]) -> Vec<AccessRecord> {
        let mut records = Vec::with_capacity(pine_ids.len());
        for pine_id in pine_ids {
            match self.query.get_access_details(username, pine_id).await {
                Ok(record) => records.push(record),
                Err(e) => {
                    e.log();
                    let mut record = AccessRecord::absent(username, pine_id);
                    record.status = OperationStatus::Failure;
                    records.push(record);
                }
            }
        }
        records
    }

    /// Apply one extension directive across a batch of records,
    /// sequentially and without atomicity. Each record reports its own
    /// outcome; a transport fault only marks that record `Failure`.
    pub async fn apply_extension(
        &self,
        records: Vec<AccessRecord>,
        directive: ExtensionDirective,
    ) -> Vec<AccessRecord> {
        let mut results = Vec::with_capacity(records.len());
        for record in records {
            match self.mutation.grant_or_extend(record.clone(), directive).await {
                Ok(updated) => results.push(updated),
                Err(e) => {
                    e.log();
                    let mut failed = record;
                    failed.status = OperationStatus::Failure;
                    results.push(failed);
                }
            }
        }
        results
    }

    /// Revoke a batch of records sequentially, one outcome per record
    pub async fn revoke_all(&self, records: Vec<AccessRecord>) -> Vec<AccessRecord> {
        let mut results = Vec::with_capacity(records.len());
        for record in records {
            match self.mutation.revoke(record.clone()).await {
                Ok(updated) => results.push(updated),
                Err(e) => {
                    e.log();
                    let mut failed = record;
                    failed.status = OperationStatus::Failure;
                    results.push(failed);
                }
            }
        }
        results
    }
}

/// Scan a directory lookup for the target username, case-insensitively.
/// The canonical casing is whatever the platform reports; the last match
/// wins when the lookup returns duplicates.
pub fn resolve_identity(username: &str, hints: &[UsernameHint]) -> IdentityCheck {
    let mut valid = false;
    let mut canonical_name = String::new();

    for hint in hints {
        if hint.username.eq_ignore_ascii_case(username) {
            valid = true;
            canonical_name = hint.username.clone();
        }
    }

    IdentityCheck {
        valid,
        canonical_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint(username: &str) -> UsernameHint {
        UsernameHint {
            username: username.to_string(),
        }
    }

    #[test]
    fn test_resolve_identity_reports_canonical_casing() {
        let check = resolve_identity("alice", &[hint("bob"), hint("AliCe")]);
        assert!(check.valid);
        assert_eq!(check.canonical_name, "AliCe");
    }

    #[test]
    fn test_resolve_identity_unknown_user() {
        let check = resolve_identity("alice", &[hint("bob")]);
        assert!(!check.valid);
        assert!(check.canonical_name.is_empty());
    }

    #[test]
    fn test_resolve_identity_last_match_wins() {
        let check = resolve_identity("alice", &[hint("ALICE"), hint("Alice")]);
        assert!(check.valid);
        assert_eq!(check.canonical_name, "Alice");
    }
}
