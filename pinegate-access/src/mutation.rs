//! Grant, extend, and revoke operations against the remote platform
//!
//! Each mutation is planned as a pure step first (which endpoint, which
//! expiration, if any) and then issued as a single non-retrying call.

use crate::endpoints::PlatformEndpoints;
use crate::expiration;
use crate::session::SessionManager;
use chrono::{DateTime, SecondsFormat, Utc};
use pinegate_core::{
    remote_error, AccessRecord, ExtensionDirective, ExtensionUnit, OperationStatus,
    PinegateResult,
};
use reqwest::StatusCode;
use std::sync::Arc;
use tracing::debug;

/// Which remote endpoint a planned mutation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOperation {
    /// The user holds no grant yet
    AddAccess,
    /// The user already holds a grant whose expiration moves
    ModifyExpiration,
}

/// The resolved shape of one grant/extend call before it is issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationPlan {
    pub operation: RemoteOperation,
    /// Omitted from the payload for lifetime grants so the platform drops
    /// any existing expiration
    pub expiration: Option<DateTime<Utc>>,
    pub lifetime: bool,
}

/// Decide what a grant/extend must do before any remote call.
///
/// Returns `None` when the record is already non-expiring: finite
/// extensions of a lifetime grant are never attempted, and a second
/// lifetime directive has nothing left to change.
pub fn plan_grant_or_extend(
    record: &AccessRecord,
    directive: ExtensionDirective,
) -> PinegateResult<Option<MutationPlan>> {
    if record.non_expiring {
        return Ok(None);
    }

    let operation = if record.has_access {
        RemoteOperation::ModifyExpiration
    } else {
        RemoteOperation::AddAccess
    };

    if directive.unit == ExtensionUnit::Lifetime {
        return Ok(Some(MutationPlan {
            operation,
            expiration: None,
            lifetime: true,
        }));
    }

    let expiration = expiration::extend(record.current_expiration, directive.unit, directive.count)?;
    Ok(Some(MutationPlan {
        operation,
        expiration: Some(expiration),
        lifetime: false,
    }))
}

/// Form body for a planned grant/extend call
fn mutation_form(record: &AccessRecord, plan: &MutationPlan) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("pine_id", record.pine_id.clone()),
        ("username_recip", record.username.clone()),
    ];
    if let Some(expiration) = plan.expiration {
        form.push((
            "expiration",
            expiration.to_rfc3339_opts(SecondsFormat::Millis, true),
        ));
    }
    form
}

pub struct AccessMutationService {
    client: reqwest::Client,
    endpoints: PlatformEndpoints,
    session: Arc<SessionManager>,
}

impl AccessMutationService {
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

    /// Grant new access or push out an existing expiration.
    ///
    /// The record comes back with its per-operation outcome: `NotApplied`
    /// when the grant was already non-expiring (no remote call is made),
    /// `Success` on HTTP 200/201, `Failure` on any other status.
    /// Transport faults surface as tagged errors.
    pub async fn grant_or_extend(
        &self,
        mut record: AccessRecord,
        directive: ExtensionDirective,
    ) -> PinegateResult<AccessRecord> {
        let Some(plan) = plan_grant_or_extend(&record, directive)? else {
            record.status = OperationStatus::NotApplied;
            return Ok(record);
        };

        self.session.ensure_valid().await?;
        let headers = self.session.auth_headers().await?;

        let url = match plan.operation {
            RemoteOperation::AddAccess => self.endpoints.add_access(),
            RemoteOperation::ModifyExpiration => self.endpoints.modify_access(),
        };

        debug!(
            username = %record.username,
            pine_id = %record.pine_id,
            operation = ?plan.operation,
            lifetime = plan.lifetime,
            "Applying access mutation"
        );

        let response = self
            .client
            .post(url)
            .headers(headers)
            .form(&mutation_form(&record, &plan))
            .send()
            .await
            .map_err(|e| remote_error!(format!("Access mutation failed: {}", e), "mutation", e))?;

        if plan.lifetime {
            record.non_expiring = true;
        } else {
            record.new_expiration = plan.expiration;
        }
        record.status = match response.status().as_u16() {
            200 | 201 => OperationStatus::Success,
            _ => OperationStatus::Failure,
        };
        Ok(record)
    }

    /// Remove the user's grant for one script
    pub async fn revoke(&self, mut record: AccessRecord) -> PinegateResult<AccessRecord> {
        self.session.ensure_valid().await?;
        let headers = self.session.auth_headers().await?;

        debug!(
            username = %record.username,
            pine_id = %record.pine_id,
            "Removing access"
        );

        let response = self
            .client
            .post(self.endpoints.remove_access())
            .headers(headers)
            .form(&[
                ("pine_id", record.pine_id.as_str()),
                ("username_recip", record.username.as_str()),
            ])
            .send()
            .await
            .map_err(|e| remote_error!(format!("Access removal failed: {}", e), "mutation", e))?;

        record.status = if response.status() == StatusCode::OK {
            OperationStatus::Success
        } else {
            OperationStatus::Failure
        };
        Ok(record)
    }
}
