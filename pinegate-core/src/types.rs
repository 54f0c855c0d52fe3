//! Core data type definitions

use crate::validation_error;
use crate::{PinegateError, PinegateResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of the privileged platform session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Process start, no probe or login attempted yet
    Uninitialized,
    /// Probe was rejected as unauthenticated, login in progress
    Validating,
    /// Credentials accepted by the most recent probe or login
    Valid,
    /// Credentials known stale or login failed, degraded until re-login
    Invalid,
}

/// The authenticated credential pair used to impersonate the privileged
/// account. Singleton per process, mutated only by the session manager.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque session cookie value
    pub session_id: String,
    /// Anti-forgery token paired with the session cookie
    pub csrf_token: String,
    pub state: SessionState,
}

impl Session {
    pub fn empty() -> Self {
        Self {
            session_id: String::new(),
            csrf_token: String::new(),
            state: SessionState::Uninitialized,
        }
    }
}

/// Outcome of the last mutation attempted against an access record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    #[serde(rename = "Not Applied")]
    NotApplied,
    Success,
    Failure,
}

/// The resolved state of one user's permission to one protected script,
/// plus the outcome of the last mutation attempted against it. Created by
/// the query service, mutated in place by the mutation service, never
/// persisted locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRecord {
    pub pine_id: String,
    pub username: String,
    pub has_access: bool,
    /// True when the platform holds the grant with a null expiration
    pub non_expiring: bool,
    /// When `non_expiring` is true this is a call-time sentinel, not a
    /// value reported by the platform
    pub current_expiration: DateTime<Utc>,
    /// Expiration computed for the most recent grant/extend attempt
    pub new_expiration: Option<DateTime<Utc>>,
    pub status: OperationStatus,
}

impl AccessRecord {
    /// A record for a (user, script) pair with no known grant
    pub fn absent(username: &str, pine_id: &str) -> Self {
        Self {
            pine_id: pine_id.to_string(),
            username: username.to_string(),
            has_access: false,
            non_expiring: false,
            current_expiration: Utc::now(),
            new_expiration: None,
            status: OperationStatus::NotApplied,
        }
    }
}

/// Result of checking a username against the platform's directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityCheck {
    pub valid: bool,
    /// The platform's canonical casing for the username, empty if invalid
    pub canonical_name: String,
}

/// Calendar unit for a time-boxed extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtensionUnit {
    Year,
    Month,
    Week,
    Day,
    /// Non-expiring access; carries no count semantics
    Lifetime,
}

/// A parsed instruction describing how far to push out an expiration, or
/// that access should become non-expiring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDirective {
    pub unit: ExtensionUnit,
    pub count: u32,
}

impl ExtensionDirective {
    pub fn lifetime() -> Self {
        Self {
            unit: ExtensionUnit::Lifetime,
            count: 0,
        }
    }

    /// Parse a directive token like "3M": the trailing character selects
    /// the unit (Y, M, W, D, L), the leading digits the count. The count is
    /// ignored for L. Unrecognized units are rejected up front so no
    /// unvalidated unit ever reaches the expiration arithmetic.
    pub fn parse(token: &str) -> PinegateResult<Self> {
        let token = token.trim();
        let Some(unit_char) = token.chars().last() else {
            return Err(validation_error!("empty extension directive", "duration", "directive"));
        };

        let unit = match unit_char.to_ascii_uppercase() {
            'Y' => ExtensionUnit::Year,
            'M' => ExtensionUnit::Month,
            'W' => ExtensionUnit::Week,
            'D' => ExtensionUnit::Day,
            'L' => ExtensionUnit::Lifetime,
            other => {
                return Err(validation_error!(
                    format!("unrecognized extension unit '{}'", other),
                    "duration",
                    "directive"
                ));
            }
        };

        if unit == ExtensionUnit::Lifetime {
            return Ok(Self::lifetime());
        }

        let digits = &token[..token.len() - unit_char.len_utf8()];
        let count: u32 = digits.parse().map_err(|_| {
            validation_error!(
                format!("invalid extension count '{}'", digits),
                "duration",
                "directive"
            )
        })?;

        Ok(Self { unit, count })
    }
}

impl std::str::FromStr for ExtensionDirective {
    type Err = PinegateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_parse_months() {
        let directive = ExtensionDirective::parse("3M").unwrap();
        assert_eq!(directive.unit, ExtensionUnit::Month);
        assert_eq!(directive.count, 3);
    }

    #[test]
    fn test_directive_parse_all_finite_units() {
        assert_eq!(
            ExtensionDirective::parse("1Y").unwrap().unit,
            ExtensionUnit::Year
        );
        assert_eq!(
            ExtensionDirective::parse("2W").unwrap().unit,
            ExtensionUnit::Week
        );
        assert_eq!(
            ExtensionDirective::parse("10D").unwrap().unit,
            ExtensionUnit::Day
        );
        assert_eq!(ExtensionDirective::parse("10d").unwrap().count, 10);
    }

    #[test]
    fn test_directive_parse_lifetime_ignores_count() {
        let directive = ExtensionDirective::parse("L").unwrap();
        assert_eq!(directive.unit, ExtensionUnit::Lifetime);
        assert_eq!(directive.count, 0);

        // Leading digits are permitted but carry no meaning for L
        let directive = ExtensionDirective::parse("7L").unwrap();
        assert_eq!(directive.unit, ExtensionUnit::Lifetime);
        assert_eq!(directive.count, 0);
    }

    #[test]
    fn test_directive_parse_rejects_unknown_unit() {
        let err = ExtensionDirective::parse("3X").unwrap_err();
        assert!(matches!(err, PinegateError::Validation { .. }));
    }

    #[test]
    fn test_directive_parse_rejects_missing_count() {
        assert!(ExtensionDirective::parse("M").is_err());
        assert!(ExtensionDirective::parse("").is_err());
    }

    #[test]
    fn test_absent_record_defaults() {
        let record = AccessRecord::absent("alice", "PUB;123");
        assert!(!record.has_access);
        assert!(!record.non_expiring);
        assert_eq!(record.status, OperationStatus::NotApplied);
        assert!(record.new_expiration.is_none());
    }

    #[test]
    fn test_operation_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OperationStatus::NotApplied).unwrap(),
            "\"Not Applied\""
        );
        assert_eq!(
            serde_json::to_string(&OperationStatus::Success).unwrap(),
            "\"Success\""
        );
    }
}
