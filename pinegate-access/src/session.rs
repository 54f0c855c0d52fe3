//! Authenticated session lifecycle
//!
//! One `SessionManager` owns the privileged session for the lifetime of
//! the process. It is the sole writer of the credential pair; the query
//! and mutation services only read the resulting header set.

use crate::endpoints::PlatformEndpoints;
use pinegate_core::{
    remote_error, CredentialsConfig, ErrorContext, PinegateError, PinegateResult, Session,
    SessionState,
};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, COOKIE, ORIGIN, REFERER, SET_COOKIE, USER_AGENT,
};
use reqwest::StatusCode;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const SESSION_COOKIE: &str = "sessionid";
const CSRF_COOKIE: &str = "XSRF-TOKEN";
const CSRF_HEADER: HeaderName = HeaderName::from_static("x-xsrf-token");

/// Cap on the probe -> login -> probe loop. Login can "succeed" without
/// yielding usable cookies, so the loop must not run unbounded.
const MAX_LOGIN_ATTEMPTS: usize = 2;

pub struct SessionManager {
    client: reqwest::Client,
    endpoints: PlatformEndpoints,
    credentials: CredentialsConfig,
    session: RwLock<Session>,
}

impl SessionManager {
    pub fn new(
        client: reqwest::Client,
        endpoints: PlatformEndpoints,
        credentials: CredentialsConfig,
    ) -> Self {
        Self {
            client,
            endpoints,
            credentials,
            session: RwLock::new(Session::empty()),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.session.read().await.state
    }

    /// Snapshot the current credential pair as an outbound header set.
    /// The pair is read under one lock guard so a call never mixes an old
    /// session cookie with a new anti-forgery token.
    pub async fn auth_headers(&self) -> PinegateResult<HeaderMap> {
        let session = self.session.read().await;

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, session.session_id))
                .map_err(|e| remote_error!("session cookie is not a valid header", "session", e))?,
        );
        headers.insert(
            CSRF_HEADER,
            HeaderValue::from_str(&session.csrf_token)
                .map_err(|e| remote_error!("anti-forgery token is not a valid header", "session", e))?,
        );
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(self.endpoints.origin())
                .map_err(|e| remote_error!("platform origin is not a valid header", "session", e))?,
        );
        Ok(headers)
    }

    /// Make sure the session is usable before an authenticated call.
    ///
    /// Idempotent: a session already marked valid returns immediately.
    /// Otherwise a probe decides the path: 200 marks the session valid,
    /// 403 triggers a bounded login loop, and anything else (network
    /// error, unexpected status) is treated as transient: the session is
    /// assumed still usable and no login is attempted, so transient
    /// outages cannot cause login storms.
    pub async fn ensure_valid(&self) -> PinegateResult<()> {
        if self.state().await == SessionState::Valid {
            return Ok(());
        }

        match self.probe().await {
            Ok(status) if status.is_success() => {
                debug!("Session probe accepted, marking session valid");
                self.set_state(SessionState::Valid).await;
                Ok(())
            }
            Ok(status) if status == StatusCode::FORBIDDEN => {
                info!("Session rejected by the platform, re-authenticating");
                self.set_state(SessionState::Validating).await;

                for attempt in 1..=MAX_LOGIN_ATTEMPTS {
                    if let Err(e) = self.login().await {
                        e.log();
                        continue;
                    }
                    match self.probe().await {
                        Ok(status) if status.is_success() => {
                            info!("Fresh credentials validated");
                            self.set_state(SessionState::Valid).await;
                            return Ok(());
                        }
                        Ok(status) if status == StatusCode::FORBIDDEN => {
                            warn!(attempt, "Fresh credentials rejected by the platform");
                        }
                        Ok(status) => {
                            warn!(%status, "Unexpected probe status after login");
                            break;
                        }
                        Err(e) => {
                            e.log();
                            break;
                        }
                    }
                }

                self.set_state(SessionState::Invalid).await;
                Ok(())
            }
            Ok(status) => {
                warn!(%status, "Unexpected probe status, assuming session still valid");
                self.set_state(SessionState::Invalid).await;
                Ok(())
            }
            Err(e) => {
                e.log();
                self.set_state(SessionState::Invalid).await;
                Ok(())
            }
        }
    }

    async fn probe(&self) -> PinegateResult<StatusCode> {
        let headers = self.auth_headers().await?;
        let response = self
            .client
            .get(self.endpoints.probe())
            .headers(headers)
            .send()
            .await
            .map_err(|e| remote_error!(format!("Session probe failed: {}", e), "session", e))?;
        Ok(response.status())
    }

    /// Submit the privileged account credentials and adopt the session
    /// and anti-forgery cookies from the response. Missing cookies leave
    /// the session invalid; later authenticated calls simply fail
    /// authorization until a probe succeeds.
    async fn login(&self) -> PinegateResult<()> {
        let response = self
            .client
            .post(self.endpoints.signin())
            .header(ORIGIN, self.endpoints.origin())
            .header(REFERER, self.endpoints.origin())
            .header(USER_AGENT, login_user_agent())
            .form(&[
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
                ("remember", "on"),
            ])
            .send()
            .await
            .map_err(|e| PinegateError::Authentication {
                message: format!("Login request failed: {}", e),
                context: ErrorContext::new("session").with_operation("login"),
            })?;

        self.adopt_login_cookies(response.headers()).await
    }

    /// Take the session and anti-forgery cookies from a login response.
    /// Either cookie missing is a login failure: the session goes
    /// invalid and the stale credential pair is left untouched.
    async fn adopt_login_cookies(&self, headers: &HeaderMap) -> PinegateResult<()> {
        let session_id = extract_cookie(headers, SESSION_COOKIE);
        let csrf_token = extract_cookie(headers, CSRF_COOKIE);

        match (session_id, csrf_token) {
            (Some(session_id), Some(csrf_token)) => {
                let mut session = self.session.write().await;
                session.session_id = session_id;
                session.csrf_token = csrf_token;
                session.state = SessionState::Validating;
                info!("Login succeeded, new session cookies adopted");
                Ok(())
            }
            (session_id, _) => {
                self.set_state(SessionState::Invalid).await;
                let missing = if session_id.is_none() {
                    SESSION_COOKIE
                } else {
                    CSRF_COOKIE
                };
                Err(PinegateError::Authentication {
                    message: format!("Login response missing the {} cookie", missing),
                    context: ErrorContext::new("session").with_operation("login"),
                })
            }
        }
    }

    async fn set_state(&self, state: SessionState) {
        self.session.write().await.state = state;
    }
}

/// Browser-style user agent sent on the signin call only; data calls keep
/// the shared client's configured agent.
fn login_user_agent() -> String {
    format!(
        "Mozilla/5.0 ({}; {})",
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Pull a cookie value out of the Set-Cookie response headers. Attributes
/// after the first `;` are ignored; the last occurrence wins.
fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| {
            let pair = cookie.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookies(cookies: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            headers.append(SET_COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        headers
    }

    fn manager() -> SessionManager {
        SessionManager::new(
            reqwest::Client::new(),
            PlatformEndpoints::new("https://example.com"),
            CredentialsConfig {
                username: "owner".to_string(),
                password: "secret".to_string(),
            },
        )
    }

    #[test]
    fn test_extract_cookie_strips_attributes() {
        let headers = headers_with_cookies(&[
            "sessionid=abc123; Path=/; HttpOnly",
            "XSRF-TOKEN=tok456; Path=/",
        ]);
        assert_eq!(
            extract_cookie(&headers, "sessionid").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            extract_cookie(&headers, "XSRF-TOKEN").as_deref(),
            Some("tok456")
        );
    }

    #[test]
    fn test_extract_cookie_missing_anti_forgery() {
        let headers = headers_with_cookies(&["sessionid=abc123; Path=/"]);
        assert_eq!(extract_cookie(&headers, "XSRF-TOKEN"), None);
    }

    #[test]
    fn test_extract_cookie_last_occurrence_wins() {
        let headers = headers_with_cookies(&["sessionid=old; Path=/", "sessionid=new; Path=/"]);
        assert_eq!(extract_cookie(&headers, "sessionid").as_deref(), Some("new"));
    }

    #[test]
    fn test_extract_cookie_ignores_malformed_entries() {
        let headers = headers_with_cookies(&["not-a-cookie", "sessionid=abc123"]);
        assert_eq!(
            extract_cookie(&headers, "sessionid").as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_login_user_agent_is_browser_shaped_and_valid() {
        let agent = login_user_agent();
        assert!(agent.starts_with("Mozilla/5.0 ("));
        assert!(HeaderValue::from_str(&agent).is_ok());
    }

    #[tokio::test]
    async fn test_new_manager_starts_uninitialized() {
        assert_eq!(manager().state().await, SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_login_response_missing_anti_forgery_cookie_degrades() {
        let manager = manager();
        let headers = headers_with_cookies(&["sessionid=abc123; Path=/"]);

        let result = manager.adopt_login_cookies(&headers).await;
        assert!(matches!(
            result,
            Err(PinegateError::Authentication { .. })
        ));
        assert_eq!(manager.state().await, SessionState::Invalid);
        // Stale credentials untouched, later authenticated calls fail
        // authorization at the platform
        let headers = manager.auth_headers().await.unwrap();
        assert_eq!(headers.get(COOKIE).unwrap(), "sessionid=");
    }

    #[tokio::test]
    async fn test_login_response_with_both_cookies_adopted() {
        let manager = manager();
        let headers = headers_with_cookies(&[
            "sessionid=abc123; Path=/; HttpOnly",
            "XSRF-TOKEN=tok456; Path=/",
        ]);

        manager.adopt_login_cookies(&headers).await.unwrap();
        assert_eq!(manager.state().await, SessionState::Validating);
        let headers = manager.auth_headers().await.unwrap();
        assert_eq!(headers.get(COOKIE).unwrap(), "sessionid=abc123");
        assert_eq!(headers.get(CSRF_HEADER).unwrap(), "tok456");
    }

    #[tokio::test]
    async fn test_auth_headers_snapshot_pair() {
        let headers = manager().auth_headers().await.unwrap();
        assert_eq!(headers.get(COOKIE).unwrap(), "sessionid=");
        assert!(headers.contains_key(CSRF_HEADER));
        assert_eq!(headers.get(ORIGIN).unwrap(), "https://example.com");
    }
}
