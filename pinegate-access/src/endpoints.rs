//! Endpoint map for the remote platform
//!
//! All paths are relative to a configurable base URL so tests and staging
//! environments can point the services at a local server.

/// Resolved URLs for every remote endpoint the services consume
#[derive(Debug, Clone)]
pub struct PlatformEndpoints {
    base_url: String,
}

impl PlatformEndpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Lightweight authenticated endpoint used only to test whether the
    /// current credentials are still accepted
    pub fn probe(&self) -> String {
        format!("{}/tvcoins/details/", self.base_url)
    }

    pub fn signin(&self) -> String {
        format!("{}/accounts/signin/", self.base_url)
    }

    pub fn username_hint(&self, username: &str) -> String {
        format!(
            "{}/username_hint/?s={}",
            self.base_url,
            url::form_urlencoded::byte_serialize(username.as_bytes()).collect::<String>()
        )
    }

    /// Most-recent-first page of current grantees, page size fixed at 10
    pub fn list_users(&self) -> String {
        format!(
            "{}/pine_perm/list_users/?limit=10&order_by=-created",
            self.base_url
        )
    }

    pub fn add_access(&self) -> String {
        format!("{}/pine_perm/add/", self.base_url)
    }

    pub fn modify_access(&self) -> String {
        format!("{}/pine_perm/modify_user_expiration/", self.base_url)
    }

    pub fn remove_access(&self) -> String {
        format!("{}/pine_perm/remove/", self.base_url)
    }

    pub fn origin(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_normalized() {
        let endpoints = PlatformEndpoints::new("https://example.com/");
        assert_eq!(endpoints.signin(), "https://example.com/accounts/signin/");
    }

    #[test]
    fn test_list_users_pins_page_parameters() {
        let endpoints = PlatformEndpoints::new("https://example.com");
        assert_eq!(
            endpoints.list_users(),
            "https://example.com/pine_perm/list_users/?limit=10&order_by=-created"
        );
    }

    #[test]
    fn test_username_hint_escapes_query() {
        let endpoints = PlatformEndpoints::new("https://example.com");
        assert_eq!(
            endpoints.username_hint("a b"),
            "https://example.com/username_hint/?s=a+b"
        );
    }
}
