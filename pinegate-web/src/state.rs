//! Application state shared across request handlers

use crate::{WebConfig, WebError, WebResult};
use pinegate_access::AccessService;
use pinegate_core::PinegateConfig;
use std::sync::Arc;
use tracing::warn;

/// Shared state: the web configuration plus the access-control facade
#[derive(Clone)]
pub struct AppState {
    pub config: WebConfig,
    pub access: Arc<AccessService>,
}

impl AppState {
    /// Build state from the process environment
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let pinegate = PinegateConfig::from_env();
        Self::with_platform_config(config, pinegate).await
    }

    /// Build state from an explicit platform configuration
    pub async fn with_platform_config(
        config: WebConfig,
        pinegate: PinegateConfig,
    ) -> WebResult<Self> {
        // Missing credentials degrade to failing logins rather than
        // refusing to start; the session manager has no terminal state.
        if let Err(e) = pinegate.validate() {
            warn!("Platform configuration incomplete: {}", e);
        }

        let access =
            AccessService::new(&pinegate).map_err(|e| WebError::Config(e.to_string()))?;

        Ok(Self {
            config,
            access: Arc::new(access),
        })
    }
}
