use cloner_logging::clone_debug;

use crate::scrape::BackendSettings;

/// Liveness probe against the backend. Boolean result, never errors.
#[derive(Debug, Clone)]
pub struct HealthChecker {
    settings: BackendSettings,
    http: reqwest::Client,
}

impl HealthChecker {
    pub fn new(settings: BackendSettings) -> Self {
        Self {
            settings,
            http: reqwest::Client::new(),
        }
    }

    /// `true` only for a 2xx response; transport failures and every other
    /// status are `false`.
    pub async fn check_health(&self) -> bool {
        let endpoint = format!("{}/api/health", self.settings.base_url);
        let request = self
            .http
            .get(&endpoint)
            .timeout(self.settings.request_timeout);
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                clone_debug!("Health probe failed: {err}");
                false
            }
        }
    }
}
