mod message_builder;
mod transport;

use reqwest::Client;
use std::time::Duration;
use url::Url;

use microjournal_domain::shared::DomainError;

pub const DEFAULT_FCM_BASE_URL: &str = "https://fcm.googleapis.com";

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub project_id: String,
    /// OAuth2 bearer token with the `firebase.messaging` scope.
    pub access_token: String,
    pub base_url: String,
    pub request_timeout: Duration,
    /// Upper bound on concurrent per-token requests within one multicast.
    pub max_in_flight: usize,
}

impl FcmConfig {
    pub fn new(project_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            access_token: access_token.into(),
            base_url: DEFAULT_FCM_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            max_in_flight: 16,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }
}

/// Firebase Cloud Messaging HTTP v1 transport
pub struct FcmTransport {
    config: FcmConfig,
    send_url: Url,
    client: Client,
}

impl FcmTransport {
    pub fn new(config: FcmConfig) -> Result<Self, DomainError> {
        if config.project_id.trim().is_empty() {
            return Err(DomainError::Validation("FCM project id is empty".to_string()));
        }
        if config.access_token.trim().is_empty() {
            return Err(DomainError::Validation("FCM access token is empty".to_string()));
        }

        let send_url = Self::build_send_url(&config.base_url, &config.project_id)?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DomainError::Infrastructure(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            send_url,
            client,
        })
    }

    fn build_send_url(base_url: &str, project_id: &str) -> Result<Url, DomainError> {
        let base = Url::parse(base_url)
            .map_err(|e| DomainError::Validation(format!("Invalid FCM base URL '{base_url}': {e}")))?;
        base.join(&format!("/v1/projects/{project_id}/messages:send"))
            .map_err(|e| DomainError::Validation(format!("Invalid FCM project id '{project_id}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_send_url() {
        let url = FcmTransport::build_send_url(DEFAULT_FCM_BASE_URL, "journal-prod").unwrap();
        assert_eq!(
            url.as_str(),
            "https://fcm.googleapis.com/v1/projects/journal-prod/messages:send"
        );
    }

    #[test]
    fn test_build_send_url_ignores_base_path() {
        let url = FcmTransport::build_send_url("http://127.0.0.1:4000/ignored/", "p").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:4000/v1/projects/p/messages:send");
    }

    #[test]
    fn test_new_rejects_missing_credentials() {
        assert!(FcmTransport::new(FcmConfig::new("", "token")).is_err());
        assert!(FcmTransport::new(FcmConfig::new("project", " ")).is_err());
        assert!(FcmTransport::new(FcmConfig::new("project", "token").with_base_url("not a url")).is_err());
    }
}
