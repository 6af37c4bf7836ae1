use secrecy::ExposeSecret;

use crate::error::ConnectError;
use crate::types::{LocalDescription, RemoteDescription, SessionCredential};

/// Performs the authenticated description exchange against the model-specific
/// signaling endpoint. One exchange per connection attempt; the credential is
/// the bearer.
pub(crate) struct SignalingClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SignalingClient {
    pub(crate) fn new(endpoint: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub(crate) async fn exchange(
        &self,
        credential: &SessionCredential,
        local: &LocalDescription,
    ) -> Result<RemoteDescription, ConnectError> {
        let url = format!("{}?model={}", self.endpoint, credential.model());
        tracing::debug!("posting local description to {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(credential.token().expose_secret())
            .json(local)
            .send()
            .await
            .map_err(|e| ConnectError::HandshakeFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectError::HandshakeFailed(format!(
                "signaling endpoint returned {}: {}",
                status, body
            )));
        }

        let remote = response
            .json::<RemoteDescription>()
            .await
            .map_err(|e| ConnectError::HandshakeFailed(format!("bad remote description: {}", e)))?;

        if !remote.is_answer() {
            return Err(ConnectError::HandshakeFailed(format!(
                "expected an answer description, got '{}'",
                remote.kind()
            )));
        }
        Ok(remote)
    }
}
