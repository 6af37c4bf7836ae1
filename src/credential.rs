use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};

use crate::error::CredentialError;
use crate::types::{CredentialGrant, SessionCredential};

const BROKER_URL_ENV: &str = "SOLACE_BROKER_URL";
const APP_TOKEN_ENV: &str = "SOLACE_APP_TOKEN";
const DEFAULT_BROKER_URL: &str = "https://api.solace.chat";

/// Fallback validity window when the broker omits `expiresAt`. Short on
/// purpose: a credential is only meant to survive one handshake.
const DEFAULT_TTL_SECS: i64 = 120;

/// Client for the authorization backend that mints ephemeral session
/// credentials. Called fresh for every connection attempt; nothing is cached.
pub struct CredentialBroker {
    http: reqwest::Client,
    base_url: String,
    app_token: SecretString,
}

pub struct CredentialBrokerBuilder {
    broker: CredentialBroker,
}

impl CredentialBrokerBuilder {
    pub fn new() -> Self {
        Self {
            broker: CredentialBroker::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.broker.base_url = base_url.to_string();
        self
    }

    pub fn with_app_token(mut self, app_token: &str) -> Self {
        self.broker.app_token = SecretString::from(app_token.to_string());
        self
    }

    pub fn build(self) -> CredentialBroker {
        self.broker
    }
}

impl Default for CredentialBrokerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialBroker {
    pub fn new() -> Self {
        dotenvy::dotenv().ok();
        Self {
            http: reqwest::Client::new(),
            base_url: std::env::var(BROKER_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_BROKER_URL.to_string()),
            app_token: std::env::var(APP_TOKEN_ENV).unwrap_or_default().into(),
        }
    }

    pub fn builder() -> CredentialBrokerBuilder {
        CredentialBrokerBuilder::new()
    }

    /// Requests a fresh single-use credential for one connection attempt.
    pub async fn acquire(&self) -> Result<SessionCredential, CredentialError> {
        let url = format!("{}/v1/voice/credentials", self.base_url);
        tracing::debug!("requesting session credential from {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.app_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(CredentialError::Unauthenticated);
        }
        if !status.is_success() {
            return Err(CredentialError::Backend(format!(
                "credential endpoint returned {}",
                status
            )));
        }

        let grant = response.json::<CredentialGrant>().await?;
        grant_into_credential(grant)
    }
}

impl Default for CredentialBroker {
    fn default() -> Self {
        Self::new()
    }
}

fn grant_into_credential(grant: CredentialGrant) -> Result<SessionCredential, CredentialError> {
    if !grant.ok() {
        let reason = grant.error().unwrap_or("no reason given").to_string();
        return Err(CredentialError::Backend(reason));
    }
    let token = grant
        .token()
        .ok_or_else(|| CredentialError::Backend("grant is missing a token".to_string()))?;

    let issued_at = Utc::now();
    let expires_at = grant
        .expires_at()
        .unwrap_or(issued_at + Duration::seconds(DEFAULT_TTL_SECS));

    Ok(SessionCredential::new(
        token,
        grant.session_id().unwrap_or_default(),
        grant.model().unwrap_or_default(),
        grant.voice().unwrap_or_default(),
        issued_at,
        expires_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_grant(raw: &str) -> CredentialGrant {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn grant_with_token_becomes_credential() {
        let grant = parse_grant(
            r#"{"ok":true,"token":"ek_abc","sessionId":"sess_1","model":"companion-realtime","voice":"warm","expiresAt":"2099-01-01T00:00:00Z"}"#,
        );
        let credential = grant_into_credential(grant).unwrap();
        assert_eq!(credential.session_id(), "sess_1");
        assert_eq!(credential.model(), "companion-realtime");
        assert_eq!(credential.voice(), "warm");
        assert!(!credential.is_expired());
    }

    #[test]
    fn rejected_grant_is_backend_error() {
        let grant = parse_grant(r#"{"ok":false,"error":"session quota exceeded"}"#);
        match grant_into_credential(grant) {
            Err(CredentialError::Backend(reason)) => {
                assert_eq!(reason, "session quota exceeded")
            }
            other => panic!("expected backend error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn ok_grant_without_token_is_fatal() {
        let grant = parse_grant(r#"{"ok":true}"#);
        assert!(matches!(
            grant_into_credential(grant),
            Err(CredentialError::Backend(_))
        ));
    }
}
