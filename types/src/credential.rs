use chrono::{DateTime, Utc};
use secrecy::SecretString;

/// Wire shape of the credential broker's response.
///
/// `ok: false` or a missing token is fatal for the connection attempt.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialGrant {
    ok: bool,
    token: Option<String>,
    session_id: Option<String>,
    model: Option<String>,
    voice: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl CredentialGrant {
    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn voice(&self) -> Option<&str> {
        self.voice.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// A short-lived, single-use session credential minted per connection attempt.
///
/// Immutable once issued. Owned by the transport session manager for the
/// lifetime of exactly one attempt; a failed handshake requires a fresh one.
#[derive(Debug, Clone)]
pub struct SessionCredential {
    token: SecretString,
    session_id: String,
    model: String,
    voice: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionCredential {
    pub fn new(
        token: impl Into<String>,
        session_id: impl Into<String>,
        model: impl Into<String>,
        voice: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token: SecretString::from(token.into()),
            session_id: session_id.into(),
            model: model.into(),
            voice: voice.into(),
            issued_at,
            expires_at,
        }
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Remaining validity window, zero once expired. Used to bound the
    /// signaling exchange so a stale credential is never retried.
    pub fn time_to_expiry(&self) -> std::time::Duration {
        (self.expires_at - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn credential_expiring_in(seconds: i64) -> SessionCredential {
        let now = Utc::now();
        SessionCredential::new(
            "tok",
            "sess_1",
            "companion-realtime",
            "warm",
            now,
            now + Duration::seconds(seconds),
        )
    }

    #[test]
    fn expiry_window() {
        let fresh = credential_expiring_in(120);
        assert!(!fresh.is_expired());
        assert!(fresh.time_to_expiry() > std::time::Duration::from_secs(100));

        let stale = credential_expiring_in(-5);
        assert!(stale.is_expired());
        assert_eq!(stale.time_to_expiry(), std::time::Duration::ZERO);
    }

    #[test]
    fn grant_parses_error_body() {
        let raw = r#"{"ok":false,"error":"quota exhausted"}"#;
        let grant: CredentialGrant = serde_json::from_str(raw).unwrap();
        assert!(!grant.ok());
        assert_eq!(grant.error(), Some("quota exhausted"));
        assert!(grant.token().is_none());
    }
}
