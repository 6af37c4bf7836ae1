/// Credential broker failures. All of these are retryable by the caller;
/// none of them consume a credential because none was issued.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("credential broker rejected the request as unauthenticated")]
    Unauthenticated,

    #[error("credential broker error: {0}")]
    Backend(String),

    #[error("credential request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Connection attempt failures. `HandshakeFailed` and `Transport` consume the
/// credential: the caller must acquire a fresh one before retrying.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("microphone unavailable: {0}")]
    PermissionDenied(String),

    #[error("signaling handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors surfaced to the caller through `on_error` while a session is live.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The remote endpoint reported an error. The session stays open unless
    /// a terminal `response.failed` arrives alongside it.
    #[error("server error: {0}")]
    Server(String),

    /// The transport dropped out from under the session; terminal.
    #[error("transport closed: {0}")]
    TransportClosed(String),
}
