mod credential;
mod error;
mod session;
mod signaling;
mod transport;

pub use solace_voice_types as types;
pub use solace_voice_utils as utils;

pub use credential::{CredentialBroker, CredentialBrokerBuilder};
pub use error::{ConnectError, CredentialError, SessionError};
pub use session::persist::{ConversationStore, HttpConversationStore};
pub use session::{
    SessionConfig, SessionConfigBuilder, SessionObserver, SessionSnapshot, VoiceSession,
};
