pub mod credential;
pub mod events;
pub mod signaling;
mod state;

pub use credential::{CredentialGrant, SessionCredential};
pub use events::{ClientEvent, ServerEvent};
pub use signaling::{AudioCaps, CaptureOptions, LocalDescription, RemoteDescription};
pub use state::{ConnectionState, ConversationHandle, MessageId, Role, TurnState};
