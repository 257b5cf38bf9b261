pub mod event;
pub mod signature;

pub use event::{decode, Delivery, EventError, EventKind, UserData};
pub use signature::{SignatureError, WebhookVerifier};
