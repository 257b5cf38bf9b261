pub mod identity;

pub use identity::receive as identity_receive;
