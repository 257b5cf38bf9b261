// handlers/mod.rs - Handler tiers
//
// public   - liveness and health probes, never touch a session
// api      - reads under /api; a session is optional unless the handler extracts AuthSession
// webhooks - identity-provider callbacks, authenticated by signature rather than session
pub mod api;
pub mod public;
pub mod webhooks;
