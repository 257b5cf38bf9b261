// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Liveness answers must stay independent of the store so that orchestrators
// do not restart the process when only the database is down. /health is the
// endpoint that reports store reachability.

pub mod health;
pub mod liveness;

pub use health::health;
pub use liveness::{api_root, root};
