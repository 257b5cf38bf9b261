pub mod user_sync;

pub use user_sync::{SyncError, SyncOutcome, UserSyncService};
