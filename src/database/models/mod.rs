pub mod project;
pub mod user;
pub mod workspace;

pub use project::Project;
pub use user::{User, UserProfile};
pub use workspace::Workspace;
