// handlers/api/mod.rs - Data reads under /api
//
// Listings return every row of their table. There is no pagination,
// filtering, or scoping to the requesting identity.

pub mod projects;
pub mod whoami;
pub mod workspaces;

pub use projects::list as projects_list;
pub use whoami::whoami;
pub use workspaces::list as workspaces_list;
