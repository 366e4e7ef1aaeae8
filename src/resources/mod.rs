pub mod cli;
pub mod config;
pub mod navmesh;

pub use cli::*;
pub use config::*;
pub use navmesh::*;
