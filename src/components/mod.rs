pub mod agent;
pub mod navigation;

pub use agent::*;
pub use navigation::*;
