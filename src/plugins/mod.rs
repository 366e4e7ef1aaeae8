pub mod animation;
pub mod core;
pub mod input;
pub mod navigation;
pub mod scene;
