pub mod animation;
pub mod camera;
pub mod navigation;
pub mod pointer;

pub use camera::*;
pub use navigation::*;
