pub mod constants;
pub mod field;
pub mod greeting;
pub mod lifetime;
pub mod phase;
pub static SCENE_WGSL: &str = include_str!("../shaders/scene.wgsl");

pub use constants::*;
pub use field::*;
pub use greeting::*;
pub use lifetime::*;
pub use phase::*;
