mod compiler;
mod consultation;
mod planner;
mod renderer;
#[cfg(test)]
pub mod scripted_backend;
mod sessions;
mod visual_assets;

pub use compiler::*;
pub use consultation::*;
pub use planner::*;
pub use renderer::*;
pub use sessions::*;
pub use visual_assets::*;
