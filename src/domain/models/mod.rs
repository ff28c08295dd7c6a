mod backend;
mod conversation;
mod error;
mod generated_image;
mod message;
mod session;
mod slash_commands;
mod theme;
mod visual;

pub use backend::*;
pub use conversation::*;
pub use error::*;
pub use generated_image::*;
pub use message::*;
pub use session::*;
pub use slash_commands::*;
pub use theme::*;
pub use visual::*;
