//! HTTP Handlers

mod material;
mod ping;
mod reading;
mod websocket;

pub use material::*;
pub use ping::*;
pub use reading::*;
pub use websocket::*;
