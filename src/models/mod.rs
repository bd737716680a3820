//! Data models
//!
//! - `Content`: the base entity every slugged, owned content type shares
//! - `User` / `Session`: the read side of authentication
//! - `fields`: reusable validated field types

mod content;
pub mod fields;
mod session;
mod user;

pub use content::{Content, ContentForm};
pub use fields::HexColor;
pub use session::Session;
pub use user::{CurrentUser, User};
