//! Database repositories
//!
//! One trait per entity plus an SQLx implementation that branches on the
//! configured driver.

pub mod content;
pub mod session;
pub mod user;

pub use content::{ContentRepository, SqlxContentRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
