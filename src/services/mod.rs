//! Services layer - Business logic
//!
//! Services sit between the views and the repositories:
//! - `content`: saving content with unique slugs
//! - `slug`: slug normalization and disambiguation
//! - `user`: session token resolution
//! - `mail`: templated multipart mail
//! - `site`: site-wide template context

pub mod content;
pub mod mail;
pub mod site;
pub mod slug;
pub mod user;

pub use content::{ContentService, ContentServiceError};
pub use mail::{MailError, MailService, MailTransport, Mailer, SmtpMailTransport};
pub use site::site_context;
pub use slug::{slugify, SlugAssigner, SlugError};
pub use user::{UserService, UserServiceError};
