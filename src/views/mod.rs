//! View building blocks
//!
//! Handlers compose these explicitly:
//! - [`Responder`]: format negotiation and rendering for one request
//! - [`ActionResponse`] / [`run_action`] / [`confirm`]: the action envelope
//! - [`require_login`] / [`require_owner`]: authorization as fail envelopes
//! - [`Form`] / [`form_valid`] / [`form_invalid`]: form processing
//!
//! Configuration ([`ViewConfig`], [`ActionConfig`], [`FormConfig`]) is built
//! once per view and never mutated by requests.

pub mod action;
pub mod auth;
pub mod base;
pub mod error;
pub mod form;
pub mod format;
pub mod request;

pub use action::{confirm, run_action, ActionConfig, ActionOutcome, ActionResponse};
pub use auth::{login_redirect, require_login, require_owner, ActionFailure, Owned};
pub use base::{Responder, ViewConfig};
pub use error::{ApiError, ViewError};
pub use form::{form_invalid, form_valid, show_form, Form, FormConfig, FormErrors, Model};
pub use format::{resolve_format, Format};
pub use request::{AuthenticatedUser, RequestMeta};
