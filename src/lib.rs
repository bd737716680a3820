//! Viewkit - base views for server-rendered axum sites
//!
//! Provides slugged, owned content with format-negotiating views, a uniform
//! action envelope, login and ownership checks, form helpers, templated mail
//! and site-wide template variables.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod theme;
pub mod util;
pub mod views;
