//! API middleware and shared state
//!
//! - Identity: session token (Bearer header or `session` cookie) resolved
//!   into an [`AuthenticatedUser`] request extension
//! - Request timing, logged through `tracing`

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::contents::ContentViews;
use crate::config::ViewsConfig;
use crate::db::repositories::{SqlxContentRepository, SqlxSessionRepository, SqlxUserRepository};
use crate::db::DynDatabasePool;
use crate::services::{ContentService, MailService, UserService};
use crate::theme::TemplateEngine;
use crate::views::{AuthenticatedUser, Responder, RequestMeta, ViewConfig, ViewError};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub content_service: Arc<ContentService>,
    pub templates: Arc<RwLock<TemplateEngine>>,
    pub content_views: Arc<ContentViews>,
    /// `None` when no SMTP relay is configured
    pub mail: Option<Arc<MailService>>,
}

impl AppState {
    /// Wire repositories and services over `pool`
    pub fn new(
        pool: DynDatabasePool,
        templates: Arc<RwLock<TemplateEngine>>,
        views: ViewsConfig,
        mail: Option<MailService>,
    ) -> Self {
        let user_service = Arc::new(UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
        ));
        let content_service = Arc::new(ContentService::new(SqlxContentRepository::boxed(pool)));
        let content_views = Arc::new(ContentViews::new(&views));

        Self {
            user_service,
            content_service,
            templates,
            content_views,
            mail: mail.map(Arc::new),
        }
    }

    /// Responder for `view` on the current request
    pub fn responder(&self, view: &ViewConfig, meta: RequestMeta) -> Result<Responder, ViewError> {
        Responder::new(view, meta, self.templates.clone())
    }
}

/// Extract session token from request
///
/// Checks the Authorization header (Bearer token) first, then the
/// `session` cookie.
pub fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Resolve the session, if any, into the current user.
///
/// Never rejects: views decide themselves whether a user is required.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(&request) {
        match state.user_service.validate_session(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(AuthenticatedUser(user));
            }
            Ok(None) => tracing::debug!("Ignoring unknown or expired session"),
            Err(e) => tracing::warn!("Session validation failed: {}", e),
        }
    }
    next.run(request).await
}

/// Log method, path, status and duration of every request
pub async fn request_timing(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "request completed"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::db::{create_test_pool, migrations};
    use axum::body::Body;

    #[tokio::test]
    async fn test_state_uses_configured_views() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let engine = TemplateEngine::new(
            std::path::Path::new("/nonexistent-templates"),
            &SiteConfig::default(),
        )
        .unwrap();
        let views = ViewsConfig {
            login_url: "/accounts/login".to_string(),
            home_url: Some("/home".to_string()),
            error_url: None,
        };

        let state = AppState::new(pool, Arc::new(RwLock::new(engine)), views, None);
        assert_eq!(state.content_views.login_url, "/accounts/login");
        assert_eq!(state.content_views.save_action.redirect_target(true).unwrap(), "/home");
        assert!(state.content_views.save_action.redirect_target(false).is_err());
        assert!(state.mail.is_none());
    }

    fn create_request_with_auth(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn create_request_with_cookie(cookie: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_session_token_from_bearer() {
        let request = create_request_with_auth("test-token-123");
        assert_eq!(extract_session_token(&request), Some("test-token-123".to_string()));
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let request = create_request_with_cookie("theme=dark; session=test-token-456");
        assert_eq!(extract_session_token(&request), Some("test-token-456".to_string()));
    }

    #[test]
    fn test_extract_session_token_bearer_priority() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer bearer-token")
            .header(header::COOKIE, "session=cookie-token")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_session_token(&request), Some("bearer-token".to_string()));
    }

    #[test]
    fn test_extract_session_token_none() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        assert!(extract_session_token(&request).is_none());

        let request = create_request_with_cookie("csrftoken=abc");
        assert!(extract_session_token(&request).is_none());
    }

    #[test]
    fn test_extract_session_token_invalid_bearer() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Basic invalid")
            .body(Body::empty())
            .unwrap();
        assert!(extract_session_token(&request).is_none());
    }
}
