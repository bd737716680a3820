//! Login and ownership checks
//!
//! Checks return an [`ActionFailure`] instead of a response so a handler can
//! stop with `?`-like flow and turn the failure into an envelope once.

use axum::{http::StatusCode, response::Response};

use super::action::{ActionConfig, ActionResponse};
use super::base::Responder;
use super::error::ViewError;
use super::request::RequestMeta;
use crate::models::{Content, User};
use crate::services::ContentServiceError;

pub const LOGIN_REQUIRED_MESSAGE: &str = "You need to sign in to continue.";
pub const NOT_OWNER_MESSAGE: &str = "You are not the owner";
pub const NOT_FOUND_MESSAGE: &str = "The content does not exist";

/// Recoverable reasons an action did not happen
#[derive(Debug, thiserror::Error)]
pub enum ActionFailure {
    #[error("{0}")]
    Validation(String),

    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound,

    /// `login_url` already carries the `next` parameter
    #[error("{}", LOGIN_REQUIRED_MESSAGE)]
    NotAuthenticated { login_url: String },

    #[error("{}", NOT_OWNER_MESSAGE)]
    NotOwner,

    /// Not recoverable, propagates as a 500
    #[error(transparent)]
    Fault(#[from] ViewError),
}

impl From<ContentServiceError> for ActionFailure {
    fn from(e: ContentServiceError) -> Self {
        match e {
            ContentServiceError::NotFound(_) => Self::NotFound,
            ContentServiceError::ValidationError(msg) => Self::Validation(msg),
            ContentServiceError::InternalError(inner) => Self::Fault(ViewError::Internal(inner)),
        }
    }
}

impl ActionFailure {
    /// Fail envelope for this failure; `Fault` is returned as the error
    pub fn respond(self, responder: &mut Responder, config: &ActionConfig) -> Result<Response, ViewError> {
        let response = match self {
            ActionFailure::Fault(e) => return Err(e),
            ActionFailure::Validation(message) => ActionResponse::fail(config)
                .message(message)
                .status(StatusCode::BAD_REQUEST),
            ActionFailure::NotAuthenticated { login_url } => ActionResponse::fail(config)
                .message(LOGIN_REQUIRED_MESSAGE)
                .redirect_url(login_url)
                .status(StatusCode::UNAUTHORIZED),
            ActionFailure::NotFound => error_page_response(config)
                .message(NOT_FOUND_MESSAGE)
                .status(StatusCode::NOT_FOUND),
            ActionFailure::NotOwner => error_page_response(config)
                .message(NOT_OWNER_MESSAGE)
                .status(StatusCode::FORBIDDEN),
        };
        response.respond(responder)
    }
}

/// Fail response redirected to the site's error page
fn error_page_response(config: &ActionConfig) -> ActionResponse<'_> {
    let response = ActionResponse::fail(config).redirect(true);
    match &config.error_url {
        Some(url) => response.redirect_url(url.clone()),
        None => response,
    }
}

/// Login URL with the current path as the `next` parameter
pub fn login_redirect(login_url: &str, path: &str) -> String {
    format!("{}?next={}", login_url, urlencoding::encode(path))
}

/// The signed-in user, or a failure redirecting to `login_url`
pub fn require_login<'m>(meta: &'m RequestMeta, login_url: &str) -> Result<&'m User, ActionFailure> {
    meta.user().ok_or_else(|| ActionFailure::NotAuthenticated {
        login_url: login_redirect(login_url, &meta.path),
    })
}

/// Anything with an owner
pub trait Owned {
    fn owner_id(&self) -> i64;
}

impl Owned for Content {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// `object` if it exists and belongs to `user`
pub fn require_owner<T: Owned>(user: &User, object: Option<T>) -> Result<T, ActionFailure> {
    let object = object.ok_or(ActionFailure::NotFound)?;
    if !user.owns(object.owner_id()) {
        tracing::debug!("User {} is not the owner of the requested object", user.id);
        return Err(ActionFailure::NotOwner);
    }
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::base::test_support::{body_string, engine};
    use crate::views::base::ViewConfig;
    use crate::views::format::Format;
    use axum::http::header;
    use serde_json::Value;

    fn user(id: i64) -> User {
        let mut user = User::new("ana", "ana@example.com");
        user.id = id;
        user
    }

    fn content(owner: i64) -> Content {
        let mut content = Content::new("Test content", owner);
        content.id = 1;
        content.slug = "test-content".into();
        content
    }

    fn action_config() -> ActionConfig {
        ActionConfig {
            home_url: Some("/".into()),
            error_url: Some("/error".into()),
            ..Default::default()
        }
    }

    fn responder(is_async: bool) -> Responder {
        let config = ViewConfig::new("contents", "update").template(Format::Html, "page.form.html");
        let mut meta = RequestMeta::get("/contents/test-content/edit?tab=1");
        meta.is_async = is_async;
        Responder::new(&config, meta, engine()).unwrap()
    }

    #[test]
    fn test_login_redirect_encodes_path() {
        assert_eq!(
            login_redirect("/login", "/contents/new?x=1"),
            "/login?next=%2Fcontents%2Fnew%3Fx%3D1"
        );
    }

    #[test]
    fn test_require_login() {
        let mut meta = RequestMeta::get("/contents/new");
        match require_login(&meta, "/login") {
            Err(ActionFailure::NotAuthenticated { login_url }) => {
                assert_eq!(login_url, "/login?next=%2Fcontents%2Fnew")
            }
            other => panic!("unexpected: {other:?}"),
        }

        meta.user = Some(user(3));
        assert_eq!(require_login(&meta, "/login").unwrap().id, 3);
    }

    #[test]
    fn test_require_owner() {
        assert_eq!(require_owner(&user(1), Some(content(1))).unwrap().id, 1);
        assert!(matches!(
            require_owner(&user(2), Some(content(1))),
            Err(ActionFailure::NotOwner)
        ));
        assert!(matches!(
            require_owner::<Content>(&user(2), None),
            Err(ActionFailure::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_not_authenticated_envelope() {
        let mut json = responder(true);
        let meta = json.meta().clone();
        let failure = require_login(&meta, "/login").unwrap_err();
        let response = failure.respond(&mut json, &action_config()).unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], LOGIN_REQUIRED_MESSAGE);
        assert_eq!(body["redirect"], true);
        assert_eq!(
            body["redirect_url"],
            "/login?next=%2Fcontents%2Ftest-content%2Fedit%3Ftab%3D1"
        );
    }

    #[tokio::test]
    async fn test_not_owner_redirects_to_error_page() {
        let mut html = responder(false);
        let response = ActionFailure::NotOwner
            .respond(&mut html, &action_config())
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/error");

        let mut json = responder(true);
        let response = ActionFailure::NotFound
            .respond(&mut json, &action_config())
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["message"], NOT_FOUND_MESSAGE);
        assert_eq!(body["redirect_url"], "/error");
    }

    #[test]
    fn test_fault_propagates() {
        let mut html = responder(false);
        let failure = ActionFailure::from(ContentServiceError::InternalError(anyhow::anyhow!("db down")));
        assert!(matches!(
            failure.respond(&mut html, &action_config()),
            Err(ViewError::Internal(_))
        ));
    }
}
