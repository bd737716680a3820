//! Action envelope
//!
//! Every state-changing view answers with the same shape:
//! `{success, message, redirect, redirect_url?}` plus view-specific keys.

use axum::{http::StatusCode, response::Response};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tera::Context as TeraContext;

use super::auth::ActionFailure;
use super::base::Responder;
use super::error::ViewError;
use super::format::Format;
use crate::config::ViewsConfig;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "The action was completed successfully";
pub const DEFAULT_FAIL_MESSAGE: &str = "The action could not be completed";
pub const DEFAULT_CONFIRM_MESSAGE: &str = "Do you want to continue with this action?";

/// Messages and redirect targets of an action view
#[derive(Debug, Clone)]
pub struct ActionConfig {
    pub success_message: String,
    pub fail_message: String,
    pub confirm_message: String,
    /// Redirect asynchronous callers too; HTML callers of actions always
    /// redirect
    pub redirect: bool,
    pub success_url: Option<String>,
    pub fail_url: Option<String>,
    /// Site-wide fallback for `success_url`
    pub home_url: Option<String>,
    /// Site-wide fallback for `fail_url`, also the target of authorization
    /// failures
    pub error_url: Option<String>,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            success_message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            fail_message: DEFAULT_FAIL_MESSAGE.to_string(),
            confirm_message: DEFAULT_CONFIRM_MESSAGE.to_string(),
            redirect: false,
            success_url: None,
            fail_url: None,
            home_url: None,
            error_url: None,
        }
    }
}

impl ActionConfig {
    /// Defaults with the site's home and error pages as fallbacks
    pub fn from_views(views: &ViewsConfig) -> Self {
        Self {
            home_url: views.home_url.clone(),
            error_url: views.error_url.clone(),
            ..Default::default()
        }
    }

    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    pub fn fail_message(mut self, message: impl Into<String>) -> Self {
        self.fail_message = message.into();
        self
    }

    pub fn confirm_message(mut self, message: impl Into<String>) -> Self {
        self.confirm_message = message.into();
        self
    }

    pub fn success_url(mut self, url: impl Into<String>) -> Self {
        self.success_url = Some(url.into());
        self
    }

    pub fn fail_url(mut self, url: impl Into<String>) -> Self {
        self.fail_url = Some(url.into());
        self
    }

    pub fn always_redirect(mut self) -> Self {
        self.redirect = true;
        self
    }

    /// Redirect target for an outcome without an explicit one
    pub fn redirect_target(&self, success: bool) -> Result<String, ViewError> {
        let (specific, fallback, kind) = if success {
            (&self.success_url, &self.home_url, "success")
        } else {
            (&self.fail_url, &self.error_url, "fail")
        };
        specific
            .as_ref()
            .or(fallback.as_ref())
            .cloned()
            .ok_or_else(|| ViewError::Configuration(format!("No {} redirect url configured", kind)))
    }
}

/// The envelope itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
    pub redirect: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

/// Builder for one action response
pub struct ActionResponse<'a> {
    config: &'a ActionConfig,
    success: bool,
    message: Option<String>,
    redirect: bool,
    redirect_url: Option<String>,
    status: StatusCode,
    context: TeraContext,
}

impl<'a> ActionResponse<'a> {
    pub fn success(config: &'a ActionConfig) -> Self {
        Self::with_outcome(config, true)
    }

    pub fn fail(config: &'a ActionConfig) -> Self {
        Self::with_outcome(config, false)
    }

    fn with_outcome(config: &'a ActionConfig, success: bool) -> Self {
        Self {
            config,
            success,
            message: None,
            redirect: config.redirect,
            redirect_url: None,
            status: StatusCode::OK,
            context: TeraContext::new(),
        }
    }

    /// Replace the configured message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn redirect(mut self, redirect: bool) -> Self {
        self.redirect = redirect;
        self
    }

    /// Explicit target; also turns the redirect on
    pub fn redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect = true;
        self.redirect_url = Some(url.into());
        self
    }

    /// Status for responses that are not redirects
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Extra context entry
    pub fn with<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.context.insert(key, value);
        self
    }

    pub fn outcome(&self) -> Result<ActionOutcome, ViewError> {
        let message = self.message.clone().unwrap_or_else(|| {
            if self.success {
                self.config.success_message.clone()
            } else {
                self.config.fail_message.clone()
            }
        });

        let redirect_url = if self.redirect {
            Some(match &self.redirect_url {
                Some(url) => url.clone(),
                None => self.config.redirect_target(self.success)?,
            })
        } else {
            None
        };

        Ok(ActionOutcome {
            success: self.success,
            message,
            redirect: self.redirect,
            redirect_url,
        })
    }

    pub fn respond(self, responder: &mut Responder) -> Result<Response, ViewError> {
        let outcome = self.outcome()?;
        if !outcome.success {
            tracing::debug!("Action on {} failed: {}", responder.meta().path, outcome.message);
        }

        let mut context = responder.base_context()?;
        context.extend(self.context);
        context.insert("success", &outcome.success);
        context.insert("message", &outcome.message);

        responder.set_redirect(outcome.redirect_url);
        responder.render_with_status(self.status, context)
    }
}

/// Run `action` and answer with its outcome.
///
/// HTML callers are redirected to the outcome's target, asynchronous
/// callers get the envelope inline unless the view always redirects.
pub async fn run_action<Fut>(
    responder: &mut Responder,
    config: &ActionConfig,
    action: Fut,
) -> Result<Response, ViewError>
where
    Fut: Future<Output = Result<bool, ActionFailure>>,
{
    match action.await {
        Ok(success) => {
            let response = if success {
                ActionResponse::success(config)
            } else {
                ActionResponse::fail(config)
            };
            let redirect = config.redirect || responder.format() == Format::Html;
            response.redirect(redirect).respond(responder)
        }
        Err(failure) => failure.respond(responder, config),
    }
}

/// Confirmation page shown before an action runs
pub fn confirm(responder: &mut Responder, config: &ActionConfig) -> Result<Response, ViewError> {
    let mut response = ActionResponse::success(config)
        .message(config.confirm_message.clone())
        .redirect(false)
        .with("confirm", &true)
        .with("confirm_message", &config.confirm_message);
    if let Some(home) = &config.home_url {
        response = response.with("cancel_url", home);
    }
    response.respond(responder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::base::test_support::{body_string, engine};
    use crate::views::base::ViewConfig;
    use crate::views::request::RequestMeta;
    use axum::http::header;
    use serde_json::Value;

    fn config() -> ActionConfig {
        ActionConfig {
            home_url: Some("/".to_string()),
            error_url: Some("/error".to_string()),
            ..Default::default()
        }
    }

    fn view() -> ViewConfig {
        ViewConfig::new("contents", "delete").template(Format::Html, "page.confirm.html")
    }

    fn responder(is_async: bool) -> Responder {
        let mut meta = RequestMeta::get("/contents/a/delete");
        meta.is_async = is_async;
        Responder::new(&view(), meta, engine()).unwrap()
    }

    async fn json_of(response: Response) -> Value {
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    #[test]
    fn test_redirect_resolution_order() {
        let config = config();
        assert_eq!(config.redirect_target(true).unwrap(), "/");
        assert_eq!(config.redirect_target(false).unwrap(), "/error");

        let config = config.success_url("/done").fail_url("/oops");
        assert_eq!(config.redirect_target(true).unwrap(), "/done");
        assert_eq!(config.redirect_target(false).unwrap(), "/oops");

        let bare = ActionConfig::default();
        assert!(matches!(bare.redirect_target(true), Err(ViewError::Configuration(_))));
    }

    #[test]
    fn test_outcome_messages() {
        let config = config();
        let outcome = ActionResponse::success(&config).outcome().unwrap();
        assert_eq!(outcome.message, DEFAULT_SUCCESS_MESSAGE);
        assert!(!outcome.redirect);
        assert!(outcome.redirect_url.is_none());

        let outcome = ActionResponse::fail(&config)
            .message("nope")
            .redirect_url("/login")
            .outcome()
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message, "nope");
        assert_eq!(outcome.redirect_url.as_deref(), Some("/login"));
    }

    #[test]
    fn test_outcome_serializes_without_redirect_url() {
        let outcome = ActionOutcome {
            success: true,
            message: "ok".into(),
            redirect: false,
            redirect_url: None,
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            serde_json::json!({"success": true, "message": "ok", "redirect": false})
        );
    }

    #[tokio::test]
    async fn test_run_action_html_redirects_to_outcome_target() {
        let config = config();

        let mut html = responder(false);
        let response = run_action(&mut html, &config, async { Ok(true) }).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let mut html = responder(false);
        let response = run_action(&mut html, &config, async { Ok(false) }).await.unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/error");
    }

    #[tokio::test]
    async fn test_run_action_async_is_inline() {
        let config = config();
        let mut json = responder(true);
        let response = run_action(&mut json, &config, async { Ok(false) }).await.unwrap();

        let body = json_of(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], DEFAULT_FAIL_MESSAGE);
        assert_eq!(body["redirect"], false);
    }

    #[tokio::test]
    async fn test_confirm_page() {
        let config = config();

        let mut json = responder(true);
        let body = json_of(confirm(&mut json, &config).unwrap()).await;
        assert_eq!(body["confirm"], true);
        assert_eq!(body["confirm_message"], DEFAULT_CONFIRM_MESSAGE);
        assert_eq!(body["success"], true);

        let mut html = responder(false);
        let response = confirm(&mut html, &config).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains(DEFAULT_CONFIRM_MESSAGE));
    }
}
