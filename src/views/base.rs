//! View configuration and the format-negotiating responder
//!
//! A [`ViewConfig`] is built once per view when the router is assembled. Each
//! request wraps it in a [`Responder`], which resolves the response format
//! up front and then emits JSON, a redirect, or a rendered template.

use anyhow::anyhow;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard};
use tera::Context as TeraContext;

use super::error::ViewError;
use super::format::{resolve_format, Format};
use super::request::RequestMeta;
use crate::models::CurrentUser;
use crate::theme::TemplateEngine;

/// Static description of a view
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub app_name: Option<String>,
    pub view_name: Option<String>,
    /// Page title, falls back to the view name
    pub title: Option<String>,
    pub templates: HashMap<Format, String>,
    pub default_format: Format,
    /// Forces a format regardless of the request
    pub format: Option<Format>,
    /// Where [`Responder::redirect_url`] points
    pub redirect_url: Option<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            app_name: None,
            view_name: None,
            title: None,
            templates: HashMap::new(),
            default_format: Format::Html,
            format: None,
            redirect_url: None,
        }
    }
}

impl ViewConfig {
    pub fn new(app_name: impl Into<String>, view_name: impl Into<String>) -> Self {
        Self {
            app_name: Some(app_name.into()),
            view_name: Some(view_name.into()),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Register the template rendered for `format`
    pub fn template(mut self, format: Format, name: impl Into<String>) -> Self {
        self.templates.insert(format, name.into());
        self
    }

    pub fn default_format(mut self, format: Format) -> Self {
        self.default_format = format;
        self
    }

    pub fn preset_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    /// Name used in configuration error messages
    fn label(&self) -> &str {
        self.view_name
            .as_deref()
            .or(self.app_name.as_deref())
            .unwrap_or("view")
    }

    pub fn get_app_name(&self) -> Result<&str, ViewError> {
        self.app_name
            .as_deref()
            .ok_or_else(|| ViewError::Configuration(format!("{} have to define an app_name", self.label())))
    }

    pub fn get_view_name(&self) -> Result<&str, ViewError> {
        self.view_name.as_deref().ok_or_else(|| {
            ViewError::Configuration(format!(
                "{} have to define view_name",
                self.app_name.as_deref().unwrap_or("view")
            ))
        })
    }

    pub fn get_title(&self) -> Result<&str, ViewError> {
        match &self.title {
            Some(title) => Ok(title),
            None => self.get_view_name().map_err(|_| {
                ViewError::Configuration(format!(
                    "{} have to define title or view_name",
                    self.app_name.as_deref().unwrap_or("view")
                ))
            }),
        }
    }
}

/// Per-request response builder for one view
pub struct Responder {
    config: ViewConfig,
    format: Format,
    meta: RequestMeta,
    templates: Arc<RwLock<TemplateEngine>>,
    /// Pending redirect target
    redirect: Option<String>,
}

impl Responder {
    /// Resolve the format for this request; fails for formats the view
    /// cannot produce
    pub fn new(
        config: &ViewConfig,
        meta: RequestMeta,
        templates: Arc<RwLock<TemplateEngine>>,
    ) -> Result<Self, ViewError> {
        let format = resolve_format(config, meta.is_async, meta.format.as_deref())?;
        Ok(Self {
            config: config.clone(),
            format,
            meta,
            templates,
            redirect: None,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn is_json(&self) -> bool {
        self.format == Format::Json
    }

    pub fn meta(&self) -> &RequestMeta {
        &self.meta
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Redirect instead of rendering; `None` cancels a pending redirect
    pub fn set_redirect(&mut self, target: Option<String>) {
        self.redirect = target;
    }

    pub fn pending_redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    /// The view's configured redirect target
    pub fn redirect_url(&self) -> Result<String, ViewError> {
        self.config.redirect_url.clone().ok_or_else(|| {
            ViewError::Configuration(format!(
                "{} have to define a redirect url",
                self.config.label()
            ))
        })
    }

    /// `app_name`, `view_name` and `title`; markup formats also get
    /// `request_path` and `user`
    pub fn base_context(&self) -> Result<TeraContext, ViewError> {
        let mut context = TeraContext::new();
        context.insert("app_name", self.config.get_app_name()?);
        context.insert("view_name", self.config.get_view_name()?);
        context.insert("title", self.config.get_title()?);

        if !self.is_json() {
            self.insert_request_vars(&mut context);
        }
        Ok(context)
    }

    fn insert_request_vars(&self, context: &mut TeraContext) {
        context.insert("request_path", &self.meta.path);
        context.insert("user", &self.meta.user().map(CurrentUser::from));
    }

    fn engine(&self) -> Result<RwLockReadGuard<'_, TemplateEngine>, ViewError> {
        self.templates
            .read()
            .map_err(|_| ViewError::Internal(anyhow!("Template engine lock poisoned")))
    }

    /// Render a partial to a string with the request and site variables,
    /// whatever the response format is
    pub fn render_fragment(&self, template: &str, context: &TeraContext) -> Result<String, ViewError> {
        let mut context = context.clone();
        self.insert_request_vars(&mut context);
        Ok(self.engine()?.render_with_site(template, &context)?)
    }

    pub fn render(&self, context: TeraContext) -> Result<Response, ViewError> {
        self.render_with_status(StatusCode::OK, context)
    }

    /// Emit the response for the resolved format.
    ///
    /// JSON gets `redirect` (and `redirect_url`) added. HTML with a pending
    /// redirect becomes `302 Found`. Everything else renders the template
    /// registered for the format.
    pub fn render_with_status(
        &self,
        status: StatusCode,
        context: TeraContext,
    ) -> Result<Response, ViewError> {
        match self.format {
            Format::Json => {
                let mut payload = context.into_json();
                if let Value::Object(map) = &mut payload {
                    map.insert("redirect".to_string(), Value::Bool(self.redirect.is_some()));
                    if let Some(target) = &self.redirect {
                        map.insert("redirect_url".to_string(), Value::String(target.clone()));
                    }
                }
                Ok((status, Json(payload)).into_response())
            }
            Format::Html if self.redirect.is_some() => {
                let target = self.redirect.as_deref().unwrap_or_default();
                let location = HeaderValue::from_str(target).map_err(|e| {
                    ViewError::Internal(anyhow!("Invalid redirect target '{}': {}", target, e))
                })?;
                tracing::debug!("Redirecting {} to {}", self.meta.path, target);
                Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
            }
            format => {
                let template = self.config.templates.get(&format).ok_or_else(|| {
                    ViewError::Configuration(format!(
                        "{} have to define a template for format {}",
                        self.config.label(),
                        format
                    ))
                })?;
                let body = self.engine()?.render_with_site(template, &context)?;
                Ok((
                    status,
                    [(header::CONTENT_TYPE, HeaderValue::from_static(format.mime_type()))],
                    body,
                )
                    .into_response())
            }
        }
    }
}
