//! Form processing
//!
//! A [`Form`] validates itself into [`FormErrors`]. The helpers here turn the
//! result into action envelopes: `form_valid` redirects HTML callers to the
//! success target, `form_invalid` re-renders with the joined error message.

use axum::{http::StatusCode, response::Response};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tera::Context as TeraContext;

use super::action::{ActionConfig, ActionResponse};
use super::base::Responder;
use super::error::ViewError;
use super::format::Format;

/// Submitted data that knows how to validate itself
pub trait Form: Serialize {
    fn validate(&self) -> Result<(), FormErrors>;
}

/// A persisted object a form edits
pub trait Model: Serialize {
    fn pk(&self) -> i64;
    fn absolute_url(&self) -> String;
}

impl Model for crate::models::Content {
    fn pk(&self) -> i64 {
        self.id
    }

    fn absolute_url(&self) -> String {
        crate::models::Content::absolute_url(self)
    }
}

/// Field errors in the order they were found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors with one message on one field
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message.into()),
            None => self.fields.push((field.to_string(), vec![message.into()])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    /// `Ok(())` when nothing was added
    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// One `field: msg1. msg2` line per field
    pub fn to_message(&self) -> String {
        self.fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(". ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Serialize for FormErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

/// Templates of a form view
#[derive(Debug, Clone)]
pub struct FormConfig {
    /// Partial rendering the form itself
    pub template_form: String,
    /// Partial rendering the saved object, needed for JSON model forms
    pub template_object: Option<String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            template_form: "forms/form.html".to_string(),
            template_object: None,
        }
    }
}

impl FormConfig {
    pub fn template_object(mut self, name: impl Into<String>) -> Self {
        self.template_object = Some(name.into());
        self
    }
}

/// Context shared by every form response. JSON callers get `form` (and
/// `object`) as rendered markup, `pk` alongside.
fn form_context<F: Form, M: Model>(
    responder: &Responder,
    config: &FormConfig,
    form: &F,
    errors: Option<&FormErrors>,
    object: Option<&M>,
) -> Result<TeraContext, ViewError> {
    let mut context = responder.base_context()?;
    context.insert("form", form);
    if let Some(errors) = errors {
        context.insert("errors", errors);
    }
    if let Some(object) = object {
        context.insert("object", object);
    }

    if responder.is_json() {
        let form_html = responder.render_fragment(&config.template_form, &context)?;

        if let Some(object) = object {
            let template = config.template_object.as_deref().ok_or_else(|| {
                ViewError::Configuration(format!(
                    "{} have to define a template_object",
                    responder.config().view_name.as_deref().unwrap_or("view")
                ))
            })?;
            let object_html = responder.render_fragment(template, &context)?;
            context.insert("object", &object_html);
            context.insert("pk", &object.pk());
        }
        context.insert("form", &form_html);
    }
    Ok(context)
}

/// Render an action response on top of the form context
fn respond_with<F: Form, M: Model>(
    response: ActionResponse<'_>,
    responder: &mut Responder,
    config: &FormConfig,
    form: &F,
    errors: Option<&FormErrors>,
    object: Option<&M>,
) -> Result<Response, ViewError> {
    let context = form_context(responder, config, form, errors, object)?;
    let mut response = response;
    for (key, value) in context.into_json().as_object().into_iter().flatten() {
        response = response.with(key, value);
    }
    response.respond(responder)
}

/// Unsubmitted form page
pub fn show_form<F: Form, M: Model>(
    responder: &mut Responder,
    action: &ActionConfig,
    config: &FormConfig,
    form: &F,
    object: Option<&M>,
) -> Result<Response, ViewError> {
    let response = ActionResponse::success(action).message("").redirect(false);
    respond_with(response, responder, config, form, None, object)
}

/// Saved successfully. HTML callers go to the object's page, or the
/// configured success target when there is no object.
pub fn form_valid<F: Form, M: Model>(
    responder: &mut Responder,
    action: &ActionConfig,
    config: &FormConfig,
    form: &F,
    object: Option<&M>,
) -> Result<Response, ViewError> {
    let mut response = ActionResponse::success(action);
    if responder.format() == Format::Html {
        let target = match object {
            Some(object) => object.absolute_url(),
            None => action.redirect_target(true)?,
        };
        response = response.redirect_url(target);
    }
    respond_with(response, responder, config, form, None, object)
}

/// Validation failed: fail envelope carrying every error
pub fn form_invalid<F: Form, M: Model>(
    responder: &mut Responder,
    action: &ActionConfig,
    config: &FormConfig,
    form: &F,
    errors: &FormErrors,
    object: Option<&M>,
) -> Result<Response, ViewError> {
    let response = ActionResponse::fail(action)
        .message(errors.to_message())
        .redirect(false)
        .status(StatusCode::BAD_REQUEST);
    respond_with(response, responder, config, form, Some(errors), object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Content, ContentForm};
    use crate::views::base::test_support::{body_string, engine};
    use crate::views::base::ViewConfig;
    use crate::views::request::RequestMeta;
    use axum::http::header;
    use serde_json::Value;

    #[derive(serde::Serialize)]
    struct NameForm {
        name: String,
    }

    impl Form for NameForm {
        fn validate(&self) -> Result<(), FormErrors> {
            let mut errors = FormErrors::new();
            if self.name.is_empty() {
                errors.add("name", "This field is required");
            }
            errors.into_result()
        }
    }

    fn responder(is_async: bool) -> Responder {
        let config = ViewConfig::new("contents", "create").template(Format::Html, "page.form.html");
        let mut meta = RequestMeta::get("/contents/new");
        meta.is_async = is_async;
        Responder::new(&config, meta, engine()).unwrap()
    }

    fn saved() -> Content {
        let mut content = Content::new("Test content", 1);
        content.id = 9;
        content.slug = "test-content".into();
        content
    }

    fn action() -> ActionConfig {
        ActionConfig {
            home_url: Some("/".into()),
            error_url: Some("/error".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_to_message_groups_by_field_in_order() {
        let mut errors = FormErrors::new();
        errors.add("name", "Too short");
        errors.add("color", "Not a color");
        errors.add("name", "Reserved");
        assert_eq!(errors.to_message(), "name: Too short. Reserved\ncolor: Not a color");
        assert_eq!(errors.get("name").unwrap().len(), 2);
    }

    #[test]
    fn test_errors_serialize_as_map() {
        let errors = FormErrors::single("name", "Required");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({"name": ["Required"]})
        );
    }

    #[test]
    fn test_validate() {
        assert!(NameForm { name: "x".into() }.validate().is_ok());
        assert!(NameForm { name: String::new() }.validate().is_err());
    }

    #[test]
    fn test_form_valid_html_redirects_to_object() {
        let mut html = responder(false);
        let form = ContentForm { name: "Test content".into() };
        let response = form_valid(&mut html, &action(), &FormConfig::default(), &form, Some(&saved())).unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/contents/test-content");
    }

    #[tokio::test]
    async fn test_form_valid_json_renders_fragments() {
        let mut json = responder(true);
        let config = FormConfig::default().template_object("contents/object.html");
        let form = ContentForm { name: "Test content".into() };
        let response = form_valid(&mut json, &action(), &config, &form, Some(&saved())).unwrap();

        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["pk"], 9);
        assert_eq!(body["redirect"], false);
        assert!(body["form"].as_str().unwrap().contains("<form"));
        assert!(body["object"].as_str().unwrap().contains("/contents/test-content"));
    }

    #[test]
    fn test_json_model_form_needs_object_template() {
        let mut json = responder(true);
        let form = ContentForm { name: "Test content".into() };
        let err = form_valid(&mut json, &action(), &FormConfig::default(), &form, Some(&saved())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: create have to define a template_object"
        );
    }

    #[tokio::test]
    async fn test_form_invalid_reports_errors() {
        let mut html = responder(false);
        let form = NameForm { name: String::new() };
        let errors = form.validate().unwrap_err();
        let response =
            form_invalid::<_, Content>(&mut html, &action(), &FormConfig::default(), &form, &errors, None).unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        assert!(body.contains("name: This field is required"));
    }
}
