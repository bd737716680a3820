//! Content views
//!
//! List, detail, create, update and delete for [`Content`], answering HTML,
//! XML or JSON through the shared view building blocks.

use anyhow::Context;
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Form as FormData, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::middleware::AppState;
use crate::config::ViewsConfig;
use crate::models::{Content, ContentForm, User};
use crate::services::{slugify, ContentServiceError, MailService, Mailer};
use crate::views::{
    confirm, form_invalid, form_valid, require_login, require_owner, run_action, show_form,
    ActionConfig, ActionFailure, Form, FormConfig, FormErrors, Format, RequestMeta, ViewConfig,
    ViewError,
};

/// Longest accepted content name
pub const MAX_NAME_LENGTH: usize = 255;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/contents", get(list))
        .route("/contents/new", get(create_form).post(create))
        .route("/contents/{slug}", get(detail))
        .route("/contents/{slug}/edit", get(edit_form).post(update))
        .route("/contents/{slug}/delete", get(confirm_delete).post(delete))
}

/// View configuration of every content view, built once at startup
#[derive(Debug, Clone)]
pub struct ContentViews {
    pub list: ViewConfig,
    pub detail: ViewConfig,
    pub create: ViewConfig,
    pub update: ViewConfig,
    pub delete: ViewConfig,
    /// Create and update
    pub save_action: ActionConfig,
    pub delete_action: ActionConfig,
    pub form: FormConfig,
    pub login_url: String,
}

impl ContentViews {
    pub fn new(views: &ViewsConfig) -> Self {
        Self {
            list: ViewConfig::new("contents", "list")
                .title("Contents")
                .template(Format::Html, "contents/list.html")
                .template(Format::Xml, "contents/list.xml"),
            detail: ViewConfig::new("contents", "detail")
                .title("Content")
                .template(Format::Html, "contents/detail.html"),
            create: ViewConfig::new("contents", "create")
                .title("New content")
                .template(Format::Html, "page.form.html"),
            update: ViewConfig::new("contents", "update")
                .title("Edit content")
                .template(Format::Html, "page.form.html"),
            delete: ViewConfig::new("contents", "delete")
                .title("Delete content")
                .template(Format::Html, "page.confirm.html"),
            save_action: ActionConfig::from_views(views).success_message("The content was saved"),
            delete_action: ActionConfig::from_views(views)
                .success_message("The content was deleted")
                .confirm_message("Do you want to delete this content?")
                .success_url("/contents"),
            form: FormConfig::default().template_object("contents/object.html"),
            login_url: views.login_url.clone(),
        }
    }
}

impl Form for ContentForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "This field is required.");
        } else if name.chars().count() > MAX_NAME_LENGTH {
            errors.add(
                "name",
                format!("Ensure this value has at most {} characters.", MAX_NAME_LENGTH),
            );
        } else if slugify(name).is_empty() {
            errors.add("name", "Enter a name with at least one letter or digit.");
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct SlugPath {
    slug: String,
}

/// The content behind `slug`, if the current user owns it
async fn owned_content(
    state: &AppState,
    meta: &RequestMeta,
    slug: &str,
) -> Result<Content, ActionFailure> {
    let user = require_login(meta, &state.content_views.login_url)?;
    let object = state.content_service.get_by_slug(slug).await?;
    require_owner(user, object)
}

async fn list(State(state): State<AppState>, meta: RequestMeta) -> Result<Response, ViewError> {
    let responder = state.responder(&state.content_views.list, meta)?;
    let objects = state
        .content_service
        .list()
        .await
        .context("Failed to list contents")?;

    let mut context = responder.base_context()?;
    context.insert("objects", &objects);
    responder.render(context)
}

async fn detail(
    State(state): State<AppState>,
    Path(SlugPath { slug }): Path<SlugPath>,
    meta: RequestMeta,
) -> Result<Response, ViewError> {
    let views = &state.content_views;
    let mut responder = state.responder(&views.detail, meta)?;
    let object = match state
        .content_service
        .get_by_slug(&slug)
        .await
        .context("Failed to load content")?
    {
        Some(object) => object,
        None => return ActionFailure::NotFound.respond(&mut responder, &views.save_action),
    };

    let is_owner = responder
        .meta()
        .user()
        .map_or(false, |user| user.owns(object.user_id));
    let mut context = responder.base_context()?;
    context.insert("object", &object);
    context.insert("is_owner", &is_owner);
    responder.render(context)
}

async fn create_form(State(state): State<AppState>, meta: RequestMeta) -> Result<Response, ViewError> {
    let views = &state.content_views;
    let mut responder = state.responder(&views.create, meta)?;
    if let Err(failure) = require_login(responder.meta(), &views.login_url).map(|_| ()) {
        return failure.respond(&mut responder, &views.save_action);
    }
    show_form::<_, Content>(
        &mut responder,
        &views.save_action,
        &views.form,
        &ContentForm::default(),
        None,
    )
}

async fn create(
    State(state): State<AppState>,
    meta: RequestMeta,
    FormData(form): FormData<ContentForm>,
) -> Result<Response, ViewError> {
    let views = &state.content_views;
    let mut responder = state.responder(&views.create, meta)?;
    let user = match require_login(responder.meta(), &views.login_url).cloned() {
        Ok(user) => user,
        Err(failure) => return failure.respond(&mut responder, &views.save_action),
    };

    if let Err(errors) = form.validate() {
        return form_invalid::<_, Content>(
            &mut responder,
            &views.save_action,
            &views.form,
            &form,
            &errors,
            None,
        );
    }

    match state.content_service.create(form.name.trim(), user.id).await {
        Ok(saved) => {
            if let Some(mail) = &state.mail {
                notify_owner(mail.clone(), &user, &saved);
            }
            form_valid(&mut responder, &views.save_action, &views.form, &form, Some(&saved))
        }
        Err(ContentServiceError::ValidationError(message)) => form_invalid::<_, Content>(
            &mut responder,
            &views.save_action,
            &views.form,
            &form,
            &FormErrors::single("name", message),
            None,
        ),
        Err(e) => ActionFailure::from(e).respond(&mut responder, &views.save_action),
    }
}

async fn edit_form(
    State(state): State<AppState>,
    Path(SlugPath { slug }): Path<SlugPath>,
    meta: RequestMeta,
) -> Result<Response, ViewError> {
    let views = &state.content_views;
    let mut responder = state.responder(&views.update, meta)?;
    let object = match owned_content(&state, responder.meta(), &slug).await {
        Ok(object) => object,
        Err(failure) => return failure.respond(&mut responder, &views.save_action),
    };

    let form = ContentForm {
        name: object.name.clone(),
    };
    show_form(&mut responder, &views.save_action, &views.form, &form, Some(&object))
}

async fn update(
    State(state): State<AppState>,
    Path(SlugPath { slug }): Path<SlugPath>,
    meta: RequestMeta,
    FormData(form): FormData<ContentForm>,
) -> Result<Response, ViewError> {
    let views = &state.content_views;
    let mut responder = state.responder(&views.update, meta)?;
    let object = match owned_content(&state, responder.meta(), &slug).await {
        Ok(object) => object,
        Err(failure) => return failure.respond(&mut responder, &views.save_action),
    };

    if let Err(errors) = form.validate() {
        return form_invalid(
            &mut responder,
            &views.save_action,
            &views.form,
            &form,
            &errors,
            Some(&object),
        );
    }

    match state.content_service.rename(&object, form.name.trim()).await {
        Ok(saved) => form_valid(&mut responder, &views.save_action, &views.form, &form, Some(&saved)),
        Err(ContentServiceError::ValidationError(message)) => form_invalid(
            &mut responder,
            &views.save_action,
            &views.form,
            &form,
            &FormErrors::single("name", message),
            Some(&object),
        ),
        Err(e) => ActionFailure::from(e).respond(&mut responder, &views.save_action),
    }
}

async fn confirm_delete(
    State(state): State<AppState>,
    Path(SlugPath { slug }): Path<SlugPath>,
    meta: RequestMeta,
) -> Result<Response, ViewError> {
    let views = &state.content_views;
    let mut responder = state.responder(&views.delete, meta)?;
    if let Err(failure) = owned_content(&state, responder.meta(), &slug).await {
        return failure.respond(&mut responder, &views.delete_action);
    }
    confirm(&mut responder, &views.delete_action)
}

async fn delete(
    State(state): State<AppState>,
    Path(SlugPath { slug }): Path<SlugPath>,
    meta: RequestMeta,
) -> Result<Response, ViewError> {
    let views = &state.content_views;
    let requester = meta.clone();
    let mut responder = state.responder(&views.delete, meta)?;

    let action = async {
        let object = owned_content(&state, &requester, &slug).await?;
        state.content_service.delete(object.id).await?;
        tracing::info!("Deleted content '{}' ({})", object.slug, object.id);
        Ok::<_, ActionFailure>(true)
    };
    run_action(&mut responder, &views.delete_action, action).await
}

/// Tell the owner their content is published. Runs in the background;
/// failures are only logged.
fn notify_owner(mail: Arc<MailService>, owner: &User, content: &Content) {
    let mailer = Mailer::new(
        format!("Published: {}", content.name),
        "mail/content_created.txt",
        "mail/content_created.html",
    )
    .with_context("username", &owner.username)
    .with_context("name", &content.name)
    .with_context("path", &content.absolute_url());
    let recipients = vec![owner.email.clone()];

    tokio::spawn(async move {
        if let Err(e) = mail.send(&mailer, &recipients, None).await {
            tracing::warn!("Failed to notify {:?}: {}", recipients, e);
        }
    });
}
