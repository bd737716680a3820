//! Tests for the template engine

use super::*;
use std::fs;
use tempfile::TempDir;
use tera::Context as TeraContext;

fn site() -> SiteConfig {
    SiteConfig {
        domain: "example.com".to_string(),
        name: "Example".to_string(),
        ..Default::default()
    }
}

fn base_context() -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("app_name", "contents");
    context.insert("view_name", "list");
    context.insert("title", "Contents");
    context.insert("request_path", "/contents");
    context.insert("objects", &Vec::<serde_json::Value>::new());
    context
}

#[test]
fn test_embedded_templates_load_without_directory() {
    let temp_dir = TempDir::new().unwrap();
    let engine = TemplateEngine::new(&temp_dir.path().join("missing"), &site()).unwrap();

    for name in [
        "base.html",
        "page.confirm.html",
        "page.form.html",
        "forms/form.html",
        "flash_view.html",
        "contents/list.html",
        "contents/list.xml",
        "contents/detail.html",
        "contents/object.html",
        "mail/content_created.txt",
        "mail/content_created.html",
    ] {
        assert!(engine.has_template(name), "missing embedded template {name}");
    }
}

#[test]
fn test_render_with_site_injects_site_vars() {
    let temp_dir = TempDir::new().unwrap();
    let engine = TemplateEngine::new(temp_dir.path(), &site()).unwrap();

    let html = engine
        .render_with_site("contents/list.html", &base_context())
        .unwrap();
    assert!(html.contains("<title>Contents | Example</title>"));
    assert!(html.contains("Nothing here yet."));
}

#[test]
fn test_directory_overrides_embedded() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("contents")).unwrap();
    fs::write(
        temp_dir.path().join("contents/list.html"),
        "custom {{ SITE_NAME }}",
    )
    .unwrap();

    let engine = TemplateEngine::new(temp_dir.path(), &site()).unwrap();
    let html = engine
        .render_with_site("contents/list.html", &base_context())
        .unwrap();
    assert_eq!(html, "custom Example");
}

#[test]
fn test_reload_picks_up_new_files() {
    let temp_dir = TempDir::new().unwrap();
    let mut engine = TemplateEngine::new(temp_dir.path(), &site()).unwrap();
    assert!(!engine.has_template("extra.html"));

    fs::write(temp_dir.path().join("extra.html"), "extra").unwrap();
    engine.reload_templates().unwrap();
    assert!(engine.has_template("extra.html"));
}

#[test]
fn test_broken_override_fails_to_load() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("broken.html"), "{% if %}").unwrap();

    let result = TemplateEngine::new(temp_dir.path(), &site());
    assert!(result.is_err());
}

#[test]
fn test_render_error_names_template() {
    let temp_dir = TempDir::new().unwrap();
    let engine = TemplateEngine::new(temp_dir.path(), &site()).unwrap();

    let err = engine.render("nope.html", &TeraContext::new()).unwrap_err();
    assert!(matches!(err, TemplateError::Render(_)));
    assert!(err.to_string().contains("nope.html"));
}

#[test]
fn test_html_is_escaped_and_filters_are_registered() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("probe.html"),
        "{{ text }}|{{ text | urlize_blank | safe }}|{{ urlfull(path='/x') }}",
    )
    .unwrap();
    let engine = TemplateEngine::new(temp_dir.path(), &site()).unwrap();

    let mut context = TeraContext::new();
    context.insert("text", "<i> http://a.io");
    let html = engine.render("probe.html", &context).unwrap();
    assert!(html.starts_with("&lt;i&gt; http:&#x2F;&#x2F;a.io|"));
    assert!(html.contains("target=\"_blank\""));
    assert!(html.ends_with("http:&#x2F;&#x2F;www.example.com&#x2F;x"));
}
