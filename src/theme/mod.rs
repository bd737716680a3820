//! Template engine
//!
//! This module provides template rendering using Tera.
//! Features:
//! - Default templates embedded in the binary
//! - Per-site overrides from the configured templates directory
//! - Shared filters and functions (see [`filters`])
//! - Site context injection

use anyhow::{Context, Result};
use rust_embed::RustEmbed;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context as TeraContext, Tera};

use crate::config::SiteConfig;
use crate::services::site::site_context;

mod error;
pub mod filters;

pub use error::TemplateError;

/// Templates shipped with the crate
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
#[include = "*.txt"]
#[include = "*.xml"]
struct DefaultTemplates;

/// Tera wrapper that knows where templates come from
pub struct TemplateEngine {
    tera: Tera,
    /// Directory whose files override the embedded defaults
    templates_path: PathBuf,
    site: SiteConfig,
}

impl TemplateEngine {
    /// Load the embedded templates, then overrides from `templates_path`.
    ///
    /// A missing directory is fine: the embedded set is complete on its own.
    pub fn new(templates_path: &Path, site: &SiteConfig) -> Result<Self> {
        let mut engine = Self {
            tera: Tera::default(),
            templates_path: templates_path.to_path_buf(),
            site: site.clone(),
        };
        engine.load_templates()?;
        Ok(engine)
    }

    fn load_templates(&mut self) -> Result<()> {
        let mut templates: BTreeMap<String, String> = BTreeMap::new();

        for name in DefaultTemplates::iter() {
            if let Some(file) = DefaultTemplates::get(&name) {
                let content = String::from_utf8(file.data.into_owned())
                    .with_context(|| format!("Embedded template is not UTF-8: {}", name))?;
                templates.insert(name.to_string(), content);
            }
        }

        let embedded = templates.len();
        collect_templates_from_dir(&self.templates_path, &self.templates_path, &mut templates)?;
        tracing::debug!(
            "Loaded {} embedded templates, {} total after overrides from {:?}",
            embedded,
            templates.len(),
            self.templates_path
        );

        let mut tera = Tera::default();
        filters::register(&mut tera, &self.site.domain);
        tera.add_raw_templates(templates)
            .map_err(|e| TemplateError::Load(chain_message(&e)))?;

        self.tera = tera;
        Ok(())
    }

    /// Re-read templates from disk
    pub fn reload_templates(&mut self) -> Result<()> {
        self.load_templates()
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Render a template with context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, TemplateError> {
        self.tera.render(template, context).map_err(|e| {
            TemplateError::Render(format!("Failed to render '{}': {}", template, chain_message(&e)))
        })
    }

    /// Render with the site context underneath `context`
    pub fn render_with_site(
        &self,
        template: &str,
        context: &TeraContext,
    ) -> Result<String, TemplateError> {
        let mut full_context = site_context(&self.site);
        full_context.extend(context.clone());
        self.render(template, &full_context)
    }

    pub fn tera(&self) -> &Tera {
        &self.tera
    }
}

/// Error message followed by every source in the chain
fn chain_message(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

/// Collect `.html`, `.txt` and `.xml` templates under `current_path`, named relative
/// to `base_path` with forward slashes
fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut BTreeMap<String, String>,
) -> Result<()> {
    if !current_path.exists() {
        return Ok(());
    }

    for entry in fs::read_dir(current_path)
        .with_context(|| format!("Failed to read templates directory: {:?}", current_path))?
    {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path
            .extension()
            .map_or(false, |ext| ext == "html" || ext == "txt" || ext == "xml")
        {
            let relative_path = path
                .strip_prefix(base_path)
                .map_err(|_| TemplateError::Load("Failed to get relative path".to_string()))?;
            let template_name = relative_path.to_string_lossy().replace('\\', "/");
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;
            templates.insert(template_name, content);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
