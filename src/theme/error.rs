//! Template engine error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    /// A template failed to parse or an inheritance chain is broken
    #[error("Template load error: {0}")]
    Load(String),

    /// Rendering failed, message carries the Tera cause chain
    #[error("Template error: {0}")]
    Render(String),
}
