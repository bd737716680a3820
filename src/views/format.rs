//! Response formats
//!
//! A request picks its format once. Resolution order:
//! 1. a format preset on the view
//! 2. `Json` for asynchronous requests (`X-Requested-With: XMLHttpRequest`)
//! 3. the route's `format` parameter, else the view's default
//!
//! `Json` is always allowed. Any other format needs a template registered on
//! the view.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::base::ViewConfig;
use super::error::ViewError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Html,
    Xhtml,
    Json,
    Atom,
    Xml,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Html,
        Format::Xhtml,
        Format::Json,
        Format::Atom,
        Format::Xml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Xhtml => "xhtml",
            Format::Json => "json",
            Format::Atom => "atom",
            Format::Xml => "xml",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Html | Format::Xhtml => "text/html",
            Format::Json => "application/json",
            Format::Atom => "application/atom+xml",
            Format::Xml => "application/xml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// Format for one request to the view described by `config`
pub fn resolve_format(
    config: &ViewConfig,
    is_async: bool,
    requested: Option<&str>,
) -> Result<Format, ViewError> {
    if let Some(format) = config.format {
        return Ok(format);
    }
    if is_async {
        return Ok(Format::Json);
    }

    let format = match requested {
        Some(token) => token
            .parse::<Format>()
            .map_err(|_| ViewError::Configuration(format!("Format not allowed: {}", token)))?,
        None => config.default_format,
    };

    if format == Format::Json || config.templates.contains_key(&format) {
        Ok(format)
    } else {
        Err(ViewError::Configuration(format!(
            "Format not allowed: {}",
            format
        )))
    }
}
