//! Slug assignment
//!
//! `slugify` turns a display name into a URL-safe base. `SlugAssigner` picks
//! the final slug for a save, disambiguating against the rows already in the
//! same table. Concurrent saves are settled by the table's `UNIQUE` slug
//! column, not here.

use crate::db::repositories::ContentRepository;
use crate::models::Content;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum SlugError {
    #[error("name must contain at least one letter or digit")]
    EmptyName,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Transliteration for Latin letters with diacritics. Lowercase input only.
fn transliterate(c: char) -> Option<&'static str> {
    let s = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => "e",
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => "g",
        'ĥ' | 'ħ' => "h",
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => "i",
        'ĵ' => "j",
        'ķ' => "k",
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => "l",
        'ñ' | 'ń' | 'ņ' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => "o",
        'œ' => "oe",
        'ŕ' | 'ŗ' | 'ř' => "r",
        'ś' | 'ŝ' | 'ş' | 'š' => "s",
        'ß' => "ss",
        'ţ' | 'ť' | 'ŧ' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => "u",
        'ŵ' => "w",
        'ý' | 'ÿ' | 'ŷ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(s)
}

/// Normalize a display name into a slug base.
///
/// Lowercases, transliterates accented Latin letters, drops everything that
/// is not an ASCII letter, digit or separator, and collapses runs of
/// whitespace, `-` and `_` into one hyphen. May return an empty string.
pub fn slugify(name: &str) -> String {
    fn push(result: &mut String, s: &str, pending_hyphen: &mut bool) {
        if *pending_hyphen && !result.is_empty() {
            result.push('-');
        }
        *pending_hyphen = false;
        result.push_str(s);
    }

    let mut result = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            let mut buf = [0u8; 4];
            push(&mut result, c.encode_utf8(&mut buf), &mut pending_hyphen);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_hyphen = true;
        } else if let Some(ascii) = transliterate(c) {
            push(&mut result, ascii, &mut pending_hyphen);
        }
    }

    result
}

/// Whether `slug` is `base-<digits>`
fn is_disambiguation_of(slug: &str, base: &str) -> bool {
    slug.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('-'))
        .map(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// Picks unique slugs within one content table
pub struct SlugAssigner {
    repo: Arc<dyn ContentRepository>,
}

impl SlugAssigner {
    pub fn new(repo: Arc<dyn ContentRepository>) -> Self {
        Self { repo }
    }

    /// Slug for saving `name`.
    ///
    /// `current` is `None` for a new row, or the row as it is stored.
    pub async fn assign(&self, name: &str, current: Option<&Content>) -> Result<String, SlugError> {
        let base = slugify(name);
        if base.is_empty() {
            return Err(SlugError::EmptyName);
        }

        let holder = self.holder_of(&base).await?;

        let candidate = match (holder, current) {
            (None, _) => return Ok(base),
            (Some(_), None) => format!("{}-{}", base, Utc::now().timestamp()),
            (Some(holder_id), Some(stored)) if holder_id == stored.id => return Ok(base),
            (Some(_), Some(stored)) => {
                // Digits in the stored slug only count as a suffix when the
                // stored name already reduced to the same base
                if slugify(&stored.name) == base
                    && is_disambiguation_of(&stored.slug, &base)
                    && self.is_free_for(&stored.slug, stored.id).await?
                {
                    return Ok(stored.slug.clone());
                }
                format!("{}-{}", base, stored.id)
            }
        };

        let own_id = current.map(|stored| stored.id);
        let mut attempt = candidate.clone();
        let mut n = 2;
        loop {
            match self.holder_of(&attempt).await? {
                Some(holder_id) if Some(holder_id) != own_id => {
                    attempt = format!("{}-{}", candidate, n);
                    n += 1;
                }
                _ => break,
            }
        }

        tracing::debug!("Assigned slug '{}' for name '{}'", attempt, name);
        Ok(attempt)
    }

    async fn holder_of(&self, slug: &str) -> Result<Option<i64>, SlugError> {
        let found = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to look up slug")?;
        Ok(found.map(|c| c.id))
    }

    async fn is_free_for(&self, slug: &str, id: i64) -> Result<bool, SlugError> {
        Ok(match self.holder_of(slug).await? {
            Some(holder_id) => holder_id == id,
            None => true,
        })
    }
}
