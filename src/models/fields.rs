//! Reusable field types

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}){1,2}$").expect("valid hex color pattern"));

/// A color in `#rgb` or `#rrggbb` notation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

/// Longest accepted value, `#rrggbb`
pub const HEX_COLOR_MAX_LENGTH: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Not a valid color: {0}")]
pub struct InvalidColor(pub String);

impl HexColor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for HexColor {
    type Err = InvalidColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if HEX_COLOR.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidColor(s.to_string()))
        }
    }
}

impl TryFrom<String> for HexColor {
    type Error = InvalidColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_short_and_long_forms() {
        assert_eq!("#fff".parse::<HexColor>().unwrap().as_str(), "#fff");
        assert_eq!("#A0b1C2".parse::<HexColor>().unwrap().as_str(), "#A0b1C2");
    }

    #[test]
    fn test_rejects_invalid_colors() {
        for value in ["fff", "#ffff", "#ggg", "#1234567", ""] {
            assert!(value.parse::<HexColor>().is_err(), "{value} should be rejected");
        }
    }

    #[test]
    fn test_serde_validates() {
        let color: HexColor = serde_json::from_str("\"#00ff00\"").unwrap();
        assert_eq!(serde_json::to_string(&color).unwrap(), "\"#00ff00\"");
        assert!(serde_json::from_str::<HexColor>("\"green\"").is_err());
    }

    #[test]
    fn test_max_length() {
        assert_eq!("#abcdef".len(), HEX_COLOR_MAX_LENGTH);
    }
}
