//! Pulling the target identity out of a document.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;

/// Attribute carrying the identity in a document.
pub const DEFAULT_IDENTITY_ATTRIBUTE: &str = "x:Class";

static DEFAULT_EXTRACTOR: LazyLock<IdentityExtractor> = LazyLock::new(|| IdentityExtractor {
    attribute: DEFAULT_IDENTITY_ATTRIBUTE.to_string(),
    pattern: Regex::new(r#"x:Class="([^"]+)""#).unwrap(),
});

/// Finds `<attribute>="<identity>"` in document text.
#[derive(Debug, Clone)]
pub struct IdentityExtractor {
    attribute: String,
    pattern: Regex,
}

impl IdentityExtractor {
    /// Extractor for a custom attribute name. The name is matched literally.
    pub fn new(attribute: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(r#"{}="([^"]+)""#, regex::escape(attribute)))?;
        Ok(Self {
            attribute: attribute.to_string(),
            pattern,
        })
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// The first identity in `text`, if any.
    pub fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

impl Default for IdentityExtractor {
    fn default() -> Self {
        DEFAULT_EXTRACTOR.clone()
    }
}

/// Extract the `x:Class` identity from `text`.
pub fn extract_identity(text: &str) -> Option<&str> {
    DEFAULT_EXTRACTOR.extract(text)
}
