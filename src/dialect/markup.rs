//! Markup renderers for documentation bodies.
//!
//! A markup style turns the lines of a parsed documentation body into HTML
//! for the generated site. Like dialects, styles are selected by name
//! through a registry populated at startup.

use indexmap::IndexMap;

use crate::core::errors::{ProdocError, Result};

/// Renders a documentation body to HTML.
pub trait MarkupRenderer {
    /// Registry name of this markup style.
    fn name(&self) -> &'static str;

    /// Render body lines to an HTML fragment.
    fn render(&self, lines: &[String]) -> String;
}

/// Plain rendering: escaped text with line breaks preserved.
pub struct VerbatimMarkup;

impl MarkupRenderer for VerbatimMarkup {
    fn name(&self) -> &'static str {
        "verbatim"
    }

    fn render(&self, lines: &[String]) -> String {
        lines
            .iter()
            .map(|line| escape_html(line))
            .collect::<Vec<_>>()
            .join("<br/>\n")
    }
}

/// Preformatted rendering: escaped text inside a `<pre>` block, preserving
/// indentation and spacing.
pub struct PreformattedMarkup;

impl MarkupRenderer for PreformattedMarkup {
    fn name(&self) -> &'static str {
        "preformatted"
    }

    fn render(&self, lines: &[String]) -> String {
        let mut out = String::from("<pre>");
        for line in lines {
            out.push_str(&escape_html(line));
            out.push('\n');
        }
        out.push_str("</pre>");
        out
    }
}

/// Escape text for literal inclusion in an HTML fragment.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Registry of markup styles, populated once at startup.
pub struct MarkupRegistry {
    styles: IndexMap<&'static str, Box<dyn MarkupRenderer>>,
}

impl MarkupRegistry {
    /// Create a registry containing the built-in styles.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            styles: IndexMap::new(),
        };
        registry.register(Box::new(VerbatimMarkup));
        registry.register(Box::new(PreformattedMarkup));
        registry
    }

    /// Register a markup style under its own name.
    pub fn register(&mut self, style: Box<dyn MarkupRenderer>) {
        self.styles.insert(style.name(), style);
    }

    /// Look up a style by case-insensitive name.
    pub fn get(&self, name: &str) -> Result<&dyn MarkupRenderer> {
        let lower = name.to_lowercase();
        self.styles
            .iter()
            .find(|(key, _)| **key == lower)
            .map(|(_, style)| style.as_ref())
            .ok_or_else(|| ProdocError::unknown_style("markup", name))
    }
}

impl Default for MarkupRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbatim_escapes_html() {
        let lines = vec!["a < b & c".to_string(), "second".to_string()];
        assert_eq!(
            VerbatimMarkup.render(&lines),
            "a &lt; b &amp; c<br/>\nsecond"
        );
    }

    #[test]
    fn test_preformatted_preserves_indentation() {
        let lines = vec!["  indented".to_string()];
        assert_eq!(
            PreformattedMarkup.render(&lines),
            "<pre>  indented\n</pre>"
        );
    }

    #[test]
    fn test_registry_lookup() {
        let registry = MarkupRegistry::with_builtins();
        assert!(registry.get("verbatim").is_ok());
        assert!(registry.get("Preformatted").is_ok());
        assert!(registry.get("latex").is_err());
    }
}
