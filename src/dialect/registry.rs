//! Dialect trait and name-keyed registry.
//!
//! A dialect turns a raw block of documentation comment lines into the
//! structured fields of a file or routine. Dialects are selected by name
//! through a registry populated at startup; a `; docformat` directive on a
//! file's first line overrides the system-wide default for that file.

use indexmap::IndexMap;

use crate::core::errors::{ProdocError, Result};
use crate::core::model::{Routine, SourceFile};
use crate::dialect::tagged::TaggedDialect;
use crate::dialect::verbatim::VerbatimDialect;

/// Site-level overview documentation parsed from an overview file.
#[derive(Debug, Clone, Default)]
pub struct Overview {
    /// Overview body lines.
    pub comments: Vec<String>,
}

/// A documentation-format dialect.
///
/// Implementations must never fail fatally on malformed input: unrecognized
/// tag lines degrade to plain description text, at most pushing a message
/// onto `warnings`.
pub trait DialectParser {
    /// Registry name of this dialect.
    fn name(&self) -> &'static str;

    /// Attach a file-header comment block to the file.
    fn parse_file_comments(
        &self,
        lines: &[String],
        file: &mut SourceFile,
        warnings: &mut Vec<String>,
    );

    /// Attach a routine comment block (header or interior) to the routine.
    fn parse_routine_comments(
        &self,
        lines: &[String],
        routine: &mut Routine,
        warnings: &mut Vec<String>,
    );

    /// Parse a site-overview comment block.
    fn parse_overview_comments(&self, lines: &[String], warnings: &mut Vec<String>) -> Overview;
}

/// Registry of available dialects, populated once at startup.
pub struct DialectRegistry {
    dialects: IndexMap<&'static str, Box<dyn DialectParser>>,
}

impl DialectRegistry {
    /// Create a registry containing the built-in dialects.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            dialects: IndexMap::new(),
        };
        registry.register(Box::new(TaggedDialect));
        registry.register(Box::new(VerbatimDialect));
        registry
    }

    /// Register a dialect under its own name.
    pub fn register(&mut self, dialect: Box<dyn DialectParser>) {
        self.dialects.insert(dialect.name(), dialect);
    }

    /// Look up a dialect by case-insensitive name.
    pub fn get(&self, name: &str) -> Result<&dyn DialectParser> {
        let lower = name.to_lowercase();
        self.dialects
            .iter()
            .find(|(key, _)| **key == lower)
            .map(|(_, dialect)| dialect.as_ref())
            .ok_or_else(|| ProdocError::unknown_style("dialect", name))
    }

    /// Names of all registered dialects, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.dialects.keys().copied().collect()
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Per-file format override parsed from a `; docformat = '…'` directive on
/// the first line of a file. The quoted value names the dialect, optionally
/// followed by a markup name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDirective {
    /// Dialect name.
    pub dialect: String,
    /// Optional markup name.
    pub markup: Option<String>,
}

impl FormatDirective {
    /// Parse the directive from a file's first line, if present.
    pub fn from_first_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        let body = trimmed.strip_prefix(';')?.trim();
        let lower = body.to_lowercase();
        if !lower.starts_with("docformat") {
            return None;
        }
        let after = body["docformat".len()..].trim_start();
        let after = after.strip_prefix('=')?.trim();

        // Value is quoted with either quote character.
        let quote = after.chars().next()?;
        if quote != '\'' && quote != '"' {
            return None;
        }
        let rest = &after[1..];
        let close = rest.find(quote)?;
        let value = rest[..close].trim().to_lowercase();

        let mut words = value.split_whitespace();
        let dialect = words.next()?.to_string();
        let markup = words.next().map(str::to_string);
        Some(Self { dialect, markup })
    }
}
