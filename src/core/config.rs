//! Configuration types for a documentation run.
//!
//! All defaults live in one place so the CLI flags, YAML config files, and
//! library callers cannot drift apart.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{ProdocError, Result};

/// Audience level for the generated documentation.
///
/// Private entities appear only in developer-level output; hidden entities
/// never appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocLevel {
    /// End-user documentation: private entities are filtered out.
    User,
    /// Developer documentation: private entities are included.
    Developer,
}

impl Default for DocLevel {
    fn default() -> Self {
        DocLevel::User
    }
}

/// Main configuration for a prodoc run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProdocConfig {
    /// Root directory of the source tree to document.
    pub root: PathBuf,

    /// Output directory for the generated site.
    pub output: PathBuf,

    /// Default documentation dialect, overridable per file by a first-line
    /// `; docformat` directive.
    pub doc_format: String,

    /// Default markup style for documentation bodies.
    pub markup: String,

    /// Audience level controlling visibility filtering.
    #[serde(default)]
    pub doc_level: DocLevel,

    /// Title for the generated site.
    #[serde(default = "default_title")]
    pub title: String,

    /// Optional overview file parsed for site-level documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<PathBuf>,

    /// Glob patterns for paths excluded from discovery.
    #[serde(default)]
    pub ignore_globs: Vec<String>,
}

fn default_title() -> String {
    "Documentation".to_string()
}

impl Default for ProdocConfig {
    fn default() -> Self {
        Self::new_with_defaults()
    }
}

impl ProdocConfig {
    /// Construct a configuration using the canonical default values shared by
    /// the CLI and library surfaces.
    pub(crate) fn new_with_defaults() -> Self {
        Self {
            root: PathBuf::from("."),
            output: PathBuf::from("docs"),
            doc_format: "tagged".to_string(),
            markup: "verbatim".to_string(),
            doc_level: DocLevel::User,
            title: default_title(),
            overview: None,
            ignore_globs: Vec::new(),
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ProdocError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            ProdocError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Validate field values that cannot be checked by serde alone.
    pub fn validate(&self) -> Result<()> {
        if self.doc_format.trim().is_empty() {
            return Err(ProdocError::config_field(
                "default dialect name must not be empty",
                "doc_format",
            ));
        }
        if self.markup.trim().is_empty() {
            return Err(ProdocError::config_field(
                "default markup name must not be empty",
                "markup",
            ));
        }
        if self.root.as_os_str().is_empty() {
            return Err(ProdocError::config_field(
                "root path must not be empty",
                "root",
            ));
        }
        Ok(())
    }
}
