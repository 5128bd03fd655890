//! Object model for parsed source units.
//!
//! Files own routines, routines own their arguments. Classes, fields, and
//! properties live in the class registry (`core::classes`) and reference
//! back into this model by handle. Every entity kind exposes its fields to
//! template rendering through the [`TemplateVars`] string-keyed lookup; the
//! entity → owning file → session fallback chain is explicit delegation in
//! the session, never implicit inheritance.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::core::config::DocLevel;

/// Stable handle to a parsed file in the session's file arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FileId(pub usize);

/// How completely a routine is documented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Completeness {
    /// No description and no documented arguments.
    Undocumented,
    /// Some documentation, but not all arguments are covered.
    Partial,
    /// Description present and every argument documented.
    Full,
}

/// A positional parameter or named keyword argument of a routine.
#[derive(Debug, Clone, Serialize)]
pub struct Argument {
    /// Argument name as written in the declaration.
    pub name: String,
    /// True for keyword arguments, false for positional parameters.
    pub is_keyword: bool,
    /// Documentation lines attached by the dialect parser.
    pub comments: Vec<String>,
    /// Keyword-style attributes from the dialect's tag syntax, e.g. `in`,
    /// `out`, `optional`, `required`.
    pub attributes: Vec<String>,
    /// Position flags within the owning routine's argument list.
    pub is_first: bool,
    /// True when this is the last argument of its list.
    pub is_last: bool,
}

impl Argument {
    /// Create a new argument with cleared position flags; the owning routine
    /// recomputes them when its argument lists are final.
    pub fn new(name: impl Into<String>, is_keyword: bool) -> Self {
        Self {
            name: name.into(),
            is_keyword,
            comments: Vec::new(),
            attributes: Vec::new(),
            is_first: false,
            is_last: false,
        }
    }

    /// True once any documentation text has been attached.
    pub fn is_documented(&self) -> bool {
        self.comments.iter().any(|line| !line.trim().is_empty())
    }
}

/// Structured documentation tags attached to a routine.
///
/// Most tags append across multiple attachment calls; `returns` and
/// `examples` overwrite.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoutineDocs {
    /// Description body lines.
    pub comments: Vec<String>,
    /// Return-value documentation (functions only); overwritten on re-set.
    pub returns: Option<String>,
    /// Usage examples; overwritten on re-set.
    pub examples: Option<String>,
    /// Author lines.
    pub author: Vec<String>,
    /// Copyright lines.
    pub copyright: Vec<String>,
    /// Modification history lines.
    pub history: Vec<String>,
    /// Version string.
    pub version: Option<String>,
    /// Known bugs.
    pub bugs: Vec<String>,
    /// Outstanding work items.
    pub todo: Vec<String>,
    /// Pre-condition lines.
    pub pre: Vec<String>,
    /// Post-condition lines.
    pub post: Vec<String>,
    /// Usage restrictions.
    pub restrictions: Vec<String>,
    /// Other routines this routine uses.
    pub uses: Vec<String>,
    /// Minimum required language version.
    pub requires: Option<String>,
    /// Customer identifier.
    pub customer_id: Option<String>,
    /// Category names, deduplicated case-insensitively.
    pub categories: Vec<String>,
}

/// A procedure or function, free or a method.
#[derive(Debug, Clone, Serialize)]
pub struct Routine {
    /// Routine name; case-insensitive identity.
    pub name: String,
    /// True for `function`, false for `pro`.
    pub is_function: bool,
    /// True when the name carries a `Class::method` separator.
    pub is_method: bool,
    /// Marked abstract by its documentation.
    pub is_abstract: bool,
    /// Marked obsolete by its documentation.
    pub is_obsolete: bool,
    /// Never shown in output.
    pub is_hidden: bool,
    /// Shown only in developer-level output.
    pub is_private: bool,
    /// Ordered positional parameters.
    pub parameters: Vec<Argument>,
    /// Ordered keyword arguments.
    pub keywords: Vec<Argument>,
    /// Structured documentation.
    pub docs: RoutineDocs,
    /// Derived documentation completeness, computed at finalization.
    pub completeness: Completeness,
    /// Number of source lines spanned by the routine body.
    pub n_lines: usize,
    /// Owning file (back-reference only).
    pub file: FileId,
}

impl Routine {
    /// Create a new routine attached to `file`. The name is set exactly once
    /// here; the session indexes it under this name when the file finishes.
    pub fn new(name: impl Into<String>, file: FileId) -> Self {
        Self {
            name: name.into(),
            is_function: false,
            is_method: false,
            is_abstract: false,
            is_obsolete: false,
            is_hidden: false,
            is_private: false,
            parameters: Vec::new(),
            keywords: Vec::new(),
            docs: RoutineDocs::default(),
            completeness: Completeness::Undocumented,
            n_lines: 0,
            file,
        }
    }

    /// Append description lines; repeated calls accumulate.
    pub fn append_comments(&mut self, lines: &[String]) {
        self.docs.comments.extend(lines.iter().cloned());
    }

    /// Add a category unless an equivalent one (case-insensitive) exists.
    pub fn add_category(&mut self, name: &str) {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return;
        }
        let lower = trimmed.to_lowercase();
        if !self
            .docs
            .categories
            .iter()
            .any(|c| c.to_lowercase() == lower)
        {
            self.docs.categories.push(trimmed.to_string());
        }
    }

    /// Look up an argument (parameter or keyword) by case-insensitive name.
    pub fn find_argument_mut(&mut self, name: &str) -> Option<&mut Argument> {
        let lower = name.to_lowercase();
        self.parameters
            .iter_mut()
            .chain(self.keywords.iter_mut())
            .find(|arg| arg.name.to_lowercase() == lower)
    }

    /// Recompute `is_first`/`is_last` flags after the argument lists change.
    pub fn refresh_argument_positions(&mut self) {
        mark_positions(&mut self.parameters);
        mark_positions(&mut self.keywords);
    }

    /// Compute the completeness level once no more comments can attach.
    pub fn finalize(&mut self) {
        self.refresh_argument_positions();

        let described = !self.docs.comments.iter().all(|l| l.trim().is_empty());
        let args_total = self.parameters.len() + self.keywords.len();
        let args_documented = self
            .parameters
            .iter()
            .chain(self.keywords.iter())
            .filter(|a| a.is_documented())
            .count();

        self.completeness = if !described && args_documented == 0 {
            Completeness::Undocumented
        } else if described && args_documented == args_total {
            Completeness::Full
        } else {
            Completeness::Partial
        };
    }

    /// Whether this routine should appear in output at the given doc level,
    /// before the owning file's visibility is applied.
    pub fn is_visible(&self, level: DocLevel) -> bool {
        if self.is_hidden {
            return false;
        }
        if self.is_private {
            return level == DocLevel::Developer;
        }
        true
    }
}

fn mark_positions(args: &mut [Argument]) {
    let len = args.len();
    for (index, arg) in args.iter_mut().enumerate() {
        arg.is_first = index == 0;
        arg.is_last = index + 1 == len;
    }
}

/// File-level documentation tags.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileDocs {
    /// File-level description lines.
    pub comments: Vec<String>,
    /// Author lines.
    pub author: Vec<String>,
    /// Copyright lines.
    pub copyright: Vec<String>,
    /// Modification history lines.
    pub history: Vec<String>,
    /// Version string.
    pub version: Option<String>,
}

/// One parsed source unit.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    /// File basename, including extension.
    pub basename: String,
    /// Directory grouping the file belongs to, relative to the root.
    pub directory: String,
    /// Total number of raw source lines.
    pub n_lines: usize,
    /// Modification timestamp, when known.
    pub modified: Option<DateTime<Utc>>,
    /// Documentation dialect in effect for this file.
    pub doc_format: String,
    /// Markup style in effect for this file.
    pub markup: String,
    /// Routines declared in this file, in declaration order.
    pub routines: Vec<Routine>,
    /// True when the file contains no routines and no main-level code.
    pub is_batch_file: bool,
    /// True when top-level executable statements were found.
    pub has_main_level_code: bool,
    /// True when the basename marks a class structure definition.
    pub is_class_definition_file: bool,
    /// Hidden flag from file-level documentation.
    pub is_hidden: bool,
    /// Private flag from file-level documentation.
    pub is_private: bool,
    /// File-level documentation.
    pub docs: FileDocs,
}

impl SourceFile {
    /// Create a new, not-yet-parsed source file record.
    pub fn new(basename: impl Into<String>, directory: impl Into<String>) -> Self {
        let basename = basename.into();
        let is_class_definition_file = basename
            .to_lowercase()
            .trim_end_matches(".pro")
            .ends_with("__define");
        Self {
            basename,
            directory: directory.into(),
            n_lines: 0,
            modified: None,
            doc_format: String::new(),
            markup: String::new(),
            routines: Vec::new(),
            is_batch_file: false,
            has_main_level_code: false,
            is_class_definition_file,
            is_hidden: false,
            is_private: false,
            docs: FileDocs::default(),
        }
    }

    /// Class name for a `<class>__define.pro` file, if this is one.
    pub fn defined_class_name(&self) -> Option<String> {
        if !self.is_class_definition_file {
            return None;
        }
        let stem = self.basename.trim_end_matches(".pro");
        let lower = stem.to_lowercase();
        let cut = lower.rfind("__define")?;
        Some(stem[..cut].to_string())
    }

    /// Relative URL of this file's generated page.
    pub fn local_url(&self) -> String {
        format!("{}.html", self.basename.trim_end_matches(".pro"))
    }

    /// Whether the file itself is visible at the given doc level.
    pub fn is_visible(&self, level: DocLevel) -> bool {
        if self.is_hidden {
            return false;
        }
        if self.is_private {
            return level == DocLevel::Developer;
        }
        true
    }
}

/// String-keyed variable lookup used by template rendering.
///
/// Returns `None` for unknown keys; callers chain lookups explicitly
/// (entity, then owning file, then session).
pub trait TemplateVars {
    /// Look up a named variable, returning its rendered value when known.
    fn variable(&self, name: &str) -> Option<Value>;
}

impl TemplateVars for Argument {
    fn variable(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(json!(self.name)),
            "is_keyword" => Some(json!(self.is_keyword)),
            "is_first" => Some(json!(self.is_first)),
            "is_last" => Some(json!(self.is_last)),
            "comments" => Some(json!(self.comments.join("\n"))),
            "attributes" => Some(json!(self.attributes)),
            _ => None,
        }
    }
}

impl TemplateVars for Routine {
    fn variable(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(json!(self.name)),
            "anchor" => Some(json!(self.name.to_lowercase())),
            "is_function" => Some(json!(self.is_function)),
            "is_method" => Some(json!(self.is_method)),
            "is_abstract" => Some(json!(self.is_abstract)),
            "is_obsolete" => Some(json!(self.is_obsolete)),
            "is_hidden" => Some(json!(self.is_hidden)),
            "is_private" => Some(json!(self.is_private)),
            "n_parameters" => Some(json!(self.parameters.len())),
            "n_keywords" => Some(json!(self.keywords.len())),
            "parameters" => Some(json!(self
                .parameters
                .iter()
                .map(|a| a.name.clone())
                .collect::<Vec<_>>())),
            "keywords" => Some(json!(self
                .keywords
                .iter()
                .map(|a| a.name.clone())
                .collect::<Vec<_>>())),
            "comments" => Some(json!(self.docs.comments.join("\n"))),
            "returns" => self.docs.returns.as_ref().map(|v| json!(v)),
            "examples" => self.docs.examples.as_ref().map(|v| json!(v)),
            "author" => Some(json!(self.docs.author.join("\n"))),
            "copyright" => Some(json!(self.docs.copyright.join("\n"))),
            "history" => Some(json!(self.docs.history.join("\n"))),
            "version" => self.docs.version.as_ref().map(|v| json!(v)),
            "bugs" => Some(json!(self.docs.bugs.join("\n"))),
            "todo" => Some(json!(self.docs.todo.join("\n"))),
            "pre" => Some(json!(self.docs.pre.join("\n"))),
            "post" => Some(json!(self.docs.post.join("\n"))),
            "restrictions" => Some(json!(self.docs.restrictions.join("\n"))),
            "uses" => Some(json!(self.docs.uses.join("\n"))),
            "requires" => self.docs.requires.as_ref().map(|v| json!(v)),
            "customer_id" => self.docs.customer_id.as_ref().map(|v| json!(v)),
            "categories" => Some(json!(self.docs.categories)),
            "completeness" => Some(json!(match self.completeness {
                Completeness::Undocumented => "undocumented",
                Completeness::Partial => "partial",
                Completeness::Full => "full",
            })),
            "n_lines" => Some(json!(self.n_lines)),
            _ => None,
        }
    }
}

impl TemplateVars for SourceFile {
    fn variable(&self, name: &str) -> Option<Value> {
        match name {
            "basename" => Some(json!(self.basename)),
            "local_url" => Some(json!(self.local_url())),
            "directory" => Some(json!(self.directory)),
            "n_lines" => Some(json!(self.n_lines)),
            "modification_time" => self.modified.map(|t| json!(t.to_rfc3339())),
            "format" => Some(json!(self.doc_format)),
            "markup" => Some(json!(self.markup)),
            "n_routines" => Some(json!(self.routines.len())),
            "routine_names" => Some(json!(self
                .routines
                .iter()
                .map(|r| r.name.clone())
                .collect::<Vec<_>>())),
            "is_batch" => Some(json!(self.is_batch_file)),
            "is_main_level" => Some(json!(self.has_main_level_code)),
            "is_class_file" => Some(json!(self.is_class_definition_file)),
            "is_hidden" => Some(json!(self.is_hidden)),
            "is_private" => Some(json!(self.is_private)),
            "comments" => Some(json!(self.docs.comments.join("\n"))),
            "author" => Some(json!(self.docs.author.join("\n"))),
            "copyright" => Some(json!(self.docs.copyright.join("\n"))),
            "history" => Some(json!(self.docs.history.join("\n"))),
            "version" => self.docs.version.as_ref().map(|v| json!(v)),
            _ => None,
        }
    }
}
