//! Build session: the single-threaded driver that parses files into the
//! object model and aggregates cross-file registries.
//!
//! One session corresponds to one documentation run. Files are parsed one at
//! a time in discovery order; all shared lookups (index, categories, class
//! registry, warning sink) are plain owned fields mutated synchronously, so
//! aggregation results are deterministic for a given input ordering.

use std::cmp::Ordering;
use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::core::classes::{accessor_kind, method_class_name, ClassRegistry};
use crate::core::config::ProdocConfig;
use crate::core::errors::{ProdocError, Result};
use crate::core::model::{Completeness, FileId, Routine, SourceFile, TemplateVars};
use crate::core::oracle::TypeOracle;
use crate::dialect::markup::MarkupRegistry;
use crate::dialect::{DialectRegistry, FormatDirective, Overview};
use crate::parse::classifier::{Classifier, ClassifierEvent};
use crate::parse::tokenizer::LineTokenizer;

/// What kind of entity an index entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// A routine in a file.
    Routine,
    /// A source file.
    File,
    /// A class in the class registry.
    Class,
}

/// One entry in the master name index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexEntry {
    /// Entity name, lowercased (names are case-insensitive identities).
    pub name: String,
    /// Entity kind.
    pub kind: IndexKind,
    /// Owning or defining file; classes only ever referenced from code have
    /// none.
    pub file: Option<FileId>,
}

/// A category and the routines filed under it.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryEntry {
    /// Display name, first-seen casing.
    pub name: String,
    /// Routine names in registration order.
    pub routines: Vec<String>,
}

/// A routine reference used by the attention registries (obsolete, bugs,
/// todo).
#[derive(Debug, Clone, Serialize)]
pub struct RegistryItem {
    /// Routine name.
    pub routine: String,
    /// Basename of the owning file.
    pub file: String,
}

/// Aggregate counts for a finished run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunSummary {
    /// Files parsed.
    pub files: usize,
    /// Routines discovered.
    pub routines: usize,
    /// Classes in the registry.
    pub classes: usize,
    /// Warnings emitted.
    pub warnings: usize,
    /// Routines with no documentation at all.
    pub undocumented: usize,
    /// Routines with some but not complete documentation.
    pub partial: usize,
    /// Fully documented routines.
    pub full: usize,
}

/// A documentation run in progress.
///
/// Feed it files with [`parse_path`](Self::parse_path) or
/// [`parse_source`](Self::parse_source), then call
/// [`finish`](Self::finish) once before rendering.
pub struct BuildSession {
    config: ProdocConfig,
    dialects: DialectRegistry,
    markups: MarkupRegistry,
    files: Vec<SourceFile>,
    classes: ClassRegistry,
    index: Vec<IndexEntry>,
    categories: IndexMap<String, CategoryEntry>,
    obsolete: Vec<RegistryItem>,
    bugs: Vec<RegistryItem>,
    todos: Vec<RegistryItem>,
    required_version: Option<String>,
    required_by: Vec<RegistryItem>,
    overview: Option<Overview>,
    warnings: Vec<String>,
    finished: bool,
}

impl BuildSession {
    /// Create a session for the given configuration.
    pub fn new(config: ProdocConfig) -> Self {
        Self {
            config,
            dialects: DialectRegistry::with_builtins(),
            markups: MarkupRegistry::with_builtins(),
            files: Vec::new(),
            classes: ClassRegistry::new(),
            index: Vec::new(),
            categories: IndexMap::new(),
            obsolete: Vec::new(),
            bugs: Vec::new(),
            todos: Vec::new(),
            required_version: None,
            required_by: Vec::new(),
            overview: None,
            warnings: Vec::new(),
            finished: false,
        }
    }

    /// The configuration this session runs under.
    pub fn config(&self) -> &ProdocConfig {
        &self.config
    }

    /// Register an additional dialect before any files are parsed.
    pub fn register_dialect(&mut self, dialect: Box<dyn crate::dialect::DialectParser>) {
        self.dialects.register(dialect);
    }

    /// Parsed files, in parse order.
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Borrow a file by handle.
    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0]
    }

    /// The class registry.
    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Master name index over files, routines, and classes. Names are
    /// lowercased; sorted and visibility-filtered by
    /// [`finish`](Self::finish).
    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    /// Categories keyed by lowercased name, in first-seen order.
    pub fn categories(&self) -> &IndexMap<String, CategoryEntry> {
        &self.categories
    }

    /// Routines marked obsolete.
    pub fn obsolete(&self) -> &[RegistryItem] {
        &self.obsolete
    }

    /// Routines with known bugs.
    pub fn bugs(&self) -> &[RegistryItem] {
        &self.bugs
    }

    /// Routines with outstanding work items.
    pub fn todos(&self) -> &[RegistryItem] {
        &self.todos
    }

    /// Highest language version required by any routine, when declared.
    pub fn required_version(&self) -> Option<&str> {
        self.required_version.as_deref()
    }

    /// Routines that require [`required_version`](Self::required_version).
    pub fn required_by(&self) -> &[RegistryItem] {
        &self.required_by
    }

    /// Site overview, when an overview file was configured and parsed.
    pub fn overview(&self) -> Option<&Overview> {
        self.overview.as_ref()
    }

    /// All warnings emitted so far.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Read a file from disk and parse it into the session.
    pub fn parse_path(&mut self, path: impl AsRef<Path>, oracle: &dyn TypeOracle) -> Result<FileId> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProdocError::io(format!("Failed to read {}", path.display()), e))?;
        let lines: Vec<String> = content.lines().map(str::to_string).collect();

        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let directory = path
            .parent()
            .map(|parent| {
                parent
                    .strip_prefix(&self.config.root)
                    .unwrap_or(parent)
                    .to_string_lossy()
                    .into_owned()
            })
            .unwrap_or_default();

        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        let id = self.parse_source(&basename, &directory, &lines, oracle)?;
        self.files[id.0].modified = modified;
        Ok(id)
    }

    /// Parse one file's raw lines into the session.
    pub fn parse_source(
        &mut self,
        basename: &str,
        directory: &str,
        lines: &[String],
        oracle: &dyn TypeOracle,
    ) -> Result<FileId> {
        let file_id = FileId(self.files.len());
        let mut file = SourceFile::new(basename, directory);
        file.n_lines = lines.len();
        debug!(file = basename, lines = lines.len(), "parsing");

        // Resolve the per-file dialect and markup, honoring a first-line
        // directive. An unknown name in the directive falls back to the
        // configured default with a warning; an unknown default is a
        // configuration error.
        let mut local_warnings: Vec<String> = Vec::new();
        let mut format_name = self.config.doc_format.clone();
        let mut markup_name = self.config.markup.clone();
        if let Some(directive) = lines.first().and_then(|l| FormatDirective::from_first_line(l)) {
            if self.dialects.get(&directive.dialect).is_ok() {
                format_name = directive.dialect;
            } else {
                local_warnings.push(format!(
                    "unknown dialect '{}' in docformat directive, using '{}'",
                    directive.dialect, self.config.doc_format
                ));
            }
            if let Some(markup) = directive.markup {
                if self.markups.get(&markup).is_ok() {
                    markup_name = markup;
                } else {
                    local_warnings.push(format!(
                        "unknown markup '{}' in docformat directive, using '{}'",
                        markup, self.config.markup
                    ));
                }
            }
        }
        self.markups.get(&markup_name)?;
        let dialect = self.dialects.get(&format_name)?;
        file.doc_format = format_name;
        file.markup = markup_name;

        // Single pass: tokenize, classify, attach comment blocks through the
        // dialect. Routine line spans come from tokenizer position deltas.
        let mut classifier = Classifier::new();
        let mut tokenizer = LineTokenizer::new(lines);
        let mut routine_start: Option<usize> = None;

        loop {
            let start = tokenizer.position();
            let statement = match tokenizer.next() {
                Some(statement) => statement,
                None => break,
            };
            for event in classifier.push(&statement) {
                if let ClassifierEvent::BeginRoutine(_) = &event {
                    if let (Some(previous_start), Some(previous)) =
                        (routine_start, file.routines.last_mut())
                    {
                        previous.n_lines = start.saturating_sub(previous_start);
                    }
                    routine_start = Some(start);
                }
                attach_event(event, file_id, &mut file, dialect, &mut local_warnings);
            }
        }

        let (tail, outcome) = classifier.finish();
        for event in tail {
            attach_event(event, file_id, &mut file, dialect, &mut local_warnings);
        }
        if let (Some(start), Some(last)) = (routine_start, file.routines.last_mut()) {
            last.n_lines = lines.len().saturating_sub(start);
        }
        file.has_main_level_code = outcome.has_main_level_code;
        file.is_batch_file = outcome.is_batch_file;

        // File-level visibility folds into every routine in the file.
        for routine in &mut file.routines {
            routine.is_hidden |= file.is_hidden;
            routine.is_private |= file.is_private;
            routine.finalize();
        }

        // Cross-file registration: index, categories, attention registries,
        // class links. Class resolution runs once per class, at first
        // reference.
        if let Some(class_name) = file.defined_class_name() {
            let key = self.classes.resolve(&class_name, oracle, &mut local_warnings);
            self.classes.set_defining_file(key, file_id);
        }
        self.index.push(IndexEntry {
            name: file.basename.to_lowercase(),
            kind: IndexKind::File,
            file: Some(file_id),
        });
        for routine in &file.routines {
            self.index.push(IndexEntry {
                name: routine.name.to_lowercase(),
                kind: IndexKind::Routine,
                file: Some(file_id),
            });
            self.register_routine(routine, &file, oracle, &mut local_warnings);
        }

        for message in local_warnings {
            warn!(file = basename, "{message}");
            self.warnings.push(format!("{basename}: {message}"));
        }
        self.files.push(file);
        Ok(file_id)
    }

    /// Finish the run: load the overview, sort the index, and log totals.
    /// Idempotent; rendering should only happen after this.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        if let Some(path) = self.config.overview.clone() {
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let lines: Vec<String> =
                        content.lines().map(strip_overview_marker).collect();
                    match self.dialects.get(&self.config.doc_format) {
                        Ok(dialect) => {
                            let mut local_warnings = Vec::new();
                            self.overview =
                                Some(dialect.parse_overview_comments(&lines, &mut local_warnings));
                            for message in local_warnings {
                                self.warnings
                                    .push(format!("{}: {}", path.display(), message));
                            }
                        }
                        Err(err) => self.warnings.push(err.to_string()),
                    }
                }
                Err(err) => {
                    self.warnings
                        .push(format!("could not read overview {}: {err}", path.display()));
                }
            }
        }

        // Classes join the index once all files are parsed.
        let class_entries: Vec<IndexEntry> = self
            .classes
            .iter()
            .map(|(_, entity)| IndexEntry {
                name: entity.name.to_lowercase(),
                kind: IndexKind::Class,
                file: entity.file,
            })
            .collect();
        self.index.extend(class_entries);

        // Entries whose entity is filtered at this doc level leave the
        // index entirely.
        let level = self.config.doc_level;
        let files = &self.files;
        self.index.retain(|entry| match entry.kind {
            IndexKind::Routine => entry.file.is_some_and(|id| {
                let file = &files[id.0];
                file.is_visible(level)
                    && file
                        .routines
                        .iter()
                        .any(|r| r.name.to_lowercase() == entry.name && r.is_visible(level))
            }),
            IndexKind::File => entry.file.is_some_and(|id| files[id.0].is_visible(level)),
            IndexKind::Class => entry
                .file
                .map_or(true, |id| files[id.0].is_visible(level)),
        });
        self.index.sort_by(|a, b| a.name.cmp(&b.name));

        let summary = self.summary();
        info!(
            files = summary.files,
            routines = summary.routines,
            classes = summary.classes,
            warnings = summary.warnings,
            "run finished"
        );
    }

    /// Aggregate counts over everything parsed so far.
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            files: self.files.len(),
            classes: self.classes.len(),
            warnings: self.warnings.len(),
            ..RunSummary::default()
        };
        for file in &self.files {
            for routine in &file.routines {
                summary.routines += 1;
                match routine.completeness {
                    Completeness::Undocumented => summary.undocumented += 1,
                    Completeness::Partial => summary.partial += 1,
                    Completeness::Full => summary.full += 1,
                }
            }
        }
        summary
    }

    /// Files visible at the configured documentation level, in parse order.
    pub fn visible_files(&self) -> impl Iterator<Item = (FileId, &SourceFile)> {
        let level = self.config.doc_level;
        self.files
            .iter()
            .enumerate()
            .filter(move |(_, file)| file.is_visible(level))
            .map(|(index, file)| (FileId(index), file))
    }

    /// Routines of a file visible at the configured documentation level.
    pub fn visible_routines<'a>(&'a self, file: &'a SourceFile) -> impl Iterator<Item = &'a Routine> {
        let level = self.config.doc_level;
        file.routines
            .iter()
            .filter(move |routine| routine.is_visible(level))
    }

    fn register_routine(
        &mut self,
        routine: &Routine,
        file: &SourceFile,
        oracle: &dyn TypeOracle,
        warnings: &mut Vec<String>,
    ) {
        for category in &routine.docs.categories {
            let entry = self
                .categories
                .entry(category.to_lowercase())
                .or_insert_with(|| CategoryEntry {
                    name: category.clone(),
                    routines: Vec::new(),
                });
            entry.routines.push(routine.name.clone());
        }

        let item = || RegistryItem {
            routine: routine.name.clone(),
            file: file.basename.clone(),
        };
        if routine.is_obsolete {
            self.obsolete.push(item());
        }
        if !routine.docs.bugs.is_empty() {
            self.bugs.push(item());
        }
        if !routine.docs.todo.is_empty() {
            self.todos.push(item());
        }

        if let Some(requires) = &routine.docs.requires {
            self.check_required_version(requires, item());
        }

        // Methods link their class; accessor methods additionally promote
        // their keywords to class properties.
        self.link_method(routine, oracle, warnings);
    }

    /// Track the highest declared version requirement and the routines that
    /// carry it. A strictly higher version resets the carrier list.
    fn check_required_version(&mut self, version: &str, item: RegistryItem) {
        let ordering = match &self.required_version {
            Some(current) => compare_versions(version, current),
            None => Ordering::Greater,
        };
        match ordering {
            Ordering::Greater => {
                self.required_version = Some(version.to_string());
                self.required_by = vec![item];
            }
            Ordering::Equal => self.required_by.push(item),
            Ordering::Less => {}
        }
    }

    fn link_method(
        &mut self,
        routine: &Routine,
        oracle: &dyn TypeOracle,
        warnings: &mut Vec<String>,
    ) {
        if routine.is_method {
            if let Some(class_name) = method_class_name(&routine.name) {
                let key = self.classes.resolve(class_name, oracle, warnings);
                if let Some(kind) = accessor_kind(&routine.name) {
                    for keyword in &routine.keywords {
                        self.classes
                            .promote_keyword_to_property(key, &keyword.name, kind);
                    }
                }
            }
        }
    }
}

impl TemplateVars for BuildSession {
    fn variable(&self, name: &str) -> Option<Value> {
        let summary = self.summary();
        match name {
            "title" => Some(json!(self.config.title)),
            "version" => Some(json!(crate::VERSION)),
            "date" => Some(json!(Utc::now().to_rfc2822())),
            "root" => Some(json!(self.config.root.display().to_string())),
            "output" => Some(json!(self.config.output.display().to_string())),
            "n_files" => Some(json!(summary.files)),
            "n_routines" => Some(json!(summary.routines)),
            "n_classes" => Some(json!(summary.classes)),
            "n_warnings" => Some(json!(summary.warnings)),
            "requires" => self.required_version.as_ref().map(|v| json!(v)),
            "overview" => self
                .overview
                .as_ref()
                .map(|o| json!(o.comments.join("\n"))),
            _ => None,
        }
    }
}

/// Compare dotted version strings segment by numeric segment. Missing
/// segments count as zero; non-numeric segments count as zero.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |s: &str| -> Vec<u64> {
        s.split('.')
            .map(|seg| seg.trim().parse::<u64>().unwrap_or(0))
            .collect()
    };
    let left = parse(a);
    let right = parse(b);
    let len = left.len().max(right.len());
    for index in 0..len {
        let l = left.get(index).copied().unwrap_or(0);
        let r = right.get(index).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn strip_overview_marker(line: &str) -> String {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix(';') {
        let mut chars = rest.chars();
        match chars.next() {
            Some(_) => chars.as_str().to_string(),
            None => String::new(),
        }
    } else {
        line.to_string()
    }
}

fn attach_event(
    event: ClassifierEvent,
    file_id: FileId,
    file: &mut SourceFile,
    dialect: &dyn crate::dialect::DialectParser,
    warnings: &mut Vec<String>,
) {
    match event {
        ClassifierEvent::FileComments(lines) => {
            dialect.parse_file_comments(&lines, file, warnings);
        }
        ClassifierEvent::BeginRoutine(declaration) => {
            let mut routine = Routine::new(declaration.name, file_id);
            routine.is_function = declaration.is_function;
            routine.is_method = declaration.is_method;
            for arg in declaration.arguments {
                let argument = crate::core::model::Argument::new(arg.name, arg.is_keyword);
                if arg.is_keyword {
                    routine.keywords.push(argument);
                } else {
                    routine.parameters.push(argument);
                }
            }
            file.routines.push(routine);
        }
        ClassifierEvent::ContinueRoutine(args) => {
            if let Some(routine) = file.routines.last_mut() {
                for arg in args {
                    let argument = crate::core::model::Argument::new(arg.name, arg.is_keyword);
                    if arg.is_keyword {
                        routine.keywords.push(argument);
                    } else {
                        routine.parameters.push(argument);
                    }
                }
            }
        }
        ClassifierEvent::RoutineComments(lines) => match file.routines.last_mut() {
            Some(routine) => dialect.parse_routine_comments(&lines, routine, warnings),
            None => warnings.push("comment block with no routine to attach to".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DocLevel;
    use crate::core::oracle::{NullOracle, TableOracle};
    use crate::core::typedesc::{RuntimeValue, Scalar};

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn parse(session: &mut BuildSession, basename: &str, raw: &[&str]) -> FileId {
        session
            .parse_source(basename, "lib", &lines(raw), &NullOracle)
            .unwrap()
    }

    fn routine_index(session: &BuildSession) -> Vec<&str> {
        session
            .index()
            .iter()
            .filter(|e| e.kind == IndexKind::Routine)
            .map(|e| e.name.as_str())
            .collect()
    }

    #[test]
    fn test_single_routine_file() {
        let mut session = BuildSession::new(ProdocConfig::default());
        let id = parse(
            &mut session,
            "mg_smooth.pro",
            &[
                ";+",
                "; Smooths a time series.",
                ";",
                "; @param data {in}{required} the series to smooth",
                ";-",
                "pro mg_smooth, data",
                "  x = 1",
                "end",
            ],
        );
        session.finish();

        let file = session.file(id);
        assert_eq!(file.routines.len(), 1);
        let routine = &file.routines[0];
        assert_eq!(routine.name, "mg_smooth");
        assert_eq!(routine.parameters.len(), 1);
        assert!(routine.parameters[0].is_documented());
        assert_eq!(routine.completeness, Completeness::Full);
        assert_eq!(routine.n_lines, 3);
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn test_file_doc_then_two_routines() {
        let mut session = BuildSession::new(ProdocConfig::default());
        let id = parse(
            &mut session,
            "mg_pair.pro",
            &[
                ";+",
                "; Helpers for coordinate pairs.",
                ";-",
                "",
                "pro mg_pair_swap, a, b",
                "end",
                "",
                "function mg_pair_sum, a, b",
                "  return, a + b",
                "end",
            ],
        );
        session.finish();

        let file = session.file(id);
        assert_eq!(
            file.docs.comments,
            vec!["Helpers for coordinate pairs.".to_string()]
        );
        assert_eq!(file.routines.len(), 2);
        assert!(file.routines[1].is_function);
        assert!(!file.is_batch_file);

        let names: Vec<&str> = routine_index(&session);
        assert_eq!(names, vec!["mg_pair_sum", "mg_pair_swap"]);
    }

    #[test]
    fn test_docformat_directive_switches_dialect() {
        let mut session = BuildSession::new(ProdocConfig::default());
        let id = parse(
            &mut session,
            "mg_verbatim.pro",
            &[
                "; docformat = 'verbatim'",
                ";+",
                "; @param x this is not a tag in the verbatim dialect",
                ";-",
                "pro mg_verbatim, x",
                "end",
            ],
        );

        let file = session.file(id);
        assert_eq!(file.doc_format, "verbatim");
        let routine = &file.routines[0];
        // Verbatim keeps tag-looking lines as plain text and never warns.
        assert!(routine.docs.comments[0].contains("@param"));
        assert!(!routine.parameters[0].is_documented());
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn test_unknown_directive_dialect_falls_back() {
        let mut session = BuildSession::new(ProdocConfig::default());
        let id = parse(
            &mut session,
            "mg_odd.pro",
            &["; docformat = 'texinfo'", "pro mg_odd", "end"],
        );
        assert_eq!(session.file(id).doc_format, "tagged");
        assert_eq!(session.warnings().len(), 1);
        assert!(session.warnings()[0].contains("texinfo"));
    }

    #[test]
    fn test_unknown_directive_markup_falls_back() {
        let mut session = BuildSession::new(ProdocConfig::default());
        let id = parse(
            &mut session,
            "mg_fancy.pro",
            &["; docformat = 'tagged latex'", "pro mg_fancy", "end"],
        );
        assert_eq!(session.file(id).doc_format, "tagged");
        assert_eq!(session.file(id).markup, "verbatim");
        assert_eq!(session.warnings().len(), 1);
        assert!(session.warnings()[0].contains("latex"));
    }

    #[test]
    fn test_unknown_default_markup_is_fatal() {
        let mut config = ProdocConfig::default();
        config.markup = "latex".to_string();
        let mut session = BuildSession::new(config);
        let result = session.parse_source(
            "mg_any.pro",
            "lib",
            &lines(&["pro mg_any", "end"]),
            &NullOracle,
        );
        assert!(matches!(
            result,
            Err(ProdocError::UnknownStyle { kind: "markup", .. })
        ));
    }

    #[test]
    fn test_hidden_file_hides_routines() {
        let mut session = BuildSession::new(ProdocConfig::default());
        let id = parse(
            &mut session,
            "mg_internal.pro",
            &[
                ";+",
                "; @hidden_file",
                ";-",
                "",
                "pro mg_internal_helper",
                "end",
            ],
        );

        let file = session.file(id);
        assert!(file.is_hidden);
        assert!(file.routines[0].is_hidden);
        assert_eq!(session.visible_files().count(), 0);
    }

    #[test]
    fn test_private_visibility_depends_on_level() {
        let source = &[
            ";+",
            "; @private",
            ";-",
            "pro mg_secret",
            "end",
        ];

        let mut user = BuildSession::new(ProdocConfig::default());
        let id = parse(&mut user, "mg_secret.pro", source);
        assert_eq!(user.visible_routines(user.file(id)).count(), 0);

        let mut config = ProdocConfig::default();
        config.doc_level = DocLevel::Developer;
        let mut dev = BuildSession::new(config);
        let id = parse(&mut dev, "mg_secret.pro", source);
        assert_eq!(dev.visible_routines(dev.file(id)).count(), 1);
    }

    #[test]
    fn test_class_definition_file_registers_class() {
        let mut oracle = TableOracle::new();
        oracle.insert(
            "mgcolist",
            vec![],
            vec![(
                "count".to_string(),
                RuntimeValue::Scalar(Scalar::Long(0)),
            )],
        );

        let mut session = BuildSession::new(ProdocConfig::default());
        let id = session
            .parse_source(
                "mgcolist__define.pro",
                "collections",
                &lines(&["pro mgcolist__define", "end"]),
                &oracle,
            )
            .unwrap();

        let key = session.classes().find("mgcolist").unwrap();
        let entity = session.classes().get(key);
        assert_eq!(entity.file, Some(id));
        assert!(entity.fields.contains_key("count"));
    }

    #[test]
    fn test_accessor_keywords_become_properties() {
        let mut session = BuildSession::new(ProdocConfig::default());
        parse(
            &mut session,
            "mgcolist__define.pro",
            &[
                "function mgcolist::init, color=color",
                "  return, 1",
                "end",
                "",
                "pro mgcolist::getProperty, color=color, count=count",
                "end",
                "",
                "pro mgcolist__define",
                "end",
            ],
        );

        let key = session.classes().find("mgcolist").unwrap();
        let entity = session.classes().get(key);
        let color = &entity.properties["color"];
        assert!(color.is_init_only);
        assert!(color.is_gettable);
        assert!(!color.is_settable);
        assert!(entity.properties["count"].is_gettable);
    }

    #[test]
    fn test_registries_collect_attention_items() {
        let mut session = BuildSession::new(ProdocConfig::default());
        parse(
            &mut session,
            "mg_old.pro",
            &[
                ";+",
                "; Old routine.",
                "; @obsolete",
                "; @bugs fails on empty input",
                "; @todo rewrite with histograms",
                "; @requires 6.2",
                "; @categories utilities, Time Series",
                ";-",
                "pro mg_old",
                "end",
            ],
        );
        parse(
            &mut session,
            "mg_new.pro",
            &[
                ";+",
                "; New routine.",
                "; @requires 5.4",
                "; @categories Utilities",
                ";-",
                "pro mg_new",
                "end",
            ],
        );
        session.finish();

        assert_eq!(session.obsolete().len(), 1);
        assert_eq!(session.bugs().len(), 1);
        assert_eq!(session.todos().len(), 1);
        assert_eq!(session.required_version(), Some("6.2"));
        assert_eq!(session.required_by().len(), 1);
        assert_eq!(session.required_by()[0].routine, "mg_old");

        let utilities = &session.categories()["utilities"];
        assert_eq!(utilities.name, "utilities");
        assert_eq!(utilities.routines, vec!["mg_old", "mg_new"]);
        assert!(session.categories().contains_key("time series"));
    }

    #[test]
    fn test_summary_counts_completeness() {
        let mut session = BuildSession::new(ProdocConfig::default());
        parse(
            &mut session,
            "mg_mixed.pro",
            &[
                ";+",
                "; Documented, no args.",
                ";-",
                "pro mg_done",
                "end",
                "",
                ";+",
                "; Documented but arg is not.",
                ";-",
                "pro mg_half, x",
                "end",
                "",
                "pro mg_bare",
                "end",
            ],
        );
        session.finish();

        let summary = session.summary();
        assert_eq!(summary.files, 1);
        assert_eq!(summary.routines, 3);
        assert_eq!(summary.full, 1);
        assert_eq!(summary.partial, 1);
        assert_eq!(summary.undocumented, 1);
    }

    #[test]
    fn test_batch_file_flags() {
        let mut session = BuildSession::new(ProdocConfig::default());
        let id = parse(&mut session, "mg_setup.pro", &["@mg_constants", ""]);
        let file = session.file(id);
        assert!(file.is_batch_file);
        assert!(!file.has_main_level_code);
        assert_eq!(file.routines.len(), 0);
    }

    #[test]
    fn test_empty_file_parses_without_warnings() {
        let mut session = BuildSession::new(ProdocConfig::default());
        let id = parse(&mut session, "mg_empty.pro", &[]);
        let file = session.file(id);
        assert!(file.is_batch_file);
        assert_eq!(file.n_lines, 0);
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn test_index_lowercased_and_sorted() {
        let mut session = BuildSession::new(ProdocConfig::default());
        parse(&mut session, "a.pro", &["pro Zeta", "end", "pro alpha", "end"]);
        parse(&mut session, "b.pro", &["pro Beta", "end"]);
        session.finish();

        assert_eq!(routine_index(&session), vec!["alpha", "beta", "zeta"]);
        let all: Vec<&str> = session.index().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(all, vec!["a.pro", "alpha", "b.pro", "beta", "zeta"]);
    }

    #[test]
    fn test_index_covers_files_and_classes() {
        let mut session = BuildSession::new(ProdocConfig::default());
        parse(
            &mut session,
            "mgcolist__define.pro",
            &["pro MGcoList__define", "end"],
        );
        session.finish();

        assert!(session
            .index()
            .iter()
            .any(|e| e.kind == IndexKind::File && e.name == "mgcolist__define.pro"));
        assert!(session
            .index()
            .iter()
            .any(|e| e.kind == IndexKind::Class && e.name == "mgcolist"));
    }

    #[test]
    fn test_hidden_file_leaves_the_index() {
        let mut session = BuildSession::new(ProdocConfig::default());
        parse(
            &mut session,
            "mg_internal.pro",
            &[";+", "; @hidden_file", ";-", "", "pro mg_helper", "end"],
        );
        session.finish();

        assert!(session.index().is_empty());
    }

    #[test]
    fn test_index_drops_invisible_routines() {
        let mut session = BuildSession::new(ProdocConfig::default());
        parse(
            &mut session,
            "mg_mix.pro",
            &[
                ";+",
                "; @hidden",
                ";-",
                "pro mg_hidden",
                "end",
                "",
                "pro mg_shown",
                "end",
            ],
        );
        session.finish();

        assert_eq!(routine_index(&session), vec!["mg_shown"]);
        // The file itself is not hidden and stays indexed.
        assert!(session
            .index()
            .iter()
            .any(|e| e.kind == IndexKind::File && e.name == "mg_mix.pro"));
    }

    #[test]
    fn test_equal_required_versions_share_the_entry() {
        let mut session = BuildSession::new(ProdocConfig::default());
        parse(
            &mut session,
            "mg_a.pro",
            &[";+", "; @requires 6.2", ";-", "pro mg_a", "end"],
        );
        parse(
            &mut session,
            "mg_b.pro",
            &[";+", "; @requires 6.2", ";-", "pro mg_b", "end"],
        );
        assert_eq!(session.required_version(), Some("6.2"));
        assert_eq!(session.required_by().len(), 2);
    }

    #[test]
    fn test_version_comparison() {
        assert_eq!(compare_versions("6.2", "5.4"), Ordering::Greater);
        assert_eq!(compare_versions("5.4", "5.4.0"), Ordering::Equal);
        assert_eq!(compare_versions("5.10", "5.9"), Ordering::Greater);
        assert_eq!(compare_versions("5", "5.1"), Ordering::Less);
    }

    #[test]
    fn test_session_template_variables() {
        let mut session = BuildSession::new(ProdocConfig::default());
        parse(&mut session, "mg_one.pro", &["pro mg_one", "end"]);
        session.finish();

        assert_eq!(session.variable("title"), Some(json!("Documentation")));
        assert_eq!(session.variable("n_files"), Some(json!(1)));
        assert_eq!(session.variable("n_routines"), Some(json!(1)));
        assert_eq!(session.variable("no_such_key"), None);
    }
}
