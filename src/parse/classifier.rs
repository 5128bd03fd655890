//! Comment/code classifier.
//!
//! A single-pass state machine that walks tokenized statements and splits a
//! file into file-header documentation, per-routine documentation, and
//! routine declarations. There is no grammar for the source language; the
//! only reliable signal for "inside a routine body" is block depth counted
//! via keyword pairs (`begin`/`case`/`switch` against the `end*` family).
//!
//! A documentation block's effect is only knowable once the *following*
//! statement is classified: a block closed at top level becomes file
//! documentation when followed by a blank statement, and routine
//! documentation when followed by a declaration. The `just_closed_header`
//! countdown carries that one-statement lookahead.

use tracing::debug;

use crate::parse::header::{self, Declaration, DeclaredArg};
use crate::parse::tokenizer::split_comment;

/// Documentation-block state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentState {
    /// Walking code or plain comments.
    OutsideComment,
    /// Between a `;+` opener and its `;-` closer.
    InsideDocBlock,
}

/// Classification output, consumed by the parse driver.
#[derive(Debug, PartialEq)]
pub enum ClassifierEvent {
    /// A comment block resolved to file-level documentation.
    FileComments(Vec<String>),
    /// A routine declaration's opening line was recognized.
    BeginRoutine(Declaration),
    /// Additional arguments from a declaration continuation line.
    ContinueRoutine(Vec<DeclaredArg>),
    /// A comment block resolved to documentation for the current routine
    /// (header or interior; both append).
    RoutineComments(Vec<String>),
}

/// End-of-file classification flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileOutcome {
    /// Top-level executable statements were found (block depth went
    /// negative).
    pub has_main_level_code: bool,
    /// No routines and no main-level code: a pass-through batch file.
    pub is_batch_file: bool,
}

/// Keywords that close a code block when they lead a statement.
const BLOCK_END_KEYWORDS: &[&str] = &[
    "end", "endif", "endelse", "endfor", "endwhile", "endrep", "endcase", "endswitch",
];

/// Keywords that open an implicit block when they lead a statement.
const IMPLICIT_BLOCK_KEYWORDS: &[&str] = &["case", "switch"];

/// The classifier state machine. Feed statements with [`push`](Self::push),
/// then call [`finish`](Self::finish).
#[derive(Debug)]
pub struct Classifier {
    state: CommentState,
    code_level: i32,
    just_closed_header: u8,
    header_continuation: bool,
    doc_buffer: Vec<String>,
    routines_seen: usize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    /// Create a classifier at the start of a file.
    pub fn new() -> Self {
        Self {
            state: CommentState::OutsideComment,
            code_level: 0,
            just_closed_header: 0,
            header_continuation: false,
            doc_buffer: Vec::new(),
            routines_seen: 0,
        }
    }

    /// Current code-block nesting depth.
    pub fn code_level(&self) -> i32 {
        self.code_level
    }

    /// Current comment state.
    pub fn state(&self) -> CommentState {
        self.state
    }

    /// Classify one tokenized statement, returning any events it produced.
    pub fn push(&mut self, statement: &str) -> Vec<ClassifierEvent> {
        let mut events = Vec::new();
        let trimmed = statement.trim_start();

        // Comment lines never advance the lookahead countdown.
        if self.state == CommentState::InsideDocBlock {
            if trimmed.starts_with(";-") {
                self.state = CommentState::OutsideComment;
                self.just_closed_header = 2;
                return events;
            }
            if trimmed.starts_with(';') {
                self.doc_buffer.push(strip_comment_marker(trimmed));
                return events;
            }
        } else if trimmed.starts_with(";+")
            && (self.code_level == 0 || (self.code_level == 1 && self.just_closed_header == 1))
        {
            self.state = CommentState::InsideDocBlock;
            return events;
        }
        if trimmed.starts_with(';') {
            // Plain comment line outside any documentation block.
            return events;
        }

        let (code, _comment) = split_comment(statement);
        let tokens: Vec<String> = code
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect();

        if tokens.is_empty() {
            // A blank statement right after a top-level block close turns
            // the buffered block into file documentation.
            if self.just_closed_header == 2 && self.code_level == 0 && !self.doc_buffer.is_empty()
            {
                events.push(ClassifierEvent::FileComments(std::mem::take(
                    &mut self.doc_buffer,
                )));
            }
            self.tick();
            return events;
        }

        let first = tokens.first().map(String::as_str).unwrap_or("");
        let last = tokens.last().map(String::as_str).unwrap_or("");

        if last == "begin" || IMPLICIT_BLOCK_KEYWORDS.contains(&first) {
            self.code_level += 1;
        }
        if BLOCK_END_KEYWORDS.contains(&first) {
            self.code_level -= 1;
        }

        if self.header_continuation {
            let (args, continues) = header::parse_continuation_line(statement);
            events.push(ClassifierEvent::ContinueRoutine(args));
            self.header_continuation = continues;
            if !continues {
                if !self.doc_buffer.is_empty() {
                    events.push(ClassifierEvent::RoutineComments(std::mem::take(
                        &mut self.doc_buffer,
                    )));
                }
                self.just_closed_header = 2;
            }
            self.tick();
            return events;
        }

        if first == "pro" || first == "function" {
            self.code_level += 1;
            self.state = CommentState::OutsideComment;
            if let Some(declaration) = header::parse_first_line(statement) {
                debug!(routine = %declaration.name, "declaration");
                self.routines_seen += 1;
                self.header_continuation = declaration.continues;
                let continues = declaration.continues;
                events.push(ClassifierEvent::BeginRoutine(declaration));
                if !continues && !self.doc_buffer.is_empty() {
                    events.push(ClassifierEvent::RoutineComments(std::mem::take(
                        &mut self.doc_buffer,
                    )));
                }
                self.just_closed_header = 2;
            }
            self.tick();
            return events;
        }

        // Interior documentation: a block just closed inside a routine body
        // attaches to the current routine, appending like a header block.
        if self.code_level == 1
            && self.just_closed_header == 2
            && self.routines_seen > 0
            && !self.doc_buffer.is_empty()
        {
            events.push(ClassifierEvent::RoutineComments(std::mem::take(
                &mut self.doc_buffer,
            )));
        }

        self.tick();
        events
    }

    /// Finish the file: flush a trailing top-level block and compute the
    /// file flags.
    pub fn finish(mut self) -> (Vec<ClassifierEvent>, FileOutcome) {
        let mut events = Vec::new();
        if self.just_closed_header == 2 && self.code_level == 0 && !self.doc_buffer.is_empty() {
            events.push(ClassifierEvent::FileComments(std::mem::take(
                &mut self.doc_buffer,
            )));
        }

        let has_main_level_code = self.code_level < 0;
        let outcome = FileOutcome {
            has_main_level_code,
            is_batch_file: self.routines_seen == 0 && !has_main_level_code,
        };
        (events, outcome)
    }

    fn tick(&mut self) {
        self.just_closed_header = self.just_closed_header.saturating_sub(1);
    }
}

/// Strip the comment marker plus one character from a doc-block line.
fn strip_comment_marker(trimmed: &str) -> String {
    let mut chars = trimmed.char_indices();
    chars.next();
    match chars.next() {
        Some((_, _)) => match chars.next() {
            Some((index, _)) => trimmed[index..].to_string(),
            None => String::new(),
        },
        None => String::new(),
    }
}
