//! Logical-statement tokenizer over raw source lines.
//!
//! A logical statement is one physical line, or several joined through the
//! trailing `$` continuation marker. Comment detection is quote-aware: a
//! `;` inside a `'…'` or `"…"` literal never starts a comment. String
//! literals have no escape character and run to the matching close quote or
//! the end of the line; an unterminated literal swallows the rest of the
//! line as text rather than raising an error.
//!
//! A continuation is only joined when the following line carries code; a
//! comment-only or blank follow-up line leaves the `$` marker in the yielded
//! statement so the classifier can keep feeding the declaration parser line
//! by line.

/// Split a line into its code part and trailing comment, honoring string
/// literals. The comment, when present, includes the leading `;`.
pub fn split_comment(line: &str) -> (&str, Option<&str>) {
    let mut quote: Option<char> = None;
    for (index, ch) in line.char_indices() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                ';' => return (&line[..index], Some(&line[index..])),
                _ => {}
            },
        }
    }
    (line, None)
}

/// True when the code part of a line ends in the `$` continuation marker as
/// a standalone token.
pub fn ends_with_continuation(code: &str) -> bool {
    let trimmed = code.trim_end();
    if !trimmed.ends_with('$') {
        return false;
    }
    match trimmed[..trimmed.len() - 1].chars().next_back() {
        None => true,
        Some(prev) => prev.is_whitespace() || prev == ',',
    }
}

/// True for a line whose trimmed content is empty or starts with `;`.
pub fn is_comment_only(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with(';')
}

/// Iterator yielding logical statements from a file's raw lines.
pub struct LineTokenizer<'a> {
    lines: &'a [String],
    cursor: usize,
}

impl<'a> LineTokenizer<'a> {
    /// Create a tokenizer over the given raw lines.
    pub fn new(lines: &'a [String]) -> Self {
        Self { lines, cursor: 0 }
    }

    /// Whether more statements remain. A file with zero lines reports
    /// exhaustion immediately; the caller treats that as an empty (batch)
    /// file.
    pub fn has_next(&self) -> bool {
        self.cursor < self.lines.len()
    }

    /// Number of raw lines consumed so far. The driver uses deltas between
    /// positions to attribute line spans to routines.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Yield the next logical statement, joining continuation lines.
    pub fn next(&mut self) -> Option<String> {
        if !self.has_next() {
            return None;
        }

        let first = &self.lines[self.cursor];
        self.cursor += 1;

        // Comment-only lines pass through untouched; a `$` inside a comment
        // is not a continuation.
        if is_comment_only(first) {
            return Some(first.clone());
        }

        let (code, _comment) = split_comment(first);
        if !ends_with_continuation(code) {
            return Some(first.clone());
        }

        let mut statement = strip_continuation(code).to_string();
        loop {
            let next_line = match self.lines.get(self.cursor) {
                Some(line) => line,
                // Continuation at end of file: keep the marker for the
                // classifier.
                None => return Some(format!("{statement} $")),
            };
            if is_comment_only(next_line) {
                // Let the classifier consume the interleaved comment lines
                // and the rest of the declaration one statement at a time.
                return Some(format!("{statement} $"));
            }

            self.cursor += 1;
            let (code, _comment) = split_comment(next_line);
            if ends_with_continuation(code) {
                statement.push(' ');
                statement.push_str(strip_continuation(code).trim());
            } else {
                statement.push(' ');
                statement.push_str(code.trim());
                return Some(statement);
            }
        }
    }
}

fn strip_continuation(code: &str) -> &str {
    let trimmed = code.trim_end();
    trimmed[..trimmed.len() - 1].trim_end()
}
