//! Tag-style documentation dialect.
//!
//! Tag lines start with `@` at the beginning of a trimmed comment line and
//! introduce a named section; following untagged lines continue that
//! section. Argument tags take a name plus optional keyword-style `{attr}`
//! attributes:
//!
//! ```text
//! ;+
//! ; Computes the running mean of a time series.
//! ;
//! ; @param data {in}{required} input time series
//! ; @keyword width {in}{optional} window width, defaults to 5
//! ; @returns fltarr of the same length as data
//! ; @categories statistics
//! ;-
//! ```
//!
//! Malformed or unrecognized tag lines degrade to plain description text
//! with a warning; they never abort parsing.

use crate::core::model::{Routine, SourceFile};
use crate::dialect::registry::{DialectParser, Overview};

/// The tag-style dialect.
pub struct TaggedDialect;

/// Where continuation lines currently attach.
enum Target {
    Description,
    Returns,
    Examples,
    Author,
    Copyright,
    History,
    Bugs,
    Todo,
    Pre,
    Post,
    Restrictions,
    Uses,
    Version,
    Requires,
    CustomerId,
    Categories,
    Argument { name: String, is_keyword: bool },
}

impl DialectParser for TaggedDialect {
    fn name(&self) -> &'static str {
        "tagged"
    }

    fn parse_file_comments(
        &self,
        lines: &[String],
        file: &mut SourceFile,
        warnings: &mut Vec<String>,
    ) {
        let mut target = Target::Description;
        for line in lines {
            let trimmed = line.trim();
            if let Some(tag_line) = trimmed.strip_prefix('@') {
                let (tag, rest) = split_tag(tag_line);
                match tag.to_lowercase().as_str() {
                    "author" => {
                        push_nonblank(&mut file.docs.author, rest.trim());
                        target = Target::Author;
                    }
                    "copyright" => {
                        push_nonblank(&mut file.docs.copyright, rest.trim());
                        target = Target::Copyright;
                    }
                    "history" => {
                        push_nonblank(&mut file.docs.history, rest.trim());
                        target = Target::History;
                    }
                    "version" => {
                        file.docs.version = Some(rest.trim().to_string());
                        target = Target::Version;
                    }
                    "hidden" | "hidden_file" => {
                        file.is_hidden = true;
                        target = Target::Description;
                    }
                    "private" | "private_file" => {
                        file.is_private = true;
                        target = Target::Description;
                    }
                    other => {
                        warnings.push(format!(
                            "unknown tag '@{other}' in file comments for {}",
                            file.basename
                        ));
                        file.docs.comments.push(line.clone());
                        target = Target::Description;
                    }
                }
            } else {
                match &target {
                    Target::Description => file.docs.comments.push(line.clone()),
                    Target::Author => push_nonblank(&mut file.docs.author, trimmed),
                    Target::Copyright => push_nonblank(&mut file.docs.copyright, trimmed),
                    Target::History => push_nonblank(&mut file.docs.history, trimmed),
                    Target::Version => append_value(&mut file.docs.version, trimmed),
                    _ => file.docs.comments.push(line.clone()),
                }
            }
        }
    }

    fn parse_routine_comments(
        &self,
        lines: &[String],
        routine: &mut Routine,
        warnings: &mut Vec<String>,
    ) {
        let mut target = Target::Description;
        // `returns` and `examples` overwrite on each block, unlike the
        // appending tags; accumulate locally, then store.
        let mut returns: Option<String> = None;
        let mut examples: Option<String> = None;

        for line in lines {
            let trimmed = line.trim();
            if let Some(tag_line) = trimmed.strip_prefix('@') {
                let (tag, rest) = split_tag(tag_line);
                match tag.to_lowercase().as_str() {
                    "param" => target = argument_tag(routine, rest, false, warnings),
                    "keyword" => target = argument_tag(routine, rest, true, warnings),
                    "returns" => {
                        returns = Some(rest.trim().to_string());
                        target = Target::Returns;
                    }
                    "examples" => {
                        examples = Some(rest.trim().to_string());
                        target = Target::Examples;
                    }
                    "author" => {
                        push_nonblank(&mut routine.docs.author, rest.trim());
                        target = Target::Author;
                    }
                    "copyright" => {
                        push_nonblank(&mut routine.docs.copyright, rest.trim());
                        target = Target::Copyright;
                    }
                    "history" => {
                        push_nonblank(&mut routine.docs.history, rest.trim());
                        target = Target::History;
                    }
                    "bugs" => {
                        push_nonblank(&mut routine.docs.bugs, rest.trim());
                        target = Target::Bugs;
                    }
                    "todo" => {
                        push_nonblank(&mut routine.docs.todo, rest.trim());
                        target = Target::Todo;
                    }
                    "pre" => {
                        push_nonblank(&mut routine.docs.pre, rest.trim());
                        target = Target::Pre;
                    }
                    "post" => {
                        push_nonblank(&mut routine.docs.post, rest.trim());
                        target = Target::Post;
                    }
                    "restrictions" => {
                        push_nonblank(&mut routine.docs.restrictions, rest.trim());
                        target = Target::Restrictions;
                    }
                    "uses" => {
                        push_nonblank(&mut routine.docs.uses, rest.trim());
                        target = Target::Uses;
                    }
                    "version" => {
                        routine.docs.version = Some(rest.trim().to_string());
                        target = Target::Version;
                    }
                    "requires" => {
                        routine.docs.requires = Some(rest.trim().to_string());
                        target = Target::Requires;
                    }
                    "customer_id" => {
                        routine.docs.customer_id = Some(rest.trim().to_string());
                        target = Target::CustomerId;
                    }
                    "categories" => {
                        add_categories(routine, rest);
                        target = Target::Categories;
                    }
                    "hidden" => {
                        routine.is_hidden = true;
                        target = Target::Description;
                    }
                    "private" => {
                        routine.is_private = true;
                        target = Target::Description;
                    }
                    "obsolete" => {
                        routine.is_obsolete = true;
                        target = Target::Description;
                    }
                    "abstract" => {
                        routine.is_abstract = true;
                        target = Target::Description;
                    }
                    other => {
                        warnings.push(format!(
                            "unknown tag '@{other}' in comments for {}",
                            routine.name
                        ));
                        routine.docs.comments.push(line.clone());
                        target = Target::Description;
                    }
                }
            } else {
                match &target {
                    Target::Description => routine.docs.comments.push(line.clone()),
                    Target::Returns => append_value(&mut returns, trimmed),
                    Target::Examples => append_value(&mut examples, trimmed),
                    Target::Author => push_nonblank(&mut routine.docs.author, trimmed),
                    Target::Copyright => push_nonblank(&mut routine.docs.copyright, trimmed),
                    Target::History => push_nonblank(&mut routine.docs.history, trimmed),
                    Target::Bugs => push_nonblank(&mut routine.docs.bugs, trimmed),
                    Target::Todo => push_nonblank(&mut routine.docs.todo, trimmed),
                    Target::Pre => push_nonblank(&mut routine.docs.pre, trimmed),
                    Target::Post => push_nonblank(&mut routine.docs.post, trimmed),
                    Target::Restrictions => {
                        push_nonblank(&mut routine.docs.restrictions, trimmed)
                    }
                    Target::Uses => push_nonblank(&mut routine.docs.uses, trimmed),
                    Target::Version => append_value(&mut routine.docs.version, trimmed),
                    Target::Requires => append_value(&mut routine.docs.requires, trimmed),
                    Target::CustomerId => {
                        append_value(&mut routine.docs.customer_id, trimmed)
                    }
                    Target::Categories => add_categories(routine, trimmed),
                    Target::Argument { name, is_keyword } => {
                        attach_argument_line(routine, name, *is_keyword, trimmed);
                    }
                }
            }
        }

        if let Some(text) = returns {
            routine.docs.returns = Some(text);
        }
        if let Some(text) = examples {
            routine.docs.examples = Some(text);
        }
    }

    fn parse_overview_comments(&self, lines: &[String], _warnings: &mut Vec<String>) -> Overview {
        Overview {
            comments: lines.to_vec(),
        }
    }
}

/// Split a tag line (with the leading `@` already removed) into the tag
/// word and the rest of the line.
fn split_tag(tag_line: &str) -> (&str, &str) {
    match tag_line.find(char::is_whitespace) {
        Some(cut) => (&tag_line[..cut], &tag_line[cut + 1..]),
        None => (tag_line, ""),
    }
}

/// Parse `@param`/`@keyword` arguments: a name, optional `{attr}` groups,
/// then documentation text.
fn argument_tag(
    routine: &mut Routine,
    rest: &str,
    is_keyword: bool,
    warnings: &mut Vec<String>,
) -> Target {
    let rest = rest.trim_start();
    let cut = rest
        .find(|c: char| c.is_whitespace() || c == '{')
        .unwrap_or(rest.len());
    let name = &rest[..cut];
    if name.is_empty() {
        warnings.push(format!(
            "argument tag without a name in comments for {}",
            routine.name
        ));
        return Target::Description;
    }

    let (attributes, text) = take_attributes(rest[cut..].trim_start());

    let list = if is_keyword {
        &mut routine.keywords
    } else {
        &mut routine.parameters
    };
    let lower = name.to_lowercase();
    match list.iter_mut().find(|a| a.name.to_lowercase() == lower) {
        Some(argument) => {
            argument.attributes.extend(attributes);
            let text = text.trim();
            if !text.is_empty() {
                argument.comments.push(text.to_string());
            }
            Target::Argument {
                name: lower,
                is_keyword,
            }
        }
        None => {
            let kind = if is_keyword { "keyword" } else { "parameter" };
            warnings.push(format!(
                "documented {kind} '{name}' not declared by {}",
                routine.name
            ));
            Target::Description
        }
    }
}

/// Consume leading `{attr}` groups, returning (attributes, remaining text).
/// An unclosed brace ends attribute parsing and the remainder is text.
fn take_attributes(mut rest: &str) -> (Vec<String>, &str) {
    let mut attributes = Vec::new();
    while let Some(body) = rest.strip_prefix('{') {
        match body.find('}') {
            Some(close) => {
                let attr = body[..close].trim();
                if !attr.is_empty() {
                    attributes.push(attr.to_string());
                }
                rest = body[close + 1..].trim_start();
            }
            None => break,
        }
    }
    (attributes, rest)
}

fn attach_argument_line(routine: &mut Routine, name: &str, is_keyword: bool, text: &str) {
    if text.is_empty() {
        return;
    }
    let list = if is_keyword {
        &mut routine.keywords
    } else {
        &mut routine.parameters
    };
    if let Some(argument) = list.iter_mut().find(|a| a.name.to_lowercase() == name) {
        argument.comments.push(text.to_string());
    }
}

fn add_categories(routine: &mut Routine, text: &str) {
    for name in text.split(',') {
        routine.add_category(name);
    }
}

fn push_nonblank(list: &mut Vec<String>, text: &str) {
    if !text.is_empty() {
        list.push(text.to_string());
    }
}

fn append_value(value: &mut Option<String>, text: &str) {
    if text.is_empty() {
        return;
    }
    match value {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(text);
        }
        None => *value = Some(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Argument, FileId};

    fn block(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    fn routine_with(parameters: &[&str], keywords: &[&str]) -> Routine {
        let mut routine = Routine::new("mg_smooth", FileId(0));
        for name in parameters {
            routine.parameters.push(Argument::new(*name, false));
        }
        for name in keywords {
            routine.keywords.push(Argument::new(*name, true));
        }
        routine
    }

    #[test]
    fn test_description_and_param_docs() {
        let mut routine = routine_with(&["data"], &["width"]);
        let mut warnings = Vec::new();
        TaggedDialect.parse_routine_comments(
            &block(&[
                "Computes the running mean of a time series.",
                "",
                "@param data {in}{required} input time series",
                "  sampled at regular intervals",
                "@keyword width {in}{optional} window width",
            ]),
            &mut routine,
            &mut warnings,
        );

        assert!(warnings.is_empty());
        assert_eq!(
            routine.docs.comments[0],
            "Computes the running mean of a time series."
        );
        assert_eq!(
            routine.parameters[0].comments,
            vec![
                "input time series".to_string(),
                "sampled at regular intervals".to_string()
            ]
        );
        assert_eq!(routine.parameters[0].attributes, vec!["in", "required"]);
        assert_eq!(routine.keywords[0].comments, vec!["window width"]);
        assert_eq!(routine.keywords[0].attributes, vec!["in", "optional"]);
    }

    #[test]
    fn test_returns_overwrites_across_blocks() {
        let mut routine = routine_with(&[], &[]);
        let mut warnings = Vec::new();
        TaggedDialect.parse_routine_comments(
            &block(&["@returns first value"]),
            &mut routine,
            &mut warnings,
        );
        TaggedDialect.parse_routine_comments(
            &block(&["@returns second value"]),
            &mut routine,
            &mut warnings,
        );
        assert_eq!(routine.docs.returns, Some("second value".to_string()));
    }

    #[test]
    fn test_appending_tags_accumulate_across_blocks() {
        let mut routine = routine_with(&[], &[]);
        let mut warnings = Vec::new();
        TaggedDialect.parse_routine_comments(
            &block(&["@history added 2002"]),
            &mut routine,
            &mut warnings,
        );
        TaggedDialect.parse_routine_comments(
            &block(&["@history rewritten 2004"]),
            &mut routine,
            &mut warnings,
        );
        assert_eq!(
            routine.docs.history,
            vec!["added 2002".to_string(), "rewritten 2004".to_string()]
        );
    }

    #[test]
    fn test_flag_tags() {
        let mut routine = routine_with(&[], &[]);
        let mut warnings = Vec::new();
        TaggedDialect.parse_routine_comments(
            &block(&["@private", "@obsolete", "@abstract"]),
            &mut routine,
            &mut warnings,
        );
        assert!(routine.is_private);
        assert!(routine.is_obsolete);
        assert!(routine.is_abstract);
        assert!(!routine.is_hidden);
    }

    #[test]
    fn test_unknown_tag_degrades_to_description() {
        let mut routine = routine_with(&[], &[]);
        let mut warnings = Vec::new();
        TaggedDialect.parse_routine_comments(
            &block(&["@nosuchtag some text"]),
            &mut routine,
            &mut warnings,
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(routine.docs.comments, vec!["@nosuchtag some text"]);
    }

    #[test]
    fn test_undeclared_param_warns() {
        let mut routine = routine_with(&["data"], &[]);
        let mut warnings = Vec::new();
        TaggedDialect.parse_routine_comments(
            &block(&["@param missing not declared"]),
            &mut routine,
            &mut warnings,
        );
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("missing"));
    }

    #[test]
    fn test_categories_split_and_dedupe() {
        let mut routine = routine_with(&[], &[]);
        let mut warnings = Vec::new();
        TaggedDialect.parse_routine_comments(
            &block(&["@categories statistics, time series", "  Statistics"]),
            &mut routine,
            &mut warnings,
        );
        assert_eq!(
            routine.docs.categories,
            vec!["statistics".to_string(), "time series".to_string()]
        );
    }

    #[test]
    fn test_requires_and_version() {
        let mut routine = routine_with(&[], &[]);
        let mut warnings = Vec::new();
        TaggedDialect.parse_routine_comments(
            &block(&["@requires 6.1", "@version 1.2"]),
            &mut routine,
            &mut warnings,
        );
        assert_eq!(routine.docs.requires, Some("6.1".to_string()));
        assert_eq!(routine.docs.version, Some("1.2".to_string()));
    }

    #[test]
    fn test_file_comments() {
        let mut file = SourceFile::new("mg_smooth.pro", "analysis");
        let mut warnings = Vec::new();
        TaggedDialect.parse_file_comments(
            &block(&[
                "Smoothing utilities.",
                "@author M. Galloway",
                "@hidden",
            ]),
            &mut file,
            &mut warnings,
        );
        assert_eq!(file.docs.comments, vec!["Smoothing utilities."]);
        assert_eq!(file.docs.author, vec!["M. Galloway"]);
        assert!(file.is_hidden);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unclosed_attribute_brace_is_text() {
        let mut routine = routine_with(&["data"], &[]);
        let mut warnings = Vec::new();
        TaggedDialect.parse_routine_comments(
            &block(&["@param data {in some doc"]),
            &mut routine,
            &mut warnings,
        );
        assert!(routine.parameters[0].attributes.is_empty());
        assert_eq!(routine.parameters[0].comments, vec!["{in some doc"]);
    }
}
