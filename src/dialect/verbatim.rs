//! Verbatim documentation dialect.
//!
//! No tag grammar: the whole comment block is attached unparsed as
//! description text. This dialect never warns.

use crate::core::model::{Routine, SourceFile};
use crate::dialect::registry::{DialectParser, Overview};

/// The verbatim dialect.
pub struct VerbatimDialect;

impl DialectParser for VerbatimDialect {
    fn name(&self) -> &'static str {
        "verbatim"
    }

    fn parse_file_comments(
        &self,
        lines: &[String],
        file: &mut SourceFile,
        _warnings: &mut Vec<String>,
    ) {
        file.docs.comments.extend(lines.iter().cloned());
    }

    fn parse_routine_comments(
        &self,
        lines: &[String],
        routine: &mut Routine,
        _warnings: &mut Vec<String>,
    ) {
        routine.append_comments(lines);
    }

    fn parse_overview_comments(&self, lines: &[String], _warnings: &mut Vec<String>) -> Overview {
        Overview {
            comments: lines.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::FileId;

    #[test]
    fn test_tags_are_plain_text() {
        let mut routine = Routine::new("mg_plot", FileId(0));
        let mut warnings = Vec::new();
        let lines = vec![
            "Plots a thing.".to_string(),
            "@param x not a tag here".to_string(),
        ];
        VerbatimDialect.parse_routine_comments(&lines, &mut routine, &mut warnings);

        assert!(warnings.is_empty());
        assert_eq!(routine.docs.comments, lines);
        assert!(routine.docs.returns.is_none());
    }

    #[test]
    fn test_blocks_append() {
        let mut routine = Routine::new("mg_plot", FileId(0));
        let mut warnings = Vec::new();
        VerbatimDialect.parse_routine_comments(
            &["first".to_string()],
            &mut routine,
            &mut warnings,
        );
        VerbatimDialect.parse_routine_comments(
            &["second".to_string()],
            &mut routine,
            &mut warnings,
        );
        assert_eq!(routine.docs.comments, vec!["first", "second"]);
    }
}
