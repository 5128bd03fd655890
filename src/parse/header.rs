//! Routine declaration parser.
//!
//! A declaration is the `pro`/`function` statement naming a routine and
//! listing its positional parameters and keyword arguments, possibly spread
//! over continuation lines. Tokens are comma-separated; a token containing
//! `=` is a keyword argument, anything else non-empty (other than the `$`
//! continuation marker) is a positional parameter. Order within each list
//! is preserved as encountered, including across continuation lines.

use crate::parse::tokenizer::{ends_with_continuation, split_comment};

/// One declared argument, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredArg {
    /// Argument name (for keywords, the text before `=`).
    pub name: String,
    /// True for keyword arguments.
    pub is_keyword: bool,
}

/// Parsed form of a declaration's opening line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Routine name.
    pub name: String,
    /// True for `function` declarations.
    pub is_function: bool,
    /// True when the name contains the `::` method separator.
    pub is_method: bool,
    /// Arguments found on this line, in order.
    pub arguments: Vec<DeclaredArg>,
    /// True when the line ends in the continuation marker and the parameter
    /// list continues on following lines.
    pub continues: bool,
}

/// Parse the opening line of a declaration. Returns `None` when no routine
/// name follows the introducing keyword.
pub fn parse_first_line(statement: &str) -> Option<Declaration> {
    let (code, _comment) = split_comment(statement);
    let continues = ends_with_continuation(code);

    let mut tokens = code.split(',');
    let head = tokens.next()?;

    // The head token is "<pro|function> <name>".
    let mut head_parts = head.split_whitespace();
    let introducer = head_parts.next()?;
    let name = head_parts.next()?.to_string();

    let mut declaration = Declaration {
        is_function: introducer.eq_ignore_ascii_case("function"),
        is_method: name.contains("::"),
        name,
        arguments: Vec::new(),
        continues,
    };
    classify_tokens(tokens, &mut declaration.arguments);
    Some(declaration)
}

/// Parse a continuation line of a declaration (no introducing keyword, no
/// routine name). Returns the arguments found and whether the declaration
/// continues further.
pub fn parse_continuation_line(statement: &str) -> (Vec<DeclaredArg>, bool) {
    let (code, _comment) = split_comment(statement);
    let continues = ends_with_continuation(code);

    let mut arguments = Vec::new();
    classify_tokens(code.split(','), &mut arguments);
    (arguments, continues)
}

fn classify_tokens<'a>(tokens: impl Iterator<Item = &'a str>, out: &mut Vec<DeclaredArg>) {
    for token in tokens {
        let token = token.trim();
        if token.is_empty() || token == "$" {
            continue;
        }
        if let Some(eq) = token.find('=') {
            let name = token[..eq].trim();
            if !name.is_empty() {
                out.push(DeclaredArg {
                    name: name.to_string(),
                    is_keyword: true,
                });
            }
        } else {
            // Drop a trailing continuation marker glued to the token list.
            let name = token.trim_end_matches('$').trim();
            if !name.is_empty() {
                out.push(DeclaredArg {
                    name: name.to_string(),
                    is_keyword: false,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedure_with_parameters() {
        let decl = parse_first_line("pro mg_plot, x, y").unwrap();
        assert_eq!(decl.name, "mg_plot");
        assert!(!decl.is_function);
        assert!(!decl.is_method);
        assert!(!decl.continues);
        assert_eq!(
            decl.arguments,
            vec![
                DeclaredArg {
                    name: "x".to_string(),
                    is_keyword: false
                },
                DeclaredArg {
                    name: "y".to_string(),
                    is_keyword: false
                },
            ]
        );
    }

    #[test]
    fn test_function_with_keywords() {
        let decl = parse_first_line("function mg_dist, n, center=center, double=dbl").unwrap();
        assert_eq!(decl.name, "mg_dist");
        assert!(decl.is_function);
        let keywords: Vec<&str> = decl
            .arguments
            .iter()
            .filter(|a| a.is_keyword)
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(keywords, vec!["center", "double"]);
    }

    #[test]
    fn test_method_detection() {
        let decl = parse_first_line("function MGcoList::get, position").unwrap();
        assert!(decl.is_method);
        assert_eq!(decl.name, "MGcoList::get");
    }

    #[test]
    fn test_continuation_spanning_three_lines() {
        // 2 positional on line 1, 1 keyword on line 2, 1 positional on line
        // 3: parameter order must be preserved across lines.
        let decl = parse_first_line("pro mg_contour, x, y, $").unwrap();
        assert!(decl.continues);

        let mut parameters: Vec<String> = decl
            .arguments
            .iter()
            .filter(|a| !a.is_keyword)
            .map(|a| a.name.clone())
            .collect();
        let mut keywords: Vec<String> = decl
            .arguments
            .iter()
            .filter(|a| a.is_keyword)
            .map(|a| a.name.clone())
            .collect();

        let (args, continues) = parse_continuation_line("    levels=levels, $");
        assert!(continues);
        for arg in args {
            if arg.is_keyword {
                keywords.push(arg.name);
            } else {
                parameters.push(arg.name);
            }
        }

        let (args, continues) = parse_continuation_line("    z");
        assert!(!continues);
        for arg in args {
            if arg.is_keyword {
                keywords.push(arg.name);
            } else {
                parameters.push(arg.name);
            }
        }

        assert_eq!(parameters, vec!["x", "y", "z"]);
        assert_eq!(keywords, vec!["levels"]);
    }

    #[test]
    fn test_declarations_compare_by_value() {
        let expected = Declaration {
            name: "mg_plot".to_string(),
            is_function: false,
            is_method: false,
            arguments: vec![DeclaredArg {
                name: "x".to_string(),
                is_keyword: false,
            }],
            continues: false,
        };
        assert_eq!(parse_first_line("pro mg_plot, x"), Some(expected.clone()));
        assert_ne!(parse_first_line("pro mg_plot, y"), Some(expected));
    }

    #[test]
    fn test_no_name_yields_none() {
        assert!(parse_first_line("pro").is_none());
        assert!(parse_first_line("").is_none());
    }

    #[test]
    fn test_trailing_comment_is_ignored() {
        let decl = parse_first_line("pro mg_plot, x ; plot a thing").unwrap();
        assert_eq!(decl.arguments.len(), 1);
        assert_eq!(decl.arguments[0].name, "x");
    }
}
