//! Reader for `.c` case files: several small programs in one file, each
//! introduced by a `// CASE <name>` line and followed by its metadata.
//!
//! ```c
//! // CASE missing semicolon
//! // expects MissingSemicolon 1:10
//! int x = 5
//! int y;
//! ```
//!
//! `// accepts` marks a case that must produce no diagnostics at all.
//! Positions are relative to the first source line of the case.

use crate::diagnostics::Category;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaseFileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("case '{case}': invalid metadata line '{line}'")]
    Metadata { case: String, line: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedDiagnostic {
    pub category: Category,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug)]
pub struct TestCase {
    pub name: String,
    pub source: String,
    pub expected: Vec<ExpectedDiagnostic>,
}

pub fn parse_test_file(path: impl AsRef<Path>) -> Result<Vec<TestCase>, CaseFileError> {
    let contents = fs::read_to_string(path)?;
    parse_test_cases(&contents)
}

pub fn parse_test_cases(contents: &str) -> Result<Vec<TestCase>, CaseFileError> {
    let mut result = vec![];
    for test_string in contents.split("// CASE ").skip(1) {
        let mut lines = test_string.lines().peekable();
        let mut test_case = TestCase {
            name: lines.next().unwrap_or_default().trim().to_string(),
            source: String::new(),
            expected: vec![],
        };

        while let Some(&line) = lines.peek() {
            let words = line.split_ascii_whitespace().collect::<Vec<_>>();
            if words.is_empty() {
                lines.next();
                continue;
            }
            if words[0] != "//" {
                break;
            }
            match &words[1..] {
                ["accepts"] => {}
                ["expects", category, position] => {
                    let expected = parse_expectation(category, position).ok_or_else(|| {
                        CaseFileError::Metadata {
                            case: test_case.name.clone(),
                            line: line.to_string(),
                        }
                    })?;
                    test_case.expected.push(expected);
                }
                _ => {
                    return Err(CaseFileError::Metadata {
                        case: test_case.name,
                        line: line.to_string(),
                    })
                }
            }
            lines.next();
        }

        test_case.source = lines.collect::<Vec<_>>().join("\n");
        result.push(test_case);
    }
    Ok(result)
}

fn parse_expectation(category: &str, position: &str) -> Option<ExpectedDiagnostic> {
    let (line, column) = position.split_once(':')?;
    Some(ExpectedDiagnostic {
        category: Category::from_name(category)?,
        line: line.parse().ok()?,
        column: column.parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cases() {
        let contents = "// CASE first\n// expects MissingSemicolon 1:10\n\nint x = 5\nint y;\n\
                        // CASE second\n// accepts\nint z;\n";
        let cases = parse_test_cases(contents).unwrap();
        assert_eq!(2, cases.len());
        assert_eq!("first", cases[0].name);
        assert_eq!("int x = 5\nint y;", cases[0].source);
        assert_eq!(
            vec![ExpectedDiagnostic {
                category: Category::MissingSemicolon,
                line: 1,
                column: 10
            }],
            cases[0].expected
        );
        assert!(cases[1].expected.is_empty());
        assert_eq!("int z;", cases[1].source);
    }

    #[rstest::rstest]
    #[case("// CASE bad\n// expects NotACategory 1:1\nint x;")]
    #[case("// CASE bad\n// expects MissingType 1\nint x;")]
    #[case("// CASE bad\n// returns 3\nint x;")]
    fn test_invalid_metadata(#[case] contents: &str) {
        assert!(matches!(
            parse_test_cases(contents),
            Err(CaseFileError::Metadata { .. })
        ));
    }
}
