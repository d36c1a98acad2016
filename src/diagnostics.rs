//! Diagnostic records shared by every phase, and the aggregator that merges
//! them into the single ordered list a caller sees.

use crate::lexical_analysis::tokens::Position;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// The phase that produced a diagnostic. Ordering matters: on a position
/// tie the earlier phase is reported first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Lexical,
    Syntax,
    Semantic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    LexError,

    MissingSemicolon,
    MissingType,
    MissingIdentifier,
    MissingExpression,
    MissingOperand,
    MissingParen,
    MissingBrace,
    MissingCondition,
    UnexpectedToken,

    VariableRedefinition,
    FunctionRedefinition,
    UndefinedVariable,
    UndefinedFunction,
    BreakOutsideLoop,
    ArgumentCountMismatch,
    ReturnTypeMismatch,
}

impl Category {
    pub fn phase(&self) -> Phase {
        match self {
            Category::LexError => Phase::Lexical,
            Category::MissingSemicolon
            | Category::MissingType
            | Category::MissingIdentifier
            | Category::MissingExpression
            | Category::MissingOperand
            | Category::MissingParen
            | Category::MissingBrace
            | Category::MissingCondition
            | Category::UnexpectedToken => Phase::Syntax,
            Category::VariableRedefinition
            | Category::FunctionRedefinition
            | Category::UndefinedVariable
            | Category::UndefinedFunction
            | Category::BreakOutsideLoop
            | Category::ArgumentCountMismatch
            | Category::ReturnTypeMismatch => Phase::Semantic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::LexError => "LexError",
            Category::MissingSemicolon => "MissingSemicolon",
            Category::MissingType => "MissingType",
            Category::MissingIdentifier => "MissingIdentifier",
            Category::MissingExpression => "MissingExpression",
            Category::MissingOperand => "MissingOperand",
            Category::MissingParen => "MissingParen",
            Category::MissingBrace => "MissingBrace",
            Category::MissingCondition => "MissingCondition",
            Category::UnexpectedToken => "UnexpectedToken",
            Category::VariableRedefinition => "VariableRedefinition",
            Category::FunctionRedefinition => "FunctionRedefinition",
            Category::UndefinedVariable => "UndefinedVariable",
            Category::UndefinedFunction => "UndefinedFunction",
            Category::BreakOutsideLoop => "BreakOutsideLoop",
            Category::ArgumentCountMismatch => "ArgumentCountMismatch",
            Category::ReturnTypeMismatch => "ReturnTypeMismatch",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ALL_CATEGORIES.iter().copied().find(|c| c.as_str() == name)
    }
}

const ALL_CATEGORIES: [Category; 17] = [
    Category::LexError,
    Category::MissingSemicolon,
    Category::MissingType,
    Category::MissingIdentifier,
    Category::MissingExpression,
    Category::MissingOperand,
    Category::MissingParen,
    Category::MissingBrace,
    Category::MissingCondition,
    Category::UnexpectedToken,
    Category::VariableRedefinition,
    Category::FunctionRedefinition,
    Category::UndefinedVariable,
    Category::UndefinedFunction,
    Category::BreakOutsideLoop,
    Category::ArgumentCountMismatch,
    Category::ReturnTypeMismatch,
];

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}:{column}: {severity}[{category}]: {message}")]
pub struct Diagnostic {
    pub category: Category,
    pub severity: Severity,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(category: Category, pos: Position, message: impl Into<String>) -> Self {
        Self {
            category,
            severity: Severity::Error,
            line: pos.line,
            column: pos.column,
            message: message.into(),
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// Merges the front end (lexer + parser) and semantic diagnostic lists.
///
/// The result is stably sorted by `(line, column)`, with lexical before
/// syntax before semantic on ties. Exact `(category, line, column)`
/// repeats are dropped; nothing else is.
pub fn aggregate(front_end: Vec<Diagnostic>, semantic: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut merged = front_end;
    merged.extend(semantic);
    merged.sort_by_key(|d| (d.line, d.column, d.category.phase()));

    let mut seen = HashSet::new();
    merged.retain(|d| seen.insert((d.category, d.line, d.column)));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(category: Category, line: usize, column: usize) -> Diagnostic {
        Diagnostic::new(category, Position::new(line, column), "")
    }

    #[rstest::rstest]
    #[case(Category::LexError, Phase::Lexical)]
    #[case(Category::MissingBrace, Phase::Syntax)]
    #[case(Category::UnexpectedToken, Phase::Syntax)]
    #[case(Category::UndefinedFunction, Phase::Semantic)]
    #[case(Category::BreakOutsideLoop, Phase::Semantic)]
    #[case(Category::ArgumentCountMismatch, Phase::Semantic)]
    #[case(Category::ReturnTypeMismatch, Phase::Semantic)]
    fn test_category_phase(#[case] category: Category, #[case] expected: Phase) {
        assert_eq!(expected, category.phase());
    }

    #[test]
    fn test_category_names_round_trip() {
        for category in ALL_CATEGORIES {
            assert_eq!(Some(category), Category::from_name(category.as_str()));
        }
        assert_eq!(None, Category::from_name("NotACategory"));
    }

    #[test]
    fn test_aggregate_sorts_by_position() {
        let front = vec![diag(Category::MissingSemicolon, 9, 1), diag(Category::MissingType, 2, 4)];
        let semantic = vec![diag(Category::UndefinedVariable, 5, 3), diag(Category::UndefinedFunction, 2, 1)];

        let result = aggregate(front, semantic);
        let positions: Vec<_> = result.iter().map(|d| (d.line, d.column)).collect();
        assert_eq!(vec![(2, 1), (2, 4), (5, 3), (9, 1)], positions);
    }

    #[test]
    fn test_aggregate_breaks_ties_by_phase() {
        let front = vec![diag(Category::MissingOperand, 3, 7), diag(Category::LexError, 3, 7)];
        let semantic = vec![diag(Category::UndefinedVariable, 3, 7)];

        let categories: Vec<_> = aggregate(front, semantic).iter().map(|d| d.category).collect();
        assert_eq!(
            vec![Category::LexError, Category::MissingOperand, Category::UndefinedVariable],
            categories
        );
    }

    #[test]
    fn test_aggregate_drops_exact_repeats_only() {
        let front = vec![
            diag(Category::MissingBrace, 4, 2),
            diag(Category::MissingBrace, 4, 2),
            diag(Category::MissingSemicolon, 4, 2),
        ];
        let result = aggregate(front, vec![]);
        assert_eq!(2, result.len());
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::new(Category::MissingSemicolon, Position::new(4, 10), "expected ';'");
        assert_eq!("4:10: error[MissingSemicolon]: expected ';'", d.to_string());
    }
}
