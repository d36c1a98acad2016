use crate::config::Config;
use crate::diagnostics::{aggregate, Diagnostic};
use crate::lexical_analysis::lexer::Lexer;
use crate::semantic_analysis::analyzer::Analyzer;
use crate::syntax_analysis::ast::ASTNode;
use crate::syntax_analysis::parser::Parser;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompilationError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of running the whole front end over one source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub program: ASTNode,
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn is_accepted(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

pub struct Compilation {
    config: Config,
}

impl Compilation {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Lexes, parses and analyzes `source`. The result depends on nothing
    /// but the source text and the configuration.
    pub fn analyze(&self, source: &str) -> Analysis {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.lex();
        let token_count = tokens.len();
        let mut front_end = lexer.take_diagnostics();

        let (program, syntax) = Parser::new(tokens)
            .with_directive_policy(self.config.directives)
            .parse();
        front_end.extend(syntax);

        // The partial tree is analyzed even when parsing failed.
        let semantic = Analyzer::new(&self.config).analyze(&program);
        let diagnostics = aggregate(front_end, semantic);
        log::debug!(
            "analyzed {} tokens, {} diagnostics",
            token_count,
            diagnostics.len()
        );

        Analysis {
            program,
            diagnostics,
        }
    }

    /// Analyzes independent sources in parallel; results keep input order.
    pub fn analyze_all<S: AsRef<str> + Sync>(&self, sources: &[S]) -> Vec<Analysis> {
        sources
            .par_iter()
            .map(|source| self.analyze(source.as_ref()))
            .collect()
    }

    pub fn read_source(path: &Path) -> Result<String, CompilationError> {
        std::fs::read_to_string(path).map_err(|source| CompilationError::Read {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for Compilation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectivePolicy;
    use crate::diagnostics::Category;

    #[test]
    fn test_phases_are_merged_in_position_order() {
        let _ = env_logger::builder().is_test(true).try_init();
        let source = "int main() {\n int a = b;\n int c = 1 +;\n return @0;\n}";
        let categories: Vec<_> = Compilation::new()
            .analyze(source)
            .diagnostics
            .iter()
            .map(|d| (d.category, d.line, d.column))
            .collect();
        assert_eq!(
            vec![
                (Category::UndefinedVariable, 2, 10),
                (Category::MissingOperand, 3, 13),
                (Category::LexError, 4, 9),
            ],
            categories
        );
    }

    #[test]
    fn test_partial_tree_is_still_analyzed() {
        let source = "int main() {\n int x = 5\n return y;\n}";
        let categories: Vec<_> = Compilation::new()
            .analyze(source)
            .diagnostics
            .iter()
            .map(|d| d.category)
            .collect();
        assert_eq!(
            vec![Category::MissingSemicolon, Category::UndefinedVariable],
            categories
        );
    }

    #[test]
    fn test_config_reaches_every_phase() {
        let config = Config {
            directives: DirectivePolicy::Reject,
            builtins: false,
            forward_calls: false,
        };
        let source = "#include <stdio.h>\nint main() { printf(\"hi\"); return 0; }";
        let analysis = Compilation::with_config(config).analyze(source);
        let categories: Vec<_> = analysis.diagnostics.iter().map(|d| d.category).collect();
        assert_eq!(
            vec![Category::UnexpectedToken, Category::UndefinedFunction],
            categories
        );
        assert!(!analysis.is_accepted());
    }

    #[test]
    fn test_analyze_all_keeps_input_order() {
        let sources = vec!["int a;", "int a = ;", "void f() { break; }", ""];
        let accepted: Vec<_> = Compilation::new()
            .analyze_all(&sources)
            .iter()
            .map(Analysis::is_accepted)
            .collect();
        assert_eq!(vec![true, false, false, true], accepted);
    }
}
