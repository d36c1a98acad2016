//! Front end for a statement-level subset of C.
//!
//! Source text goes through the [lexer](lexical_analysis::lexer), the
//! recovering [parser](syntax_analysis::parser) and the
//! [semantic analyzer](semantic_analysis::analyzer); the diagnostics of all
//! three are merged by [`diagnostics::aggregate`]. The whole pipeline is
//! driven by [`utils::compilation::Compilation`].

pub mod config;
pub mod diagnostics;
pub mod lexical_analysis;
pub mod semantic_analysis;
pub mod syntax_analysis;
pub mod utils;
