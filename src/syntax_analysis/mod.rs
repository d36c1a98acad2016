pub mod ast;
mod expressions;
pub mod parser;
mod statements;
