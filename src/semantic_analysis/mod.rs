pub mod analyzer;
pub mod builtins;
pub mod symbol_table;
