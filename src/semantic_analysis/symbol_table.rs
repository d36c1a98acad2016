use crate::lexical_analysis::tokens::Position;
use std::collections::HashMap;

pub type ScopeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    /// `arity` is None for header built-ins, whose argument lists are not
    /// known (`printf` is variadic).
    Function {
        is_definition: bool,
        arity: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub scope: ScopeId,
    pub pos: Position,
}

#[derive(Debug)]
pub struct Scope {
    kind: ScopeKind,
    symbols: HashMap<String, Symbol>,
    parent: Option<ScopeId>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            symbols: HashMap::default(),
            parent,
        }
    }

    fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }
}

/// Variables live in a stack of lexical scopes; functions live in a single
/// file-wide namespace of their own.
///
/// Scopes are kept in an arena indexed by `ScopeId` and are pushed and
/// popped strictly LIFO, so the live scopes always form one chain from the
/// innermost scope to the global one.
pub struct SymbolTable {
    scopes: Vec<Scope>,
    functions: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            functions: HashMap::default(),
        }
    }

    pub fn push_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let parent = self.current_scope();
        self.scopes.push(Scope::new(kind, parent));
        log::trace!("entered {:?} scope, depth {}", kind, self.scopes.len());
        self.scopes.len() - 1
    }

    /// Discards the innermost scope with everything declared in it.
    pub fn pop_scope(&mut self) -> Option<Scope> {
        let scope = self.scopes.pop();
        if let Some(scope) = &scope {
            log::trace!(
                "left {:?} scope with {} symbols, depth {}",
                scope.kind,
                scope.symbols.len(),
                self.scopes.len()
            );
        }
        scope
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current_scope(&self) -> Option<ScopeId> {
        self.scopes.len().checked_sub(1)
    }

    /// Innermost visible declaration of a variable.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        let mut current = self.current_scope();
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if let Some(symbol) = scope.get(name) {
                return Some(symbol);
            }
            current = scope.parent;
        }
        None
    }

    pub fn get_at_current_scope(&self, name: &str) -> Option<&Symbol> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }

    /// Declares a variable in the innermost scope, replacing any earlier
    /// declaration of the same scope.
    pub fn insert(&mut self, name: &str, pos: Position) {
        let Some(scope) = self.current_scope() else {
            log::trace!("no scope to declare '{}' in", name);
            return;
        };
        let symbol = Symbol {
            name: name.to_string(),
            kind: SymbolKind::Variable,
            scope,
            pos,
        };
        self.scopes[scope].symbols.insert(name.to_string(), symbol);
    }

    pub fn get_function(&self, name: &str) -> Option<&Symbol> {
        self.functions.get(name)
    }

    /// Records a prototype. Prototypes never conflict; the first one seen
    /// fixes the arity unless a definition already did.
    pub fn declare_prototype(&mut self, name: &str, pos: Position, arity: Option<usize>) {
        self.functions
            .entry(name.to_string())
            .or_insert_with(|| Symbol {
                name: name.to_string(),
                kind: SymbolKind::Function {
                    is_definition: false,
                    arity,
                },
                scope: 0,
                pos,
            });
    }

    /// Records a definition. A second definition is refused and the first
    /// one returned.
    pub fn define_function(
        &mut self,
        name: &str,
        pos: Position,
        arity: Option<usize>,
    ) -> Result<(), Symbol> {
        let symbol = self.functions.entry(name.to_string()).or_insert_with(|| Symbol {
            name: name.to_string(),
            kind: SymbolKind::Function {
                is_definition: false,
                arity,
            },
            scope: 0,
            pos,
        });
        match &mut symbol.kind {
            SymbolKind::Function {
                is_definition: true,
                ..
            } => Err(symbol.clone()),
            kind => {
                *kind = SymbolKind::Function {
                    is_definition: true,
                    arity,
                };
                symbol.pos = pos;
                Ok(())
            }
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize) -> Position {
        Position::new(line, 1)
    }

    #[test]
    fn test_inner_declaration_shadows_outer() {
        let mut table = SymbolTable::new();
        table.push_scope(ScopeKind::Global);
        table.insert("a", pos(1));
        let inner = table.push_scope(ScopeKind::Block);
        table.insert("a", pos(2));

        let found = table.get("a").map(|s| (s.scope, s.pos));
        assert_eq!(Some((inner, pos(2))), found);

        table.pop_scope();
        assert_eq!(Some(pos(1)), table.get("a").map(|s| s.pos));
    }

    #[test]
    fn test_lookup_walks_parent_chain() {
        let mut table = SymbolTable::new();
        table.push_scope(ScopeKind::Global);
        table.insert("g", pos(1));
        table.push_scope(ScopeKind::Function);
        table.push_scope(ScopeKind::Block);

        assert!(table.get("g").is_some());
        assert!(table.get_at_current_scope("g").is_none());
        assert!(table.get("missing").is_none());
    }

    #[test]
    fn test_popped_scope_is_invisible() {
        let mut table = SymbolTable::new();
        table.push_scope(ScopeKind::Global);
        table.push_scope(ScopeKind::Block);
        table.insert("local", pos(3));

        let popped = table
            .pop_scope()
            .map(|s| (s.kind, s.symbols.len(), s.parent));
        assert_eq!(Some((ScopeKind::Block, 1, Some(0))), popped);
        assert!(table.get("local").is_none());
        assert_eq!(1, table.depth());
    }

    #[test]
    fn test_insert_replaces_same_scope_duplicate() {
        let mut table = SymbolTable::new();
        table.push_scope(ScopeKind::Global);
        table.insert("x", pos(1));
        assert_eq!(Some(pos(1)), table.get_at_current_scope("x").map(|s| s.pos));
        table.insert("x", pos(2));
        assert_eq!(Some(pos(2)), table.get("x").map(|s| s.pos));
    }

    #[test]
    fn test_insert_without_scope_is_ignored() {
        let mut table = SymbolTable::new();
        table.insert("x", pos(1));
        assert!(table.get("x").is_none());
    }

    // true is a definition, false a prototype
    #[rstest::rstest]
    #[case(&[false, true], true)]
    #[case(&[true, false], true)]
    #[case(&[false, false, true], true)]
    #[case(&[true, true], false)]
    #[case(&[false, true, false, true], false)]
    fn test_function_declarations(#[case] declarations: &[bool], #[case] accepted: bool) {
        let mut table = SymbolTable::new();
        let mut all_ok = true;
        for (line, is_definition) in declarations.iter().enumerate() {
            if *is_definition {
                all_ok &= table.define_function("f", pos(line + 1), Some(0)).is_ok();
            } else {
                table.declare_prototype("f", pos(line + 1), Some(0));
            }
        }
        assert_eq!(accepted, all_ok);
    }

    #[test]
    fn test_redefinition_keeps_first_definition() {
        let mut table = SymbolTable::new();
        assert!(table.define_function("f", pos(1), Some(1)).is_ok());
        let first = table.define_function("f", pos(5), Some(2)).unwrap_err();
        assert_eq!(pos(1), first.pos);
        assert_eq!(
            Some(SymbolKind::Function {
                is_definition: true,
                arity: Some(1)
            }),
            table.get_function("f").map(|s| s.kind)
        );
    }

    #[rstest::rstest]
    #[case(Some(2), Some(3), Some(3))]
    #[case(None, Some(3), Some(3))]
    fn test_definition_sets_arity(
        #[case] prototype: Option<usize>,
        #[case] definition: Option<usize>,
        #[case] expected: Option<usize>,
    ) {
        let mut table = SymbolTable::new();
        table.declare_prototype("f", pos(1), prototype);
        assert!(table.define_function("f", pos(2), definition).is_ok());
        let arity = match table.get_function("f").map(|s| s.kind) {
            Some(SymbolKind::Function { arity, .. }) => arity,
            _ => None,
        };
        assert_eq!(expected, arity);
    }

    #[test]
    fn test_prototype_after_definition_keeps_definition() {
        let mut table = SymbolTable::new();
        assert!(table.define_function("f", pos(1), Some(1)).is_ok());
        table.declare_prototype("f", pos(4), Some(3));
        let symbol = table.get_function("f").cloned();
        assert_eq!(Some(pos(1)), symbol.as_ref().map(|s| s.pos));
        assert_eq!(
            Some(SymbolKind::Function {
                is_definition: true,
                arity: Some(1)
            }),
            symbol.map(|s| s.kind)
        );
    }

    #[test]
    fn test_functions_and_variables_do_not_collide() {
        let mut table = SymbolTable::new();
        table.push_scope(ScopeKind::Global);
        table.insert("count", pos(1));
        assert!(table.define_function("count", pos(2), Some(0)).is_ok());
        assert_eq!(Some(SymbolKind::Variable), table.get("count").map(|s| s.kind));
        assert!(table.get_function("count").is_some());
    }
}
