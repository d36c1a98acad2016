use crate::config::Config;
use crate::diagnostics::{Category, Diagnostic};
use crate::lexical_analysis::tokens::Position;
use crate::semantic_analysis::builtins;
use crate::semantic_analysis::symbol_table::{ScopeKind, SymbolKind, SymbolTable};
use crate::syntax_analysis::ast::*;

/// Walks a (possibly partial) program and reports name-resolution errors
/// (redefinitions, uses of undeclared names, misplaced `break`s) along with
/// call arity and `void` return checks.
pub struct Analyzer {
    symbol_table: SymbolTable,
    diagnostics: Vec<Diagnostic>,
    loop_depth: usize,
    // Return type of the function whose body is being walked.
    return_type: Option<TypeSpecifier>,
    builtins: bool,
    forward_calls: bool,
}

impl Analyzer {
    pub fn new(config: &Config) -> Self {
        Self {
            symbol_table: SymbolTable::new(),
            diagnostics: vec![],
            loop_depth: 0,
            return_type: None,
            builtins: config.builtins,
            forward_calls: config.forward_calls,
        }
    }

    pub fn analyze(mut self, program: &ASTNode) -> Vec<Diagnostic> {
        self.symbol_table.push_scope(ScopeKind::Global);
        match program {
            ASTNode::Program(items) => {
                if self.forward_calls {
                    self.declare_functions_ahead(items);
                }
                for item in items {
                    self.analyze_node(item);
                }
            }
            node => self.analyze_node(node),
        }
        self.symbol_table.pop_scope();
        debug_assert_eq!(0, self.symbol_table.depth());
        self.diagnostics
    }

    fn declare_functions_ahead(&mut self, items: &[ASTNode]) {
        for item in items {
            if let ASTNode::FunctionDecl {
                name, params, pos, ..
            } = item
            {
                // A prototype, so the definition itself still counts once.
                self.symbol_table.declare_prototype(name, *pos, Some(params.len()));
            }
        }
    }

    fn analyze_node(&mut self, node: &ASTNode) {
        match node {
            ASTNode::Program(items) => {
                for item in items {
                    self.analyze_node(item);
                }
            }
            ASTNode::Include(header, pos) => {
                if !self.builtins {
                    return;
                }
                for function in builtins::functions_for(header) {
                    self.symbol_table.declare_prototype(function, *pos, None);
                }
            }
            ASTNode::FunctionDecl {
                return_type,
                name,
                params,
                body,
                pos,
            } => self.analyze_function(return_type.specifier, name, params, body.as_deref(), *pos),
            ASTNode::VarDecl { name, init, pos, .. } => {
                // The name is in scope inside its own initializer.
                self.declare_variable(name, *pos);
                if let Some(init) = init {
                    self.analyze_expression(init);
                }
            }
            ASTNode::Block(items, _) => {
                self.symbol_table.push_scope(ScopeKind::Block);
                for item in items {
                    self.analyze_node(item);
                }
                self.symbol_table.pop_scope();
            }
            ASTNode::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.analyze_expression(condition);
                self.analyze_node(then_branch);
                if let Some(else_branch) = else_branch {
                    self.analyze_node(else_branch);
                }
            }
            ASTNode::While {
                condition, body, ..
            } => {
                self.analyze_expression(condition);
                self.analyze_loop_body(body);
            }
            ASTNode::For {
                init,
                condition,
                step,
                body,
                ..
            } => {
                self.symbol_table.push_scope(ScopeKind::Block);
                for node in init {
                    self.analyze_node(node);
                }
                if let Some(condition) = condition {
                    self.analyze_expression(condition);
                }
                if let Some(step) = step {
                    self.analyze_expression(step);
                }
                self.analyze_loop_body(body);
                self.symbol_table.pop_scope();
            }
            ASTNode::Return(value, pos) => {
                if let Some(value) = value {
                    if self.return_type == Some(TypeSpecifier::Void) {
                        self.report(
                            Category::ReturnTypeMismatch,
                            *pos,
                            "void function should not return a value".to_string(),
                        );
                    }
                    self.analyze_expression(value);
                }
            }
            ASTNode::Break(pos) => {
                if self.loop_depth == 0 {
                    self.report(
                        Category::BreakOutsideLoop,
                        *pos,
                        "'break' statement not within a loop".to_string(),
                    );
                }
            }
            ASTNode::ExpressionStatement(expression, _) => self.analyze_expression(expression),
        }
    }

    fn analyze_function(
        &mut self,
        return_type: TypeSpecifier,
        name: &str,
        params: &[Parameter],
        body: Option<&[ASTNode]>,
        pos: Position,
    ) {
        let Some(body) = body else {
            self.symbol_table.declare_prototype(name, pos, Some(params.len()));
            return;
        };
        if let Err(previous) = self.symbol_table.define_function(name, pos, Some(params.len())) {
            self.report(
                Category::FunctionRedefinition,
                pos,
                format!("redefinition of function '{}' (first defined at {})", name, previous.pos),
            );
        }

        self.symbol_table.push_scope(ScopeKind::Function);
        for param in params {
            self.declare_variable(&param.name, param.pos);
        }
        let enclosing_loops = std::mem::replace(&mut self.loop_depth, 0);
        let enclosing_return = self.return_type.replace(return_type);
        for statement in body {
            self.analyze_node(statement);
        }
        self.return_type = enclosing_return;
        self.loop_depth = enclosing_loops;
        self.symbol_table.pop_scope();
    }

    fn analyze_loop_body(&mut self, body: &ASTNode) {
        self.loop_depth += 1;
        self.analyze_node(body);
        self.loop_depth -= 1;
    }

    fn declare_variable(&mut self, name: &str, pos: Position) {
        if let Some(previous) = self.symbol_table.get_at_current_scope(name) {
            let message = format!("redefinition of '{}' (previously declared at {})", name, previous.pos);
            self.report(Category::VariableRedefinition, pos, message);
        }
        self.symbol_table.insert(name, pos);
    }

    fn analyze_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Identifier(name, pos) => {
                if self.symbol_table.get(name).is_none() {
                    self.report(
                        Category::UndefinedVariable,
                        *pos,
                        format!("use of undeclared variable '{}'", name),
                    );
                }
            }
            Expression::Call(name, arguments, pos) => {
                match self.symbol_table.get_function(name).map(|symbol| symbol.kind) {
                    None => self.report(
                        Category::UndefinedFunction,
                        *pos,
                        format!("call to undeclared function '{}'", name),
                    ),
                    Some(SymbolKind::Function {
                        arity: Some(arity), ..
                    }) if arity != arguments.len() => self.report(
                        Category::ArgumentCountMismatch,
                        *pos,
                        format!(
                            "function '{}' expects {} argument(s), {} given",
                            name,
                            arity,
                            arguments.len()
                        ),
                    ),
                    Some(_) => {}
                }
                for argument in arguments {
                    self.analyze_expression(argument);
                }
            }
            Expression::Binary(_, left, right, _) => {
                self.analyze_expression(left);
                self.analyze_expression(right);
            }
            Expression::Unary(_, operand, _) => self.analyze_expression(operand),
            Expression::Literal(..) | Expression::Invalid(_) => {}
        }
    }

    fn report(&mut self, category: Category, pos: Position, message: String) {
        log::debug!("{} at {}: {}", category, pos, message);
        self.diagnostics.push(Diagnostic::new(category, pos, message));
    }
}
