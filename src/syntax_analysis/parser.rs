use crate::config::DirectivePolicy;
use crate::diagnostics::{Category, Diagnostic};
use crate::lexical_analysis::tokens::*;
use crate::syntax_analysis::ast::*;

/// How deep blocks, statement bodies, parentheses, calls, unary operators
/// and chained assignments may nest before the parser gives up on the
/// innermost construct.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Recursive-descent parser with panic-mode recovery.
///
/// Every production reports at most one diagnostic for the construct it is
/// parsing: the first report sets `panicking`, which silences the rest of
/// the statement until the next statement (or top-level declaration)
/// starts. After a failed statement the parser skips to a synchronizing
/// token and carries on, so independent defects are all reported.
pub struct Parser {
    pub(super) tokens: Vec<Token>,
    pub(super) pos: usize,
    pub(super) terminator_stack: Vec<TokenType>,
    pub(super) diagnostics: Vec<Diagnostic>,
    pub(super) panicking: bool,
    pub(super) depth: usize,
    pub(super) directive_policy: DirectivePolicy,
    // Name and return type of the function whose body is being parsed.
    pub(super) current_function: Option<(String, TypeSpecifier)>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.token_type != TokenType::Eof) {
            let pos = tokens.last().map_or(Position::new(1, 1), |t| t.end());
            tokens.push(Token::new("", TokenType::Eof, pos));
        }
        Self {
            tokens,
            pos: 0,
            terminator_stack: vec![],
            diagnostics: vec![],
            panicking: false,
            depth: 0,
            directive_policy: DirectivePolicy::default(),
            current_function: None,
        }
    }

    pub fn with_directive_policy(mut self, policy: DirectivePolicy) -> Self {
        self.directive_policy = policy;
        self
    }

    /// Parses the whole token stream. Always returns a `Program`, together
    /// with the syntax diagnostics in the order they were found.
    pub fn parse(mut self) -> (ASTNode, Vec<Diagnostic>) {
        let mut result = Vec::new();
        while self.current().token_type != TokenType::Eof {
            let start = self.pos;
            self.panicking = false;
            self.parse_external_declaration(&mut result);
            if self.panicking && !self.at_declaration_boundary(start) {
                self.synchronize_declaration();
            }
            if self.pos == start {
                self.advance();
            }
        }
        debug_assert!(self.terminator_stack.is_empty());
        debug_assert_eq!(0, self.depth);
        (ASTNode::Program(result), self.diagnostics)
    }

    fn parse_external_declaration(&mut self, out: &mut Vec<ASTNode>) {
        let token = self.current().clone();
        match token.token_type {
            TokenType::Directive => self.parse_directive(out),
            t if t.starts_declaration() => {
                let data_type = self.parse_data_type();
                self.parse_declaration(data_type, token.pos, out);
            }
            TokenType::Identifier => {
                // `z = 10;`, `main() {` or `bool flag;`: report, then read
                // it as an implicit int declaration so later uses resolve.
                if self.peak(1).token_type == TokenType::Identifier {
                    self.report(
                        Category::MissingType,
                        token.pos,
                        format!("unknown type name '{}'", token.value),
                    );
                    self.advance();
                } else {
                    self.report(
                        Category::MissingType,
                        token.pos,
                        format!("missing type specifier before '{}'", token.value),
                    );
                }
                self.parse_declaration(DataType::new(TypeSpecifier::Int), token.pos, out);
            }
            TokenType::CloseCurly => {
                self.report(Category::UnexpectedToken, token.pos, "unmatched '}'");
            }
            t if t.starts_statement() || t == TokenType::Else => {
                self.report(
                    Category::UnexpectedToken,
                    token.pos,
                    format!("{} statement outside of a function", token.describe()),
                );
            }
            _ => {
                self.report(
                    Category::UnexpectedToken,
                    token.pos,
                    format!("expected a declaration, found {}", token.describe()),
                );
            }
        }
    }

    pub(super) fn parse_directive(&mut self, out: &mut Vec<ASTNode>) {
        let token = self.consume();
        match self.directive_policy {
            DirectivePolicy::Reject => self.report(
                Category::UnexpectedToken,
                token.pos,
                "preprocessor directives are not supported",
            ),
            DirectivePolicy::Skip => match include_target(&token.value) {
                Some(header) => out.push(ASTNode::Include(header, token.pos)),
                None => log::debug!("skipping directive '{}' at {}", token.value, token.pos),
            },
        }
    }

    /// `[static|const]* type`. A missing type specifier is reported and read
    /// as `int`.
    pub(super) fn parse_data_type(&mut self) -> DataType {
        let mut data_type = DataType::new(TypeSpecifier::Int);
        while self.current().token_type.is_qualifier() {
            match self.consume().token_type {
                TokenType::Static => data_type.is_static = true,
                _ => data_type.is_const = true,
            }
        }

        let token = self.current().clone();
        match TypeSpecifier::from_token_type(token.token_type) {
            Some(specifier) => {
                self.advance();
                data_type.specifier = specifier;
            }
            None => self.report(
                Category::MissingType,
                token.pos,
                format!("missing type specifier before {}", token.describe()),
            ),
        }
        data_type
    }

    /// Everything after the type: one or more variable declarators, or a
    /// function prototype/definition.
    pub(super) fn parse_declaration(
        &mut self,
        data_type: DataType,
        start: Position,
        out: &mut Vec<ASTNode>,
    ) {
        let Some(name) = self.expect_declarator_name() else {
            return;
        };
        if self.current().token_type == TokenType::OpenParen {
            out.push(self.parse_function(data_type, name, start));
            return;
        }

        let mut declarator = Some((name, start));
        while let Some((name, pos)) = declarator.take() {
            let init = self.parse_initializer();
            out.push(ASTNode::VarDecl {
                data_type,
                name,
                init,
                pos,
            });
            if self.current().token_type == TokenType::Comma {
                self.advance();
                let pos = self.current().pos;
                match self.expect_declarator_name() {
                    Some(name) => declarator = Some((name, pos)),
                    None => return,
                }
            }
        }
        self.expect_semicolon("after declaration");
    }

    fn expect_declarator_name(&mut self) -> Option<String> {
        let token = self.current().clone();
        if token.token_type == TokenType::Identifier {
            self.advance();
            return Some(token.value);
        }
        self.report(
            Category::MissingIdentifier,
            token.pos,
            format!("expected identifier after type, found {}", token.describe()),
        );
        None
    }

    fn parse_initializer(&mut self) -> Option<Expression> {
        if self.current().token_type != TokenType::Equals {
            return None;
        }
        let equals = self.consume();
        Some(self.parse_value_after(&equals))
    }

    fn parse_function(&mut self, return_type: DataType, name: String, pos: Position) -> ASTNode {
        self.try_consume(TokenType::OpenParen);
        self.push_terminator(TokenType::CloseParen);
        let params = self.parse_parameters();
        self.expect_close_paren(format!("expected ')' to close the parameter list of '{}'", name));
        self.pop_terminator(TokenType::CloseParen);

        let body = match self.current().token_type {
            TokenType::SemiColon => {
                self.advance();
                None
            }
            TokenType::OpenCurly => Some(self.parse_function_body(&name, return_type.specifier)),
            t if t.starts_declaration() || t == TokenType::Eof => {
                self.report_after_previous(
                    Category::MissingSemicolon,
                    format!("expected ';' after the declaration of '{}'", name),
                );
                None
            }
            _ => {
                let token = self.current().clone();
                self.report(
                    Category::UnexpectedToken,
                    token.pos,
                    format!("expected '{{' or ';' after '{}(...)', found {}", name, token.describe()),
                );
                None
            }
        };

        ASTNode::FunctionDecl {
            return_type,
            name,
            params,
            body,
            pos,
        }
    }

    fn parse_function_body(&mut self, name: &str, return_type: TypeSpecifier) -> Vec<ASTNode> {
        let saved = self.current_function.replace((name.to_string(), return_type));
        let open = self.consume();
        let statements = self.parse_block_items(open.pos);
        self.current_function = saved;
        statements
    }

    fn parse_parameters(&mut self) -> Vec<Parameter> {
        let mut result = Vec::new();
        if self.current().token_type == TokenType::Void
            && self.peak(1).token_type == TokenType::CloseParen
        {
            self.advance();
            return result;
        }
        if self.current().token_type == TokenType::CloseParen {
            return result;
        }

        loop {
            if let Some(parameter) = self.parse_parameter() {
                result.push(parameter);
            }
            match self.current().token_type {
                TokenType::Comma => {
                    self.advance();
                    if self.current().token_type == TokenType::CloseParen {
                        let pos = self.current().pos;
                        self.report(Category::UnexpectedToken, pos, "expected parameter after ','");
                    }
                }
                t if t.starts_declaration() || t == TokenType::Identifier => {
                    self.report_after_previous(
                        Category::UnexpectedToken,
                        "expected ',' between parameters",
                    );
                }
                _ => break,
            }
        }
        result
    }

    fn parse_parameter(&mut self) -> Option<Parameter> {
        let token = self.current().clone();
        if token.token_type.starts_declaration() {
            let data_type = self.parse_data_type();
            let name = self.current().clone();
            if name.token_type == TokenType::Identifier {
                self.advance();
                return Some(Parameter {
                    data_type: Some(data_type.specifier),
                    name: name.value,
                    pos: token.pos,
                });
            }
            self.report(
                Category::MissingIdentifier,
                name.pos,
                format!("expected parameter name, found {}", name.describe()),
            );
            return None;
        }

        if token.token_type != TokenType::Identifier {
            return None;
        }
        self.advance();
        if self.current().token_type == TokenType::Identifier {
            let name = self.consume();
            self.report(
                Category::MissingType,
                token.pos,
                format!("unknown type name '{}'", token.value),
            );
            return Some(Parameter {
                data_type: None,
                name: name.value,
                pos: token.pos,
            });
        }
        self.report(
            Category::MissingType,
            token.pos,
            format!("missing type specifier for parameter '{}'", token.value),
        );
        Some(Parameter {
            data_type: None,
            name: token.value,
            pos: token.pos,
        })
    }

    /// `type ident ( ... ) {` - the start of a function definition. Seen
    /// inside a block it means the enclosing braces were never closed.
    pub(super) fn at_function_definition(&self) -> bool {
        let mut i = 0;
        while self.peak(i).token_type.is_qualifier() {
            i += 1;
        }
        if !self.peak(i).token_type.is_type_specifier()
            || self.peak(i + 1).token_type != TokenType::Identifier
            || self.peak(i + 2).token_type != TokenType::OpenParen
        {
            return false;
        }

        let mut depth = 0;
        let mut j = i + 2;
        loop {
            match self.peak(j).token_type {
                TokenType::OpenParen => depth += 1,
                TokenType::CloseParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.peak(j + 1).token_type == TokenType::OpenCurly;
                    }
                }
                // An unclosed parameter list running into a body.
                TokenType::OpenCurly => return true,
                TokenType::SemiColon | TokenType::CloseCurly | TokenType::Eof => return false,
                _ => {}
            }
            j += 1;
        }
    }

    // ==================== Token cursor ====================

    pub(super) fn peak(&self, offset: usize) -> &Token {
        if (self.pos + offset) >= self.tokens.len() {
            &self.tokens[self.tokens.len() - 1]
        } else {
            &self.tokens[self.pos + offset]
        }
    }

    pub(super) fn current(&self) -> &Token {
        self.peak(0)
    }

    pub(super) fn consume(&mut self) -> Token {
        let result = self.current().clone();
        self.advance();
        result
    }

    /// Never moves past the trailing `Eof`.
    pub(super) fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub(super) fn try_consume(&mut self, token_type: TokenType) -> Option<Token> {
        if self.current().token_type == token_type {
            Some(self.consume())
        } else {
            None
        }
    }

    fn previous_end(&self) -> Position {
        if self.pos == 0 {
            self.current().pos
        } else {
            self.tokens[self.pos - 1].end()
        }
    }

    pub(super) fn push_terminator(&mut self, terminator: TokenType) {
        self.terminator_stack.push(terminator);
    }

    pub(super) fn pop_terminator(&mut self, terminator: TokenType) {
        let popped = self.terminator_stack.pop();
        debug_assert_eq!(Some(terminator), popped);
    }

    pub(super) fn is_next_terminator(&self, token_type: TokenType) -> bool {
        self.terminator_stack.last() == Some(&token_type)
    }

    // ==================== Diagnostics ====================

    pub(super) fn report(&mut self, category: Category, pos: Position, message: impl Into<String>) {
        let message = message.into();
        if self.panicking {
            log::trace!("suppressed {} at {}: {}", category, pos, message);
            return;
        }
        self.panicking = true;
        log::debug!("{} at {}: {}", category, pos, message);
        self.diagnostics.push(Diagnostic::new(category, pos, message));
    }

    /// Reports a missing terminator or closing token right after the last
    /// token that was consumed.
    pub(super) fn report_after_previous(&mut self, category: Category, message: impl Into<String>) {
        let pos = self.previous_end();
        self.report(category, pos, message);
    }

    pub(super) fn expect_semicolon(&mut self, context: &str) -> bool {
        if self.try_consume(TokenType::SemiColon).is_some() {
            return true;
        }
        self.report_after_previous(Category::MissingSemicolon, format!("expected ';' {}", context));
        false
    }

    /// Consumes the `)` closing the innermost open parenthesis. When it is
    /// missing, the rest of the garbled section is skipped up to that `)` or
    /// to anything that plausibly follows the parenthesis.
    pub(super) fn expect_close_paren(&mut self, message: impl Into<String>) -> bool {
        if self.try_consume(TokenType::CloseParen).is_some() {
            return true;
        }
        self.report_after_previous(Category::MissingParen, message);
        loop {
            let token_type = self.current().token_type;
            if matches!(
                token_type,
                TokenType::OpenCurly | TokenType::CloseCurly | TokenType::SemiColon | TokenType::Eof
            ) {
                break;
            }
            self.advance();
            if self.is_next_terminator(token_type) {
                break;
            }
        }
        false
    }

    // ==================== Error recovery ====================

    /// Enters one nesting level. Past `MAX_NESTING_DEPTH` the construct at
    /// the cursor is reported, skipped, and false is returned; the caller
    /// then must not call `leave_nesting`.
    pub(super) fn enter_nesting(&mut self) -> bool {
        if self.depth < MAX_NESTING_DEPTH {
            self.depth += 1;
            return true;
        }
        let token = self.current().clone();
        self.report(
            Category::UnexpectedToken,
            token.pos,
            format!("{} nests deeper than {} levels", token.describe(), MAX_NESTING_DEPTH),
        );
        self.skip_nested_section();
        false
    }

    pub(super) fn leave_nesting(&mut self) {
        self.depth -= 1;
    }

    /// Skips a whole `( ... )` or `{ ... }` group when the cursor opens one.
    /// Otherwise skips up to the next `;` or `,` or the closer of the
    /// enclosing group, none of which is consumed.
    fn skip_nested_section(&mut self) {
        let from = self.current().pos;
        let opens_group = matches!(
            self.current().token_type,
            TokenType::OpenParen | TokenType::OpenCurly
        );
        let mut balance = 0usize;
        loop {
            match self.current().token_type {
                TokenType::Eof => break,
                TokenType::OpenParen | TokenType::OpenCurly => balance += 1,
                TokenType::CloseParen | TokenType::CloseCurly => {
                    if balance == 0 {
                        break;
                    }
                    balance -= 1;
                    if balance == 0 && opens_group {
                        self.advance();
                        break;
                    }
                }
                TokenType::SemiColon | TokenType::Comma if balance == 0 => break,
                _ => {}
            }
            self.advance();
        }
        log::debug!("skipped nested section from {} to {}", from, self.current().pos);
    }

    /// Whether a failed declaration that began at token `start` already ends
    /// where the next one can begin. Only a `;` or `}` consumed by the
    /// failed declaration itself counts.
    fn at_declaration_boundary(&self, start: usize) -> bool {
        let after_terminator = self.pos > start
            && matches!(
                self.tokens[self.pos - 1].token_type,
                TokenType::SemiColon | TokenType::CloseCurly
            );
        let token_type = self.current().token_type;
        after_terminator
            || token_type.starts_declaration()
            || matches!(token_type, TokenType::Directive | TokenType::Eof)
    }

    /// Skips to the next top-level declaration: past a `;`, past a stray
    /// balanced `{ ... }`, or up to a type keyword or directive.
    fn synchronize_declaration(&mut self) {
        let from = self.current().pos;
        loop {
            match self.current().token_type {
                TokenType::Eof | TokenType::Directive => break,
                TokenType::SemiColon => {
                    self.advance();
                    break;
                }
                TokenType::OpenCurly => {
                    self.skip_balanced_braces();
                    break;
                }
                t if t.starts_declaration() => break,
                _ => self.advance(),
            }
        }
        log::debug!("synchronized from {} to {}", from, self.current().pos);
    }

    fn skip_balanced_braces(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current().token_type {
                TokenType::Eof => return,
                TokenType::OpenCurly => depth += 1,
                TokenType::CloseCurly => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }
}

/// `#include <stdio.h>` and `#include "x.h"` give the header name.
fn include_target(directive: &str) -> Option<String> {
    let rest = directive
        .strip_prefix('#')?
        .trim_start()
        .strip_prefix("include")?
        .trim_start();
    let close = match rest.chars().next()? {
        '<' => '>',
        '"' => '"',
        _ => return None,
    };
    let inner = &rest[1..];
    let end = inner.find(close)?;
    Some(inner[..end].trim().to_string())
}
