use crate::diagnostics::Category;
use crate::lexical_analysis::tokens::*;
use crate::syntax_analysis::ast::*;
use crate::syntax_analysis::parser::Parser;

impl Parser {
    /// Statements up to the `}` matching an already consumed `{` opened at
    /// `open`. A missing `}` is synthesized at end of input, or before the
    /// next function definition since those cannot nest.
    pub(super) fn parse_block_items(&mut self, open: Position) -> Vec<ASTNode> {
        self.push_terminator(TokenType::CloseCurly);
        let mut result = Vec::new();
        loop {
            let token_type = self.current().token_type;
            if token_type == TokenType::CloseCurly
                || token_type == TokenType::Eof
                || self.at_function_definition()
            {
                break;
            }

            let start = self.pos;
            self.panicking = false;
            self.parse_statement(&mut result);
            if self.panicking && !self.at_statement_boundary(start) {
                self.synchronize();
            }
            if self.pos == start {
                self.advance();
            }
        }

        self.panicking = false;
        if self.try_consume(TokenType::CloseCurly).is_none() {
            self.report_after_previous(
                Category::MissingBrace,
                format!("expected '}}' to close the block opened at {}", open),
            );
        }
        self.pop_terminator(TokenType::CloseCurly);
        result
    }

    pub(super) fn parse_statement(&mut self, out: &mut Vec<ASTNode>) {
        if !self.enter_nesting() {
            return;
        }
        self.parse_statement_kind(out);
        self.leave_nesting();
    }

    fn parse_statement_kind(&mut self, out: &mut Vec<ASTNode>) {
        let token = self.current().clone();
        match token.token_type {
            TokenType::OpenCurly => out.push(self.parse_block()),
            TokenType::If => out.push(self.parse_if()),
            TokenType::While => out.push(self.parse_while()),
            TokenType::For => out.extend(self.parse_for()),
            TokenType::Return => out.push(self.parse_return()),
            TokenType::Break => {
                self.advance();
                self.expect_semicolon("after 'break'");
                out.push(ASTNode::Break(token.pos));
            }
            TokenType::SemiColon => self.advance(),
            TokenType::Directive => self.parse_directive(out),
            t if t.starts_declaration() => {
                let data_type = self.parse_data_type();
                self.parse_declaration(data_type, token.pos, out);
            }
            TokenType::Identifier if self.peak(1).token_type == TokenType::Identifier => {
                self.report(
                    Category::MissingType,
                    token.pos,
                    format!("unknown type name '{}'", token.value),
                );
                self.advance();
                self.parse_declaration(DataType::new(TypeSpecifier::Int), token.pos, out);
            }
            t if t.starts_expression() => {
                let expression = self.parse_expression();
                self.expect_semicolon("after expression");
                out.push(ASTNode::ExpressionStatement(expression, token.pos));
            }
            TokenType::CloseCurly | TokenType::Eof => self.report(
                Category::UnexpectedToken,
                token.pos,
                format!("expected statement, found {}", token.describe()),
            ),
            _ => {
                self.report(
                    Category::UnexpectedToken,
                    token.pos,
                    format!("unexpected {}", token.describe()),
                );
                self.advance();
            }
        }
    }

    fn parse_block(&mut self) -> ASTNode {
        let open = self.consume();
        ASTNode::Block(self.parse_block_items(open.pos), open.pos)
    }

    /// Loop and branch bodies are always blocks; a lone statement is wrapped.
    fn parse_body(&mut self) -> ASTNode {
        if self.current().token_type == TokenType::OpenCurly {
            return self.parse_block();
        }
        let pos = self.current().pos;
        let mut statements = Vec::new();
        self.parse_statement(&mut statements);
        ASTNode::Block(statements, pos)
    }

    fn parse_if(&mut self) -> ASTNode {
        let if_token = self.consume();
        let condition = self.parse_condition(&if_token);
        let then_branch = Box::new(self.parse_body());
        let else_branch = match self.try_consume(TokenType::Else) {
            Some(_) => Some(Box::new(self.parse_body())),
            None => None,
        };
        ASTNode::If {
            condition,
            then_branch,
            else_branch,
            pos: if_token.pos,
        }
    }

    fn parse_while(&mut self) -> ASTNode {
        let while_token = self.consume();
        let condition = self.parse_condition(&while_token);
        let body = Box::new(self.parse_body());
        ASTNode::While {
            condition,
            body,
            pos: while_token.pos,
        }
    }

    /// `( expression )` after `if` or `while`.
    fn parse_condition(&mut self, keyword: &Token) -> Expression {
        if self.current().token_type != TokenType::OpenParen {
            self.report_after_previous(
                Category::UnexpectedToken,
                format!("expected '(' after '{}'", keyword.value),
            );
            if self.current().token_type.starts_expression() {
                return self.parse_expression();
            }
            return Expression::Invalid(self.current().pos);
        }

        self.advance();
        self.push_terminator(TokenType::CloseParen);
        let condition = if self.current().token_type == TokenType::CloseParen {
            let pos = self.current().pos;
            self.report(
                Category::MissingCondition,
                pos,
                format!("expected condition in '{}' statement", keyword.value),
            );
            Expression::Invalid(pos)
        } else {
            self.parse_expression()
        };
        self.expect_close_paren(format!("expected ')' after '{}' condition", keyword.value));
        self.pop_terminator(TokenType::CloseParen);
        condition
    }

    fn parse_for(&mut self) -> Option<ASTNode> {
        let for_token = self.consume();
        if self.current().token_type != TokenType::OpenParen {
            self.report_after_previous(Category::UnexpectedToken, "expected '(' after 'for'");
            return None;
        }
        self.advance();
        self.push_terminator(TokenType::CloseParen);

        let mut init = Vec::new();
        let token = self.current().clone();
        match token.token_type {
            TokenType::SemiColon => self.advance(),
            t if t.starts_declaration() => {
                let data_type = self.parse_data_type();
                self.parse_declaration(data_type, token.pos, &mut init);
            }
            _ => {
                let expression = self.parse_expression();
                init.push(ASTNode::ExpressionStatement(expression, token.pos));
                self.expect_semicolon("after 'for' initializer");
            }
        }

        let condition = match self.current().token_type {
            TokenType::SemiColon => None,
            _ => Some(self.parse_expression()),
        };
        self.expect_semicolon("after 'for' condition");

        let step = match self.current().token_type {
            TokenType::CloseParen => None,
            _ => Some(self.parse_expression()),
        };
        self.expect_close_paren("expected ')' after 'for' clauses");
        self.pop_terminator(TokenType::CloseParen);

        let body = Box::new(self.parse_body());
        Some(ASTNode::For {
            init,
            condition,
            step,
            body,
            pos: for_token.pos,
        })
    }

    fn parse_return(&mut self) -> ASTNode {
        let return_token = self.consume();
        let current = self.current().clone();

        if current.token_type == TokenType::SemiColon {
            let missing_value = self
                .current_function
                .as_ref()
                .filter(|(_, specifier)| *specifier != TypeSpecifier::Void)
                .map(|(name, _)| format!("non-void function '{}' should return a value", name));
            if let Some(message) = missing_value {
                self.report(Category::MissingExpression, current.pos, message);
            }
            self.advance();
            return ASTNode::Return(None, return_token.pos);
        }

        if !current.token_type.starts_expression() {
            self.report_after_previous(Category::MissingSemicolon, "expected ';' after 'return'");
            return ASTNode::Return(None, return_token.pos);
        }

        let expression = self.parse_expression();
        self.expect_semicolon("after return value");
        ASTNode::Return(Some(expression), return_token.pos)
    }

    /// Same as the top-level check: the terminator must belong to the
    /// statement that began at `start`.
    fn at_statement_boundary(&self, start: usize) -> bool {
        if self.pos > start
            && matches!(
                self.tokens[self.pos - 1].token_type,
                TokenType::SemiColon | TokenType::CloseCurly
            )
        {
            return true;
        }
        let token = self.current();
        match token.token_type {
            TokenType::CloseCurly | TokenType::Eof => true,
            t if t.starts_statement() => true,
            // An identifier opening a new line most likely starts the next
            // statement after a forgotten ';'.
            TokenType::Identifier => {
                self.pos > start && self.tokens[self.pos - 1].pos.line < token.pos.line
            }
            _ => false,
        }
    }

    /// Skips past the next `;`, or up to a token that can start a statement
    /// or close the enclosing block.
    pub(super) fn synchronize(&mut self) {
        let from = self.current().pos;
        loop {
            match self.current().token_type {
                TokenType::Eof | TokenType::CloseCurly => break,
                TokenType::SemiColon => {
                    self.advance();
                    break;
                }
                t if t.starts_statement() => break,
                _ => self.advance(),
            }
        }
        log::debug!("synchronized from {} to {}", from, self.current().pos);
    }
}
