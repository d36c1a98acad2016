use crate::diagnostics::Category;
use crate::lexical_analysis::tokens::*;
use crate::syntax_analysis::ast::*;
use crate::syntax_analysis::parser::Parser;

/// Binary operators and their precedence; higher binds tighter.
fn binary_operator(token_type: TokenType) -> Option<(BinaryOperator, u8)> {
    match token_type {
        TokenType::BarBar => Some((BinaryOperator::Or, 1)),
        TokenType::AndAnd => Some((BinaryOperator::And, 2)),
        TokenType::Bar => Some((BinaryOperator::BitOr, 3)),
        TokenType::Caret => Some((BinaryOperator::BitXor, 4)),
        TokenType::And => Some((BinaryOperator::BitAnd, 5)),
        TokenType::EqualsEquals => Some((BinaryOperator::Equal, 6)),
        TokenType::NotEquals => Some((BinaryOperator::NotEqual, 6)),
        TokenType::LessThan => Some((BinaryOperator::Less, 7)),
        TokenType::LessThanEquals => Some((BinaryOperator::LessEqual, 7)),
        TokenType::GreaterThan => Some((BinaryOperator::Greater, 7)),
        TokenType::GreaterThanEquals => Some((BinaryOperator::GreaterEqual, 7)),
        TokenType::Plus => Some((BinaryOperator::Add, 8)),
        TokenType::Minus => Some((BinaryOperator::Subtract, 8)),
        TokenType::Star => Some((BinaryOperator::Multiply, 9)),
        TokenType::Slash => Some((BinaryOperator::Divide, 9)),
        TokenType::Percent => Some((BinaryOperator::Modulo, 9)),
        _ => None,
    }
}

fn unary_operator(token_type: TokenType) -> Option<UnaryOperator> {
    match token_type {
        TokenType::Minus => Some(UnaryOperator::Negate),
        TokenType::Plus => Some(UnaryOperator::Plus),
        TokenType::Bang => Some(UnaryOperator::Not),
        _ => None,
    }
}

impl Parser {
    pub(super) fn parse_expression(&mut self) -> Expression {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Expression {
        let target = self.parse_binary(0);
        let Some(equals) = self.try_consume(TokenType::Equals) else {
            return target;
        };
        if !matches!(target, Expression::Identifier(..) | Expression::Invalid(_)) {
            self.report(
                Category::UnexpectedToken,
                equals.pos,
                "left side of '=' must be a variable",
            );
        }
        let value = if self.enter_nesting() {
            let value = self.parse_value_after(&equals);
            self.leave_nesting();
            value
        } else {
            Expression::Invalid(equals.pos)
        };
        let pos = target.position();
        Expression::Binary(BinaryOperator::Assign, Box::new(target), Box::new(value), pos)
    }

    /// The value after an `=`, in an initializer or an assignment.
    pub(super) fn parse_value_after(&mut self, equals: &Token) -> Expression {
        if self.current().token_type.starts_expression() {
            return self.parse_assignment();
        }
        let current = self.current().clone();
        self.report(
            Category::MissingExpression,
            current.pos,
            format!("expected expression after '{}', found {}", equals.value, current.describe()),
        );
        Expression::Invalid(current.pos)
    }

    fn parse_binary(&mut self, parent_precedence: u8) -> Expression {
        let mut left = self.parse_unary();
        loop {
            let Some((operator, precedence)) = binary_operator(self.current().token_type) else {
                break;
            };
            if precedence <= parent_precedence {
                break;
            }
            let operator_token = self.consume();
            let right = if self.current().token_type.starts_expression() {
                self.parse_binary(precedence)
            } else {
                self.missing_operand(&operator_token)
            };
            let pos = left.position();
            left = Expression::Binary(operator, Box::new(left), Box::new(right), pos);
        }
        left
    }

    fn parse_unary(&mut self) -> Expression {
        let Some(operator) = unary_operator(self.current().token_type) else {
            return self.parse_primary();
        };
        let operator_pos = self.current().pos;
        if !self.enter_nesting() {
            return Expression::Invalid(operator_pos);
        }
        let operator_token = self.consume();
        let operand = if self.current().token_type.starts_expression() {
            self.parse_unary()
        } else {
            self.missing_operand(&operator_token)
        };
        self.leave_nesting();
        Expression::Unary(operator, Box::new(operand), operator_token.pos)
    }

    fn missing_operand(&mut self, operator: &Token) -> Expression {
        let current = self.current().clone();
        self.report(
            Category::MissingOperand,
            current.pos,
            format!("expected operand after '{}', found {}", operator.value, current.describe()),
        );
        Expression::Invalid(current.pos)
    }

    fn parse_primary(&mut self) -> Expression {
        let token = self.current().clone();
        match token.token_type {
            TokenType::Identifier if self.peak(1).token_type == TokenType::OpenParen => {
                self.parse_call()
            }
            TokenType::Identifier => {
                self.advance();
                Expression::Identifier(token.value, token.pos)
            }
            TokenType::IntegerLiteral => {
                self.advance();
                match token.value.parse::<i64>() {
                    Ok(value) => Expression::Literal(Literal::Integer(value), token.pos),
                    Err(_) => {
                        self.report(
                            Category::UnexpectedToken,
                            token.pos,
                            format!("integer literal '{}' is out of range", token.value),
                        );
                        Expression::Invalid(token.pos)
                    }
                }
            }
            TokenType::FloatLiteral => {
                self.advance();
                match token.value.parse::<f64>() {
                    Ok(value) => Expression::Literal(Literal::Float(value), token.pos),
                    Err(_) => {
                        self.report(
                            Category::UnexpectedToken,
                            token.pos,
                            format!("invalid floating literal '{}'", token.value),
                        );
                        Expression::Invalid(token.pos)
                    }
                }
            }
            TokenType::CharLiteral => {
                self.advance();
                let value = decode_quoted(&token.value).chars().next().unwrap_or('\0');
                Expression::Literal(Literal::Char(value), token.pos)
            }
            TokenType::StringLiteral => {
                self.advance();
                Expression::Literal(Literal::String(decode_quoted(&token.value)), token.pos)
            }
            TokenType::OpenParen => self.parse_parenthesized(),
            _ => {
                self.report(
                    Category::UnexpectedToken,
                    token.pos,
                    format!("expected expression, found {}", token.describe()),
                );
                Expression::Invalid(token.pos)
            }
        }
    }

    fn parse_parenthesized(&mut self) -> Expression {
        let open = self.current().pos;
        if !self.enter_nesting() {
            return Expression::Invalid(open);
        }
        self.advance();
        self.push_terminator(TokenType::CloseParen);
        let expression = if self.current().token_type == TokenType::CloseParen {
            let pos = self.current().pos;
            self.report(
                Category::MissingExpression,
                pos,
                "expected expression inside parentheses",
            );
            Expression::Invalid(pos)
        } else {
            self.parse_expression()
        };
        self.expect_close_paren("expected ')' to close parenthesized expression");
        self.pop_terminator(TokenType::CloseParen);
        self.leave_nesting();
        expression
    }

    fn parse_call(&mut self) -> Expression {
        let start = self.current().pos;
        if !self.enter_nesting() {
            return Expression::Invalid(start);
        }
        let name = self.consume();
        self.advance();
        self.push_terminator(TokenType::CloseParen);

        let mut arguments = Vec::new();
        if self.current().token_type != TokenType::CloseParen {
            loop {
                if !self.current().token_type.starts_expression() {
                    let current = self.current().clone();
                    self.report(
                        Category::MissingExpression,
                        current.pos,
                        format!("expected argument, found {}", current.describe()),
                    );
                    break;
                }
                arguments.push(self.parse_expression());
                if self.try_consume(TokenType::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect_close_paren(format!(
            "expected ')' to close the argument list of '{}'",
            name.value
        ));
        self.pop_terminator(TokenType::CloseParen);
        self.leave_nesting();
        Expression::Call(name.value, arguments, name.pos)
    }
}

/// Contents of a char or string lexeme with escapes resolved. The closing
/// quote may be absent when the literal was unterminated.
fn decode_quoted(lexeme: &str) -> String {
    let mut chars = lexeme.chars();
    let quote = chars.next().unwrap_or('"');
    let mut result = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('0') => result.push('\0'),
                Some(other) => result.push(other),
                None => break,
            },
            c if c == quote => break,
            c => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical_analysis::lexer::Lexer;

    fn parse_initializer(expression: &str) -> Expression {
        let source = format!("int v = {};", expression);
        let (program, diagnostics) = Parser::new(Lexer::new(&source).lex()).parse();
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        match program {
            ASTNode::Program(mut items) => match items.remove(0) {
                ASTNode::VarDecl { init: Some(init), .. } => init,
                other => panic!("unexpected node {:?}", other),
            },
            other => panic!("expected program, got {:?}", other),
        }
    }

    /// Renders an expression fully parenthesized, to compare tree shapes.
    fn shape(expression: &Expression) -> String {
        match expression {
            Expression::Binary(op, left, right, _) => {
                format!("({:?} {} {})", op, shape(left), shape(right))
            }
            Expression::Unary(op, operand, _) => format!("({:?} {})", op, shape(operand)),
            Expression::Call(name, args, _) => {
                let args: Vec<_> = args.iter().map(shape).collect();
                format!("{}({})", name, args.join(", "))
            }
            Expression::Identifier(name, _) => name.clone(),
            Expression::Literal(Literal::Integer(value), _) => value.to_string(),
            Expression::Literal(literal, _) => format!("{:?}", literal),
            Expression::Invalid(_) => "<invalid>".to_string(),
        }
    }

    #[rstest::rstest]
    #[case("1 + 2 * 3", "(Add 1 (Multiply 2 3))")]
    #[case("1 - 2 - 3", "(Subtract (Subtract 1 2) 3)")]
    #[case("(1 + 2) * 3", "(Multiply (Add 1 2) 3)")]
    #[case("1 < 2 == 3 >= 4", "(Equal (Less 1 2) (GreaterEqual 3 4))")]
    #[case("1 || 2 && 3", "(Or 1 (And 2 3))")]
    #[case("1 | 2 ^ 3 & 4", "(BitOr 1 (BitXor 2 (BitAnd 3 4)))")]
    #[case("-1 + !2", "(Add (Negate 1) (Not 2))")]
    #[case("- -1", "(Negate (Negate 1))")]
    #[case("10 % 3 / 2", "(Divide (Modulo 10 3) 2)")]
    #[case("f(1, g(2) + 3, 4)", "f(1, (Add g(2) 3), 4)")]
    #[case("f()", "f()")]
    fn test_expression_shape(#[case] expression: &str, #[case] expected: &str) {
        assert_eq!(expected, shape(&parse_initializer(expression)));
    }

    #[rstest::rstest]
    #[case("'A'", Literal::Char('A'))]
    #[case("'\\n'", Literal::Char('\n'))]
    #[case("3.5", Literal::Float(3.5))]
    #[case("\"a\\tb\"", Literal::String("a\tb".to_string()))]
    #[case("\"say \\\"hi\\\"\"", Literal::String("say \"hi\"".to_string()))]
    fn test_literals(#[case] expression: &str, #[case] expected: Literal) {
        match parse_initializer(expression) {
            Expression::Literal(literal, _) => assert_eq!(expected, literal),
            other => panic!("unexpected expression {:?}", other),
        }
    }

    #[rstest::rstest]
    #[case("\"abc\"", "abc")]
    #[case("\"abc", "abc")]
    #[case("'x'", "x")]
    #[case("\"\\\\\"", "\\")]
    #[case("\"\"", "")]
    fn test_decode_quoted(#[case] lexeme: &str, #[case] expected: &str) {
        assert_eq!(expected, decode_quoted(lexeme));
    }

    #[test]
    fn test_binary_position_is_left_operand() {
        let expression = parse_initializer("a + b");
        assert_eq!(Position::new(1, 9), expression.position());
    }

    #[test]
    fn test_integer_out_of_range() {
        let (_, diagnostics) =
            Parser::new(Lexer::new("int v = 99999999999999999999;").lex()).parse();
        assert_eq!(1, diagnostics.len());
        assert_eq!(Category::UnexpectedToken, diagnostics[0].category);
    }
}
