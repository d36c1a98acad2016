use crate::diagnostics::{Category, Diagnostic};
use crate::lexical_analysis::tokens::*;

/// Lazy tokenizer. Yields tokens one at a time and finishes with a single
/// `Eof` token. Unknown characters are reported and skipped so the stream
/// never stops early.
pub struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    finished: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    pub fn new(src: &str) -> Self {
        Self {
            src: src.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            finished: false,
            diagnostics: Vec::new(),
        }
    }

    /// Rewinds to the start of the input and forgets earlier diagnostics.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.line = 1;
        self.column = 1;
        self.finished = false;
        self.diagnostics.clear();
    }

    pub fn lex(&mut self) -> Vec<Token> {
        self.by_ref().collect()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn next_token(&mut self) -> Token {
        loop {
            let c = self.current();
            if c == EOF && self.pos >= self.src.len() {
                return Token::new("", TokenType::Eof, self.location());
            }

            if c.is_whitespace() {
                self.advance();
            } else if c == '/' && self.peek(1) == '/' {
                while self.current() != '\n' && self.pos < self.src.len() {
                    self.advance();
                }
            } else if c == '/' && self.peek(1) == '*' {
                self.skip_block_comment();
            } else if c == '#' {
                return self.lex_directive();
            } else if c.is_ascii_digit() {
                return self.lex_number();
            } else if c.is_ascii_alphabetic() || c == '_' {
                return self.lex_word();
            } else if c == '"' {
                return self.lex_quoted('"', TokenType::StringLiteral);
            } else if c == '\'' {
                return self.lex_quoted('\'', TokenType::CharLiteral);
            } else if let Some(token) = self.lex_operator(c) {
                return token;
            } else {
                let pos = self.location();
                self.report(pos, format!("unrecognized character '{}'", c.escape_default()));
                self.advance();
            }
        }
    }

    fn peek(&self, offset: usize) -> char {
        self.src.get(self.pos + offset).copied().unwrap_or(EOF)
    }

    fn current(&self) -> char {
        self.peek(0)
    }

    fn advance(&mut self) {
        if let Some(&c) = self.src.get(self.pos) {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn consume(&mut self) -> char {
        let curr = self.current();
        self.advance();
        curr
    }

    fn location(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn report(&mut self, pos: Position, message: String) {
        log::debug!("lex error at {}: {}", pos, message);
        self.diagnostics.push(Diagnostic::new(Category::LexError, pos, message));
    }

    fn skip_block_comment(&mut self) {
        let start = self.location();
        self.advance();
        self.advance();
        loop {
            if self.pos >= self.src.len() {
                self.report(start, "unterminated block comment".to_string());
                return;
            }
            if self.current() == '*' && self.peek(1) == '/' {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }
    }

    fn lex_directive(&mut self) -> Token {
        let start = self.location();
        let mut value = String::new();
        while self.current() != '\n' && self.pos < self.src.len() {
            value.push(self.consume());
        }
        Token::new(value.trim_end(), TokenType::Directive, start)
    }

    fn lex_number(&mut self) -> Token {
        let start = self.location();
        let mut value = String::new();
        while self.current().is_ascii_digit() {
            value.push(self.consume());
        }

        if self.current() == '.' && self.peek(1).is_ascii_digit() {
            value.push(self.consume());
            while self.current().is_ascii_digit() {
                value.push(self.consume());
            }
            return Token::new(value, TokenType::FloatLiteral, start);
        }

        Token::new(value, TokenType::IntegerLiteral, start)
    }

    fn lex_word(&mut self) -> Token {
        let start = self.location();
        let mut value = String::new();
        while self.current().is_ascii_alphanumeric() || self.current() == '_' {
            value.push(self.consume());
        }

        let token_type = get_word_token_type(value.as_str());
        Token::new(value, token_type, start)
    }

    /// String and char literals. The token value keeps the quotes and
    /// escapes exactly as written; the parser decodes them.
    fn lex_quoted(&mut self, quote: char, token_type: TokenType) -> Token {
        let start = self.location();
        let mut value = String::from(self.consume());
        loop {
            let c = self.current();
            if self.pos >= self.src.len() || c == '\n' {
                let what = if quote == '"' { "string" } else { "character" };
                self.report(start, format!("unterminated {} literal", what));
                break;
            }
            value.push(self.consume());
            if c == '\\' {
                if self.pos < self.src.len() && self.current() != '\n' {
                    value.push(self.consume());
                }
            } else if c == quote {
                break;
            }
        }
        Token::new(value, token_type, start)
    }

    fn lex_operator(&mut self, c: char) -> Option<Token> {
        let mut token_type = SINGLE_CHAR_TOKENS.get(&c).copied()?;
        let pos = self.location();
        let mut value = String::from(c);

        macro_rules! match_double_char_token {
            ($next:expr, $token_type:expr) => {
                if self.peek(1) == $next {
                    value.push($next);
                    token_type = $token_type;
                    self.advance();
                }
            };
        }

        match c {
            '|' => match_double_char_token!('|', TokenType::BarBar),
            '&' => match_double_char_token!('&', TokenType::AndAnd),
            '=' => match_double_char_token!('=', TokenType::EqualsEquals),
            '!' => match_double_char_token!('=', TokenType::NotEquals),
            '>' => match_double_char_token!('=', TokenType::GreaterThanEquals),
            '<' => match_double_char_token!('=', TokenType::LessThanEquals),
            _ => {}
        }
        self.advance();

        Some(Token::new(value, token_type, pos))
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.token_type == TokenType::Eof {
            self.finished = true;
        }
        Some(token)
    }
}

fn get_word_token_type(word: &str) -> TokenType {
    if let Some(token_type) = TYPES.get(word) {
        *token_type
    } else if let Some(token_type) = KEYWORDS.get(word) {
        *token_type
    } else {
        TokenType::Identifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::iter::zip;

    fn token(value: &str, token_type: TokenType, line: usize, column: usize) -> Token {
        Token::new(value, token_type, Position::new(line, column))
    }

    #[rstest::rstest]
    #[case("0", TokenType::IntegerLiteral)]
    #[case("123", TokenType::IntegerLiteral)]
    #[case("3.14", TokenType::FloatLiteral)]
    #[case("1.0", TokenType::FloatLiteral)]
    fn test_lex_number(#[case] test_case: &str, #[case] expected_type: TokenType) {
        let tokens = Lexer::new(test_case).lex();
        assert_eq!(2, tokens.len());
        assert_eq!(test_case, tokens[0].value);
        assert_eq!(expected_type, tokens[0].token_type);
        assert_eq!(TokenType::Eof, tokens[1].token_type);
    }

    #[rstest::rstest]
    #[case("+", TokenType::Plus)]
    #[case("=", TokenType::Equals)]
    #[case("%", TokenType::Percent)]
    #[case("^", TokenType::Caret)]
    #[case("&", TokenType::And)]
    #[case("&&", TokenType::AndAnd)]
    #[case("|", TokenType::Bar)]
    #[case("||", TokenType::BarBar)]
    #[case("==", TokenType::EqualsEquals)]
    #[case("!=", TokenType::NotEquals)]
    #[case("!", TokenType::Bang)]
    #[case(">=", TokenType::GreaterThanEquals)]
    #[case("<=", TokenType::LessThanEquals)]
    #[case("{", TokenType::OpenCurly)]
    #[case("int", TokenType::Int)]
    #[case("double", TokenType::Double)]
    #[case("void", TokenType::Void)]
    #[case("static", TokenType::Static)]
    #[case("const", TokenType::Const)]
    #[case("break", TokenType::Break)]
    #[case("while", TokenType::While)]
    #[case("hello", TokenType::Identifier)]
    #[case("_under_score9", TokenType::Identifier)]
    #[case("integer", TokenType::Identifier)]
    fn test_lex_single_token(#[case] test_case: &str, #[case] expected_type: TokenType) {
        let tokens = Lexer::new(test_case).lex();
        assert_eq!(2, tokens.len());
        assert_eq!(test_case, tokens[0].value);
        assert_eq!(expected_type, tokens[0].token_type);
    }

    #[rstest::rstest]
    #[case("// This is a comment ending with EOF")]
    #[case("// This is a comment ending with a new line\n")]
    #[case("/* block\n comment */")]
    fn test_comment(#[case] test_case: &str) {
        let mut lexer = Lexer::new(test_case);
        let tokens = lexer.lex();
        assert_eq!(1, tokens.len());
        assert_eq!(TokenType::Eof, tokens[0].token_type);
        assert!(lexer.diagnostics().is_empty());
    }

    #[test]
    fn test_positions_across_lines() {
        let result = Lexer::new("int x = 5\nfloat y;").lex();
        let expected = vec![
            token("int", TokenType::Int, 1, 1),
            token("x", TokenType::Identifier, 1, 5),
            token("=", TokenType::Equals, 1, 7),
            token("5", TokenType::IntegerLiteral, 1, 9),
            token("float", TokenType::Float, 2, 1),
            token("y", TokenType::Identifier, 2, 7),
            token(";", TokenType::SemiColon, 2, 8),
            token("", TokenType::Eof, 2, 9),
        ];
        assert_eq!(expected.len(), result.len());
        for (x, y) in zip(expected, result) {
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_token_end() {
        let tokens = Lexer::new("    return 5").lex();
        assert_eq!(Position::new(1, 13), tokens[1].end());
    }

    #[rstest::rstest]
    #[case("\"Outer a = %d\\n\"", TokenType::StringLiteral)]
    #[case("'A'", TokenType::CharLiteral)]
    #[case("'\\n'", TokenType::CharLiteral)]
    fn test_quoted_literals_keep_lexeme(#[case] test_case: &str, #[case] expected_type: TokenType) {
        let mut lexer = Lexer::new(test_case);
        let tokens = lexer.lex();
        assert_eq!(2, tokens.len());
        assert_eq!(expected_type, tokens[0].token_type);
        assert_eq!(test_case, tokens[0].value);
        assert!(lexer.diagnostics().is_empty());
    }

    #[test]
    fn test_unterminated_string_is_reported() {
        let mut lexer = Lexer::new("\"abc\nint");
        let tokens = lexer.lex();
        assert_eq!(TokenType::StringLiteral, tokens[0].token_type);
        assert_eq!(TokenType::Int, tokens[1].token_type);
        assert_eq!(1, lexer.diagnostics().len());
        assert_eq!(Category::LexError, lexer.diagnostics()[0].category);
    }

    #[test]
    fn test_directive_is_one_token() {
        let tokens = Lexer::new("#include <stdio.h>\nint").lex();
        assert_eq!(3, tokens.len());
        assert_eq!(token("#include <stdio.h>", TokenType::Directive, 1, 1), tokens[0]);
        assert_eq!(TokenType::Int, tokens[1].token_type);
    }

    #[rstest::rstest]
    #[case("int @x;", 1, 5)]
    #[case("x = 1 $ 2;", 1, 7)]
    #[case("a\n  `", 2, 3)]
    fn test_unknown_character_is_skipped(#[case] test_case: &str, #[case] line: usize, #[case] column: usize) {
        let mut lexer = Lexer::new(test_case);
        let tokens = lexer.lex();
        assert!(tokens
            .iter()
            .all(|t| !t.value.contains(|c: char| matches!(c, '@' | '$' | '`'))));
        let diagnostics = lexer.take_diagnostics();
        assert_eq!(1, diagnostics.len());
        assert_eq!(Category::LexError, diagnostics[0].category);
        assert_eq!(Position::new(line, column), diagnostics[0].position());
    }

    #[test]
    fn test_lexing_is_lazy_and_restartable() {
        let mut lexer = Lexer::new("int x;");
        let first: Vec<_> = lexer.by_ref().take(2).collect();
        assert_eq!(TokenType::Int, first[0].token_type);
        assert_eq!(TokenType::Identifier, first[1].token_type);

        lexer.reset();
        let all = lexer.lex();
        assert_eq!(4, all.len());
        assert_eq!(TokenType::Int, all[0].token_type);
        assert_eq!(None, lexer.next());
    }

    #[test]
    fn test_iterator_adapters_on_lexer() {
        let mut lexer = Lexer::new("int x = 1;");
        assert_eq!(Some(4), lexer.position(|t| t.token_type == TokenType::SemiColon));

        lexer.reset();
        let first_literal = lexer.find(|t| t.token_type == TokenType::IntegerLiteral);
        assert_eq!(Some(Position::new(1, 9)), first_literal.map(|t| t.pos));
    }
}
