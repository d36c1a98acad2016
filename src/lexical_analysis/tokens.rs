use phf::phf_map;
use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenType {
    // Type specifiers
    Int,
    Float,
    Char,
    Double,
    Void,
    // Qualifiers
    Static,
    Const,
    // Keywords
    If,
    Else,
    While,
    For,
    Return,
    Break,

    Identifier,
    IntegerLiteral,
    FloatLiteral,
    CharLiteral,
    StringLiteral,
    Directive,

    Equals,
    EqualsEquals,
    Bang,
    NotEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    And,
    AndAnd,
    Bar,
    BarBar,
    Caret,
    OpenParen,
    CloseParen,
    OpenCurly,
    CloseCurly,
    Comma,
    SemiColon,
    Eof,
}

impl TokenType {
    pub fn is_type_specifier(&self) -> bool {
        matches!(
            self,
            TokenType::Int | TokenType::Float | TokenType::Char | TokenType::Double | TokenType::Void
        )
    }

    pub fn is_qualifier(&self) -> bool {
        matches!(self, TokenType::Static | TokenType::Const)
    }

    pub fn starts_declaration(&self) -> bool {
        self.is_type_specifier() || self.is_qualifier()
    }

    /// Keywords that can only appear at the start of a statement. Used as
    /// synchronization points after a parse error.
    pub fn starts_statement(&self) -> bool {
        self.starts_declaration()
            || matches!(
                self,
                TokenType::If
                    | TokenType::While
                    | TokenType::For
                    | TokenType::Return
                    | TokenType::Break
                    | TokenType::OpenCurly
            )
    }

    pub fn starts_expression(&self) -> bool {
        matches!(
            self,
            TokenType::Identifier
                | TokenType::IntegerLiteral
                | TokenType::FloatLiteral
                | TokenType::CharLiteral
                | TokenType::StringLiteral
                | TokenType::OpenParen
                | TokenType::Minus
                | TokenType::Plus
                | TokenType::Bang
        )
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub value: String,
    pub token_type: TokenType,
    pub pos: Position,
}

impl Token {
    pub fn new(value: impl Into<String>, token_type: TokenType, pos: Position) -> Self {
        Self {
            value: value.into(),
            token_type,
            pos,
        }
    }

    /// Position of the first column after the token. `value` is the raw
    /// lexeme and tokens never span lines.
    pub fn end(&self) -> Position {
        Position::new(self.pos.line, self.pos.column + self.value.chars().count())
    }

    /// Human readable form used in diagnostic messages.
    pub fn describe(&self) -> String {
        match self.token_type {
            TokenType::Eof => "end of input".to_string(),
            TokenType::StringLiteral => "string literal".to_string(),
            TokenType::Directive => "preprocessor directive".to_string(),
            _ => format!("'{}'", self.value),
        }
    }
}

pub static EOF: char = '\0';

pub const TYPES: phf::Map<&'static str, TokenType> = phf_map! {
    "int" => TokenType::Int,
    "float" => TokenType::Float,
    "char" => TokenType::Char,
    "double" => TokenType::Double,
    "void" => TokenType::Void,
};

pub const KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "static" => TokenType::Static,
    "const" => TokenType::Const,
    "if" => TokenType::If,
    "else" => TokenType::Else,
    "while" => TokenType::While,
    "for" => TokenType::For,
    "return" => TokenType::Return,
    "break" => TokenType::Break,
};

pub const SINGLE_CHAR_TOKENS: phf::Map<char, TokenType> = phf_map! {
    '+' => TokenType::Plus,
    '-' => TokenType::Minus,
    '*' => TokenType::Star,
    '/' => TokenType::Slash,
    '%' => TokenType::Percent,
    '=' => TokenType::Equals,
    '!' => TokenType::Bang,
    '<' => TokenType::LessThan,
    '>' => TokenType::GreaterThan,
    ';' => TokenType::SemiColon,
    ',' => TokenType::Comma,
    '(' => TokenType::OpenParen,
    ')' => TokenType::CloseParen,
    '{' => TokenType::OpenCurly,
    '}' => TokenType::CloseCurly,
    '^' => TokenType::Caret,
    '|' => TokenType::Bar,
    '&' => TokenType::And,
};
