use crate::lexical_analysis::tokens::{Position, TokenType};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TypeSpecifier {
    Int,
    Float,
    Char,
    Double,
    Void,
}

impl TypeSpecifier {
    pub fn from_token_type(token_type: TokenType) -> Option<Self> {
        match token_type {
            TokenType::Int => Some(TypeSpecifier::Int),
            TokenType::Float => Some(TypeSpecifier::Float),
            TokenType::Char => Some(TypeSpecifier::Char),
            TokenType::Double => Some(TypeSpecifier::Double),
            TokenType::Void => Some(TypeSpecifier::Void),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DataType {
    pub specifier: TypeSpecifier,
    pub is_static: bool,
    pub is_const: bool,
}

impl DataType {
    pub fn new(specifier: TypeSpecifier) -> Self {
        Self {
            specifier,
            is_static: false,
            is_const: false,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Parameter {
    // None when the type specifier was missing in the source.
    pub data_type: Option<TypeSpecifier>,
    pub name: String,
    pub pos: Position,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOperator {
    Assign,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Not,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Char(char),
    String(String),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Binary(BinaryOperator, Box<Expression>, Box<Expression>, Position),
    Unary(UnaryOperator, Box<Expression>, Position),
    Call(String, Vec<Expression>, Position),
    Identifier(String, Position),
    Literal(Literal, Position),
    // Stands in for an operand or value the parser reported as missing.
    Invalid(Position),
}

impl Expression {
    pub fn position(&self) -> Position {
        match self {
            Expression::Binary(_, _, _, pos)
            | Expression::Unary(_, _, pos)
            | Expression::Call(_, _, pos)
            | Expression::Identifier(_, pos)
            | Expression::Literal(_, pos)
            | Expression::Invalid(pos) => *pos,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum ASTNode {
    Program(Vec<ASTNode>),
    Include(String, Position),
    FunctionDecl {
        return_type: DataType,
        name: String,
        params: Vec<Parameter>,
        // None for a prototype.
        body: Option<Vec<ASTNode>>,
        pos: Position,
    },
    VarDecl {
        data_type: DataType,
        name: String,
        init: Option<Expression>,
        pos: Position,
    },
    Block(Vec<ASTNode>, Position),
    If {
        condition: Expression,
        then_branch: Box<ASTNode>,
        else_branch: Option<Box<ASTNode>>,
        pos: Position,
    },
    While {
        condition: Expression,
        body: Box<ASTNode>,
        pos: Position,
    },
    For {
        init: Vec<ASTNode>,
        condition: Option<Expression>,
        step: Option<Expression>,
        body: Box<ASTNode>,
        pos: Position,
    },
    Return(Option<Expression>, Position),
    Break(Position),
    ExpressionStatement(Expression, Position),
}

impl ASTNode {
    pub fn position(&self) -> Position {
        match self {
            ASTNode::Program(_) => Position::new(1, 1),
            ASTNode::Include(_, pos)
            | ASTNode::Block(_, pos)
            | ASTNode::Return(_, pos)
            | ASTNode::Break(pos)
            | ASTNode::ExpressionStatement(_, pos) => *pos,
            ASTNode::FunctionDecl { pos, .. }
            | ASTNode::VarDecl { pos, .. }
            | ASTNode::If { pos, .. }
            | ASTNode::While { pos, .. }
            | ASTNode::For { pos, .. } => *pos,
        }
    }
}
