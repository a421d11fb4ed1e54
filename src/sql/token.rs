//! SQL Tokens - the atomic units of SQL output.
//!
//! Only the vocabulary needed for a single-aggregate `SELECT` is modelled.
//! Values never appear as tokens: they are bound through [`Token::Placeholder`].

/// SQL Token - every element the compiler can place in a statement.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    // === Keywords ===
    Select,
    From,
    Where,
    And,
    As,
    Distinct,

    // === Punctuation ===
    Comma,
    Star,
    LParen,
    RParen,
    Semicolon,

    // === Operators ===
    Eq,
    Gt,
    Gte,
    Lt,

    // === Whitespace ===
    Space,

    // === Dynamic Content ===
    /// Table or column name. Only names drawn from the schema registry
    /// reach this variant, so they are emitted verbatim.
    Ident(String),
    /// Named bind parameter, rendered as `:name`.
    Placeholder(String),
    /// Integer constant chosen by the compiler (never caller input).
    LitInt(i64),
    /// Function name, rendered upper-case.
    FunctionName(String),
}

impl Token {
    /// Serialize this token to SQL text.
    pub fn serialize(&self) -> String {
        match self {
            Token::Select => "SELECT".into(),
            Token::From => "FROM".into(),
            Token::Where => "WHERE".into(),
            Token::And => "AND".into(),
            Token::As => "AS".into(),
            Token::Distinct => "DISTINCT".into(),

            Token::Comma => ",".into(),
            Token::Star => "*".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Semicolon => ";".into(),

            Token::Eq => "=".into(),
            Token::Gt => ">".into(),
            Token::Gte => ">=".into(),
            Token::Lt => "<".into(),

            Token::Space => " ".into(),

            Token::Ident(name) => name.clone(),
            Token::Placeholder(name) => format!(":{}", name),
            Token::LitInt(n) => n.to_string(),
            Token::FunctionName(name) => name.to_uppercase(),
        }
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    /// Serialize all tokens to a SQL string.
    pub fn serialize(&self) -> String {
        self.tokens.iter().map(Token::serialize).collect()
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
}
