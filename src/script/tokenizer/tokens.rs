use crate::script::input_source::{InputPosition, InputSpan};

/// Represents a particular kind of token. Tokens up to and including `Unknown`
/// carry variable text, the remaining ones are fixed punctuation, operators or
/// keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    // Variable-character tokens
    Ident,          // identifier
    Integer,        // integer literal
    String,         // string literal, text excludes the quotes
    Stored,         // stored expression, text excludes the backticks
    Dice,           // dice pattern, e.g. 4d6h3
    Unknown,        // character we could not make sense of
    // Punctuation (single character)
    Exclamation,    // !
    Question,       // ?
    Pound,          // #
    Dollar,         // $
    At,             // @
    Tilde,          // ~
    Quote,          // '
    OpenCurly,      // {
    OpenParen,      // (
    OpenSquare,     // [
    CloseCurly,     // }
    CloseParen,     // )
    CloseSquare,    // ]
    Colon,          // :
    Comma,          // ,
    Dot,            // .
    SemiColon,      // ;
    // Operator-like (single character)
    Plus,           // +
    Minus,          // -
    Star,           // *
    Slash,          // /
    Percent,        // %
    Caret,          // ^
    And,            // &
    Or,             // |
    Equal,          // =
    OpenAngle,      // <
    CloseAngle,     // >
    // Two characters
    DotDot,         // ..
    FatArrow,       // =>
    PlusEquals,     // +=
    MinusEquals,    // -=
    StarEquals,     // *=
    SlashEquals,    // /=
    PercentEquals,  // %=
    CaretEquals,    // ^=
    AndAnd,         // &&
    OrOr,           // ||
    EqualEqual,     // ==
    NotEqual,       // !=
    LessEquals,     // <=
    GreaterEquals,  // >=
    ShiftLeft,      // <<
    ShiftRight,     // >>
    Diamond,        // <>
    // Three characters
    ShiftRightStar, // >>*
    // Keywords
    KwFor,
    KwIf,
    KwElse,
    // End of input, always the last token
    End,
}

impl TokenKind {
    /// Returns true for tokens whose text varies.
    pub fn has_variable_text(&self) -> bool {
        *self <= TokenKind::Unknown
    }

    /// Returns the characters that are represented by the token. For tokens
    /// with variable text this returns a description instead.
    pub fn token_chars(&self) -> &'static str {
        use TokenKind as TK;
        match self {
            TK::Ident => "identifier",
            TK::Integer => "integer",
            TK::String => "string",
            TK::Stored => "stored expression",
            TK::Dice => "dice",
            TK::Unknown => "unknown character",
            TK::Exclamation => "!",
            TK::Question => "?",
            TK::Pound => "#",
            TK::Dollar => "$",
            TK::At => "@",
            TK::Tilde => "~",
            TK::Quote => "'",
            TK::OpenCurly => "{",
            TK::OpenParen => "(",
            TK::OpenSquare => "[",
            TK::CloseCurly => "}",
            TK::CloseParen => ")",
            TK::CloseSquare => "]",
            TK::Colon => ":",
            TK::Comma => ",",
            TK::Dot => ".",
            TK::SemiColon => ";",
            TK::Plus => "+",
            TK::Minus => "-",
            TK::Star => "*",
            TK::Slash => "/",
            TK::Percent => "%",
            TK::Caret => "^",
            TK::And => "&",
            TK::Or => "|",
            TK::Equal => "=",
            TK::OpenAngle => "<",
            TK::CloseAngle => ">",
            TK::DotDot => "..",
            TK::FatArrow => "=>",
            TK::PlusEquals => "+=",
            TK::MinusEquals => "-=",
            TK::StarEquals => "*=",
            TK::SlashEquals => "/=",
            TK::PercentEquals => "%=",
            TK::CaretEquals => "^=",
            TK::AndAnd => "&&",
            TK::OrOr => "||",
            TK::EqualEqual => "==",
            TK::NotEqual => "!=",
            TK::LessEquals => "<=",
            TK::GreaterEquals => ">=",
            TK::ShiftLeft => "<<",
            TK::ShiftRight => ">>",
            TK::Diamond => "<>",
            TK::ShiftRightStar => ">>*",
            TK::KwFor => "for",
            TK::KwIf => "if",
            TK::KwElse => "else",
            TK::End => "end of input",
        }
    }
}

/// Represents a single token. Tokens are immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: InputSpan,
}

impl Token {
    pub(crate) fn new<S: Into<String>>(kind: TokenKind, text: S, begin: InputPosition, end: InputPosition) -> Self {
        Self{ kind, text: text.into(), span: InputSpan::from_positions(begin, end) }
    }

    /// Text as it should appear in diagnostics
    pub fn display_text(&self) -> &str {
        match self.kind {
            TokenKind::End => "",
            _ if self.kind.has_variable_text() => &self.text,
            _ => self.kind.token_chars(),
        }
    }
}

/// The output of tokenizing a script.
#[derive(Debug, Default)]
pub struct TokenBuffer {
    pub tokens: Vec<Token>,
}

impl TokenBuffer {
    pub(crate) fn new() -> Self {
        Self{ tokens: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn kinds(&self) -> Vec<TokenKind> {
        self.tokens.iter().map(|t| t.kind).collect()
    }
}
