use crate::script::ast::AssignmentOperator;
use crate::script::tokenizer::{Token, TokenKind};

// Keywords, matched case-insensitively
pub(crate) const KW_FOR:  &'static str = "for";
pub(crate) const KW_IF:   &'static str = "if";
pub(crate) const KW_ELSE: &'static str = "else";

// Builtin that shares its name with a keyword
pub(crate) const BUILTIN_IF: &'static str = "if";

// Parameters bound by the `=> { ... }` shorthand
pub(crate) const IMPLICIT_PARAMS: [&'static str; 2] = ["_", "I"];

// Single-character symbols
pub(crate) const SYMBOL_RANDOM: &'static str = "~";
pub(crate) const SYMBOL_COUNT:  &'static str = "#";

// Number of tokens on either side of a fault shown in syntax errors
const ERROR_WINDOW: usize = 2;

pub(crate) fn keyword_kind(text: &str) -> Option<TokenKind> {
    if text.eq_ignore_ascii_case(KW_FOR) {
        Some(TokenKind::KwFor)
    } else if text.eq_ignore_ascii_case(KW_IF) {
        Some(TokenKind::KwIf)
    } else if text.eq_ignore_ascii_case(KW_ELSE) {
        Some(TokenKind::KwElse)
    } else {
        None
    }
}

pub(crate) fn assignment_operator(kind: TokenKind) -> Option<AssignmentOperator> {
    use AssignmentOperator as AO;
    match kind {
        TokenKind::Equal => Some(AO::Set),
        TokenKind::PlusEquals => Some(AO::Added),
        TokenKind::MinusEquals => Some(AO::Subtracted),
        TokenKind::StarEquals => Some(AO::Multiplied),
        TokenKind::SlashEquals => Some(AO::Divided),
        TokenKind::PercentEquals => Some(AO::Remained),
        TokenKind::CaretEquals => Some(AO::Elevated),
        _ => None,
    }
}

fn closing_kind(open: TokenKind) -> Option<TokenKind> {
    match open {
        TokenKind::OpenParen => Some(TokenKind::CloseParen),
        TokenKind::OpenCurly => Some(TokenKind::CloseCurly),
        TokenKind::OpenSquare => Some(TokenKind::CloseSquare),
        _ => None,
    }
}

/// Finds the index of the token closing the bracket at `open_idx`. Only the
/// bracket kind at `open_idx` is counted, which is enough for well-formed
/// input and fails gracefully otherwise.
pub(crate) fn find_matching_close(tokens: &[Token], open_idx: usize) -> Option<usize> {
    let open = tokens.get(open_idx)?.kind;
    let close = closing_kind(open)?;

    let mut depth = 0u32;
    for (idx, token) in tokens.iter().enumerate().skip(open_idx) {
        if token.kind == open {
            depth += 1;
        } else if token.kind == close {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }

    None
}

/// Renders the tokens surrounding `idx`, used to localize syntax errors.
pub(crate) fn token_window(tokens: &[Token], idx: usize) -> String {
    let begin = idx.saturating_sub(ERROR_WINDOW);
    let end = (idx + ERROR_WINDOW + 1).min(tokens.len());

    let mut window = String::new();
    for token in &tokens[begin..end] {
        let text = token.display_text();
        if text.is_empty() {
            continue;
        }
        if !window.is_empty() {
            window.push(' ');
        }
        if token.kind == TokenKind::String {
            window.push('"');
            window.push_str(text);
            window.push('"');
        } else {
            window.push_str(text);
        }
    }

    window
}
