mod tokens;

pub use tokens::*;

use crate::script::input_source::InputSource;
use crate::script::parser::token_parsing::keyword_kind;

/// Turns script text into a `TokenBuffer`. Tokenizing never fails: characters
/// that cannot start any token become `Unknown` tokens and the parser turns
/// those into error nodes. The buffer always ends with an `End` token.
pub(crate) struct Tokenizer {}

impl Tokenizer {
    pub(crate) fn new() -> Self {
        Self{}
    }

    pub(crate) fn tokenize(&mut self, source: &mut InputSource, target: &mut TokenBuffer) {
        debug_assert_eq!(source.pos().offset, 0);
        debug_assert!(target.tokens.is_empty());

        while let Some(c) = source.next() {
            if is_whitespace(c) {
                source.consume();
            } else if c == b'"' {
                self.consume_delimited(b'"', TokenKind::String, source, target);
            } else if c == b'`' {
                self.consume_delimited(b'`', TokenKind::Stored, source, target);
            } else if let Some(length) = dice_length(source) {
                self.consume_dice(length, source, target);
            } else if is_identifier_start(c) {
                self.consume_identifier(source, target);
            } else if is_integer_literal_start(c) {
                self.consume_number(source, target);
            } else if !self.maybe_parse_punctuation(c, source, target) {
                let begin = source.pos();
                source.consume();
                let end = source.pos();
                let text = source.section_at_pos(begin, end);
                target.tokens.push(Token::new(TokenKind::Unknown, text, begin, end));
            }
        }

        let end = source.pos();
        target.tokens.push(Token::new(TokenKind::End, "", end, end));
    }

    fn maybe_parse_punctuation(&mut self, first_char: u8, source: &mut InputSource, target: &mut TokenBuffer) -> bool {
        let pos = source.pos();
        let token_kind;
        if first_char == b'!' {
            source.consume();
            if Some(b'=') == source.next() {
                source.consume();
                token_kind = TokenKind::NotEqual;
            } else {
                token_kind = TokenKind::Exclamation;
            }
        } else if first_char == b'%' {
            source.consume();
            if Some(b'=') == source.next() {
                source.consume();
                token_kind = TokenKind::PercentEquals;
            } else {
                token_kind = TokenKind::Percent;
            }
        } else if first_char == b'&' {
            source.consume();
            if Some(b'&') == source.next() {
                source.consume();
                token_kind = TokenKind::AndAnd;
            } else {
                token_kind = TokenKind::And;
            }
        } else if first_char == b'(' {
            source.consume();
            token_kind = TokenKind::OpenParen;
        } else if first_char == b')' {
            source.consume();
            token_kind = TokenKind::CloseParen;
        } else if first_char == b'*' {
            source.consume();
            if Some(b'=') == source.next() {
                source.consume();
                token_kind = TokenKind::StarEquals;
            } else {
                token_kind = TokenKind::Star;
            }
        } else if first_char == b'+' {
            source.consume();
            if Some(b'=') == source.next() {
                source.consume();
                token_kind = TokenKind::PlusEquals;
            } else {
                token_kind = TokenKind::Plus;
            }
        } else if first_char == b',' {
            source.consume();
            token_kind = TokenKind::Comma;
        } else if first_char == b'-' {
            source.consume();
            if Some(b'=') == source.next() {
                source.consume();
                token_kind = TokenKind::MinusEquals;
            } else {
                token_kind = TokenKind::Minus;
            }
        } else if first_char == b'.' {
            source.consume();
            if Some(b'.') == source.next() {
                source.consume();
                token_kind = TokenKind::DotDot;
            } else {
                token_kind = TokenKind::Dot;
            }
        } else if first_char == b'/' {
            source.consume();
            if Some(b'=') == source.next() {
                source.consume();
                token_kind = TokenKind::SlashEquals;
            } else {
                token_kind = TokenKind::Slash;
            }
        } else if first_char == b':' {
            source.consume();
            token_kind = TokenKind::Colon;
        } else if first_char == b';' {
            source.consume();
            token_kind = TokenKind::SemiColon;
        } else if first_char == b'<' {
            source.consume();
            let next = source.next();
            if Some(b'<') == next {
                source.consume();
                token_kind = TokenKind::ShiftLeft;
            } else if Some(b'=') == next {
                source.consume();
                token_kind = TokenKind::LessEquals;
            } else if Some(b'>') == next {
                source.consume();
                token_kind = TokenKind::Diamond;
            } else {
                token_kind = TokenKind::OpenAngle;
            }
        } else if first_char == b'=' {
            source.consume();
            let next = source.next();
            if Some(b'=') == next {
                source.consume();
                token_kind = TokenKind::EqualEqual;
            } else if Some(b'>') == next {
                source.consume();
                token_kind = TokenKind::FatArrow;
            } else {
                token_kind = TokenKind::Equal;
            }
        } else if first_char == b'>' {
            source.consume();
            let next = source.next();
            if Some(b'>') == next {
                source.consume();
                if Some(b'*') == source.next() {
                    source.consume();
                    token_kind = TokenKind::ShiftRightStar;
                } else {
                    token_kind = TokenKind::ShiftRight;
                }
            } else if Some(b'=') == next {
                source.consume();
                token_kind = TokenKind::GreaterEquals;
            } else {
                token_kind = TokenKind::CloseAngle;
            }
        } else if first_char == b'?' {
            source.consume();
            token_kind = TokenKind::Question;
        } else if first_char == b'@' {
            source.consume();
            token_kind = TokenKind::At;
        } else if first_char == b'#' {
            source.consume();
            token_kind = TokenKind::Pound;
        } else if first_char == b'$' {
            source.consume();
            token_kind = TokenKind::Dollar;
        } else if first_char == b'\'' {
            source.consume();
            token_kind = TokenKind::Quote;
        } else if first_char == b'[' {
            source.consume();
            token_kind = TokenKind::OpenSquare;
        } else if first_char == b']' {
            source.consume();
            token_kind = TokenKind::CloseSquare;
        } else if first_char == b'^' {
            source.consume();
            if Some(b'=') == source.next() {
                source.consume();
                token_kind = TokenKind::CaretEquals;
            } else {
                token_kind = TokenKind::Caret;
            }
        } else if first_char == b'{' {
            source.consume();
            token_kind = TokenKind::OpenCurly;
        } else if first_char == b'|' {
            source.consume();
            if Some(b'|') == source.next() {
                source.consume();
                token_kind = TokenKind::OrOr;
            } else {
                token_kind = TokenKind::Or;
            }
        } else if first_char == b'}' {
            source.consume();
            token_kind = TokenKind::CloseCurly;
        } else if first_char == b'~' {
            source.consume();
            token_kind = TokenKind::Tilde;
        } else {
            return false;
        }

        let end = source.pos();
        target.tokens.push(Token::new(token_kind, token_kind.token_chars(), pos, end));
        true
    }

    /// Consumes a string or stored-expression literal. The token text holds
    /// the contents without delimiters and with escapes resolved. A literal
    /// that runs into the end of the input becomes an `Unknown` token.
    fn consume_delimited(&mut self, delimiter: u8, kind: TokenKind, source: &mut InputSource, target: &mut TokenBuffer) {
        let begin = source.pos();
        debug_assert_eq!(source.next(), Some(delimiter));
        source.consume();

        let mut contents = Vec::new();
        let mut terminated = false;
        while let Some(c) = source.next() {
            let at = source.pos();
            source.consume();
            if c == delimiter {
                terminated = true;
                break;
            }

            if c == b'\\' {
                if let Some(escaped) = source.next() {
                    if escaped == delimiter || escaped == b'\\' {
                        source.consume();
                        contents.push(escaped);
                        continue;
                    }
                }
            }

            contents.extend_from_slice(source.section_at_pos(at, source.pos()).as_bytes());
        }

        let end = source.pos();
        if terminated {
            let text = String::from_utf8_lossy(&contents).into_owned();
            target.tokens.push(Token::new(kind, text, begin, end));
        } else {
            let text = source.section_at_pos(begin, end);
            target.tokens.push(Token::new(TokenKind::Unknown, text, begin, end));
        }
    }

    fn consume_dice(&mut self, length: usize, source: &mut InputSource, target: &mut TokenBuffer) {
        let begin = source.pos();
        for _ in 0..length {
            source.consume();
        }
        let end = source.pos();
        let text = source.section_at_pos(begin, end);
        target.tokens.push(Token::new(TokenKind::Dice, text, begin, end));
    }

    fn consume_identifier(&mut self, source: &mut InputSource, target: &mut TokenBuffer) {
        let begin = source.pos();
        while let Some(c) = source.next() {
            if !is_identifier_remaining(c) {
                break;
            }
            source.consume();
        }
        let end = source.pos();
        let text = source.section_at_pos(begin, end);

        let kind = keyword_kind(text).unwrap_or(TokenKind::Ident);
        target.tokens.push(Token::new(kind, text, begin, end));
    }

    fn consume_number(&mut self, source: &mut InputSource, target: &mut TokenBuffer) {
        let begin = source.pos();
        while let Some(c) = source.next() {
            if !c.is_ascii_digit() {
                break;
            }
            source.consume();
        }
        let end = source.pos();
        let text = source.section_at_pos(begin, end);
        target.tokens.push(Token::new(TokenKind::Integer, text, begin, end));
    }
}

/// Tokenizes an entire script.
pub fn tokenize(text: &str) -> TokenBuffer {
    let mut source = InputSource::new(text);
    let mut buffer = TokenBuffer::new();
    Tokenizer::new().tokenize(&mut source, &mut buffer);
    buffer
}

/// Matches `[0-9]{0,3} d [0-9]{1,3} ([rhl][0-9]{1,3}){0,2}` at the current
/// position and returns the length of the match. The match must not be
/// followed by an identifier character, so `d20x` stays an identifier.
fn dice_length(source: &InputSource) -> Option<usize> {
    let digits_at = |start: usize, max: usize| -> usize {
        let mut count = 0;
        while count < max {
            match source.lookahead(start + count) {
                Some(c) if c.is_ascii_digit() => count += 1,
                _ => break,
            }
        }
        count
    };

    let mut length = digits_at(0, 3);
    if source.lookahead(length) != Some(b'd') {
        return None;
    }
    length += 1;

    let sides = digits_at(length, 3);
    if sides == 0 {
        return None;
    }
    length += sides;

    for _ in 0..2 {
        match source.lookahead(length) {
            Some(b'r') | Some(b'h') | Some(b'l') => {
                let amount = digits_at(length + 1, 3);
                if amount == 0 {
                    break;
                }
                length += 1 + amount;
            },
            _ => break,
        }
    }

    match source.lookahead(length) {
        Some(c) if is_identifier_remaining(c) => None,
        _ => Some(length),
    }
}

#[inline]
fn is_whitespace(c: u8) -> bool {
    c == b' ' || c == b'\t' || c == b'\n' || c == b'\r'
}

#[inline]
fn is_identifier_start(c: u8) -> bool {
    (c >= b'a' && c <= b'z') ||
        (c >= b'A' && c <= b'Z') ||
        c == b'_'
}

#[inline]
fn is_identifier_remaining(c: u8) -> bool {
    (c >= b'0' && c <= b'9') ||
        (c >= b'a' && c <= b'z') ||
        (c >= b'A' && c <= b'Z') ||
        c == b'_'
}

#[inline]
fn is_integer_literal_start(c: u8) -> bool {
    c >= b'0' && c <= b'9'
}
