use crate::script::tokenizer::{tokenize, TokenKind};

use TokenKind as TK;

fn kinds(text: &str) -> Vec<TokenKind> {
    tokenize(text).kinds()
}

#[test]
fn test_dice_and_identifiers() {
    assert_eq!(kinds("3d6h2 + x"), vec![TK::Dice, TK::Plus, TK::Ident, TK::End]);
    assert_eq!(kinds("d20 1d6r1h2"), vec![TK::Dice, TK::Dice, TK::End]);

    // A dice pattern running into identifier characters is an identifier
    let buffer = tokenize("d20x dd6 d");
    assert_eq!(buffer.kinds(), vec![TK::Ident, TK::Ident, TK::Ident, TK::End]);
    assert_eq!(buffer.tokens[0].text, "d20x");
}

#[test]
fn test_longest_operator_wins() {
    assert_eq!(kinds(">>* <> >> << >="), vec![
        TK::ShiftRightStar, TK::Diamond, TK::ShiftRight, TK::ShiftLeft, TK::GreaterEquals, TK::End
    ]);
    assert_eq!(kinds("x ^= 2"), vec![TK::Ident, TK::CaretEquals, TK::Integer, TK::End]);
    assert_eq!(kinds("a=>b==c"), vec![TK::Ident, TK::FatArrow, TK::Ident, TK::EqualEqual, TK::Ident, TK::End]);
    assert_eq!(kinds("1..3"), vec![TK::Integer, TK::DotDot, TK::Integer, TK::End]);
}

#[test]
fn test_string_escapes() {
    let buffer = tokenize(r#""say \"hi\" \\ now""#);
    assert_eq!(buffer.kinds(), vec![TK::String, TK::End]);
    assert_eq!(buffer.tokens[0].text, r#"say "hi" \ now"#);

    // Other escapes are kept as written
    let buffer = tokenize(r#""a\nb""#);
    assert_eq!(buffer.tokens[0].text, r#"a\nb"#);

    let buffer = tokenize("\"épée\"");
    assert_eq!(buffer.tokens[0].text, "épée");
}

#[test]
fn test_stored_expression() {
    let buffer = tokenize("e = `x * 10`");
    assert_eq!(buffer.kinds(), vec![TK::Ident, TK::Equal, TK::Stored, TK::End]);
    assert_eq!(buffer.tokens[2].text, "x * 10");
}

#[test]
fn test_keywords_ignore_case() {
    assert_eq!(kinds("FOR If else iffy"), vec![TK::KwFor, TK::KwIf, TK::KwElse, TK::Ident, TK::End]);
}

#[test]
fn test_unterminated_literal_is_unknown() {
    let buffer = tokenize("1 + \"abc");
    assert_eq!(buffer.kinds(), vec![TK::Integer, TK::Plus, TK::Unknown, TK::End]);
    assert_eq!(buffer.tokens[2].text, "\"abc");

    assert_eq!(kinds("1 \\ 2"), vec![TK::Integer, TK::Unknown, TK::Integer, TK::End]);
}

#[test]
fn test_spans() {
    let buffer = tokenize("ab + 12");
    let plus = &buffer.tokens[1];
    assert_eq!(plus.span.begin.offset, 3);
    assert_eq!(plus.span.end.offset, 4);
    let end = &buffer.tokens[3];
    assert_eq!(end.span.begin.offset, 7);
}
