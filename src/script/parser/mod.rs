pub(crate) mod token_parsing;

use std::mem;

use crate::script::ast::*;
use crate::script::input_source::InputSource;
use crate::script::tokenizer::{Token, TokenBuffer, TokenKind, Tokenizer};

use token_parsing::*;

/// Result of parsing a construct that requires particular tokens. The error
/// variant is an `Expression::Error` node that takes the construct's place in
/// the tree.
type ParseResult = Result<ExpressionId, ExpressionId>;

/// Tokenizes and parses a script. Parsing never fails: syntax errors become
/// `Expression::Error` nodes in the returned tree.
pub fn parse(text: &str) -> Ast {
    let mut source = InputSource::new(text);
    let mut buffer = TokenBuffer::new();
    Tokenizer::new().tokenize(&mut source, &mut buffer);
    Parser::new(text, &buffer.tokens).parse()
}

/// Recursive descent parser, one function per precedence level. From lowest
/// to highest precedence:
///
/// sequence (`;`, `|`) > statement (`for`, assignment) > conditional (`if`,
/// `?:`) > `||` > `&&` > get-bonus (`$`) > equality (`==`, `!=`, `..`, `&`) >
/// relational > shift (`<<`, `>>`, `>>*`, `<>`) > additive > multiplicative >
/// pair (`:`) > unary > postfix (index, member, call) > leaf
pub(crate) struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    heap: Heap,
    // Set while parsing the then-branch of a ternary, where `:` ends the
    // branch instead of building a pair
    no_pair: bool,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        debug_assert!(tokens.last().map(|t| t.kind) == Some(TokenKind::End));
        Self{ source, tokens, pos: 0, heap: Heap::new(), no_pair: false }
    }

    pub(crate) fn parse(mut self) -> Ast {
        let root = self.parse_sequence(None);
        Ast{ heap: self.heap, root }
    }

    // -------------------------------------------------------------------------
    // Token iteration
    // -------------------------------------------------------------------------

    fn peek(&self) -> TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> TokenKind {
        self.tokens.get(self.pos + offset).map(|t| t.kind).unwrap_or(TokenKind::End)
    }

    /// Returns the current token and moves past it. The `End` token is never
    /// moved past.
    fn advance(&mut self) -> &'a Token {
        let tokens = self.tokens;
        let idx = self.pos.min(tokens.len() - 1);
        if tokens[idx].kind != TokenKind::End {
            self.pos = idx + 1;
        }
        &tokens[idx]
    }

    fn consume_if(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<(), ExpressionId> {
        if self.consume_if(kind) {
            Ok(())
        } else {
            Err(self.error_here(&format!("expected '{}' {}", kind.token_chars(), context)))
        }
    }

    fn alloc(&mut self, expression: Expression) -> ExpressionId {
        self.heap.alloc_expression(expression)
    }

    fn error_at(&mut self, token_idx: usize, message: &str) -> ExpressionId {
        let window = token_window(self.tokens, token_idx);
        let message = if window.is_empty() {
            message.to_string()
        } else {
            format!("{}: `{}`", message, window)
        };
        self.alloc(Expression::Error(message))
    }

    fn error_here(&mut self, message: &str) -> ExpressionId {
        self.error_at(self.pos, message)
    }

    fn is_error(&self, id: ExpressionId) -> bool {
        self.heap[id].is_error()
    }

    /// Runs `f` with pairs enabled, for constructs nested in brackets.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let old = mem::replace(&mut self.no_pair, false);
        let result = f(self);
        self.no_pair = old;
        result
    }

    // -------------------------------------------------------------------------
    // Sequences and statements
    // -------------------------------------------------------------------------

    fn at_sequence_end(&self, terminator: Option<TokenKind>) -> bool {
        let kind = self.peek();
        kind == TokenKind::End || Some(kind) == terminator
    }

    fn at_statement_end(&self, terminator: Option<TokenKind>) -> bool {
        let kind = self.peek();
        kind == TokenKind::SemiColon || kind == TokenKind::Or || self.at_sequence_end(terminator)
    }

    /// Statements separated by `;` or `|`, chained left to right. Stops in
    /// front of `terminator` (which is not consumed) or at the end of input.
    fn parse_sequence(&mut self, terminator: Option<TokenKind>) -> ExpressionId {
        let mut result: Option<ExpressionId> = None;
        let mut piped = false;
        loop {
            if self.at_sequence_end(terminator) {
                break;
            }
            if self.consume_if(TokenKind::SemiColon) {
                continue;
            }

            let mut statement = self.parse_statement();
            if !self.at_statement_end(terminator) {
                if !self.is_error(statement) {
                    let error = self.error_here("unexpected token");
                    statement = self.alloc(Expression::Multi{ first: statement, rest: error });
                }
                self.skip_statement(terminator);
            }

            result = Some(match result {
                None => statement,
                Some(first) if piped => self.alloc(Expression::Pipe{ first, rest: statement }),
                Some(first) => self.alloc(Expression::Multi{ first, rest: statement }),
            });

            match self.peek() {
                TokenKind::SemiColon => { self.advance(); piped = false; },
                TokenKind::Or => { self.advance(); piped = true; },
                _ => break,
            }
        }

        match result {
            Some(result) => result,
            None => self.alloc(Expression::Empty),
        }
    }

    /// Error recovery: skips to the end of the current statement, stepping
    /// over bracketed groups.
    fn skip_statement(&mut self, terminator: Option<TokenKind>) {
        let mut depth = 0u32;
        loop {
            let kind = self.peek();
            if kind == TokenKind::End {
                break;
            }
            if depth == 0 && (kind == TokenKind::SemiColon || kind == TokenKind::Or || Some(kind) == terminator) {
                break;
            }
            match kind {
                TokenKind::OpenParen | TokenKind::OpenCurly | TokenKind::OpenSquare => depth += 1,
                TokenKind::CloseParen | TokenKind::CloseCurly | TokenKind::CloseSquare => depth = depth.saturating_sub(1),
                _ => {},
            }
            self.advance();
        }
    }

    fn parse_statement(&mut self) -> ExpressionId {
        if self.peek() == TokenKind::KwFor {
            return self.parse_for().unwrap_or_else(|e| e);
        }

        let target = self.parse_conditional();
        let operation = match assignment_operator(self.peek()) {
            Some(operation) => operation,
            None => return target,
        };
        let operator_idx = self.pos;
        self.advance();
        let value = self.parse_statement();

        let target_name = match &self.heap[target] {
            Expression::Var(name) => Ok(Some(name.clone())),
            Expression::Key{ .. } => Ok(None),
            other => Err(other.kind_name()),
        };
        match target_name {
            Ok(Some(name)) => self.alloc(Expression::AssignVar{ name, operation, value }),
            Ok(None) => self.alloc(Expression::AssignKey{ target, operation, value }),
            Err(kind) => self.error_at(operator_idx, &format!("cannot assign to a {} expression", kind)),
        }
    }

    fn parse_for(&mut self) -> ParseResult {
        self.advance();
        let variable = match self.peek() {
            TokenKind::Ident => self.advance().text.clone(),
            _ => return Err(self.error_here("expected a loop variable after 'for'")),
        };
        self.expect(TokenKind::Comma, "after the loop variable")?;
        let iterable = self.nested(|p| p.parse_conditional());
        self.expect(TokenKind::Comma, "after the loop iterable")?;
        let body = self.parse_block("to open the loop body")?;

        Ok(self.alloc(Expression::For{ variable, iterable, body }))
    }

    /// `{ sequence }`
    fn parse_block(&mut self, context: &str) -> ParseResult {
        self.expect(TokenKind::OpenCurly, context)?;
        let body = self.nested(|p| p.parse_sequence(Some(TokenKind::CloseCurly)));
        self.expect(TokenKind::CloseCurly, "to close the block")?;
        Ok(body)
    }

    // -------------------------------------------------------------------------
    // Conditionals
    // -------------------------------------------------------------------------

    /// Whether the `if` at the current position is the builtin `if(c, a)`: a
    /// parenthesized group that is not followed by a block.
    fn is_builtin_if_call(&self) -> bool {
        if self.peek_at(1) != TokenKind::OpenParen {
            return false;
        }
        match find_matching_close(self.tokens, self.pos + 1) {
            Some(close_idx) => self.tokens.get(close_idx + 1).map(|t| t.kind) != Some(TokenKind::OpenCurly),
            None => true,
        }
    }

    fn parse_conditional(&mut self) -> ExpressionId {
        if self.peek() == TokenKind::KwIf && !self.is_builtin_if_call() {
            return self.parse_if().unwrap_or_else(|e| e);
        }

        let test = self.parse_logical_or();
        if !self.consume_if(TokenKind::Question) {
            return test;
        }

        let old = mem::replace(&mut self.no_pair, true);
        let then = self.parse_conditional();
        self.no_pair = old;
        if let Err(error) = self.expect(TokenKind::Colon, "in ternary expression") {
            return error;
        }
        let otherwise = self.parse_conditional();

        self.alloc(Expression::Ternary{ test, then, otherwise })
    }

    fn parse_if(&mut self) -> ParseResult {
        self.advance();
        let mut branches = Vec::new();
        loop {
            let condition = self.parse_logical_or();
            let body = self.parse_block("after the if condition")?;
            branches.push((Some(condition), body));

            if !self.consume_if(TokenKind::KwElse) {
                break;
            }
            if self.consume_if(TokenKind::KwIf) {
                continue;
            }

            let body = self.parse_block("after 'else'")?;
            branches.push((None, body));
            break;
        }

        Ok(self.alloc(Expression::If{ branches }))
    }

    // -------------------------------------------------------------------------
    // Binary operators
    // -------------------------------------------------------------------------

    fn parse_generic_binary<M, F>(&mut self, match_fn: M, higher_precedence_fn: F) -> ExpressionId
        where M: Fn(TokenKind) -> Option<BinaryOperator>,
              F: Fn(&mut Self) -> ExpressionId
    {
        let mut result = higher_precedence_fn(self);
        while let Some(operation) = match_fn(self.peek()) {
            self.advance();
            let left = result;
            let right = higher_precedence_fn(self);
            result = self.alloc(Expression::Binary{ left, operation, right });
        }

        result
    }

    fn parse_logical_or(&mut self) -> ExpressionId {
        self.parse_generic_binary(
            |token| match token {
                TokenKind::OrOr => Some(BinaryOperator::LogicalOr),
                _ => None,
            },
            Self::parse_logical_and
        )
    }

    fn parse_logical_and(&mut self) -> ExpressionId {
        self.parse_generic_binary(
            |token| match token {
                TokenKind::AndAnd => Some(BinaryOperator::LogicalAnd),
                _ => None,
            },
            Self::parse_get_bonus
        )
    }

    /// `STAT $ TYPE`. A bare identifier on the right names the bonus type.
    fn parse_get_bonus(&mut self) -> ExpressionId {
        let mut result = self.parse_equality();
        while self.consume_if(TokenKind::Dollar) {
            let right = match self.bare_word() {
                Some(word) => self.alloc(Expression::StringLit(word)),
                None => self.parse_equality(),
            };
            result = self.alloc(Expression::Binary{ left: result, operation: BinaryOperator::GetBonus, right });
        }

        result
    }

    fn parse_equality(&mut self) -> ExpressionId {
        self.parse_generic_binary(
            |token| match token {
                TokenKind::EqualEqual => Some(BinaryOperator::Equality),
                TokenKind::NotEqual => Some(BinaryOperator::Inequality),
                TokenKind::DotDot => Some(BinaryOperator::Range),
                TokenKind::And => Some(BinaryOperator::HasFlag),
                _ => None,
            },
            Self::parse_relational
        )
    }

    fn parse_relational(&mut self) -> ExpressionId {
        self.parse_generic_binary(
            |token| match token {
                TokenKind::OpenAngle => Some(BinaryOperator::LessThan),
                TokenKind::CloseAngle => Some(BinaryOperator::GreaterThan),
                TokenKind::LessEquals => Some(BinaryOperator::LessThanEqual),
                TokenKind::GreaterEquals => Some(BinaryOperator::GreaterThanEqual),
                _ => None,
            },
            Self::parse_shift
        )
    }

    fn parse_shift(&mut self) -> ExpressionId {
        let mut result = self.parse_additive();
        loop {
            let operation = match self.peek() {
                TokenKind::ShiftLeft => ShiftOperator::Push,
                TokenKind::ShiftRight => ShiftOperator::Pull,
                TokenKind::ShiftRightStar => ShiftOperator::Append,
                TokenKind::Diamond => ShiftOperator::Arrange,
                _ => break,
            };
            self.advance();
            let left = result;
            let right = self.parse_additive();
            result = self.alloc(Expression::Shift{ left, operation, right });
        }

        result
    }

    fn parse_additive(&mut self) -> ExpressionId {
        self.parse_generic_binary(
            |token| match token {
                TokenKind::Plus => Some(BinaryOperator::Add),
                TokenKind::Minus => Some(BinaryOperator::Subtract),
                _ => None,
            },
            Self::parse_multiplicative
        )
    }

    /// Multiplying or dividing a dice literal produces a `DiceMultiplier`,
    /// which decides at evaluation time whether to scale or repeat the roll.
    fn parse_multiplicative(&mut self) -> ExpressionId {
        let mut result = self.parse_pair();
        loop {
            let operation = match self.peek() {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                TokenKind::Percent => BinaryOperator::Remainder,
                _ => break,
            };
            self.advance();
            let right = self.parse_pair();

            let is_dice = match &self.heap[result] {
                Expression::Dice(_) => true,
                _ => false,
            };
            result = if is_dice && operation != BinaryOperator::Remainder {
                self.alloc(Expression::DiceMultiplier{ dice: result, count: right, operation })
            } else {
                self.alloc(Expression::Binary{ left: result, operation, right })
            };
        }

        result
    }

    fn parse_pair(&mut self) -> ExpressionId {
        let key = self.parse_unary();
        if self.no_pair || self.peek() != TokenKind::Colon {
            return key;
        }
        self.advance();
        let value = self.parse_pair();

        self.alloc(Expression::KeyValue{ key, value })
    }

    // -------------------------------------------------------------------------
    // Unary and postfix
    // -------------------------------------------------------------------------

    fn parse_unary(&mut self) -> ExpressionId {
        let operation = match self.peek() {
            TokenKind::Minus => UnaryOperator::Negate,
            TokenKind::Exclamation => UnaryOperator::Not,
            TokenKind::Percent => UnaryOperator::Stringify,
            TokenKind::At => UnaryOperator::BaseOf,
            TokenKind::Pound => {
                self.advance();
                let operand = self.parse_unary();
                return self.alloc(Expression::ExpressionWrap(operand));
            },
            TokenKind::Dollar => {
                return self.parse_bonus_literal().unwrap_or_else(|e| e);
            },
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary();

        self.alloc(Expression::Unary{ operation, operand })
    }

    /// `$name` or `$(name, type, value)` with optional type and value. Bare
    /// words are taken literally as the name or type.
    fn parse_bonus_literal(&mut self) -> ParseResult {
        self.advance();
        if let Some(word) = self.bare_word() {
            let name = self.alloc(Expression::StringLit(word));
            return Ok(self.alloc(Expression::Bonus{ name, bonus_type: None, value: None }));
        }

        match self.peek() {
            TokenKind::String => {
                let text = self.advance().text.clone();
                let name = self.alloc(Expression::StringLit(text));
                Ok(self.alloc(Expression::Bonus{ name, bonus_type: None, value: None }))
            },
            TokenKind::OpenParen => {
                self.advance();
                let name = self.parse_bonus_argument();
                let mut bonus_type = None;
                let mut value = None;
                if self.consume_if(TokenKind::Comma) {
                    bonus_type = Some(self.parse_bonus_argument());
                    if self.consume_if(TokenKind::Comma) {
                        value = Some(self.nested(|p| p.parse_conditional()));
                    }
                }
                self.expect(TokenKind::CloseParen, "to close the bonus")?;
                Ok(self.alloc(Expression::Bonus{ name, bonus_type, value }))
            },
            _ => Err(self.error_here("expected a bonus name after '$'")),
        }
    }

    fn parse_bonus_argument(&mut self) -> ExpressionId {
        let is_bare = match self.peek_at(1) {
            TokenKind::Comma | TokenKind::CloseParen => true,
            _ => false,
        };
        match self.peek() {
            TokenKind::Ident if is_bare => {
                let text = self.advance().text.clone();
                self.alloc(Expression::StringLit(text))
            },
            TokenKind::Star if is_bare => {
                self.advance();
                self.alloc(Expression::StringLit("*".to_string()))
            },
            _ => self.nested(|p| p.parse_conditional()),
        }
    }

    /// Consumes an identifier that is not followed by anything that would make
    /// it part of a larger expression.
    fn bare_word(&mut self) -> Option<String> {
        if self.peek() != TokenKind::Ident {
            return None;
        }
        match self.peek_at(1) {
            TokenKind::OpenParen | TokenKind::OpenSquare | TokenKind::Dot => None,
            _ => Some(self.advance().text.clone()),
        }
    }

    fn parse_postfix(&mut self) -> ExpressionId {
        let mut result = self.parse_leaf();
        loop {
            let next = match self.peek() {
                TokenKind::OpenSquare => self.parse_index(result),
                TokenKind::Dot => self.parse_member(result),
                TokenKind::OpenParen if self.is_callable(result) => {
                    match self.parse_arguments() {
                        Ok(args) => Ok(self.alloc(Expression::CallFunction{ callee: result, args })),
                        Err(error) => Err(error),
                    }
                },
                _ => break,
            };
            match next {
                Ok(id) => result = id,
                Err(error) => return error,
            }
        }

        result
    }

    fn is_callable(&self, id: ExpressionId) -> bool {
        match &self.heap[id] {
            Expression::Var(_) | Expression::Key{ .. } | Expression::Member{ .. } |
            Expression::Call{ .. } | Expression::CallFunction{ .. } | Expression::Def{ .. } => true,
            _ => false,
        }
    }

    /// `container[index]`, where `[#]` and `[~]` index with a symbol.
    fn parse_index(&mut self, container: ExpressionId) -> ParseResult {
        self.advance();
        let is_symbol = match self.peek() {
            TokenKind::Pound | TokenKind::Tilde => self.peek_at(1) == TokenKind::CloseSquare,
            _ => false,
        };
        let index = if is_symbol {
            let symbol = self.advance().kind.token_chars().to_string();
            self.alloc(Expression::Symbol(symbol))
        } else {
            self.nested(|p| p.parse_conditional())
        };
        self.expect(TokenKind::CloseSquare, "to close the index")?;

        Ok(self.alloc(Expression::Key{ container, index }))
    }

    /// `target.name` or `target.name(args)`
    fn parse_member(&mut self, target: ExpressionId) -> ParseResult {
        self.advance();
        if self.peek() != TokenKind::Ident {
            return Err(self.error_here("expected a member name after '.'"));
        }
        let name = self.advance().text.clone();
        let args = if self.peek() == TokenKind::OpenParen {
            Some(self.parse_arguments()?)
        } else {
            None
        };

        Ok(self.alloc(Expression::Member{ target, name, args }))
    }

    /// `( arg, arg, ... )`
    fn parse_arguments(&mut self) -> Result<Vec<ExpressionId>, ExpressionId> {
        self.expect(TokenKind::OpenParen, "to open the argument list")?;
        let mut args = Vec::new();
        if self.consume_if(TokenKind::CloseParen) {
            return Ok(args);
        }

        loop {
            args.push(self.nested(|p| p.parse_conditional()));
            match self.peek() {
                TokenKind::Comma => { self.advance(); },
                TokenKind::CloseParen => { self.advance(); break; },
                _ => return Err(self.error_here("expected ',' or ')' in argument list")),
            }
        }

        Ok(args)
    }

    // -------------------------------------------------------------------------
    // Leaves
    // -------------------------------------------------------------------------

    fn parse_leaf(&mut self) -> ExpressionId {
        let tokens = self.tokens;
        let idx = self.pos.min(tokens.len() - 1);
        let token = &tokens[idx];
        match token.kind {
            TokenKind::Integer => {
                self.advance();
                match token.text.parse::<i64>() {
                    Ok(value) => self.alloc(Expression::Number(value)),
                    Err(_) => self.error_at(idx, "integer literal is too large"),
                }
            },
            TokenKind::String => {
                self.advance();
                self.alloc(Expression::StringLit(token.text.clone()))
            },
            TokenKind::Stored => {
                self.advance();
                self.alloc(Expression::Stored(token.text.clone()))
            },
            TokenKind::Dice => {
                self.advance();
                match DiceSpec::from_text(&token.text) {
                    Some(spec) => self.alloc(Expression::Dice(spec)),
                    None => self.error_at(idx, "invalid dice"),
                }
            },
            TokenKind::Ident => {
                self.advance();
                if self.peek() == TokenKind::OpenParen {
                    match self.parse_arguments() {
                        Ok(args) => self.alloc(Expression::Call{ name: token.text.clone(), args }),
                        Err(error) => error,
                    }
                } else {
                    self.alloc(Expression::Var(token.text.clone()))
                }
            },
            TokenKind::KwIf => {
                // Only reached for the builtin form `if(cond, value)`
                self.advance();
                match self.parse_arguments() {
                    Ok(args) => self.alloc(Expression::Call{ name: BUILTIN_IF.to_string(), args }),
                    Err(error) => error,
                }
            },
            TokenKind::OpenParen => self.parse_parenthesized().unwrap_or_else(|e| e),
            TokenKind::FatArrow => {
                self.advance();
                let params = IMPLICIT_PARAMS.iter().map(|p| p.to_string()).collect();
                self.parse_function_body(params).unwrap_or_else(|e| e)
            },
            TokenKind::OpenCurly => self.parse_block("to open the block").unwrap_or_else(|e| e),
            TokenKind::OpenSquare => self.parse_array().unwrap_or_else(|e| e),
            TokenKind::Tilde => {
                self.advance();
                self.alloc(Expression::Symbol(SYMBOL_RANDOM.to_string()))
            },
            TokenKind::Quote => {
                self.advance();
                let argument = self.nested(|p| p.parse_conditional());
                match self.expect(TokenKind::Quote, "to close the event") {
                    Ok(()) => self.alloc(Expression::Event(argument)),
                    Err(error) => error,
                }
            },
            TokenKind::Unknown => {
                self.advance();
                self.error_at(idx, &format!("unexpected character '{}'", token.text))
            },
            TokenKind::End => self.error_at(idx, "unexpected end of input"),
            _ => self.error_at(idx, &format!("unexpected '{}'", token.kind.token_chars())),
        }
    }

    /// Either a lambda `(A, B) => { body }` or a parenthesized sequence.
    fn parse_parenthesized(&mut self) -> ParseResult {
        let tokens = self.tokens;
        let open_idx = self.pos;
        if let Some(close_idx) = find_matching_close(tokens, open_idx) {
            if tokens.get(close_idx + 1).map(|t| t.kind) == Some(TokenKind::FatArrow) {
                let mut params = Vec::new();
                let mut expect_name = true;
                for token in &tokens[open_idx + 1..close_idx] {
                    match token.kind {
                        TokenKind::Ident if expect_name => params.push(token.text.clone()),
                        TokenKind::Comma if !expect_name => {},
                        _ => return Err(self.error_at(open_idx, "invalid parameter list")),
                    }
                    expect_name = !expect_name;
                }
                if expect_name && !params.is_empty() {
                    return Err(self.error_at(close_idx, "invalid parameter list"));
                }

                self.pos = close_idx + 2;
                return self.parse_function_body(params);
            }
        }

        self.advance();
        let inner = self.nested(|p| p.parse_sequence(Some(TokenKind::CloseParen)));
        self.expect(TokenKind::CloseParen, "to close the parenthesis")?;
        Ok(inner)
    }

    /// The body of a function is kept as text and parsed on every call.
    fn parse_function_body(&mut self, params: Vec<String>) -> ParseResult {
        let open_idx = self.pos;
        if self.peek() != TokenKind::OpenCurly {
            return Err(self.error_here("expected '{' to open the function body"));
        }
        let close_idx = match find_matching_close(self.tokens, open_idx) {
            Some(close_idx) => close_idx,
            None => return Err(self.error_at(open_idx, "unmatched '{' in function body")),
        };

        let begin = self.tokens[open_idx].span.end.offset as usize;
        let end = self.tokens[close_idx].span.begin.offset as usize;
        let body = self.source.get(begin..end).unwrap_or("").trim().to_string();
        self.pos = close_idx + 1;

        Ok(self.alloc(Expression::Def{ params, body }))
    }

    /// `[a, b, ...]`
    fn parse_array(&mut self) -> ParseResult {
        self.advance();
        let mut elements = Vec::new();
        if self.consume_if(TokenKind::CloseSquare) {
            return Ok(self.alloc(Expression::Array(elements)));
        }

        loop {
            elements.push(self.nested(|p| p.parse_conditional()));
            match self.peek() {
                TokenKind::Comma => { self.advance(); },
                TokenKind::CloseSquare => { self.advance(); break; },
                _ => return Err(self.error_here("expected ',' or ']' in array")),
            }
        }

        Ok(self.alloc(Expression::Array(elements)))
    }
}
