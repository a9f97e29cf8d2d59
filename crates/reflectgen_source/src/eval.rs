//! Integer constant expressions.
//!
//! Used for enumerator values and `#if` conditions. Arithmetic is done in
//! `i128` and wraps; callers truncate to the width they need.

use crate::token::{Token, TokenKind};

/// Evaluates a constant expression over `tokens`.
///
/// Identifiers are resolved through `resolve`; an unresolvable identifier or
/// any construct outside the supported grammar yields `None`.
pub fn evaluate(tokens: &[Token], resolve: &dyn Fn(&str) -> Option<i128>) -> Option<i128> {
    let tokens: Vec<&Token> = tokens.iter().filter(|t| !t.kind.is_trivia()).collect();
    let mut eval = Evaluator {
        tokens: &tokens,
        pos: 0,
        resolve,
    };
    let value = eval.ternary()?;
    (eval.pos == tokens.len()).then_some(value)
}

/// Parses an integer or character literal.
#[must_use]
pub fn parse_literal(text: &str) -> Option<i128> {
    if text.starts_with('\'') {
        return parse_char(text);
    }
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L', 'z', 'Z']);
    let (radix, body) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (2, bin)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };
    i128::from_str_radix(body, radix).ok()
}

fn parse_char(text: &str) -> Option<i128> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let value = match inner.strip_prefix('\\') {
        None => {
            let mut chars = inner.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            u32::from(c)
        }
        Some("n") => 10,
        Some("t") => 9,
        Some("r") => 13,
        Some("0") => 0,
        Some("\\") => 92,
        Some("'") => 39,
        Some("\"") => 34,
        Some(other) => {
            let hex = other.strip_prefix('x')?;
            u32::from_str_radix(hex, 16).ok()?
        }
    };
    Some(i128::from(value))
}

struct Evaluator<'a> {
    tokens: &'a [&'a Token],
    pos: usize,
    resolve: &'a dyn Fn(&str) -> Option<i128>,
}

impl Evaluator<'_> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_punct(&self, punct: &str) -> bool {
        matches!(self.peek(), Some(TokenKind::Punct(p)) if *p == punct)
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.peek_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Right shift is lexed as two adjacent `>` tokens.
    fn eat_shift_right(&mut self) -> bool {
        let adjacent = match (self.tokens.get(self.pos), self.tokens.get(self.pos + 1)) {
            (Some(a), Some(b)) => a.is_punct(">") && b.is_punct(">") && a.span.touches(&b.span),
            _ => false,
        };
        if adjacent {
            self.pos += 2;
        }
        adjacent
    }

    fn ternary(&mut self) -> Option<i128> {
        let cond = self.logical_or()?;
        if self.eat("?") {
            let then = self.ternary()?;
            if !self.eat(":") {
                return None;
            }
            let otherwise = self.ternary()?;
            return Some(if cond != 0 { then } else { otherwise });
        }
        Some(cond)
    }

    fn logical_or(&mut self) -> Option<i128> {
        let mut lhs = self.logical_and()?;
        while self.eat("||") {
            let rhs = self.logical_and()?;
            lhs = i128::from(lhs != 0 || rhs != 0);
        }
        Some(lhs)
    }

    fn logical_and(&mut self) -> Option<i128> {
        let mut lhs = self.bit_or()?;
        while self.eat("&&") {
            let rhs = self.bit_or()?;
            lhs = i128::from(lhs != 0 && rhs != 0);
        }
        Some(lhs)
    }

    fn bit_or(&mut self) -> Option<i128> {
        let mut lhs = self.bit_xor()?;
        while self.eat("|") {
            lhs |= self.bit_xor()?;
        }
        Some(lhs)
    }

    fn bit_xor(&mut self) -> Option<i128> {
        let mut lhs = self.bit_and()?;
        while self.eat("^") {
            lhs ^= self.bit_and()?;
        }
        Some(lhs)
    }

    fn bit_and(&mut self) -> Option<i128> {
        let mut lhs = self.equality()?;
        while self.eat("&") {
            lhs &= self.equality()?;
        }
        Some(lhs)
    }

    fn equality(&mut self) -> Option<i128> {
        let mut lhs = self.relational()?;
        loop {
            if self.eat("==") {
                lhs = i128::from(lhs == self.relational()?);
            } else if self.eat("!=") {
                lhs = i128::from(lhs != self.relational()?);
            } else {
                return Some(lhs);
            }
        }
    }

    fn relational(&mut self) -> Option<i128> {
        let mut lhs = self.shift()?;
        loop {
            if self.eat("<=") {
                lhs = i128::from(lhs <= self.shift()?);
            } else if self.eat(">=") {
                lhs = i128::from(lhs >= self.shift()?);
            } else if self.peek_punct("<") {
                self.pos += 1;
                lhs = i128::from(lhs < self.shift()?);
            } else if self.peek_punct(">") && !self.is_shift_right_ahead() {
                self.pos += 1;
                lhs = i128::from(lhs > self.shift()?);
            } else {
                return Some(lhs);
            }
        }
    }

    fn is_shift_right_ahead(&self) -> bool {
        match (self.tokens.get(self.pos), self.tokens.get(self.pos + 1)) {
            (Some(a), Some(b)) => b.is_punct(">") && a.span.touches(&b.span),
            _ => false,
        }
    }

    fn shift(&mut self) -> Option<i128> {
        let mut lhs = self.additive()?;
        loop {
            if self.eat("<<") {
                let rhs = u32::try_from(self.additive()?).ok()?;
                lhs = lhs.checked_shl(rhs)?;
            } else if self.eat_shift_right() {
                let rhs = u32::try_from(self.additive()?).ok()?;
                lhs = lhs.checked_shr(rhs)?;
            } else {
                return Some(lhs);
            }
        }
    }

    fn additive(&mut self) -> Option<i128> {
        let mut lhs = self.multiplicative()?;
        loop {
            if self.eat("+") {
                lhs = lhs.wrapping_add(self.multiplicative()?);
            } else if self.eat("-") {
                lhs = lhs.wrapping_sub(self.multiplicative()?);
            } else {
                return Some(lhs);
            }
        }
    }

    fn multiplicative(&mut self) -> Option<i128> {
        let mut lhs = self.unary()?;
        loop {
            if self.eat("*") {
                lhs = lhs.wrapping_mul(self.unary()?);
            } else if self.eat("/") {
                lhs = lhs.checked_div(self.unary()?)?;
            } else if self.eat("%") {
                lhs = lhs.checked_rem(self.unary()?)?;
            } else {
                return Some(lhs);
            }
        }
    }

    fn unary(&mut self) -> Option<i128> {
        if self.eat("-") {
            return Some(self.unary()?.wrapping_neg());
        }
        if self.eat("+") {
            return self.unary();
        }
        if self.eat("~") {
            return Some(!self.unary()?);
        }
        if self.eat("!") {
            return Some(i128::from(self.unary()? == 0));
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<i128> {
        if self.eat("(") {
            let value = self.ternary()?;
            return self.eat(")").then_some(value);
        }
        let kind = self.peek()?.clone();
        self.pos += 1;
        match kind {
            TokenKind::Number(text) | TokenKind::Char(text) => parse_literal(&text),
            TokenKind::Keyword(k) if k == "true" => Some(1),
            TokenKind::Keyword(k) if k == "false" => Some(0),
            TokenKind::Keyword(k) if matches!(k.as_str(), "static_cast" | "int" | "unsigned") => {
                self.cast_tail()
            }
            TokenKind::Ident(first) => {
                let mut name = first;
                while self.peek_punct("::") {
                    let next = self.tokens.get(self.pos + 1).map(|t| &t.kind);
                    let Some(TokenKind::Ident(next)) = next else {
                        return None;
                    };
                    name = format!("{name}::{next}");
                    self.pos += 2;
                }
                (self.resolve)(&name).or_else(|| {
                    name.rsplit("::")
                        .next()
                        .filter(|last| *last != name)
                        .and_then(|last| (self.resolve)(last))
                })
            }
            _ => None,
        }
    }

    /// `static_cast<T>(expr)` and functional casts `int(expr)`.
    fn cast_tail(&mut self) -> Option<i128> {
        if self.eat("<") {
            while !self.eat(">") {
                self.tokens.get(self.pos)?;
                self.pos += 1;
            }
        }
        if !self.eat("(") {
            return None;
        }
        let value = self.ternary()?;
        self.eat(")").then_some(value)
    }
}
