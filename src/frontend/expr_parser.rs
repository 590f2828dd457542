//! Precedence-climbing parser for the C expression subset found in guard
//! conditions.
//!
//! The output is the [`Expr`] shape the analysis consumes: calls, binary and
//! unary operators are kept structural, everything else collapses into
//! `Expr::Other` carrying its raw text. A condition the parser cannot handle
//! (ternaries, stray tokens) degrades to a single `Other` node rather than
//! failing the file.

use super::ast::Expr;

/// Parse a condition expression. Total: unparseable input becomes
/// `Expr::Other` with the trimmed source text.
pub fn parse_condition(text: &str) -> Expr {
    let trimmed = text.trim();
    let tokens = match tokenize(trimmed) {
        Some(t) if !t.is_empty() => t,
        _ => return Expr::other(trimmed),
    };
    let mut parser = Parser { tokens, pos: 0 };
    match parser.parse_expr(0) {
        Some(expr) if parser.at_end() => expr,
        _ => Expr::other(trimmed),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Number(String),
    Str(String),
    Punct(&'static str),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

// Multi-char operators first so "&&" never lexes as two "&".
const PUNCTS: &[&str] = &[
    "<<", ">>", "->", "&&", "||", "==", "!=", "<=", ">=", "+", "-", "*", "/", "%", "<", ">", "&",
    "^", "|", "!", "~", "=", ".",
];

fn tokenize(input: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;
    'outer: while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '"' | '\'' => {
                let quote = c;
                let start = i;
                i += 1;
                while i < bytes.len() {
                    let b = bytes[i] as char;
                    if b == '\\' {
                        i += 2;
                        continue;
                    }
                    if b == quote {
                        i += 1;
                        tokens.push(Token::Str(input[start..i].to_string()));
                        continue 'outer;
                    }
                    i += 1;
                }
                return None; // unterminated literal
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(input[start..i].to_string()));
            }
            _ if c.is_ascii_digit() => {
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'.')
                {
                    i += 1;
                }
                tokens.push(Token::Number(input[start..i].to_string()));
            }
            _ => {
                for p in PUNCTS {
                    if input[i..].starts_with(p) {
                        tokens.push(Token::Punct(p));
                        i += p.len();
                        continue 'outer;
                    }
                }
                return None; // character outside the subset (e.g. "?")
            }
        }
    }
    Some(tokens)
}

/// Binding power for binary operators, C precedence order. `None` means the
/// token does not continue a binary expression.
fn binding_power(op: &str) -> Option<u8> {
    Some(match op {
        "*" | "/" | "%" => 10,
        "+" | "-" => 9,
        "<<" | ">>" => 8,
        "<" | "<=" | ">" | ">=" => 7,
        "==" | "!=" => 6,
        "&" => 5,
        "^" => 4,
        "|" => 3,
        "&&" => 2,
        "||" => 1,
        // Assignment inside a condition still reads as a binary node.
        "=" => 0,
        _ => return None,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn parse_expr(&mut self, min_bp: u8) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;
        while let Some(Token::Punct(op)) = self.peek() {
            let op = *op;
            let bp = match binding_power(op) {
                Some(bp) if bp >= min_bp => bp,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_expr(bp + 1)?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        if let Some(Token::Punct(op)) = self.peek() {
            if matches!(*op, "!" | "~" | "-" | "+" | "*" | "&") {
                let op = *op;
                self.bump();
                let operand = self.parse_unary()?;
                return Some(Expr::unary(op, operand));
            }
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        match self.bump()? {
            Token::LParen => {
                let inner = self.parse_expr(0)?;
                match self.bump()? {
                    Token::RParen => Some(inner),
                    _ => None,
                }
            }
            Token::Number(n) => Some(Expr::other(n)),
            Token::Str(s) => Some(Expr::other(s)),
            Token::Ident(name) => self.parse_path_or_call(name),
            _ => None,
        }
    }

    /// An identifier optionally followed by member selectors and one call.
    /// `a->b.c` stays `Other`; `a->ops->check(x)` becomes a `Call` whose
    /// callee is the full selector path.
    fn parse_path_or_call(&mut self, first: String) -> Option<Expr> {
        let mut path = first;
        loop {
            match self.peek() {
                Some(Token::Punct(sel @ ("." | "->"))) => {
                    let sel = *sel;
                    self.bump();
                    match self.bump()? {
                        Token::Ident(name) => {
                            path.push_str(sel);
                            path.push_str(&name);
                        }
                        _ => return None,
                    }
                }
                Some(Token::LBracket) => {
                    self.bump();
                    let _index = self.parse_expr(0)?;
                    match self.bump()? {
                        Token::RBracket => {
                            path.push_str("[]");
                        }
                        _ => return None,
                    }
                }
                Some(Token::LParen) => {
                    self.bump();
                    let args = self.parse_args()?;
                    return Some(Expr::call(path, args));
                }
                _ => return Some(Expr::other(path)),
            }
        }
    }

    /// Arguments up to the closing paren. Each argument is parsed as a full
    /// expression; nested commas are delimited by paren tracking in recursion.
    fn parse_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token::RParen)) {
            self.bump();
            return Some(args);
        }
        loop {
            args.push(self.parse_expr(0)?);
            match self.bump()? {
                Token::Comma => continue,
                Token::RParen => return Some(args),
                _ => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::frontend::ast::Expr;

    #[test]
    fn single_call_with_constant_arg() {
        let expr = parse_condition("capable(CAP_SYS_ADMIN)");
        assert_eq!(
            expr,
            Expr::call("capable", vec![Expr::other("CAP_SYS_ADMIN")])
        );
    }

    #[test]
    fn ns_capable_two_args() {
        let expr = parse_condition("ns_capable(ns, CAP_NET_ADMIN)");
        assert_eq!(
            expr,
            Expr::call(
                "ns_capable",
                vec![Expr::other("ns"), Expr::other("CAP_NET_ADMIN")]
            )
        );
    }

    #[test]
    fn logical_and_is_binary() {
        let expr = parse_condition("x == 0 && capable(CAP_SYS_ADMIN)");
        assert_eq!(
            expr,
            Expr::binary(
                "&&",
                Expr::binary("==", Expr::other("x"), Expr::other("0")),
                Expr::call("capable", vec![Expr::other("CAP_SYS_ADMIN")]),
            )
        );
    }

    #[test]
    fn negated_call() {
        let expr = parse_condition("!capable(CAP_SYS_NICE)");
        assert_eq!(
            expr,
            Expr::unary("!", Expr::call("capable", vec![Expr::other("CAP_SYS_NICE")]))
        );
    }

    #[test]
    fn parenthesized_grouping() {
        let expr = parse_condition("(a || b) && c");
        assert_eq!(
            expr,
            Expr::binary(
                "&&",
                Expr::binary("||", Expr::other("a"), Expr::other("b")),
                Expr::other("c"),
            )
        );
    }

    #[test]
    fn member_call_keeps_selector_path() {
        let expr = parse_condition("cred->ops->check(cap)");
        assert_eq!(
            expr,
            Expr::call("cred->ops->check", vec![Expr::other("cap")])
        );
    }

    #[test]
    fn precedence_or_binds_loosest() {
        // a && b || c  =>  (a && b) || c
        let expr = parse_condition("a && b || c");
        assert_eq!(
            expr,
            Expr::binary(
                "||",
                Expr::binary("&&", Expr::other("a"), Expr::other("b")),
                Expr::other("c"),
            )
        );
    }

    #[test]
    fn ternary_degrades_to_other() {
        let expr = parse_condition("a ? b : c");
        assert_eq!(expr, Expr::other("a ? b : c"));
    }

    #[test]
    fn empty_condition_is_other() {
        assert_eq!(parse_condition("   "), Expr::other(""));
    }

    #[test]
    fn nested_call_args() {
        let expr = parse_condition("capable(cap_of(task))");
        assert_eq!(
            expr,
            Expr::call("capable", vec![Expr::call("cap_of", vec![Expr::other("task")])])
        );
    }
}
