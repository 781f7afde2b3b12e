//! Preprocessing, tokenizer and recursive-descent parser for g(x).

use super::symbols::{self, Constant, Function};
use crate::error::EngineError;
use std::fmt;

/// Abstract Syntax Tree nodes for expressions.
///
/// Names are resolved while parsing, so a tree that exists only ever refers
/// to `x` or whitelisted functions and constants.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable,
    Constant(Constant),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    Neg(Box<Expr>),
    Call(Function, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Inserts the implied multiplications users write by hand.
///
/// A digit immediately followed by `x` or `(` gets a `*` (`2x` -> `2*x`,
/// `3(` -> `3*(`), as does `)` immediately followed by a digit or `x`
/// (`)2` -> `)*2`). Digits inside identifiers such as `log10` are left alone.
pub fn preprocess(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);
    let mut in_word = false;
    let mut in_identifier = false;

    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphabetic() || c == '_' {
            if !in_word {
                in_identifier = true;
            }
            in_word = true;
        } else if c.is_ascii_digit() {
            if !in_word {
                in_identifier = false;
            }
            in_word = true;
        } else {
            in_word = false;
            in_identifier = false;
        }

        out.push(c);

        let next = chars.get(i + 1).copied();
        let needs_star = match (c, next) {
            (d, Some('x' | '(')) if d.is_ascii_digit() && !in_identifier => true,
            (')', Some(n)) if n == 'x' || n.is_ascii_digit() => true,
            _ => false,
        };
        if needs_star {
            out.push('*');
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Dot,
    Unexpected(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Dot => write!(f, "."),
            Token::Unexpected(c) => write!(f, "{c}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>, EngineError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        let offset = pos;

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        let starts_number = c.is_ascii_digit()
            || (c == '.' && chars.get(pos + 1).is_some_and(|n| n.is_ascii_digit()));

        if starts_number {
            let mut literal = String::new();
            while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                literal.push(chars[pos]);
                pos += 1;
            }
            // Exponent only when digits follow: `1e-3`, but `2e` stays `2` `e`.
            if pos < chars.len() && (chars[pos] == 'e' || chars[pos] == 'E') {
                let mut look = pos + 1;
                if look < chars.len() && (chars[look] == '+' || chars[look] == '-') {
                    look += 1;
                }
                if look < chars.len() && chars[look].is_ascii_digit() {
                    while look < chars.len() && chars[look].is_ascii_digit() {
                        look += 1;
                    }
                    literal.extend(&chars[pos..look]);
                    pos = look;
                }
            }
            let value: f64 = literal.parse().map_err(|_| {
                EngineError::syntax(format!("Invalid number '{literal}' at position {offset}"))
            })?;
            tokens.push(Spanned {
                token: Token::Number(value),
                offset,
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let mut ident = String::new();
            while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                ident.push(chars[pos]);
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Identifier(ident),
                offset,
            });
            continue;
        }

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if chars.get(pos + 1) == Some(&'*') => {
                pos += 1;
                Token::Caret
            }
            '*' => Token::Star,
            '/' => Token::Slash,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '.' => Token::Dot,
            other => Token::Unexpected(other),
        };
        tokens.push(Spanned { token, offset });
        pos += 1;
    }

    Ok(tokens)
}

/// Rejects reserved names and attribute access outside the math namespaces.
///
/// Runs before parsing so an escape attempt is reported as such even when
/// the rest of the input is also malformed.
pub(crate) fn screen(tokens: &[Spanned]) -> Result<(), EngineError> {
    for (i, spanned) in tokens.iter().enumerate() {
        match &spanned.token {
            Token::Identifier(name) if symbols::is_reserved(name) => {
                return Err(EngineError::Security {
                    construct: name.clone(),
                });
            }
            Token::Dot if i > 0 => {
                let attr = match tokens.get(i + 1).map(|t| &t.token) {
                    Some(Token::Identifier(attr)) => attr.clone(),
                    _ => String::new(),
                };
                let qualified_by_namespace = match &tokens[i - 1].token {
                    Token::Identifier(owner) if symbols::is_namespace(owner) => {
                        // `np.cos` is fine, `x.np.cos` or `np.cos.real` is not.
                        i < 2 || !matches!(tokens[i - 2].token, Token::Dot)
                    }
                    Token::Identifier(_) | Token::RParen | Token::Number(_) => false,
                    _ => continue,
                };
                if !qualified_by_namespace {
                    return Err(EngineError::Security {
                        construct: format!("{}.{attr}", tokens[i - 1].token),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Deepest nesting the parser accepts, counting both parenthesis/unary
/// recursion and the height of the resulting tree. The compiler walks the
/// tree recursively, so the height stays bounded too.
pub const MAX_DEPTH: usize = 256;

/// Parses an already preprocessed expression into an AST.
pub fn parse(input: &str) -> Result<Expr, EngineError> {
    let tokens = tokenize(input)?;
    screen(&tokens)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        nesting: 0,
    };
    let node = parser.parse_expression()?;
    match parser.peek() {
        None => Ok(node.expr),
        Some(spanned) => Err(unexpected(&spanned)),
    }
}

fn unexpected(spanned: &Spanned) -> EngineError {
    EngineError::syntax(format!(
        "Unexpected '{}' at position {}",
        spanned.token, spanned.offset
    ))
}

fn too_deep() -> EngineError {
    EngineError::syntax(format!(
        "Expression nested too deeply (limit {MAX_DEPTH})"
    ))
}

/// A subtree together with its height.
struct Node {
    expr: Expr,
    height: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Self {
        Self { expr, height: 1 }
    }

    fn wrap(self, build: impl FnOnce(Box<Expr>) -> Expr) -> Result<Self, EngineError> {
        let height = self.height + 1;
        if height > MAX_DEPTH {
            return Err(too_deep());
        }
        Ok(Self {
            expr: build(Box::new(self.expr)),
            height,
        })
    }

    fn binary(left: Node, op: BinaryOp, right: Node) -> Result<Self, EngineError> {
        let height = left.height.max(right.height) + 1;
        if height > MAX_DEPTH {
            return Err(too_deep());
        }
        Ok(Self {
            expr: Expr::Binary(Box::new(left.expr), op, Box::new(right.expr)),
            height,
        })
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    nesting: usize,
}

impl Parser {
    fn peek(&self) -> Option<Spanned> {
        self.tokens.get(self.pos).cloned()
    }

    fn peek_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn consume(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn expect_rparen(&mut self) -> Result<(), EngineError> {
        match self.consume() {
            Some(Spanned {
                token: Token::RParen,
                ..
            }) => Ok(()),
            Some(other) => Err(EngineError::syntax(format!(
                "Expected ')' but found '{}' at position {}",
                other.token, other.offset
            ))),
            None => Err(EngineError::syntax("Expected ')' before end of input")),
        }
    }

    fn parse_expression(&mut self) -> Result<Node, EngineError> {
        let mut left = self.parse_term()?;

        while let Some(token) = self.peek_token() {
            let op = match token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.consume();
            let right = self.parse_term()?;
            left = Node::binary(left, op, right)?;
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Node, EngineError> {
        let mut left = self.parse_unary()?;

        while let Some(token) = self.peek_token() {
            let op = match token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => break,
            };
            self.consume();
            let right = self.parse_unary()?;
            left = Node::binary(left, op, right)?;
        }
        Ok(left)
    }

    // Every recursive path (parentheses, call arguments, signs, exponents)
    // passes through here, so this counter bounds the parser's stack.
    fn parse_unary(&mut self) -> Result<Node, EngineError> {
        if self.nesting >= MAX_DEPTH {
            return Err(too_deep());
        }
        self.nesting += 1;
        let result = self.parse_signed();
        self.nesting -= 1;
        result
    }

    fn parse_signed(&mut self) -> Result<Node, EngineError> {
        match self.peek_token() {
            Some(Token::Minus) => {
                self.consume();
                self.parse_unary()?.wrap(Expr::Neg)
            }
            Some(Token::Plus) => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    // Right associative and tighter than a leading minus: -x^2 == -(x^2).
    fn parse_power(&mut self) -> Result<Node, EngineError> {
        let base = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek_token() {
            self.consume();
            let exponent = self.parse_unary()?;
            return Node::binary(base, BinaryOp::Pow, exponent);
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Node, EngineError> {
        let Some(spanned) = self.consume() else {
            return Err(EngineError::syntax("Unexpected end of input"));
        };

        match spanned.token {
            Token::Number(n) => Ok(Node::leaf(Expr::Number(n))),
            Token::LParen => {
                let node = self.parse_expression()?;
                self.expect_rparen()?;
                Ok(node)
            }
            Token::Identifier(name) => self.parse_name(name, spanned.offset),
            _ => Err(unexpected(&spanned)),
        }
    }

    fn parse_name(&mut self, name: String, offset: usize) -> Result<Node, EngineError> {
        let (display, bare) = if symbols::is_namespace(&name) {
            match self.peek_token() {
                Some(Token::Dot) => {
                    self.consume();
                    match self.consume() {
                        Some(Spanned {
                            token: Token::Identifier(attr),
                            ..
                        }) => (format!("{name}.{attr}"), attr),
                        _ => {
                            return Err(EngineError::syntax(format!(
                                "Expected a name after '{name}.' at position {offset}"
                            )))
                        }
                    }
                }
                _ => {
                    return Err(EngineError::syntax(format!(
                        "Namespace '{name}' must be followed by a function or constant name"
                    )))
                }
            }
        } else {
            (name.clone(), name)
        };

        let is_call = matches!(self.peek_token(), Some(Token::LParen));

        if let Some(function) = Function::lookup(&bare) {
            if !is_call {
                return Err(EngineError::syntax(format!(
                    "Function '{display}' requires a parenthesized argument"
                )));
            }
            self.consume();
            let arg = self.parse_expression()?;
            self.expect_rparen()?;
            return arg.wrap(|arg| Expr::Call(function, arg));
        }

        let value = if display == symbols::VARIABLE {
            Expr::Variable
        } else if let Some(constant) = Constant::lookup(&bare) {
            Expr::Constant(constant)
        } else {
            return Err(EngineError::UnknownName { name: display });
        };

        if is_call {
            return Err(EngineError::syntax(format!(
                "'{display}' is not a function"
            )));
        }
        Ok(Node::leaf(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn preprocess_inserts_implied_multiplication() {
        assert_eq!(preprocess("2x+1"), "2*x+1");
        assert_eq!(preprocess("3(x+1)"), "3*(x+1)");
        assert_eq!(preprocess("(x+1)2"), "(x+1)*2");
        assert_eq!(preprocess("(x+1)x"), "(x+1)*x");
        assert_eq!(preprocess("x^2"), "x^2");
    }

    #[test]
    fn preprocess_leaves_identifier_digits_alone() {
        assert_eq!(preprocess("log10(x)"), "log10(x)");
        assert_eq!(preprocess("log2(2x)"), "log2(2*x)");
        assert_eq!(preprocess("np.exp(x)"), "np.exp(x)");
    }

    #[test]
    fn preprocess_requires_adjacency() {
        assert_eq!(preprocess("2 x"), "2 x");
    }

    #[test]
    fn tokenizer_reads_scientific_notation_and_double_star() {
        let tokens: Vec<Token> = tokenize("1.5e-3 ** x")
            .expect("tokenize")
            .into_iter()
            .map(|s| s.token)
            .collect();
        assert_eq!(
            tokens,
            vec![
                Token::Number(1.5e-3),
                Token::Caret,
                Token::Identifier("x".to_string())
            ]
        );
    }

    #[test]
    fn tokenizer_keeps_bare_e_as_identifier() {
        let tokens: Vec<Token> = tokenize("2e")
            .expect("tokenize")
            .into_iter()
            .map(|s| s.token)
            .collect();
        assert_eq!(
            tokens,
            vec![Token::Number(2.0), Token::Identifier("e".to_string())]
        );
    }

    #[test]
    fn power_is_right_associative_and_binds_tighter_than_negation() {
        let expr = parse("-2^3^2").expect("parse");
        let expected = Expr::Neg(Box::new(Expr::Binary(
            num(2.0),
            BinaryOp::Pow,
            Box::new(Expr::Binary(num(3.0), BinaryOp::Pow, num(2.0))),
        )));
        assert_eq!(expr, expected);
    }

    #[test]
    fn qualified_and_bare_names_resolve_identically() {
        let bare = parse("cos(x) + pi").expect("parse bare");
        let qualified = parse("np.cos(x) + math.pi").expect("parse qualified");
        assert_eq!(bare, qualified);
    }

    #[test]
    fn unknown_identifier_is_reported_by_name() {
        assert_eq!(
            parse("foo(x)"),
            Err(EngineError::UnknownName {
                name: "foo".to_string()
            })
        );
        assert_eq!(
            parse("np.foo(x)"),
            Err(EngineError::UnknownName {
                name: "np.foo".to_string()
            })
        );
    }

    #[test]
    fn attribute_escapes_are_security_errors() {
        for input in [
            "__import__('os')",
            "x.real",
            "np.__dict__",
            "(x).conjugate()",
            "np.cos.real",
            "import os",
        ] {
            let err = parse(input).expect_err(input);
            assert!(
                matches!(err, EngineError::Security { .. }),
                "{input} produced {err:?}"
            );
        }
    }

    #[test]
    fn deep_nesting_is_rejected_without_recursing_past_the_limit() {
        let parens = format!("{}x{}", "(".repeat(20_000), ")".repeat(20_000));
        let signs = format!("{}x", "-".repeat(20_000));
        let calls = format!("{}x{}", "sin(".repeat(5_000), ")".repeat(5_000));
        let powers = vec!["x"; 5_000].join("^");
        for input in [&parens, &signs, &calls, &powers] {
            let err = parse(input).expect_err("too deep");
            assert!(
                matches!(&err, EngineError::Syntax { message } if message.contains("nested too deeply")),
                "{err:?}"
            );
        }
    }

    #[test]
    fn long_operator_chains_are_bounded_by_tree_height() {
        let sum = vec!["x"; 20_000].join("+");
        assert!(matches!(parse(&sum), Err(EngineError::Syntax { .. })));

        let within = vec!["x"; MAX_DEPTH].join("+");
        assert!(parse(&within).is_ok());
        let nested = format!("{}x{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse(&nested), Ok(Expr::Variable));
    }

    #[test]
    fn malformed_input_is_a_syntax_error() {
        for input in ["1 +", "(x", "x)", "sin x", "pi(2)", "x(2)", "2 x", "x, 1", "np + 1", "1.2.3"] {
            let err = parse(input).expect_err(input);
            assert!(
                matches!(err, EngineError::Syntax { .. }),
                "{input} produced {err:?}"
            );
        }
    }
}
