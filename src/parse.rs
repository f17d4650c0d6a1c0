use std::{iter::Peekable, ops::Range};

/// How deeply parentheses may be nested, and the deepest
/// [`crate::Expression`] that may be built from some text. These share a
/// limit because an expression is written out with one set of parentheses
/// per level.
const MAX_DEPTH: usize = 256;

/// Recognise the structure of some text without building an
/// [`crate::Expression`] from it.
pub fn recognize(src: &str) -> Result<ParseTree<'_>, ParseError> {
    Parser::new(src).parse()
}

/// The grammar rule a [`ParseTree`] node was recognised as.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Rule {
    Sum,
    Product,
    Number,
    Variable,
}

/// The concrete structure of a piece of text.
///
/// Parenthesised primitives don't get their own node, the nested [`Rule::Sum`]
/// is used directly (with its span widened to cover the parentheses).
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTree<'a> {
    pub rule: Rule,
    /// The text this node was recognised from.
    pub text: &'a str,
    pub span: Range<usize>,
    pub children: Vec<ParseTree<'a>>,
}

impl<'a> ParseTree<'a> {
    fn leaf(token: Token<'a>, rule: Rule) -> Self {
        ParseTree {
            rule,
            text: token.text,
            span: token.span,
            children: Vec::new(),
        }
    }

    fn branch(
        src: &'a str,
        rule: Rule,
        start: usize,
        children: Vec<ParseTree<'a>>,
    ) -> Self {
        let end = children.last().map(|c| c.span.end).unwrap_or(start);

        ParseTree {
            rule,
            text: &src[start..end],
            span: start..end,
            children,
        }
    }
}

/// A simple recursive descent parser (`LL(1)`) for recognising the structure
/// of an expression.
///
/// The grammar:
///
/// ```text
/// sum       := product ("+" product)*
///
/// product   := primitive ("*" primitive)*
///
/// primitive := NUMBER
///            | VARIABLE
///            | "(" sum ")"
/// ```
///
/// Where a `VARIABLE` is a single token made of an optional numeric
/// coefficient, a name, and an optional power (e.g. `x`, `3x^2`, `4.5y`).
///
/// Text which nests too deeply, either through parentheses or through very
/// long sums and products, is rejected with [`ParseError::NestedTooDeeply`].
#[derive(Debug, Clone)]
pub(crate) struct Parser<'a> {
    src: &'a str,
    tokens: Peekable<Tokens<'a>>,
    nesting: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Parser {
            src,
            tokens: Tokens::new(src).peekable(),
            nesting: 0,
        }
    }

    pub(crate) fn parse(mut self) -> Result<ParseTree<'a>, ParseError> {
        let tree = self.sum()?;

        match self.tokens.next() {
            None if depth(&tree) > MAX_DEPTH => {
                Err(ParseError::NestedTooDeeply {
                    span: tree.span.clone(),
                })
            },
            None => Ok(tree),
            Some(Ok(token)) => Err(ParseError::TrailingInput {
                found: token.kind,
                span: token.span,
            }),
            Some(Err(e)) => Err(e),
        }
    }

    fn peek(&mut self) -> Option<TokenKind> {
        self.tokens
            .peek()
            .and_then(|result| result.as_ref().ok())
            .map(|tok| tok.kind)
    }

    fn advance(&mut self) -> Result<Token<'a>, ParseError> {
        match self.tokens.next() {
            Some(result) => result,
            None => Err(ParseError::UnexpectedEndOfInput),
        }
    }

    fn sum(&mut self) -> Result<ParseTree<'a>, ParseError> {
        self.separated_by(Rule::Sum, TokenKind::Plus, |p| p.product())
    }

    fn product(&mut self) -> Result<ParseTree<'a>, ParseError> {
        self.separated_by(Rule::Product, TokenKind::Times, |p| p.primitive())
    }

    fn separated_by<F>(
        &mut self,
        rule: Rule,
        separator: TokenKind,
        mut item: F,
    ) -> Result<ParseTree<'a>, ParseError>
    where
        F: FnMut(&mut Parser<'a>) -> Result<ParseTree<'a>, ParseError>,
    {
        let first = item(self)?;
        let start = first.span.start;
        let mut children = vec![first];

        while self.peek() == Some(separator) {
            // skip past the operator
            let _ = self.advance()?;
            // and parse the next operand
            children.push(item(self)?);
        }

        Ok(ParseTree::branch(self.src, rule, start, children))
    }

    fn primitive(&mut self) -> Result<ParseTree<'a>, ParseError> {
        let expected = &[
            TokenKind::Number,
            TokenKind::Variable,
            TokenKind::OpenParen,
        ];

        match self.peek() {
            Some(TokenKind::Number) => {
                let token = self.advance()?;
                return Ok(ParseTree::leaf(token, Rule::Number));
            },
            Some(TokenKind::Variable) => {
                let token = self.advance()?;
                return Ok(ParseTree::leaf(token, Rule::Variable));
            },
            Some(TokenKind::OpenParen) => {
                let open_paren = self.advance()?;

                if self.nesting >= MAX_DEPTH {
                    return Err(ParseError::NestedTooDeeply {
                        span: open_paren.span,
                    });
                }

                self.nesting += 1;
                let mut inner = self.sum()?;
                self.nesting -= 1;
                let close_paren = self.advance()?;

                if close_paren.kind == TokenKind::CloseParen {
                    let src = self.src;
                    inner.span = open_paren.span.start..close_paren.span.end;
                    inner.text = &src[inner.span.clone()];
                    return Ok(inner);
                } else {
                    return Err(ParseError::UnexpectedToken {
                        found: close_paren.kind,
                        span: close_paren.span,
                        expected: &[
                            TokenKind::CloseParen,
                            TokenKind::Plus,
                            TokenKind::Times,
                        ],
                    });
                }
            },
            _ => {},
        }

        // we couldn't parse the primitive, return a nice error
        match self.tokens.next() {
            Some(Ok(Token { span, kind, .. })) => {
                Err(ParseError::UnexpectedToken {
                    found: kind,
                    expected,
                    span,
                })
            },
            Some(Err(e)) => Err(e),
            None => Err(ParseError::UnexpectedEndOfInput),
        }
    }
}

/// An upper bound on the depth of the [`crate::Expression`] built from a
/// tree. Sums and products are folded to the left, so every extra operand
/// adds another level.
fn depth(tree: &ParseTree<'_>) -> usize {
    let deepest_child = tree.children.iter().map(depth).max().unwrap_or(0);

    deepest_child + tree.children.len().saturating_sub(1)
}

/// Possible errors that may occur while parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid character {character:?} at index {index}")]
    InvalidCharacter { character: char, index: usize },
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("expected one of {expected:?} at {span:?}, but found {found:?}")]
    UnexpectedToken {
        found: TokenKind,
        span: Range<usize>,
        expected: &'static [TokenKind],
    },
    /// A `^` which isn't followed by a power that fits in a `u32`.
    #[error("invalid exponent at {span:?}")]
    InvalidExponent { span: Range<usize> },
    #[error("found a trailing {found:?} at {span:?}")]
    TrailingInput {
        found: TokenKind,
        span: Range<usize>,
    },
    /// A number or coefficient too large to be represented.
    #[error("the number at {span:?} is out of range")]
    NumberOutOfRange { span: Range<usize> },
    #[error("the expression at {span:?} is nested too deeply")]
    NestedTooDeeply { span: Range<usize> },
}

#[derive(Debug, Clone, PartialEq)]
struct Tokens<'a> {
    src: &'a str,
    cursor: usize,
}

impl<'a> Tokens<'a> {
    fn new(src: &'a str) -> Self { Tokens { src, cursor: 0 } }

    fn rest(&self) -> &'a str { &self.src[self.cursor..] }

    fn peek(&self) -> Option<char> { self.rest().chars().next() }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    fn chomp(
        &mut self,
        kind: TokenKind,
    ) -> Option<Result<Token<'a>, ParseError>> {
        let start = self.cursor;
        self.advance()?;
        let end = self.cursor;

        let tok = Token {
            text: &self.src[start..end],
            span: start..end,
            kind,
        };

        Some(Ok(tok))
    }

    fn take_while<P>(&mut self, mut predicate: P) -> &'a str
    where
        P: FnMut(char) -> bool,
    {
        let start = self.cursor;

        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }

            self.advance();
        }

        &self.src[start..self.cursor]
    }

    fn chomp_integer(&mut self) -> &'a str {
        self.take_while(|c| c.is_ascii_digit())
    }

    /// Chomp a number, or a variable with its (optional) coefficient and
    /// power.
    fn chomp_term(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.cursor;

        if !self.chomp_integer().is_empty() && self.peek() == Some('.') {
            // skip past the decimal, the fractional digits are optional
            self.advance();
            self.chomp_integer();
        }

        let digits = &self.src[start..self.cursor];
        let in_range = digits.parse::<f64>().map_or(false, f64::is_finite);

        if !digits.is_empty() && !in_range {
            return Err(ParseError::NumberOutOfRange {
                span: start..self.cursor,
            });
        }

        let name = self.take_while(|c| c.is_ascii_alphabetic());

        if name.is_empty() {
            return Ok(Token::from_text(
                self.src,
                start..self.cursor,
                TokenKind::Number,
            ));
        }

        if self.peek() == Some('^') {
            let caret = self.cursor;
            self.advance();
            let power = self.chomp_integer();

            if power.parse::<u32>().is_err() {
                return Err(ParseError::InvalidExponent {
                    span: caret..self.cursor,
                });
            }
        }

        Ok(Token::from_text(
            self.src,
            start..self.cursor,
            TokenKind::Variable,
        ))
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            return match self.peek()? {
                space if space.is_whitespace() => {
                    self.advance();
                    continue;
                },
                '(' => self.chomp(TokenKind::OpenParen),
                ')' => self.chomp(TokenKind::CloseParen),
                '+' => self.chomp(TokenKind::Plus),
                '*' => self.chomp(TokenKind::Times),
                'a'..='z' | 'A'..='Z' | '0'..='9' => Some(self.chomp_term()),
                other => Some(Err(ParseError::InvalidCharacter {
                    character: other,
                    index: self.cursor,
                })),
            };
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token<'a> {
    text: &'a str,
    span: Range<usize>,
    kind: TokenKind,
}

impl<'a> Token<'a> {
    fn from_text(
        original_source: &'a str,
        span: Range<usize>,
        kind: TokenKind,
    ) -> Self {
        Token {
            text: &original_source[span.clone()],
            span,
            kind,
        }
    }
}

/// The kinds of token that can appear in an [`crate::Expression`]'s text
/// form.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    Variable,
    OpenParen,
    CloseParen,
    Plus,
    Times,
}

#[cfg(test)]
mod tokenizer_tests {
    use super::*;

    macro_rules! tokenize_test {
        ($name:ident, $src:expr, $should_be:expr) => {
            #[test]
            fn $name() {
                let mut tokens = Tokens::new($src);

                let got = tokens.next().unwrap().unwrap();

                let Range { start, end } = got.span;
                assert_eq!(start, 0);
                assert_eq!(end, $src.len());
                assert_eq!(got.kind, $should_be);

                assert!(
                    tokens.next().is_none(),
                    "{:?} should be empty",
                    tokens
                );
            }
        };
    }

    tokenize_test!(open_paren, "(", TokenKind::OpenParen);
    tokenize_test!(close_paren, ")", TokenKind::CloseParen);
    tokenize_test!(plus, "+", TokenKind::Plus);
    tokenize_test!(times, "*", TokenKind::Times);
    tokenize_test!(single_digit_integer, "3", TokenKind::Number);
    tokenize_test!(multi_digit_integer, "31", TokenKind::Number);
    tokenize_test!(number_with_trailing_dot, "31.", TokenKind::Number);
    tokenize_test!(simple_decimal, "3.14", TokenKind::Number);
    tokenize_test!(simple_variable, "x", TokenKind::Variable);
    tokenize_test!(longer_variable, "hello", TokenKind::Variable);
    tokenize_test!(variables_are_case_sensitive, "Max", TokenKind::Variable);
    tokenize_test!(variable_with_power, "x^19", TokenKind::Variable);
    tokenize_test!(variable_with_coefficient, "12x", TokenKind::Variable);
    tokenize_test!(decimal_coefficient, "4.603zed", TokenKind::Variable);
    tokenize_test!(coefficient_and_power, "1.5x^19", TokenKind::Variable);

    #[test]
    fn whitespace_is_skipped() {
        let kinds: Vec<_> = Tokens::new("  ( 3x^2\t*\n4 ) ")
            .map(|tok| tok.unwrap().kind)
            .collect();

        assert_eq!(
            kinds,
            vec![
                TokenKind::OpenParen,
                TokenKind::Variable,
                TokenKind::Times,
                TokenKind::Number,
                TokenKind::CloseParen,
            ]
        );
    }

    #[test]
    fn digits_after_a_name_start_a_new_token() {
        let kinds: Vec<_> =
            Tokens::new("x2").map(|tok| tok.unwrap().kind).collect();

        assert_eq!(kinds, vec![TokenKind::Variable, TokenKind::Number]);
    }

    #[test]
    fn invalid_characters() {
        let inputs = vec![("-", '-', 0), ("x / y", '/', 2), (".5", '.', 0)];

        for (src, character, index) in inputs {
            let got = Tokens::new(src).find_map(Result::err).unwrap();

            assert_eq!(got, ParseError::InvalidCharacter { character, index });
        }
    }

    #[test]
    fn numbers_must_be_finite() {
        let huge = format!("1{}", "0".repeat(400));
        let inputs = vec![
            (huge.clone(), 0..401),
            (format!("{}.5", huge), 0..403),
            (format!("{}x^2", huge), 0..401),
        ];

        for (src, span) in inputs {
            let got = Tokens::new(&src).next().unwrap();

            assert_eq!(got, Err(ParseError::NumberOutOfRange { span }));
        }

        let tiny = format!("0.{}1", "0".repeat(400));
        let got = Tokens::new(&tiny).next().unwrap().unwrap();
        assert_eq!(got.kind, TokenKind::Number);
    }

    #[test]
    fn caret_needs_a_power() {
        let inputs = vec![("x^", 1..2), ("x^ 2", 1..2), ("x^99999999999", 1..13)];

        for (src, span) in inputs {
            let got = Tokens::new(src).next().unwrap();

            assert_eq!(got, Err(ParseError::InvalidExponent { span }));
        }
    }
}
