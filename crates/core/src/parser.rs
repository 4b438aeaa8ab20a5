//! Tree builder: recursive descent over the scanner's tokens.
//!
//! The parser holds exactly one token of lookahead (`current`) and pulls the
//! next one from the scanner on demand. Comments are diverted into the
//! document's comment list as they stream past. No error recovery: the first
//! lexical or syntax error is returned.

use crate::ast::{Argument, ArgumentKind, Block, Comment, Directive, Document, Position};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Scanner, Spanned, Token};
use crate::options::ParseOptions;

/// Parse Confetti text with the base grammar.
pub fn parse(src: &str) -> Result<Document, ParseError> {
    parse_with(src, &ParseOptions::default())
}

/// Parse Confetti text with the given grammar extensions.
pub fn parse_with(src: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    let mut parser = Parser::new(Scanner::new(src, options), options.max_depth)?;
    parser.parse_document()
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Spanned,
    comments: Vec<Comment>,
    max_depth: usize,
}

fn is_scalar(token: &Token) -> bool {
    matches!(
        token,
        Token::Word(_) | Token::Punctuator(_) | Token::Quoted(_) | Token::TripleQuoted(_)
    )
}

impl<'a> Parser<'a> {
    fn new(scanner: Scanner<'a>, max_depth: usize) -> Result<Self, ParseError> {
        let mut parser = Parser {
            scanner,
            current: Spanned {
                token: Token::Eof,
                position: Position::START,
            },
            comments: Vec::new(),
            max_depth,
        };
        parser.current = parser.next_significant()?;
        Ok(parser)
    }

    fn next_significant(&mut self) -> Result<Spanned, ParseError> {
        loop {
            let spanned = self.scanner.next_token()?;
            match spanned.token {
                Token::Comment(text) => self.comments.push(Comment {
                    text,
                    position: spanned.position,
                }),
                token => {
                    return Ok(Spanned {
                        token,
                        position: spanned.position,
                    })
                }
            }
        }
    }

    fn peek(&self) -> &Token {
        &self.current.token
    }

    fn pos(&self) -> Position {
        self.current.position
    }

    fn advance(&mut self) -> Result<Spanned, ParseError> {
        let next = self.next_significant()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn err(&self, kind: ParseErrorKind, msg: impl Into<String>) -> ParseError {
        ParseError::new(kind, self.pos(), msg)
    }

    fn check_depth(&self, depth: usize) -> Result<(), ParseError> {
        if depth > self.max_depth {
            return Err(self.err(
                ParseErrorKind::NestingTooDeep,
                format!("nesting exceeds the limit of {} levels", self.max_depth),
            ));
        }
        Ok(())
    }

    // -- Directive lists ----------------------------------------

    fn parse_document(&mut self) -> Result<Document, ParseError> {
        let directives = self.parse_directives(0)?;
        if self.peek() == &Token::RBrace {
            return Err(self.err(
                ParseErrorKind::UnexpectedCloseBrace,
                "'}' without a matching '{'",
            ));
        }
        Ok(Document {
            directives,
            comments: std::mem::take(&mut self.comments),
        })
    }

    /// Parse directives up to a `}` or the end of input, consuming neither.
    fn parse_directives(&mut self, depth: usize) -> Result<Vec<Directive>, ParseError> {
        let mut directives = Vec::new();
        loop {
            match self.peek() {
                Token::Newline | Token::Semicolon => {
                    self.advance()?;
                }
                Token::RBrace | Token::Eof => return Ok(directives),
                _ => directives.push(self.parse_directive(depth)?),
            }
        }
    }

    fn parse_block(&mut self, depth: usize) -> Result<Block, ParseError> {
        self.check_depth(depth)?;
        let open = self.advance()?.position;
        let directives = self.parse_directives(depth)?;
        if self.peek() != &Token::RBrace {
            return Err(ParseError::new(
                ParseErrorKind::UnterminatedBlock,
                open,
                "'{' is never closed",
            ));
        }
        let close = self.advance()?.position;
        Ok(Block {
            open,
            close,
            directives,
        })
    }

    // -- Single directive ---------------------------------------

    fn parse_directive(&mut self, depth: usize) -> Result<Directive, ParseError> {
        let name = self.parse_name()?;

        let mut arguments = Vec::new();
        loop {
            match self.peek() {
                t if is_scalar(t) => arguments.push(self.parse_scalar()?),
                Token::LParen => arguments.push(self.parse_expression(depth + 1)?),
                Token::RParen => {
                    return Err(self.err(
                        ParseErrorKind::UnexpectedCloseParen,
                        "')' without a matching '('",
                    ))
                }
                _ => break,
            }
        }

        // A block may open on a later line; only `;` closes a directive for good.
        while self.peek() == &Token::Newline {
            self.advance()?;
        }
        let block = if self.peek() == &Token::LBrace {
            Some(self.parse_block(depth + 1)?)
        } else {
            None
        };

        Ok(Directive {
            name,
            arguments,
            block,
        })
    }

    fn parse_name(&mut self) -> Result<Argument, ParseError> {
        match self.peek() {
            t if is_scalar(t) => {
                let name = self.parse_scalar()?;
                if name.value.is_empty() {
                    return Err(ParseError::new(
                        ParseErrorKind::ExpectedDirective,
                        name.position,
                        "directive name must not be empty",
                    ));
                }
                Ok(name)
            }
            Token::RParen => Err(self.err(
                ParseErrorKind::UnexpectedCloseParen,
                "')' without a matching '('",
            )),
            other => Err(self.err(
                ParseErrorKind::ExpectedDirective,
                format!("expected a directive name, found {}", other.describe()),
            )),
        }
    }

    fn parse_scalar(&mut self) -> Result<Argument, ParseError> {
        let Spanned { token, position } = self.advance()?;
        let (kind, value) = match token {
            Token::Word(v) => (ArgumentKind::Word, v),
            Token::Punctuator(v) => (ArgumentKind::Punctuator, v),
            Token::Quoted(v) => (ArgumentKind::Quoted, v),
            Token::TripleQuoted(v) => (ArgumentKind::TripleQuoted, v),
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    position,
                    format!("expected an argument, found {}", other.describe()),
                ))
            }
        };
        Ok(Argument::new(kind, value, position))
    }

    // -- Expression arguments -----------------------------------

    /// Parse `( ... )` as a flat argument list, recursing into nested groups.
    fn parse_expression(&mut self, depth: usize) -> Result<Argument, ParseError> {
        self.check_depth(depth)?;
        let open = self.advance()?.position;
        let mut items = Vec::new();
        loop {
            match self.peek() {
                t if is_scalar(t) => items.push(self.parse_scalar()?),
                Token::LParen => items.push(self.parse_expression(depth + 1)?),
                Token::Newline => {
                    self.advance()?;
                }
                Token::RParen => {
                    let close = self.advance()?.position;
                    let value = self.scanner.source()[open.offset + 1..close.offset].to_owned();
                    return Ok(Argument {
                        kind: ArgumentKind::Expression,
                        value,
                        items,
                        position: open,
                    });
                }
                Token::Eof => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnterminatedExpression,
                        open,
                        "'(' is never closed",
                    ))
                }
                other => {
                    return Err(self.err(
                        ParseErrorKind::UnexpectedToken,
                        format!(
                            "{} is not allowed inside an expression argument",
                            other.describe()
                        ),
                    ))
                }
            }
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
