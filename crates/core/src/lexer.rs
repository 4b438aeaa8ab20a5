//! Scanner: turns source text into tokens, one at a time.
//!
//! The scanner knows nothing about directive structure. It resolves escapes,
//! joins continued lines, skips whitespace and reports comments as tokens so
//! the parser can keep them. The first malformed construct is fatal.

use crate::ast::Position;
use crate::error::{ParseError, ParseErrorKind};
use crate::options::ParseOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bare word, escapes resolved
    Word(String),
    /// User-declared punctuator
    Punctuator(String),
    /// `"..."` content, escapes resolved
    Quoted(String),
    /// `"""..."""` content, verbatim
    TripleQuoted(String),
    LBrace,
    RBrace,
    Semicolon,
    LParen,
    RParen,
    Newline,
    /// Comment text without its delimiters
    Comment(String),
    Eof,
}

impl Token {
    /// Short human description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Word(w) => format!("'{}'", w),
            Token::Punctuator(p) => format!("punctuator '{}'", p),
            Token::Quoted(_) => "quoted argument".to_owned(),
            Token::TripleQuoted(_) => "triple-quoted argument".to_owned(),
            Token::LBrace => "'{'".to_owned(),
            Token::RBrace => "'}'".to_owned(),
            Token::Semicolon => "';'".to_owned(),
            Token::LParen => "'('".to_owned(),
            Token::RParen => "')'".to_owned(),
            Token::Newline => "end of line".to_owned(),
            Token::Comment(_) => "comment".to_owned(),
            Token::Eof => "end of input".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub position: Position,
}

pub fn is_line_terminator(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

fn is_space(c: char) -> bool {
    c.is_whitespace() && !is_line_terminator(c)
}

fn is_illegal(c: char) -> bool {
    c.is_control() && !c.is_whitespace()
}

fn illegal(at: Position, c: char) -> ParseError {
    ParseError::new(
        ParseErrorKind::IllegalCharacter,
        at,
        format!("illegal character U+{:04X}", c as u32),
    )
}

/// Pull-based scanner. Not restartable; make a new one per input.
pub struct Scanner<'a> {
    src: &'a str,
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    offset: usize,
    c_style_comments: bool,
    expressions: bool,
    /// Declared punctuators, longest first.
    punctuators: Vec<Vec<char>>,
    /// Whether the current logical line has produced an argument-like token.
    line_has_token: bool,
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str, options: &ParseOptions) -> Self {
        let chars: Vec<char> = src.chars().collect();
        let mut punctuators: Vec<Vec<char>> = options
            .punctuator_arguments
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.chars().collect())
            .collect();
        punctuators.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut scanner = Scanner {
            src,
            chars,
            pos: 0,
            line: 1,
            column: 1,
            offset: 0,
            c_style_comments: options.c_style_comments,
            expressions: options.expression_arguments,
            punctuators,
            line_has_token: false,
            finished: false,
        };
        if scanner.peek() == Some('\u{FEFF}') {
            scanner.pos = 1;
            scanner.offset = '\u{FEFF}'.len_utf8();
        }
        scanner
    }

    /// The full input text.
    pub fn source(&self) -> &'a str {
        self.src
    }

    pub fn here(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        let mut rest = self.chars[self.pos..].iter();
        s.chars().all(|c| rest.next() == Some(&c))
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        self.offset += c.len_utf8();
        if is_line_terminator(c) && !(c == '\r' && self.peek() == Some('\n')) {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume one line terminator, treating CRLF as one.
    fn eat_line_terminator(&mut self) {
        if self.bump() == Some('\r') && self.peek() == Some('\n') {
            self.bump();
        }
    }

    fn match_punctuator(&self) -> Option<usize> {
        self.punctuators
            .iter()
            .find(|p| self.chars[self.pos..].starts_with(p))
            .map(Vec::len)
    }

    fn at_comment_start(&self) -> bool {
        match self.peek() {
            Some('#') => true,
            Some('/') if self.c_style_comments => {
                matches!(self.peek_at(1), Some('/') | Some('*'))
            }
            _ => false,
        }
    }

    fn ends_word(&self, c: char) -> bool {
        c.is_whitespace()
            || matches!(c, '{' | '}' | ';' | '"')
            || (self.expressions && matches!(c, '(' | ')'))
            || self.at_comment_start()
    }

    fn emit(&mut self, token: Token, position: Position) -> Spanned {
        match token {
            Token::Newline => self.line_has_token = false,
            Token::Comment(_) | Token::Eof => {}
            _ => self.line_has_token = true,
        }
        Spanned { token, position }
    }

    /// Scan the next token. Returns `Eof` forever once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Spanned, ParseError> {
        loop {
            while matches!(self.peek(), Some(c) if is_space(c)) {
                self.bump();
            }
            let start = self.here();
            let c = match self.peek() {
                Some(c) => c,
                None => return Ok(self.emit(Token::Eof, start)),
            };

            if c == '\\' && self.peek_at(1).is_some_and(is_line_terminator) {
                if !self.line_has_token {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidLineContinuation,
                        start,
                        "line continuation must follow a directive argument",
                    ));
                }
                self.bump();
                self.eat_line_terminator();
                continue;
            }

            let token = match c {
                '#' => {
                    self.bump();
                    Token::Comment(self.line_comment()?)
                }
                '/' if self.c_style_comments && self.peek_at(1) == Some('/') => {
                    self.bump();
                    self.bump();
                    Token::Comment(self.line_comment()?)
                }
                '/' if self.c_style_comments && self.peek_at(1) == Some('*') => {
                    Token::Comment(self.block_comment(start)?)
                }
                c if is_line_terminator(c) => {
                    self.eat_line_terminator();
                    Token::Newline
                }
                '{' => {
                    self.bump();
                    Token::LBrace
                }
                '}' => {
                    self.bump();
                    Token::RBrace
                }
                ';' => {
                    self.bump();
                    Token::Semicolon
                }
                '(' if self.expressions => {
                    self.bump();
                    Token::LParen
                }
                ')' if self.expressions => {
                    self.bump();
                    Token::RParen
                }
                '"' if self.starts_with("\"\"\"") => {
                    Token::TripleQuoted(self.triple_quoted(start)?)
                }
                '"' => Token::Quoted(self.quoted(start)?),
                c if is_illegal(c) => return Err(illegal(start, c)),
                _ => match self.match_punctuator() {
                    Some(len) => Token::Punctuator((0..len).filter_map(|_| self.bump()).collect()),
                    None => Token::Word(self.word()?),
                },
            };
            return Ok(self.emit(token, start));
        }
    }

    fn line_comment(&mut self) -> Result<String, ParseError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if is_line_terminator(c) {
                break;
            }
            if is_illegal(c) {
                return Err(illegal(self.here(), c));
            }
            text.push(c);
            self.bump();
        }
        Ok(text)
    }

    fn block_comment(&mut self, start: Position) -> Result<String, ParseError> {
        self.bump();
        self.bump();
        let mut depth = 1usize;
        let mut text = String::new();
        loop {
            if self.starts_with("/*") {
                depth += 1;
                text.push_str("/*");
                self.bump();
                self.bump();
                continue;
            }
            if self.starts_with("*/") {
                depth -= 1;
                self.bump();
                self.bump();
                if depth == 0 {
                    return Ok(text);
                }
                text.push_str("*/");
                continue;
            }
            match self.peek() {
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnterminatedComment,
                        start,
                        "block comment is never closed",
                    ))
                }
                Some(c) if is_illegal(c) => return Err(illegal(self.here(), c)),
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
    }

    fn quoted(&mut self, start: Position) -> Result<String, ParseError> {
        self.bump();
        let mut value = String::new();
        loop {
            let here = self.here();
            match self.peek() {
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnterminatedString,
                        start,
                        "quoted argument is never closed",
                    ))
                }
                Some('"') => {
                    self.bump();
                    return Ok(value);
                }
                Some(c) if is_line_terminator(c) => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnterminatedString,
                        start,
                        "quoted argument is not closed before the end of the line",
                    ))
                }
                Some('\\') => {
                    self.bump();
                    match self.peek() {
                        None => {
                            return Err(ParseError::new(
                                ParseErrorKind::UnterminatedString,
                                start,
                                "quoted argument is never closed",
                            ))
                        }
                        Some(c) if is_line_terminator(c) => self.eat_line_terminator(),
                        Some(c) if c.is_whitespace() => {
                            return Err(ParseError::new(
                                ParseErrorKind::InvalidEscape,
                                here,
                                "backslash must not be followed by whitespace",
                            ))
                        }
                        Some(c) if is_illegal(c) => return Err(illegal(self.here(), c)),
                        Some(c) => {
                            self.bump();
                            value.push(match c {
                                'n' => '\n',
                                't' => '\t',
                                other => other,
                            });
                        }
                    }
                }
                Some(c) if is_illegal(c) => return Err(illegal(here, c)),
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
    }

    fn triple_quoted(&mut self, start: Position) -> Result<String, ParseError> {
        for _ in 0..3 {
            self.bump();
        }
        let mut value = String::new();
        loop {
            if self.starts_with("\"\"\"") {
                for _ in 0..3 {
                    self.bump();
                }
                return Ok(value);
            }
            match self.peek() {
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnterminatedString,
                        start,
                        "triple-quoted argument is never closed",
                    ))
                }
                Some(c) if is_illegal(c) => return Err(illegal(self.here(), c)),
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
    }

    fn word(&mut self) -> Result<String, ParseError> {
        let mut value = String::new();
        while let Some(c) = self.peek() {
            let here = self.here();
            if self.ends_word(c) {
                break;
            }
            if c == '\\' {
                match self.peek_at(1) {
                    None => {
                        return Err(ParseError::new(
                            ParseErrorKind::InvalidEscape,
                            here,
                            "backslash at end of input",
                        ))
                    }
                    Some(next) if is_line_terminator(next) => {
                        self.bump();
                        self.eat_line_terminator();
                    }
                    Some(next) if next.is_whitespace() => {
                        return Err(ParseError::new(
                            ParseErrorKind::InvalidEscape,
                            here,
                            "backslash must not be followed by whitespace",
                        ))
                    }
                    Some(next) if is_illegal(next) => {
                        self.bump();
                        return Err(illegal(self.here(), next));
                    }
                    Some(next) => {
                        self.bump();
                        self.bump();
                        value.push(next);
                    }
                }
                continue;
            }
            if is_illegal(c) {
                return Err(illegal(here, c));
            }
            if !value.is_empty() && self.match_punctuator().is_some() {
                break;
            }
            value.push(c);
            self.bump();
        }
        Ok(value)
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Spanned, ParseError>;

    /// Yields tokens up to, not including, `Eof`, and stops after the first
    /// error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(Spanned {
                token: Token::Eof, ..
            }) => {
                self.finished = true;
                None
            }
            Ok(spanned) => Some(Ok(spanned)),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Scan the whole input eagerly. The last token is always `Eof`.
pub fn tokenize(src: &str, options: &ParseOptions) -> Result<Vec<Spanned>, ParseError> {
    let mut scanner = Scanner::new(src, options);
    let mut tokens = Vec::new();
    loop {
        let spanned = scanner.next_token()?;
        let done = spanned.token == Token::Eof;
        tokens.push(spanned);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        kinds_with(src, &ParseOptions::default())
    }

    fn kinds_with(src: &str, options: &ParseOptions) -> Vec<Token> {
        tokenize(src, options)
            .unwrap_or_else(|e| panic!("tokenize {:?} failed: {}", src, e))
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    fn lex_err(src: &str) -> ParseError {
        tokenize(src, &ParseOptions::default()).expect_err("expected a lexical error")
    }

    fn word(s: &str) -> Token {
        Token::Word(s.to_owned())
    }

    #[test]
    fn punctuators_split_words_without_whitespace() {
        assert_eq!(
            kinds("a{b;c}"),
            vec![
                word("a"),
                Token::LBrace,
                word("b"),
                Token::Semicolon,
                word("c"),
                Token::RBrace,
                Token::Eof,
            ]
        );
        assert_eq!(
            kinds("key\"quoted\"#note"),
            vec![
                word("key"),
                Token::Quoted("quoted".to_owned()),
                Token::Comment("note".to_owned()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn quoted_escapes_resolve() {
        assert_eq!(
            kinds(r#""a\nb" "tab\tstop" "q\"uote" "back\\slash" "\{""#),
            vec![
                Token::Quoted("a\nb".to_owned()),
                Token::Quoted("tab\tstop".to_owned()),
                Token::Quoted("q\"uote".to_owned()),
                Token::Quoted("back\\slash".to_owned()),
                Token::Quoted("{".to_owned()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn empty_and_back_to_back_quotes() {
        assert_eq!(
            kinds(r#""" "a""b""#),
            vec![
                Token::Quoted(String::new()),
                Token::Quoted("a".to_owned()),
                Token::Quoted("b".to_owned()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn bare_word_escapes_punctuators() {
        assert_eq!(kinds(r"\{x\}\;\#"), vec![word("{x};#"), Token::Eof]);
    }

    #[test]
    fn unterminated_quote_reports_opening_position() {
        let err = lex_err("key \"abc");
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert_eq!((err.line, err.column), (1, 5));
    }

    #[test]
    fn newline_inside_quote_is_unterminated() {
        let err = lex_err("key \"abc\ndef\"");
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
    }

    #[test]
    fn triple_quoted_is_verbatim_and_multiline() {
        let src = "text \"\"\"line \\n one\n\"two\"\n\"\"\" after";
        let toks = tokenize(src, &ParseOptions::default()).unwrap();
        assert_eq!(
            toks[1].token,
            Token::TripleQuoted("line \\n one\n\"two\"\n".to_owned())
        );
        assert_eq!(toks[2].token, word("after"));
        assert_eq!(toks[2].position.line, 3);
    }

    #[test]
    fn unterminated_triple_quote() {
        let err = lex_err("a \"\"\"never\nclosed\"\"");
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert_eq!((err.line, err.column), (1, 3));
    }

    #[test]
    fn continuation_joins_word_and_line() {
        let toks = tokenize("foo\\\nbar baz", &ParseOptions::default()).unwrap();
        assert_eq!(toks[0].token, word("foobar"));
        assert_eq!(toks[1].token, word("baz"));
        assert_eq!((toks[1].position.line, toks[1].position.column), (2, 5));
    }

    #[test]
    fn continuation_between_arguments_suppresses_newline() {
        assert_eq!(
            kinds("foo \\\n  bar\nbaz"),
            vec![
                word("foo"),
                word("bar"),
                Token::Newline,
                word("baz"),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn continuation_inside_quoted_string() {
        assert_eq!(
            kinds("a \"one \\\ntwo\""),
            vec![word("a"), Token::Quoted("one two".to_owned()), Token::Eof]
        );
    }

    #[test]
    fn lonely_continuation_is_rejected() {
        let err = lex_err("\\\nfoo");
        assert_eq!(err.kind, ParseErrorKind::InvalidLineContinuation);
        let err = lex_err("foo\n  \\\nbar");
        assert_eq!(err.kind, ParseErrorKind::InvalidLineContinuation);
        assert_eq!((err.line, err.column), (2, 3));
    }

    #[test]
    fn malformed_escapes() {
        assert_eq!(lex_err("foo \\").kind, ParseErrorKind::InvalidEscape);
        assert_eq!(lex_err("foo\\ bar").kind, ParseErrorKind::InvalidEscape);
        assert_eq!(lex_err("\"foo\\ bar\"").kind, ParseErrorKind::InvalidEscape);
    }

    #[test]
    fn control_characters_are_illegal() {
        let err = lex_err("foo\u{0}bar");
        assert_eq!(err.kind, ParseErrorKind::IllegalCharacter);
        assert_eq!(err.column, 4);
        let err = lex_err("# bell \u{7}");
        assert_eq!(err.kind, ParseErrorKind::IllegalCharacter);
    }

    #[test]
    fn line_terminators_and_positions() {
        let toks = tokenize("a\r\nb\rc\u{2028}d", &ParseOptions::default()).unwrap();
        let lines: Vec<(Token, u32)> = toks
            .into_iter()
            .map(|s| (s.token, s.position.line))
            .collect();
        assert_eq!(
            lines,
            vec![
                (word("a"), 1),
                (Token::Newline, 1),
                (word("b"), 2),
                (Token::Newline, 2),
                (word("c"), 3),
                (Token::Newline, 3),
                (word("d"), 4),
                (Token::Eof, 4),
            ]
        );
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let toks = tokenize("héllo wörld", &ParseOptions::default()).unwrap();
        assert_eq!(toks[1].position.column, 7);
        assert_eq!(toks[1].position.offset, "héllo ".len());
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        let toks = tokenize("\u{FEFF}foo", &ParseOptions::default()).unwrap();
        assert_eq!(toks[0].token, word("foo"));
        assert_eq!(toks[0].position.column, 1);
    }

    #[test]
    fn c_style_comments_require_option() {
        assert_eq!(kinds("a//b"), vec![word("a//b"), Token::Eof]);
        let opts = ParseOptions::default().with_c_style_comments();
        assert_eq!(
            kinds_with("a//b\nc", &opts),
            vec![
                word("a"),
                Token::Comment("b".to_owned()),
                Token::Newline,
                word("c"),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn block_comments_nest() {
        let opts = ParseOptions::default().with_c_style_comments();
        let toks = tokenize("a /* x /* y */ z\n */ b", &opts).unwrap();
        assert_eq!(toks[1].token, Token::Comment(" x /* y */ z\n ".to_owned()));
        assert_eq!(toks[2].token, word("b"));
        assert_eq!(toks[2].position.line, 2);
    }

    #[test]
    fn unterminated_block_comment() {
        let opts = ParseOptions::default().with_c_style_comments();
        let err = tokenize("a\n  /* /* */", &opts).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedComment);
        assert_eq!((err.line, err.column), (2, 3));
    }

    #[test]
    fn declared_punctuators_use_longest_match() {
        let opts = ParseOptions::default().with_punctuators([":", ":="]);
        assert_eq!(
            kinds_with("a:=b c:d", &opts),
            vec![
                word("a"),
                Token::Punctuator(":=".to_owned()),
                word("b"),
                word("c"),
                Token::Punctuator(":".to_owned()),
                word("d"),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn parens_are_plain_without_expressions() {
        assert_eq!(kinds("f(x)"), vec![word("f(x)"), Token::Eof]);
        let opts = ParseOptions::default().with_expression_arguments();
        assert_eq!(
            kinds_with("f(x)", &opts),
            vec![
                word("f"),
                Token::LParen,
                word("x"),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn iterator_stops_after_first_error() {
        let mut scanner = Scanner::new("ok \"broken", &ParseOptions::default());
        assert!(matches!(scanner.next(), Some(Ok(_))));
        assert!(matches!(scanner.next(), Some(Err(_))));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn here_tracks_the_cursor_alongside_iteration() {
        let mut scanner = Scanner::new("ab\ncd", &ParseOptions::default());
        assert_eq!(scanner.here(), Position::START);
        assert!(matches!(scanner.next(), Some(Ok(_))));
        assert_eq!((scanner.here().line, scanner.here().column), (1, 3));
        assert!(matches!(scanner.next(), Some(Ok(_))));
        assert_eq!(
            scanner.here(),
            Position {
                line: 2,
                column: 1,
                offset: 3,
            }
        );

        let mut scanner = Scanner::new("ab\ncd", &ParseOptions::default());
        let newline_at = scanner.position(|t| t.is_ok_and(|s| s.token == Token::Newline));
        assert_eq!(newline_at, Some(1));
    }
}
