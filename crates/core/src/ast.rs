//! The directive tree produced by the parser.
//!
//! A [`Document`] owns its directives outright; children live in the
//! [`Block`] of their parent, so the tree has no back-references and is
//! immutable once [`crate::parse`] returns it.

use serde::Serialize;
use std::fmt;

// ──────────────────────────────────────────────
// Positions
// ──────────────────────────────────────────────

/// A source location. `line` and `column` are 1-based and count characters;
/// `offset` is the byte offset into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    pub const START: Position = Position {
        line: 1,
        column: 1,
        offset: 0,
    };
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ──────────────────────────────────────────────
// Arguments
// ──────────────────────────────────────────────

/// How an argument was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentKind {
    /// Unquoted word; escapes already resolved.
    Word,
    /// One of the punctuators declared in the parse options.
    Punctuator,
    /// `"..."` string; escapes already resolved.
    Quoted,
    /// `"""..."""` string, taken verbatim.
    TripleQuoted,
    /// `( ... )` group; only with expression arguments enabled.
    Expression,
}

/// One value attached to a directive.
///
/// For expressions, `value` is the verbatim text between the outer
/// parentheses and `items` holds the nested arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Argument {
    pub kind: ArgumentKind,
    pub value: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Argument>,
    pub position: Position,
}

impl Argument {
    pub fn new(kind: ArgumentKind, value: impl Into<String>, position: Position) -> Self {
        Argument {
            kind,
            value: value.into(),
            items: Vec::new(),
            position,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_expression(&self) -> bool {
        self.kind == ArgumentKind::Expression
    }
}

// ──────────────────────────────────────────────
// Directives
// ──────────────────────────────────────────────

/// A brace-delimited list of child directives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub open: Position,
    pub close: Position,
    pub directives: Vec<Directive>,
}

/// A named entry with arguments and an optional block of children.
/// The name is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    pub name: Argument,
    pub arguments: Vec<Argument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<Block>,
}

impl Directive {
    pub fn name(&self) -> &str {
        &self.name.value
    }

    pub fn position(&self) -> Position {
        self.name.position
    }

    pub fn args(&self) -> impl Iterator<Item = &str> + '_ {
        self.arguments.iter().map(Argument::as_str)
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).map(Argument::as_str)
    }

    pub fn has_block(&self) -> bool {
        self.block.is_some()
    }

    /// Child directives; empty when there is no block.
    pub fn children(&self) -> &[Directive] {
        match &self.block {
            Some(block) => &block.directives,
            None => &[],
        }
    }

    pub fn child(&self, name: &str) -> Option<&Directive> {
        self.children().iter().find(|d| d.name() == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Directive> + 'a {
        self.children().iter().filter(move |d| d.name() == name)
    }

    /// Follow a path of names through nested blocks, taking the first match
    /// at each level.
    pub fn get(&self, path: &[&str]) -> Option<&Directive> {
        lookup_path(self.children(), path)
    }
}

/// A comment, kept apart from the directives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub text: String,
    pub position: Position,
}

/// The result of a parse: the top-level directives plus every comment in
/// source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub directives: Vec<Directive>,
    pub comments: Vec<Comment>,
}

impl Document {
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.name() == name)
    }

    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Directive> + 'a {
        self.directives.iter().filter(move |d| d.name() == name)
    }

    pub fn get(&self, path: &[&str]) -> Option<&Directive> {
        lookup_path(&self.directives, path)
    }

    /// Compact notation, one line per top-level directive:
    /// `<server> [<host> <localhost>; <port> <8080>]`.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for (i, d) in self.directives.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            outline_directive(d, &mut out);
        }
        out
    }
}

fn lookup_path<'a>(mut level: &'a [Directive], path: &[&str]) -> Option<&'a Directive> {
    let (last, parents) = path.split_last()?;
    for name in parents {
        level = level.iter().find(|d| d.name() == *name)?.children();
    }
    level.iter().find(|d| d.name() == *last)
}

fn outline_directive(d: &Directive, out: &mut String) {
    out.push('<');
    out.push_str(d.name());
    out.push('>');
    for arg in &d.arguments {
        out.push_str(" <");
        out.push_str(&arg.value);
        out.push('>');
    }
    if let Some(block) = &d.block {
        out.push_str(" [");
        for (i, child) in block.directives.iter().enumerate() {
            if i > 0 {
                out.push_str("; ");
            }
            outline_directive(child, out);
        }
        out.push(']');
    }
}

// ──────────────────────────────────────────────
// Rendering
// ──────────────────────────────────────────────

const RESERVED: &[char] = &['{', '}', ';', '"', '#', '\\', '(', ')'];

fn needs_quotes(value: &str) -> bool {
    value.is_empty() || value.chars().any(|c| c.is_whitespace() || c.is_control())
}

fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in value.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            other => write!(f, "{}", other)?,
        }
    }
    f.write_str("\"")
}

fn write_word(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    if needs_quotes(value) {
        return write_quoted(f, value);
    }
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        let comment_start = c == '/' && matches!(chars.peek(), Some('/') | Some('*'));
        if RESERVED.contains(&c) || comment_start {
            f.write_str("\\")?;
        }
        write!(f, "{}", c)?;
    }
    Ok(())
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ArgumentKind::Word => write_word(f, &self.value),
            ArgumentKind::Punctuator => f.write_str(&self.value),
            ArgumentKind::Quoted => write_quoted(f, &self.value),
            ArgumentKind::TripleQuoted => write!(f, "\"\"\"{}\"\"\"", self.value),
            ArgumentKind::Expression => write!(f, "({})", self.value),
        }
    }
}

fn write_directive(f: &mut fmt::Formatter<'_>, d: &Directive, depth: usize) -> fmt::Result {
    let indent = "    ".repeat(depth);
    write!(f, "{}{}", indent, d.name)?;
    for arg in &d.arguments {
        write!(f, " {}", arg)?;
    }
    if let Some(block) = &d.block {
        if block.directives.is_empty() {
            f.write_str(" {}")?;
        } else {
            f.write_str(" {\n")?;
            for child in &block.directives {
                write_directive(f, child, depth + 1)?;
                f.write_str("\n")?;
            }
            write!(f, "{}}}", indent)?;
        }
    }
    Ok(())
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_directive(f, self, 0)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.directives {
            write_directive(f, d, 0)?;
            f.write_str("\n")?;
        }
        Ok(())
    }
}
