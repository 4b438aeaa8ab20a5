//! confetti-core: parser for the Confetti configuration language.
//!
//! Confetti text is a sequence of directives. Each directive has a name,
//! zero or more arguments and an optional brace-delimited block of child
//! directives. Parsing runs in two stages:
//!
//! - [`lexer`] -- the scanner, which classifies characters into tokens
//! - [`parser`] -- the tree builder, which assembles a [`Document`]
//!
//! Optional grammar extensions (C-style comments, expression arguments,
//! punctuator arguments) are switched on through [`ParseOptions`].
//!
//! ```
//! let doc = confetti_core::parse("server { port 8080 }").unwrap();
//! assert_eq!(doc.get(&["server", "port"]).and_then(|d| d.arg(0)), Some("8080"));
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod walk;

// ── Convenience re-exports ───────────────────────────────────────────

pub use ast::{Argument, ArgumentKind, Block, Comment, Directive, Document, Position};
pub use error::{ErrorCategory, ParseError, ParseErrorKind};
pub use options::{ParseOptions, DEFAULT_MAX_DEPTH};
pub use parser::{parse, parse_with};
pub use walk::Event;
