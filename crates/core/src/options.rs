//! Grammar extensions and limits, chosen per parse call.

/// Default nesting limit for blocks and expression arguments.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options controlling which optional grammar extensions are recognized.
///
/// The defaults describe the base language: `#` comments only, no expression
/// arguments, no user punctuators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Recognize `// line` and `/* block */` comments. Block comments nest.
    pub c_style_comments: bool,
    /// Recognize parenthesized expression arguments such as `(x + 1)`.
    pub expression_arguments: bool,
    /// Extra punctuators that split bare words and stand as their own
    /// arguments, e.g. `:` or `:=`.
    pub punctuator_arguments: Vec<String>,
    /// Maximum nesting of blocks and expressions.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            c_style_comments: false,
            expression_arguments: false,
            punctuator_arguments: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn with_c_style_comments(mut self) -> Self {
        self.c_style_comments = true;
        self
    }

    pub fn with_expression_arguments(mut self) -> Self {
        self.expression_arguments = true;
        self
    }

    pub fn with_punctuators<I, S>(mut self, punctuators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.punctuator_arguments
            .extend(punctuators.into_iter().map(Into::into));
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
