/// Why a directive tree could not be mapped onto a type.
///
/// `field` is the dotted path from the mapped root, e.g. `database.port`.
/// Line and column point at the offending directive's name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("missing required field '{field}'")]
    MissingField { field: String },

    #[error("{line}:{column}: '{field}' takes {expected} argument(s), found {found}")]
    WrongArity {
        field: String,
        expected: usize,
        found: usize,
        line: u32,
        column: u32,
    },

    #[error("{line}:{column}: '{field}': cannot read '{value}' as {expected}")]
    Coercion {
        field: String,
        value: String,
        expected: String,
        line: u32,
        column: u32,
    },

    #[error(
        "{line}:{column}: '{field}': '{value}' is not a {enum_name} (expected one of: {})",
        .valid.join(", ")
    )]
    UnknownEnumMember {
        field: String,
        value: String,
        enum_name: String,
        valid: Vec<String>,
        line: u32,
        column: u32,
    },

    #[error("{line}:{column}: unknown directive '{name}' in {scope}")]
    UnknownDirective {
        name: String,
        scope: String,
        line: u32,
        column: u32,
    },

    #[error("{line}:{column}: '{field}' needs a block")]
    MissingBlock {
        field: String,
        line: u32,
        column: u32,
    },

    #[error("{line}:{column}: '{field}' does not take a block")]
    UnexpectedBlock {
        field: String,
        line: u32,
        column: u32,
    },

    #[error("{line}:{column}: '{field}' is already set on line {first_line}")]
    DuplicateField {
        field: String,
        line: u32,
        column: u32,
        first_line: u32,
    },

    #[error("no top-level '{name}' directive")]
    MissingRoot { name: String },

    #[error("invalid descriptor for '{field}': {message}")]
    InvalidDescriptor { field: String, message: String },

    #[error("cannot build {type_name}: {message}")]
    Deserialize { type_name: String, message: String },
}

impl MappingError {
    /// The dotted field path the error is about, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            MappingError::MissingField { field }
            | MappingError::WrongArity { field, .. }
            | MappingError::Coercion { field, .. }
            | MappingError::UnknownEnumMember { field, .. }
            | MappingError::MissingBlock { field, .. }
            | MappingError::UnexpectedBlock { field, .. }
            | MappingError::DuplicateField { field, .. }
            | MappingError::InvalidDescriptor { field, .. } => Some(field.as_str()),
            MappingError::UnknownDirective { .. }
            | MappingError::MissingRoot { .. }
            | MappingError::Deserialize { .. } => None,
        }
    }

    /// Line and column of the offending directive, when one exists.
    pub fn position(&self) -> Option<(u32, u32)> {
        match *self {
            MappingError::WrongArity { line, column, .. }
            | MappingError::Coercion { line, column, .. }
            | MappingError::UnknownEnumMember { line, column, .. }
            | MappingError::UnknownDirective { line, column, .. }
            | MappingError::MissingBlock { line, column, .. }
            | MappingError::UnexpectedBlock { line, column, .. }
            | MappingError::DuplicateField { line, column, .. } => Some((line, column)),
            _ => None,
        }
    }
}
