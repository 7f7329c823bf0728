use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn corpus_empty(root: impl Into<String>) -> Error {
        Error(ErrorKind::CorpusEmpty { root: root.into() }.into())
    }

    pub fn mismatched_paren(position: usize) -> Error {
        Error(ErrorKind::MismatchedParen { position }.into())
    }

    pub fn missing_operand(operator: &'static str) -> Error {
        Error(ErrorKind::MissingOperand { operator }.into())
    }

    pub fn malformed_query(remaining: usize) -> Error {
        Error(ErrorKind::MalformedQuery { remaining }.into())
    }

    pub fn index_corruption(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::IndexCorruption {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    /// Returns `true` for the failures that are scoped to a single query
    /// and leave the loaded index usable.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MismatchedParen { .. }
                | ErrorKind::MissingOperand { .. }
                | ErrorKind::MalformedQuery { .. }
                | ErrorKind::IndexCorruption { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("no documents found under '{root}'")]
    CorpusEmpty { root: String },

    #[error("mismatched parentheses at token {position}")]
    MismatchedParen { position: usize },

    #[error("{operator} is missing an operand")]
    MissingOperand { operator: &'static str },

    #[error("query does not reduce to a single result set ({remaining} left on the stack)")]
    MalformedQuery { remaining: usize },

    #[error("index corruption in '{element}': {message}")]
    IndexCorruption { element: String, message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}
