use std::fmt;

use thiserror::Error;

/// 1-based line/column of an element in overlay source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
}

impl TextPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

fn located(position: &Option<TextPosition>, message: &str) -> String {
    match position {
        Some(position) => format!("{position}: {message}"),
        None => message.to_string(),
    }
}

/// Malformed or schema-violating overlay markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", located(.position, .message))]
pub struct FormatError {
    pub position: Option<TextPosition>,
    pub message: String,
}

impl FormatError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            position: None,
            message: message.into(),
        }
    }

    pub fn at(position: Option<TextPosition>, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// A well-formed overlay whose content breaks a uniqueness or existence rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", located(.position, .message))]
pub struct SemanticError {
    pub position: Option<TextPosition>,
    pub message: String,
}

impl SemanticError {
    pub fn at(position: Option<TextPosition>, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThemeError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
    #[error("resource '{prefix}.{name}' not found")]
    ResourceNotFound { prefix: String, name: String },
    #[error("failed to read resource '{prefix}.{name}': {message}")]
    ResourceRead {
        prefix: String,
        name: String,
        message: String,
    },
    #[error("GlobalStyle named '{0}' is not supported")]
    UnsupportedStyle(String),
    #[error("theme '{0}' is not registered")]
    KeyNotFound(String),
    #[error("invalid theme catalog: {0}")]
    Catalog(String),
    #[error("grammar '{name}': {source}")]
    Grammar {
        name: String,
        #[source]
        source: Box<ThemeError>,
    },
    #[error("theme '{key}': {source}")]
    Theme {
        key: String,
        #[source]
        source: Box<ThemeError>,
    },
}

impl ThemeError {
    pub fn in_grammar(self, name: impl Into<String>) -> Self {
        ThemeError::Grammar {
            name: name.into(),
            source: Box::new(self),
        }
    }

    pub fn in_theme(self, key: impl Into<String>) -> Self {
        ThemeError::Theme {
            key: key.into(),
            source: Box::new(self),
        }
    }

    /// Strips `Grammar`/`Theme` context wrappers.
    pub fn root_cause(&self) -> &ThemeError {
        match self {
            ThemeError::Grammar { source, .. } | ThemeError::Theme { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}
