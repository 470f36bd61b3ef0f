// Error handling for filterchain

use std::fmt;

use crate::domain::template::Token;

/// What went wrong, independent of where it happened
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    #[error("filter with name '{0}' is already registered")]
    DuplicateRegistration(String),

    #[error("filter with name '{0}' does not exist (therefore cannot be replaced)")]
    MissingRegistration(String),

    #[error("filter with name '{0}' not found")]
    UnknownFilter(String),

    #[error("filter parameter required after ':'")]
    MissingArgument,

    #[error("{0}")]
    Syntax(String),

    #[error("{0}")]
    Execution(String),
}

/// Source position of a token that caused an error
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub line: usize,
    pub col: usize,
    pub token: String,
}

/// Error raised while registering, parsing or executing filters.
///
/// Carries the component that produced it (`sender`), the template it belongs
/// to once known, and the token location once known.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub sender: String,
    pub template: Option<String>,
    pub location: Option<Location>,
    pub kind: ErrorKind,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn new(sender: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            sender: sender.into(),
            template: None,
            location: None,
            kind,
        }
    }

    /// Error raised by a filter's own logic
    pub fn execution(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(sender, ErrorKind::Execution(message.into()))
    }

    pub fn syntax(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(sender, ErrorKind::Syntax(message.into()))
    }

    pub fn at(mut self, token: &Token) -> Self {
        self.location = Some(Location {
            line: token.line,
            col: token.col,
            token: token.val.clone(),
        });
        self
    }

    pub fn in_template(mut self, template: Option<&str>) -> Self {
        if let Some(name) = template {
            self.template = Some(name.to_string());
        }
        self
    }

    /// Attach the template and token location unless a location is already set
    pub fn update_from_token_if_needed(self, template: Option<&str>, token: &Token) -> Self {
        if self.location.is_some() {
            return self;
        }
        self.at(token).in_template(template)
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Error (where: {})", self.sender)?;
        if let Some(template) = &self.template {
            write!(f, " in {}", template)?;
        }
        if let Some(loc) = &self.location {
            write!(f, " | Line {} Col {} near '{}'", loc.line, loc.col, loc.token)?;
        }
        write!(f, "] {}", self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
