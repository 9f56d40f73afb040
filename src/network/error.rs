use thiserror::Error;

/// Errors raised by the network arena
#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    /// The element does not exist or has been deleted
    #[error("Element #{0} does not exist")]
    NotFound(usize),

    /// A sibling with the same name is already present under the parent
    #[error("Element '{name}' already exists under '{parent}'")]
    DuplicateName { parent: String, name: String },

    /// Element names must be non-empty and must not contain a path separator
    #[error("Invalid element name '{0}'")]
    InvalidName(String),

    /// The root element is owned by the network itself
    #[error("The root element cannot be deleted or copied")]
    RootElement,

    /// The element exists but carries a different payload than required
    #[error("Element '{path}' is not a {expected}")]
    WrongKind { path: String, expected: &'static str },
}
