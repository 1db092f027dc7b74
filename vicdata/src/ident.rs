//! Identifier validation shared by every registry.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentError {
    #[error("identifier is empty")]
    Empty,
    #[error("identifier {0:?} contains a character outside [A-Za-z0-9_]")]
    BadChar(String),
}

/// Registry identifiers are non-empty and restricted to `[A-Za-z0-9_]+`.
pub fn validate_identifier(ident: &str) -> Result<(), IdentError> {
    if ident.is_empty() {
        return Err(IdentError::Empty);
    }
    if ident
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_')
    {
        Ok(())
    } else {
        Err(IdentError::BadChar(ident.to_string()))
    }
}
