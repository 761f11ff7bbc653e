//! Validated primitive types shared across the HLC crates.
//!
//! Ledger keys and caller identifiers arrive as free text from clients. [`ResourceId`] makes
//! the "usable as a key" check happen once, at the boundary, so contract code can rely on it
//! afterwards.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input contained control characters, which are not allowed in ledger keys
    #[error("Text contains control characters")]
    ControlCharacters,
}

/// Identifier of a stored resource, as assigned by the caller.
///
/// The value is not trimmed: identifiers are ledger keys and must be stored exactly as
/// supplied. Whitespace-only and control-character input is rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(String);

impl ResourceId {
    /// Parses a caller-supplied identifier.
    pub fn parse(input: impl Into<String>) -> Result<Self, TextError> {
        let input = input.into();
        if input.trim().is_empty() {
            return Err(TextError::Empty);
        }
        if input.chars().any(char::is_control) {
            return Err(TextError::ControlCharacters);
        }
        Ok(Self(input))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id_keeps_value_verbatim() {
        let id = ResourceId::parse(" P1").expect("leading space is part of the key");
        assert_eq!(id.as_str(), " P1");
    }

    #[test]
    fn test_resource_id_rejects_empty_and_control_characters() {
        assert_eq!(ResourceId::parse(""), Err(TextError::Empty));
        assert_eq!(ResourceId::parse("\t"), Err(TextError::Empty));
        assert_eq!(
            ResourceId::parse("P\u{0}1"),
            Err(TextError::ControlCharacters)
        );
    }
}
