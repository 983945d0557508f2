//! Message validation rules.

use chathub_core::error::AppError;

/// Rejection text for blank messages.
pub const EMPTY_MESSAGE: &str = "You cannot submit an empty message";

/// Validates chat message content.
#[derive(Debug, Clone, Copy)]
pub struct MessageValidator {
    max_length: usize,
}

impl MessageValidator {
    /// Create a validator accepting at most `max_length` characters.
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    /// Validate message content.
    ///
    /// Length is counted in characters, not bytes. Whitespace-only content
    /// counts as empty.
    pub fn validate_content(&self, content: &str) -> Result<(), AppError> {
        if content.trim().is_empty() {
            return Err(AppError::validation(EMPTY_MESSAGE));
        }

        if content.chars().count() > self.max_length {
            return Err(AppError::validation(format!(
                "Message too long. Max {} characters",
                self.max_length
            )));
        }

        Ok(())
    }
}
