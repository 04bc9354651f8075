//! Discord bot token value object.

use std::fmt;

/// Discord bot token with validation and masking.
#[derive(Clone, PartialEq, Eq)]
pub struct BotToken {
    value: String,
}

impl BotToken {
    /// Creates a token, rejecting blank values and a stray `Bot ` prefix.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let value = value.trim();
        let value = value.strip_prefix("Bot ").unwrap_or(value).trim();

        if value.is_empty() || value.contains(char::is_whitespace) {
            return None;
        }

        Some(Self {
            value: value.to_string(),
        })
    }

    /// Returns token as string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Value for the HTTP `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bot {}", self.value)
    }

    /// Returns masked token for display.
    #[must_use]
    pub fn masked(&self) -> String {
        if self.value.len() <= 10 {
            return "*".repeat(self.value.len());
        }

        let visible_prefix = &self.value[..4];
        let visible_suffix = &self.value[self.value.len() - 4..];
        format!("{visible_prefix}...{visible_suffix}")
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotToken")
            .field("value", &self.masked())
            .finish()
    }
}

impl fmt::Display for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}
