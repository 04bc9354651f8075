use std::io;
use thiserror::Error;

use super::constants::GatewayOpcode;
use crate::domain::errors::DiscordError;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures of a single gateway session.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("connection closed with code {code}: {reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("websocket error: {message}")]
    WebSocket { message: String },

    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("session invalidated, resumable: {resumable}")]
    SessionInvalidated { resumable: bool },

    #[error("heartbeat timeout: no acknowledgment received")]
    HeartbeatTimeout,

    #[error("reconnection limit exceeded after {attempts} attempts")]
    ReconnectionLimitExceeded { attempts: u32 },

    #[error("compression error: {message}")]
    CompressionError { message: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },

    #[error("protocol error: unexpected opcode {opcode:?}")]
    UnexpectedOpcode { opcode: Option<GatewayOpcode> },

    #[error("protocol error: {message}")]
    ProtocolError { message: String },

    #[error("timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("gateway shutting down")]
    ShuttingDown,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl GatewayError {
    #[must_use]
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn websocket(message: impl Into<String>) -> Self {
        Self::WebSocket {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn compression(message: impl Into<String>) -> Self {
        Self::CompressionError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Builds the error for a close frame, classifying fatal codes.
    #[must_use]
    pub fn closed(code: u16, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match GatewayCloseCode::from_u16(code) {
            Some(close) if close.is_fatal() => Self::auth_failed(format!("{close:?}: {reason}")),
            _ => Self::ConnectionClosed { code, reason },
        }
    }

    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::ConnectionClosed { .. }
                | Self::WebSocket { .. }
                | Self::HeartbeatTimeout
                | Self::SessionInvalidated { resumable: true }
                | Self::Io(_)
        )
    }

    #[must_use]
    pub const fn should_reconnect(&self) -> bool {
        match self {
            Self::SessionInvalidated { .. }
            | Self::ConnectionFailed { .. }
            | Self::ConnectionClosed { .. }
            | Self::WebSocket { .. }
            | Self::HeartbeatTimeout
            | Self::CompressionError { .. }
            | Self::Timeout { .. }
            | Self::Io(_) => true,

            Self::AuthenticationFailed { .. }
            | Self::ReconnectionLimitExceeded { .. }
            | Self::ShuttingDown
            | Self::ProtocolError { .. }
            | Self::SerializationError { .. }
            | Self::UnexpectedOpcode { .. } => false,
        }
    }

    #[must_use]
    pub const fn can_resume(&self) -> bool {
        match self {
            Self::SessionInvalidated { resumable } => *resumable,
            Self::ConnectionClosed { code, .. } => match GatewayCloseCode::from_u16(*code) {
                Some(close) => close.is_resumable(),
                None => true,
            },
            Self::WebSocket { .. } | Self::HeartbeatTimeout | Self::Io(_) => true,
            _ => false,
        }
    }

    #[must_use]
    pub const fn close_code(&self) -> Option<u16> {
        if let Self::ConnectionClosed { code, .. } = self {
            Some(*code)
        } else {
            None
        }
    }
}

impl From<GatewayError> for DiscordError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::AuthenticationFailed { message } => Self::rejected(message),
            other => Self::gateway(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayCloseCode {
    UnknownError = 4000,
    UnknownOpcode = 4001,
    DecodeError = 4002,
    NotAuthenticated = 4003,
    AuthenticationFailed = 4004,
    AlreadyAuthenticated = 4005,
    InvalidSequence = 4007,
    RateLimited = 4008,
    SessionTimedOut = 4009,
    InvalidShard = 4010,
    ShardingRequired = 4011,
    InvalidApiVersion = 4012,
    InvalidIntents = 4013,
    DisallowedIntents = 4014,
}

impl GatewayCloseCode {
    #[must_use]
    pub const fn from_u16(code: u16) -> Option<Self> {
        match code {
            4000 => Some(Self::UnknownError),
            4001 => Some(Self::UnknownOpcode),
            4002 => Some(Self::DecodeError),
            4003 => Some(Self::NotAuthenticated),
            4004 => Some(Self::AuthenticationFailed),
            4005 => Some(Self::AlreadyAuthenticated),
            4007 => Some(Self::InvalidSequence),
            4008 => Some(Self::RateLimited),
            4009 => Some(Self::SessionTimedOut),
            4010 => Some(Self::InvalidShard),
            4011 => Some(Self::ShardingRequired),
            4012 => Some(Self::InvalidApiVersion),
            4013 => Some(Self::InvalidIntents),
            4014 => Some(Self::DisallowedIntents),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_resumable(self) -> bool {
        matches!(
            self,
            Self::UnknownError
                | Self::UnknownOpcode
                | Self::DecodeError
                | Self::NotAuthenticated
                | Self::AlreadyAuthenticated
                | Self::RateLimited
        )
    }

    /// Codes after which reconnecting cannot help, e.g. a bad token or the
    /// privileged message content intent not being enabled.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed
                | Self::InvalidShard
                | Self::ShardingRequired
                | Self::InvalidApiVersion
                | Self::InvalidIntents
                | Self::DisallowedIntents
        )
    }
}

impl From<GatewayCloseCode> for u16 {
    fn from(code: GatewayCloseCode) -> Self {
        code as Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_recoverability() {
        assert!(GatewayError::connection_failed("test").is_recoverable());
        assert!(GatewayError::HeartbeatTimeout.is_recoverable());
        assert!(!GatewayError::auth_failed("test").is_recoverable());
        assert!(!GatewayError::ShuttingDown.should_reconnect());
    }

    #[test]
    fn test_fatal_close_code_stops_reconnecting() {
        let error = GatewayError::closed(4014, "Disallowed intent(s).");
        assert!(matches!(error, GatewayError::AuthenticationFailed { .. }));
        assert!(!error.should_reconnect());

        let error = GatewayError::closed(4000, "Unknown error");
        assert!(error.should_reconnect());
        assert!(error.can_resume());
        assert_eq!(error.close_code(), Some(4000));
    }

    #[test]
    fn test_invalid_sequence_requires_fresh_session() {
        let error = GatewayError::closed(4007, "Invalid seq");
        assert!(error.should_reconnect());
        assert!(!error.can_resume());
        assert!(!GatewayError::SessionInvalidated { resumable: false }.can_resume());
    }

    #[test]
    fn test_conversion_to_discord_error() {
        let error: DiscordError = GatewayError::auth_failed("bad token").into();
        assert!(matches!(error, DiscordError::Rejected { .. }));
    }
}
