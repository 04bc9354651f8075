use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    WaitingForHello,
    Identifying,
    Resuming,
    Connected,
    ShuttingDown,
}

impl ConnectionState {
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    #[must_use]
    pub const fn is_handshaking(&self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::WaitingForHello | Self::Identifying | Self::Resuming
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::WaitingForHello => write!(f, "Waiting for Hello"),
            Self::Identifying => write!(f, "Identifying"),
            Self::Resuming => write!(f, "Resuming"),
            Self::Connected => write!(f, "Connected"),
            Self::ShuttingDown => write!(f, "Shutting Down"),
        }
    }
}

/// Resume data carried across connections.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    session_id: Option<String>,
    resume_gateway_url: Option<String>,
    sequence: Option<u64>,
}

impl SessionState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            session_id: None,
            resume_gateway_url: None,
            sequence: None,
        }
    }

    pub fn start(&mut self, session_id: String, resume_url: Option<String>) {
        self.session_id = Some(session_id);
        self.resume_gateway_url = resume_url;
    }

    pub const fn observe_sequence(&mut self, sequence: Option<u64>) {
        if let Some(seq) = sequence {
            self.sequence = Some(seq);
        }
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    #[must_use]
    pub fn resume_gateway_url(&self) -> Option<&str> {
        self.resume_gateway_url.as_deref()
    }

    #[must_use]
    pub const fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    /// Session id and sequence when a resume can be attempted.
    #[must_use]
    pub fn resume_point(&self) -> Option<(&str, u64)> {
        Some((self.session_id.as_deref()?, self.sequence?))
    }

    #[must_use]
    pub const fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.sequence.is_some()
    }

    pub fn clear(&mut self) {
        self.session_id = None;
        self.resume_gateway_url = None;
        self.sequence = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "Connected");
        assert_eq!(ConnectionState::WaitingForHello.to_string(), "Waiting for Hello");
    }

    #[test]
    fn test_connection_state_checks() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(ConnectionState::Resuming.is_handshaking());
        assert!(!ConnectionState::ShuttingDown.is_handshaking());
    }

    #[test]
    fn test_session_resume_point() {
        let mut session = SessionState::new();
        assert!(session.resume_point().is_none());

        session.start("abc".into(), Some("wss://resume.discord.gg".into()));
        assert!(!session.can_resume());

        session.observe_sequence(None);
        session.observe_sequence(Some(42));
        assert_eq!(session.resume_point(), Some(("abc", 42)));
        assert_eq!(session.resume_gateway_url(), Some("wss://resume.discord.gg"));
    }

    #[test]
    fn test_session_clear() {
        let mut session = SessionState::new();
        session.start("abc".into(), None);
        session.observe_sequence(Some(1));

        session.clear();
        assert!(session.session_id().is_none());
        assert!(session.sequence().is_none());
        assert!(!session.can_resume());
    }
}
