use std::time::Duration;

pub const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json&compress=zlib-stream";
pub const GATEWAY_QUERY: &str = "/?v=10&encoding=json&compress=zlib-stream";
pub const ZLIB_SUFFIX: [u8; 4] = [0x00, 0x00, 0xff, 0xff];

pub const RECONNECT_DELAY_BASE: Duration = Duration::from_secs(1);
pub const RECONNECT_DELAY_MAX: Duration = Duration::from_secs(60);
pub const RECONNECT_JITTER_MAX: Duration = Duration::from_millis(500);
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
pub const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

pub const CONNECTION_PROPERTIES_OS: &str = std::env::consts::OS;
pub const CONNECTION_PROPERTIES_LIBRARY: &str = "frametrim";

pub const LARGE_THRESHOLD: u16 = 50;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOpcode {
    Dispatch = 0,
    Heartbeat = 1,
    Identify = 2,
    Resume = 6,
    Reconnect = 7,
    InvalidSession = 9,
    Hello = 10,
    HeartbeatAck = 11,
}

impl GatewayOpcode {
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            6 => Some(Self::Resume),
            7 => Some(Self::Reconnect),
            9 => Some(Self::InvalidSession),
            10 => Some(Self::Hello),
            11 => Some(Self::HeartbeatAck),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<GatewayOpcode> for u8 {
    fn from(opcode: GatewayOpcode) -> Self {
        opcode.as_u8()
    }
}

/// Subset of gateway intents relevant to a message-watching bot.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayIntent {
    Guilds = 1 << 0,
    GuildMessages = 1 << 9,
    /// Privileged; must be enabled for the application in the developer portal.
    MessageContent = 1 << 15,
}

impl GatewayIntent {
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

impl From<GatewayIntent> for u32 {
    fn from(intent: GatewayIntent) -> Self {
        intent.as_u32()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GatewayIntents(u32);

impl GatewayIntents {
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn with(mut self, intent: GatewayIntent) -> Self {
        self.0 |= intent.as_u32();
        self
    }

    #[must_use]
    pub const fn has(self, intent: GatewayIntent) -> bool {
        (self.0 & intent.as_u32()) != 0
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Guild structure, guild messages and their content.
    #[must_use]
    pub const fn default_bot() -> Self {
        Self::new()
            .with(GatewayIntent::Guilds)
            .with(GatewayIntent::GuildMessages)
            .with(GatewayIntent::MessageContent)
    }
}

impl From<GatewayIntents> for u32 {
    fn from(intents: GatewayIntents) -> Self {
        intents.as_u32()
    }
}
