use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::constants::{
    CONNECTION_PROPERTIES_LIBRARY, CONNECTION_PROPERTIES_OS, GatewayOpcode, LARGE_THRESHOLD,
};

/// Outgoing gateway frame.
#[derive(Debug, Serialize)]
pub struct GatewayPayload {
    pub op: u8,
    pub d: Value,
}

impl GatewayPayload {
    #[must_use]
    pub fn heartbeat(sequence: Option<u64>) -> Self {
        Self {
            op: GatewayOpcode::Heartbeat.as_u8(),
            d: sequence.map_or(Value::Null, |s| Value::Number(s.into())),
        }
    }

    #[must_use]
    pub fn identify(token: &str, intents: u32) -> Self {
        let identify = IdentifyData {
            token,
            properties: IdentifyProperties {
                os: CONNECTION_PROPERTIES_OS,
                browser: CONNECTION_PROPERTIES_LIBRARY,
                device: CONNECTION_PROPERTIES_LIBRARY,
            },
            large_threshold: LARGE_THRESHOLD,
            intents,
        };

        Self {
            op: GatewayOpcode::Identify.as_u8(),
            d: serde_json::to_value(identify).unwrap_or(Value::Null),
        }
    }

    #[must_use]
    pub fn resume(token: &str, session_id: &str, sequence: u64) -> Self {
        let resume = ResumeData {
            token,
            session_id,
            seq: sequence,
        };

        Self {
            op: GatewayOpcode::Resume.as_u8(),
            d: serde_json::to_value(resume).unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Serialize)]
struct IdentifyData<'a> {
    token: &'a str,
    properties: IdentifyProperties,
    large_threshold: u16,
    intents: u32,
}

#[derive(Debug, Serialize)]
struct IdentifyProperties {
    os: &'static str,
    browser: &'static str,
    device: &'static str,
}

#[derive(Debug, Serialize)]
struct ResumeData<'a> {
    token: &'a str,
    session_id: &'a str,
    seq: u64,
}

/// Incoming gateway frame.
#[derive(Debug, Deserialize)]
pub struct GatewayMessage {
    pub op: u8,
    pub d: Option<Value>,
    pub s: Option<u64>,
    pub t: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HelloPayload {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,
    pub resume_gateway_url: Option<String>,
    pub user: ReadyUser,
}

#[derive(Debug, Deserialize)]
pub struct ReadyUser {
    pub id: String,
}

/// Message as delivered by `MESSAGE_CREATE`, `MESSAGE_UPDATE` and the REST API.
///
/// Updates may omit any field but `id` and `channel_id`; a missing
/// `attachments` array means the update did not carry the attachment list.
#[derive(Debug, Deserialize)]
pub struct MessagePayload {
    pub id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub author: Option<AuthorPayload>,
    pub content: Option<String>,
    pub attachments: Option<Vec<AttachmentPayload>>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorPayload {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Deserialize)]
pub struct AttachmentPayload {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelPayload {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: u8,
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GuildCreatePayload {
    pub id: String,
    #[serde(default)]
    pub channels: Vec<ChannelPayload>,
    #[serde(default)]
    pub threads: Vec<ChannelPayload>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadListSyncPayload {
    #[serde(default)]
    pub threads: Vec<ChannelPayload>,
}
