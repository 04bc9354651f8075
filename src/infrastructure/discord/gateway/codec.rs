use flate2::{Decompress, FlushDecompress, Status};
use tracing::debug;

use super::constants::ZLIB_SUFFIX;
use super::error::{GatewayError, GatewayResult};
use super::events::DispatchEvent;
use super::payloads::{
    ChannelPayload, GatewayMessage, GuildCreatePayload, HelloPayload, MessagePayload,
    ReadyPayload, ThreadListSyncPayload,
};

use crate::domain::entities::{
    Attachment, ChannelId, ChannelLink, Message, MessageAuthor, MessageId,
};

const OUTPUT_CHUNK: usize = 32 * 1024;
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Inflates a `zlib-stream` gateway connection.
///
/// One zlib context spans the whole connection; a frame is complete once
/// the buffered input ends with the sync-flush marker.
pub struct GatewayCodec {
    inflater: Decompress,
    pending: Vec<u8>,
}

impl GatewayCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inflater: Decompress::new(true),
            pending: Vec::with_capacity(4096),
        }
    }

    /// Buffers `data` and returns the decoded text once a frame is complete.
    pub fn decode_binary(&mut self, data: &[u8]) -> GatewayResult<Option<String>> {
        self.pending.extend_from_slice(data);

        if !self.pending.ends_with(&ZLIB_SUFFIX) {
            return Ok(None);
        }

        let result = self.inflate();
        self.pending.clear();
        result.map(Some)
    }

    fn inflate(&mut self) -> GatewayResult<String> {
        let mut output = Vec::with_capacity(OUTPUT_CHUNK);
        let start = self.inflater.total_in();

        loop {
            let consumed = usize::try_from(self.inflater.total_in() - start)
                .map_err(|e| GatewayError::compression(e.to_string()))?;
            let input = self.pending.get(consumed..).unwrap_or_default();

            if output.len() == output.capacity() {
                if output.len() >= MAX_FRAME_SIZE {
                    return Err(GatewayError::compression(
                        "decompressed frame exceeds maximum size",
                    ));
                }
                output.reserve(OUTPUT_CHUNK);
            }

            let produced_before = output.len();
            let status = self
                .inflater
                .decompress_vec(input, &mut output, FlushDecompress::Sync)
                .map_err(|e| GatewayError::compression(e.to_string()))?;

            let drained = self.inflater.total_in() - start >= self.pending.len() as u64;
            let has_room = output.len() < output.capacity();
            let stalled = output.len() == produced_before && has_room;

            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError if (drained && has_room) || stalled => break,
                Status::Ok | Status::BufError => {}
            }
        }

        String::from_utf8(output)
            .map_err(|e| GatewayError::compression(format!("invalid UTF-8: {e}")))
    }

    /// Drops buffered input and starts a fresh zlib context.
    pub fn reset(&mut self) {
        self.inflater.reset(true);
        self.pending.clear();
    }
}

impl Default for GatewayCodec {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventParser;

impl EventParser {
    pub fn parse_message(json: &str) -> GatewayResult<GatewayMessage> {
        serde_json::from_str(json).map_err(|e| GatewayError::serialization(e.to_string()))
    }

    pub fn parse_hello(data: &serde_json::Value) -> GatewayResult<HelloPayload> {
        serde_json::from_value(data.clone())
            .map_err(|e| GatewayError::serialization(format!("Failed to parse Hello: {e}")))
    }

    pub fn parse_dispatch(
        event_type: &str,
        data: Option<serde_json::Value>,
    ) -> GatewayResult<DispatchEvent> {
        if event_type == "RESUMED" {
            return Ok(DispatchEvent::Resumed);
        }

        let data = data.ok_or_else(|| GatewayError::protocol("Missing dispatch data"))?;

        match event_type {
            "READY" => Self::parse_ready(data),
            "MESSAGE_CREATE" => {
                Self::parse_message_payload(data, "MessageCreate").map(|message| {
                    DispatchEvent::MessageCreate { message }
                })
            }
            "MESSAGE_UPDATE" => {
                Self::parse_message_payload(data, "MessageUpdate").map(|message| {
                    DispatchEvent::MessageUpdate { message }
                })
            }
            "GUILD_CREATE" => Self::parse_guild_create(data),
            "CHANNEL_CREATE" | "CHANNEL_UPDATE" | "THREAD_CREATE" | "THREAD_UPDATE" => {
                Self::parse_channel(data)
            }
            "THREAD_LIST_SYNC" => Self::parse_thread_list_sync(data),
            _ => Ok(DispatchEvent::Unknown {
                event_type: event_type.to_string(),
            }),
        }
    }

    fn parse_ready(data: serde_json::Value) -> GatewayResult<DispatchEvent> {
        let ready: ReadyPayload = serde_json::from_value(data)
            .map_err(|e| GatewayError::serialization(format!("Failed to parse Ready: {e}")))?;

        Ok(DispatchEvent::Ready {
            session_id: ready.session_id,
            resume_gateway_url: ready.resume_gateway_url,
            user_id: ready.user.id,
        })
    }

    fn parse_message_payload(data: serde_json::Value, name: &str) -> GatewayResult<Message> {
        let payload: MessagePayload = serde_json::from_value(data)
            .map_err(|e| GatewayError::serialization(format!("Failed to parse {name}: {e}")))?;
        Self::convert_message_payload(payload)
    }

    fn parse_guild_create(data: serde_json::Value) -> GatewayResult<DispatchEvent> {
        let guild: GuildCreatePayload = serde_json::from_value(data).map_err(|e| {
            GatewayError::serialization(format!("Failed to parse GuildCreate: {e}"))
        })?;

        debug!(
            guild_id = %guild.id,
            channels = guild.channels.len(),
            threads = guild.threads.len(),
            "Guild available"
        );

        let links = guild
            .channels
            .into_iter()
            .chain(guild.threads)
            .filter_map(Self::convert_channel)
            .collect();

        Ok(DispatchEvent::ChannelsDiscovered { links })
    }

    fn parse_channel(data: serde_json::Value) -> GatewayResult<DispatchEvent> {
        let channel: ChannelPayload = serde_json::from_value(data)
            .map_err(|e| GatewayError::serialization(format!("Failed to parse Channel: {e}")))?;

        Ok(DispatchEvent::ChannelsDiscovered {
            links: Self::convert_channel(channel).into_iter().collect(),
        })
    }

    fn parse_thread_list_sync(data: serde_json::Value) -> GatewayResult<DispatchEvent> {
        let sync: ThreadListSyncPayload = serde_json::from_value(data).map_err(|e| {
            GatewayError::serialization(format!("Failed to parse ThreadListSync: {e}"))
        })?;

        Ok(DispatchEvent::ChannelsDiscovered {
            links: sync
                .threads
                .into_iter()
                .filter_map(Self::convert_channel)
                .collect(),
        })
    }

    /// Maps a channel object to a link; unparsable ids are skipped.
    #[must_use]
    pub fn convert_channel(payload: ChannelPayload) -> Option<ChannelLink> {
        let channel_id = payload.id.parse::<u64>().ok()?;
        let parent_id = payload
            .parent_id
            .and_then(|id| id.parse::<u64>().ok())
            .map(ChannelId);

        Some(ChannelLink::from_raw(
            ChannelId(channel_id),
            payload.kind,
            parent_id,
        ))
    }

    /// Builds a domain message. A payload without `attachments` yields a partial message.
    pub fn convert_message_payload(payload: MessagePayload) -> GatewayResult<Message> {
        let message_id = payload
            .id
            .parse::<u64>()
            .map_err(|_| GatewayError::protocol("Invalid message ID"))?;

        let channel_id = payload
            .channel_id
            .parse::<u64>()
            .map_err(|_| GatewayError::protocol("Invalid channel ID"))?;

        let mut message = Message::new(MessageId(message_id), ChannelId(channel_id))
            .with_partial(payload.attachments.is_none());

        if let Some(author) = payload.author {
            message =
                message.with_author(MessageAuthor::new(author.id, author.username, author.bot));
        }

        if let Some(content) = payload.content {
            message = message.with_content(content);
        }

        if let Some(attachments) = payload.attachments {
            let attachments = attachments
                .into_iter()
                .map(|a| {
                    let attachment = Attachment::new(a.id, a.filename, a.size, a.url);
                    match a.content_type {
                        Some(content_type) => attachment.with_content_type(content_type),
                        None => attachment,
                    }
                })
                .collect();
            message = message.with_attachments(attachments);
        }

        Ok(message)
    }
}
