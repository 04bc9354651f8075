//! Per-message attachment pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::application::dto::ProcessedResult;
use crate::application::services::MessagePipeline;
use crate::domain::entities::{Attachment, Message};
use crate::domain::errors::ProcessingError;
use crate::domain::ports::{AttachmentFetchPort, ImageCodecPort, MessagingPort};
use crate::domain::services::TransformDecider;

/// Fetches, decides, transforms and replies for every image on a message.
///
/// Attachments are handled one after another; a failure on one is reported
/// and never stops the rest.
#[derive(Clone)]
pub struct ProcessMessageUseCase {
    fetcher: Arc<dyn AttachmentFetchPort>,
    codec: Arc<dyn ImageCodecPort>,
    messaging: Arc<dyn MessagingPort>,
    decider: Arc<TransformDecider>,
}

impl ProcessMessageUseCase {
    /// Creates new process message use case.
    #[must_use]
    pub const fn new(
        fetcher: Arc<dyn AttachmentFetchPort>,
        codec: Arc<dyn ImageCodecPort>,
        messaging: Arc<dyn MessagingPort>,
        decider: Arc<TransformDecider>,
    ) -> Self {
        Self {
            fetcher,
            codec,
            messaging,
            decider,
        }
    }

    /// Runs the pipeline over all image attachments of `message`.
    ///
    /// Returns how many processed images were posted back.
    pub async fn execute(&self, message: &Message) -> usize {
        let mut posted = 0;

        for attachment in message.attachments() {
            if !attachment.is_image() {
                debug!(
                    message_id = %message.id(),
                    filename = attachment.filename(),
                    content_type = ?attachment.content_type(),
                    "Skipping non-image attachment"
                );
                continue;
            }

            match self.process_attachment(attachment).await {
                Ok(Some(result)) => {
                    if self.publish(message, attachment, result).await {
                        posted += 1;
                    }
                }
                Ok(None) => {
                    debug!(
                        message_id = %message.id(),
                        filename = attachment.filename(),
                        "No transform needed"
                    );
                }
                Err(e) => self.report_failure(message, attachment, &e).await,
            }
        }

        posted
    }

    async fn process_attachment(
        &self,
        attachment: &Attachment,
    ) -> Result<Option<ProcessedResult>, ProcessingError> {
        let bytes = self.fetcher.fetch_bytes(attachment.url()).await?;

        let codec = Arc::clone(&self.codec);
        let decider = Arc::clone(&self.decider);
        let file_name = attachment.filename().to_string();

        tokio::task::spawn_blocking(move || -> Result<Option<ProcessedResult>, ProcessingError> {
            let image = codec.decode(&bytes)?;
            let decision = decider.plan(&image, &file_name);
            debug!(
                filename = %file_name,
                width = image.width(),
                height = image.height(),
                action = ?decision.action,
                "Transform decided"
            );

            if decision.action.is_skip() {
                return Ok(None);
            }

            let encoded = codec.execute(&image, &decision)?;
            Ok(Some(ProcessedResult::new(encoded, &decision)))
        })
        .await
        .map_err(|e| ProcessingError::worker(e.to_string()))?
    }

    async fn publish(
        &self,
        message: &Message,
        attachment: &Attachment,
        result: ProcessedResult,
    ) -> bool {
        let content = result.label(attachment.filename());
        let file_name = result.file_name.clone();

        match self
            .messaging
            .reply(message, &content, vec![result.into_file()])
            .await
        {
            Ok(()) => {
                info!(
                    message_id = %message.id(),
                    file = %file_name,
                    "Posted processed image"
                );
                true
            }
            Err(e) => {
                error!(message_id = %message.id(), error = %e, "Failed to post processed image");
                false
            }
        }
    }

    async fn report_failure(
        &self,
        message: &Message,
        attachment: &Attachment,
        failure: &ProcessingError,
    ) {
        let summary = format!(
            "⚠️ Could not process {}: {failure}",
            attachment.filename()
        );

        let sent = if failure.should_report_visibly() {
            error!(
                message_id = %message.id(),
                filename = attachment.filename(),
                error = %failure,
                "Calibrated region does not match image"
            );
            self.messaging.reply(message, &summary, Vec::new()).await
        } else {
            warn!(
                message_id = %message.id(),
                filename = attachment.filename(),
                kind = failure.kind(),
                error = %failure,
                "Attachment skipped"
            );
            self.messaging
                .send_channel_message(message.channel_id(), &summary)
                .await
        };

        if let Err(e) = sent {
            error!(message_id = %message.id(), error = %e, "Failed to report processing error");
        }
    }
}

#[async_trait]
impl MessagePipeline for ProcessMessageUseCase {
    async fn run(&self, message: Message) {
        let posted = self.execute(&message).await;
        debug!(message_id = %message.id(), posted, "Pipeline finished");
    }
}
