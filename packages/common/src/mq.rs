use std::fmt::Debug;

use thiserror::Error;
use tracing::debug;

use crate::file::FileId;

/// Channels known to the notification bus.
///
/// The channel names are part of the wire contract shared with other
/// publishers and subscribers, so they are fixed literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationTopic {
    /// A new file has been stored and is waiting to be processed.
    FileUploaded,
}

impl NotificationTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileUploaded => "file-uploaded",
        }
    }
}

impl std::fmt::Display for NotificationTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core trait for all bus messages.
///
/// Messages travel as bare strings on their topic; there is no envelope.
pub trait Message: Debug + Send + Sync + Clone + Sized {
    fn topic() -> NotificationTopic;

    /// Wire payload for this message.
    fn encode(&self) -> String;

    /// Parse a wire payload received on [`Message::topic`].
    fn decode(payload: &str) -> Result<Self, MessageError>;
}

/// Notification that a file is ready to be processed.
///
/// The payload is the file id as a plain string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileUploaded {
    pub file_id: FileId,
}

impl FileUploaded {
    pub fn new(file_id: FileId) -> Self {
        Self { file_id }
    }
}

impl Message for FileUploaded {
    fn topic() -> NotificationTopic {
        NotificationTopic::FileUploaded
    }

    fn encode(&self) -> String {
        self.file_id.to_string()
    }

    fn decode(payload: &str) -> Result<Self, MessageError> {
        debug!(topic = %Self::topic(), payload, "Decoding message");
        payload
            .parse::<FileId>()
            .map(Self::new)
            .map_err(|e| MessageError::InvalidPayload {
                topic: Self::topic().as_str(),
                payload: payload.to_string(),
                reason: e.to_string(),
            })
    }
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Invalid payload {payload:?} on {topic}: {reason}")]
    InvalidPayload {
        topic: &'static str,
        payload: String,
        reason: String,
    },
}
