use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Unsupported content")]
    UnsupportedContent,
    #[error("Send rejected: {0}")]
    Rejected(String),
}

/// One captured message, reduced to its content at capture time. Recipients
/// get the content re-created, never forwarded, so the sender stays hidden.
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastPayload {
    Text(String),
    Photo {
        file_id: String,
        caption: Option<String>,
    },
    Video {
        file_id: String,
        caption: Option<String>,
    },
    Document {
        file_id: String,
        caption: Option<String>,
    },
    Audio {
        file_id: String,
        caption: Option<String>,
    },
    Animation {
        file_id: String,
        caption: Option<String>,
    },
    Voice {
        file_id: String,
        caption: Option<String>,
    },
    VideoNote {
        file_id: String,
    },
    Sticker {
        file_id: String,
    },
    Location {
        latitude: f64,
        longitude: f64,
    },
    Contact {
        phone_number: String,
        first_name: String,
        last_name: Option<String>,
    },
    Venue {
        latitude: f64,
        longitude: f64,
        title: String,
        address: String,
    },
    Poll {
        question: String,
        options: Vec<String>,
        is_anonymous: bool,
        allows_multiple_answers: bool,
    },
    Dice {
        emoji: String,
    },
    Game {
        short_name: String,
    },
    Unsupported,
}

impl BroadcastPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            BroadcastPayload::Text(_) => "text",
            BroadcastPayload::Photo { .. } => "photo",
            BroadcastPayload::Video { .. } => "video",
            BroadcastPayload::Document { .. } => "document",
            BroadcastPayload::Audio { .. } => "audio",
            BroadcastPayload::Animation { .. } => "animation",
            BroadcastPayload::Voice { .. } => "voice",
            BroadcastPayload::VideoNote { .. } => "video_note",
            BroadcastPayload::Sticker { .. } => "sticker",
            BroadcastPayload::Location { .. } => "location",
            BroadcastPayload::Contact { .. } => "contact",
            BroadcastPayload::Venue { .. } => "venue",
            BroadcastPayload::Poll { .. } => "poll",
            BroadcastPayload::Dice { .. } => "dice",
            BroadcastPayload::Game { .. } => "game",
            BroadcastPayload::Unsupported => "unsupported",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            BroadcastPayload::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Outbound delivery seam; the Telegram gateway implements this, tests
/// substitute their own.
#[async_trait]
pub trait BroadcastTransport: Send + Sync {
    async fn deliver(&self, chat_id: i64, payload: &BroadcastPayload) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub success: u64,
    pub failed: u64,
}

impl BroadcastReport {
    pub fn total(&self) -> u64 {
        self.success + self.failed
    }
}

/// Replays one payload to every recipient, sequentially, in snapshot order.
/// A failed recipient is counted and skipped; the batch never stops early.
/// An unsupported payload fails every recipient without touching the
/// transport.
pub async fn fan_out(
    transport: &dyn BroadcastTransport,
    recipients: &[i64],
    payload: &BroadcastPayload,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();
    for &chat_id in recipients {
        if matches!(payload, BroadcastPayload::Unsupported) {
            warn!(chat_id, "unsupported broadcast content, counting as failed");
            report.failed += 1;
            continue;
        }
        match transport.deliver(chat_id, payload).await {
            Ok(()) => report.success += 1,
            Err(e) => {
                warn!(chat_id, error = %e, "broadcast delivery failed");
                report.failed += 1;
            }
        }
    }
    info!(
        success = report.success,
        failed = report.failed,
        total = report.total(),
        kind = payload.kind(),
        "broadcast finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every delivery and fails for the configured chat ids.
    struct ScriptedTransport {
        fail_for: Vec<i64>,
        delivered: Mutex<Vec<i64>>,
    }

    impl ScriptedTransport {
        fn new(fail_for: Vec<i64>) -> Self {
            Self {
                fail_for,
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BroadcastTransport for ScriptedTransport {
        async fn deliver(
            &self,
            chat_id: i64,
            _payload: &BroadcastPayload,
        ) -> Result<(), DeliveryError> {
            self.delivered.lock().unwrap().push(chat_id);
            if self.fail_for.contains(&chat_id) {
                return Err(DeliveryError::Rejected("blocked by user".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn counts_failures_without_stopping() {
        let transport = ScriptedTransport::new(vec![2, 4]);
        let recipients = vec![1, 2, 3, 4, 5];
        let payload = BroadcastPayload::Text("hello".to_string());

        let report = fan_out(&transport, &recipients, &payload).await;

        assert_eq!(report.success, 3);
        assert_eq!(report.failed, 2);
        assert_eq!(report.total(), 5);
        // Every recipient after the first failure was still attempted.
        assert_eq!(*transport.delivered.lock().unwrap(), recipients);
    }

    #[tokio::test]
    async fn unsupported_payload_fails_every_recipient() {
        let transport = ScriptedTransport::new(vec![]);
        let recipients = vec![1, 2, 3];

        let report = fan_out(&transport, &recipients, &BroadcastPayload::Unsupported).await;

        assert_eq!(report.success, 0);
        assert_eq!(report.failed, 3);
        assert!(transport.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_snapshot_reports_zero() {
        let transport = ScriptedTransport::new(vec![]);
        let payload = BroadcastPayload::Text("hello".to_string());

        let report = fan_out(&transport, &[], &payload).await;

        assert_eq!(report.total(), 0);
    }

    #[test]
    fn text_payload_exposes_text() {
        let payload = BroadcastPayload::Text("hi".to_string());
        assert_eq!(payload.as_text(), Some("hi"));
        assert!(BroadcastPayload::Unsupported.as_text().is_none());
        assert_eq!(payload.kind(), "text");
    }
}
