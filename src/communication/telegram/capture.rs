use crate::broadcast::BroadcastPayload;
use teloxide::types::{DiceEmoji, Message};

/// Reduces an inbound message to its content kind, decided here once and
/// matched exhaustively at send time. Anything unrecognised becomes
/// `Unsupported`.
pub fn payload_from_message(msg: &Message) -> BroadcastPayload {
    if let Some(text) = msg.text() {
        return BroadcastPayload::Text(text.to_string());
    }

    let caption = msg.caption().map(ToString::to_string);

    if let Some(photos) = msg.photo() {
        // The platform lists sizes smallest first; keep the largest.
        if let Some(photo) = photos.last() {
            return BroadcastPayload::Photo {
                file_id: photo.file.id.clone(),
                caption,
            };
        }
    }
    if let Some(video) = msg.video() {
        return BroadcastPayload::Video {
            file_id: video.file.id.clone(),
            caption,
        };
    }
    if let Some(document) = msg.document() {
        return BroadcastPayload::Document {
            file_id: document.file.id.clone(),
            caption,
        };
    }
    if let Some(audio) = msg.audio() {
        return BroadcastPayload::Audio {
            file_id: audio.file.id.clone(),
            caption,
        };
    }
    if let Some(animation) = msg.animation() {
        return BroadcastPayload::Animation {
            file_id: animation.file.id.clone(),
            caption,
        };
    }
    if let Some(voice) = msg.voice() {
        return BroadcastPayload::Voice {
            file_id: voice.file.id.clone(),
            caption,
        };
    }
    if let Some(video_note) = msg.video_note() {
        return BroadcastPayload::VideoNote {
            file_id: video_note.file.id.clone(),
        };
    }
    if let Some(sticker) = msg.sticker() {
        return BroadcastPayload::Sticker {
            file_id: sticker.file.id.clone(),
        };
    }
    if let Some(contact) = msg.contact() {
        return BroadcastPayload::Contact {
            phone_number: contact.phone_number.clone(),
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
        };
    }
    if let Some(venue) = msg.venue() {
        return BroadcastPayload::Venue {
            latitude: venue.location.latitude,
            longitude: venue.location.longitude,
            title: venue.title.clone(),
            address: venue.address.clone(),
        };
    }
    if let Some(location) = msg.location() {
        return BroadcastPayload::Location {
            latitude: location.latitude,
            longitude: location.longitude,
        };
    }
    if let Some(poll) = msg.poll() {
        return BroadcastPayload::Poll {
            question: poll.question.clone(),
            options: poll.options.iter().map(|o| o.text.clone()).collect(),
            is_anonymous: poll.is_anonymous,
            allows_multiple_answers: poll.allows_multiple_answers,
        };
    }
    if let Some(dice) = msg.dice() {
        return BroadcastPayload::Dice {
            emoji: emoji_label(dice.emoji).to_string(),
        };
    }
    if let Some(game) = msg.game() {
        // The platform never echoes the registered short name back; the
        // title is the only identifier available at capture time.
        return BroadcastPayload::Game {
            short_name: game.title.clone(),
        };
    }

    BroadcastPayload::Unsupported
}

pub(super) fn emoji_label(emoji: DiceEmoji) -> &'static str {
    match emoji {
        DiceEmoji::Dice => "🎲",
        DiceEmoji::Darts => "🎯",
        DiceEmoji::Basketball => "🏀",
        DiceEmoji::Football => "⚽",
        DiceEmoji::Bowling => "🎳",
        DiceEmoji::SlotMachine => "🎰",
    }
}

pub(super) fn emoji_from_label(label: &str) -> Option<DiceEmoji> {
    match label {
        "🎲" => Some(DiceEmoji::Dice),
        "🎯" => Some(DiceEmoji::Darts),
        "🏀" => Some(DiceEmoji::Basketball),
        "⚽" => Some(DiceEmoji::Football),
        "🎳" => Some(DiceEmoji::Bowling),
        "🎰" => Some(DiceEmoji::SlotMachine),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Builds a private-chat message from raw Bot API JSON, the same shape
    /// the platform delivers.
    fn message(extra: serde_json::Value) -> Message {
        let mut base = json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": 12345i64,
                "type": "private",
                "first_name": "Test",
            },
            "from": {
                "id": 12345u64,
                "is_bot": false,
                "first_name": "Test",
            },
        });
        base.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        serde_json::from_value(base).expect("failed to deserialize mock message")
    }

    #[test]
    fn captures_text() {
        let msg = message(json!({"text": "hello"}));
        assert_eq!(
            payload_from_message(&msg),
            BroadcastPayload::Text("hello".to_string())
        );
    }

    #[test]
    fn captures_largest_photo_with_caption() {
        let msg = message(json!({
            "photo": [
                {"file_id": "small", "file_unique_id": "s", "width": 90, "height": 90},
                {"file_id": "large", "file_unique_id": "l", "width": 800, "height": 800},
            ],
            "caption": "look",
        }));
        assert_eq!(
            payload_from_message(&msg),
            BroadcastPayload::Photo {
                file_id: "large".to_string(),
                caption: Some("look".to_string()),
            }
        );
    }

    #[test]
    fn captures_location() {
        let msg = message(json!({"location": {"latitude": 41.3, "longitude": 69.2}}));
        assert_eq!(
            payload_from_message(&msg),
            BroadcastPayload::Location {
                latitude: 41.3,
                longitude: 69.2,
            }
        );
    }

    #[test]
    fn captures_contact() {
        let msg = message(json!({
            "contact": {"phone_number": "+99890", "first_name": "Ann"}
        }));
        assert_eq!(
            payload_from_message(&msg),
            BroadcastPayload::Contact {
                phone_number: "+99890".to_string(),
                first_name: "Ann".to_string(),
                last_name: None,
            }
        );
    }

    #[test]
    fn captures_venue() {
        let msg = message(json!({
            "venue": {
                "location": {"latitude": 1.0, "longitude": 2.0},
                "title": "Cafe",
                "address": "Main St 1",
            }
        }));
        assert_eq!(
            payload_from_message(&msg),
            BroadcastPayload::Venue {
                latitude: 1.0,
                longitude: 2.0,
                title: "Cafe".to_string(),
                address: "Main St 1".to_string(),
            }
        );
    }

    #[test]
    fn captures_poll() {
        let msg = message(json!({
            "poll": {
                "id": "p1",
                "question": "Ready?",
                "options": [
                    {"text": "Yes", "voter_count": 0},
                    {"text": "No", "voter_count": 0},
                ],
                "total_voter_count": 0,
                "is_closed": false,
                "is_anonymous": true,
                "type": "regular",
                "allows_multiple_answers": false,
            }
        }));
        assert_eq!(
            payload_from_message(&msg),
            BroadcastPayload::Poll {
                question: "Ready?".to_string(),
                options: vec!["Yes".to_string(), "No".to_string()],
                is_anonymous: true,
                allows_multiple_answers: false,
            }
        );
    }

    #[test]
    fn captures_dice() {
        let msg = message(json!({"dice": {"emoji": "🎲", "value": 4}}));
        assert_eq!(
            payload_from_message(&msg),
            BroadcastPayload::Dice {
                emoji: "🎲".to_string(),
            }
        );
    }

    #[test]
    fn captures_voice() {
        let msg = message(json!({
            "voice": {"file_id": "v1", "file_unique_id": "vu", "duration": 3, "mime_type": "audio/ogg"}
        }));
        assert_eq!(
            payload_from_message(&msg),
            BroadcastPayload::Voice {
                file_id: "v1".to_string(),
                caption: None,
            }
        );
    }

    #[test]
    fn unrecognised_content_is_unsupported() {
        let msg = message(json!({"new_chat_title": "renamed"}));
        assert_eq!(payload_from_message(&msg), BroadcastPayload::Unsupported);
    }

    #[test]
    fn dice_emoji_labels_round_trip() {
        for emoji in [
            DiceEmoji::Dice,
            DiceEmoji::Darts,
            DiceEmoji::Basketball,
            DiceEmoji::Football,
            DiceEmoji::Bowling,
            DiceEmoji::SlotMachine,
        ] {
            assert_eq!(emoji_from_label(emoji_label(emoji)), Some(emoji));
        }
        assert_eq!(emoji_from_label("🃏"), None);
    }
}
