use super::capture::emoji_from_label;
use crate::broadcast::{BroadcastPayload, BroadcastTransport, DeliveryError};
use crate::configuration::ChannelConfig;
use crate::engine::{ButtonAction, InlineButton, Keyboard};
use crate::membership::{MembershipError, MembershipGate};
use async_trait::async_trait;
use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton, KeyboardMarkup,
    KeyboardRemove, ReplyMarkup,
};
use tracing::warn;
use url::Url;

/// Re-creates a captured payload for one recipient via the matching send
/// primitive. Forwarding is never used, so the sender stays anonymous.
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl BroadcastTransport for TelegramTransport {
    async fn deliver(&self, chat_id: i64, payload: &BroadcastPayload) -> Result<(), DeliveryError> {
        let chat = ChatId(chat_id);
        let result = match payload {
            BroadcastPayload::Text(text) => self.bot.send_message(chat, text.clone()).await.map(drop),
            BroadcastPayload::Photo { file_id, caption } => {
                let mut req = self.bot.send_photo(chat, InputFile::file_id(file_id.clone()));
                if let Some(caption) = caption {
                    req = req.caption(caption.clone());
                }
                req.await.map(drop)
            }
            BroadcastPayload::Video { file_id, caption } => {
                let mut req = self.bot.send_video(chat, InputFile::file_id(file_id.clone()));
                if let Some(caption) = caption {
                    req = req.caption(caption.clone());
                }
                req.await.map(drop)
            }
            BroadcastPayload::Document { file_id, caption } => {
                let mut req = self.bot.send_document(chat, InputFile::file_id(file_id.clone()));
                if let Some(caption) = caption {
                    req = req.caption(caption.clone());
                }
                req.await.map(drop)
            }
            BroadcastPayload::Audio { file_id, caption } => {
                let mut req = self.bot.send_audio(chat, InputFile::file_id(file_id.clone()));
                if let Some(caption) = caption {
                    req = req.caption(caption.clone());
                }
                req.await.map(drop)
            }
            BroadcastPayload::Animation { file_id, caption } => {
                let mut req = self.bot.send_animation(chat, InputFile::file_id(file_id.clone()));
                if let Some(caption) = caption {
                    req = req.caption(caption.clone());
                }
                req.await.map(drop)
            }
            BroadcastPayload::Voice { file_id, caption } => {
                let mut req = self.bot.send_voice(chat, InputFile::file_id(file_id.clone()));
                if let Some(caption) = caption {
                    req = req.caption(caption.clone());
                }
                req.await.map(drop)
            }
            BroadcastPayload::VideoNote { file_id } => self
                .bot
                .send_video_note(chat, InputFile::file_id(file_id.clone()))
                .await
                .map(drop),
            BroadcastPayload::Sticker { file_id } => self
                .bot
                .send_sticker(chat, InputFile::file_id(file_id.clone()))
                .await
                .map(drop),
            BroadcastPayload::Location {
                latitude,
                longitude,
            } => self
                .bot
                .send_location(chat, *latitude, *longitude)
                .await
                .map(drop),
            BroadcastPayload::Contact {
                phone_number,
                first_name,
                last_name,
            } => {
                let mut req = self
                    .bot
                    .send_contact(chat, phone_number.clone(), first_name.clone());
                if let Some(last_name) = last_name {
                    req = req.last_name(last_name.clone());
                }
                req.await.map(drop)
            }
            BroadcastPayload::Venue {
                latitude,
                longitude,
                title,
                address,
            } => self
                .bot
                .send_venue(chat, *latitude, *longitude, title.clone(), address.clone())
                .await
                .map(drop),
            BroadcastPayload::Poll {
                question,
                options,
                is_anonymous,
                allows_multiple_answers,
            } => self
                .bot
                .send_poll(chat, question.clone(), options.clone())
                .is_anonymous(*is_anonymous)
                .allows_multiple_answers(*allows_multiple_answers)
                .await
                .map(drop),
            BroadcastPayload::Dice { emoji } => {
                let mut req = self.bot.send_dice(chat);
                if let Some(emoji) = emoji_from_label(emoji) {
                    req = req.emoji(emoji);
                }
                req.await.map(drop)
            }
            BroadcastPayload::Game { short_name } => self
                .bot
                .send_game(chat_id as u32, short_name.clone())
                .await
                .map(drop),
            BroadcastPayload::Unsupported => return Err(DeliveryError::UnsupportedContent),
        };
        result.map_err(|e| DeliveryError::Rejected(e.to_string()))
    }
}

/// Membership checks against the configured channel set. `left` and
/// `kicked` count as outside; any other status counts as a member.
pub struct TelegramMembershipGate {
    bot: Bot,
    channels: Vec<ChannelConfig>,
}

impl TelegramMembershipGate {
    pub fn new(bot: Bot, channels: Vec<ChannelConfig>) -> Self {
        Self { bot, channels }
    }
}

#[async_trait]
impl MembershipGate for TelegramMembershipGate {
    async fn is_member_of_all(&self, user_id: i64) -> Result<bool, MembershipError> {
        for channel in &self.channels {
            let member = self
                .bot
                .get_chat_member(ChatId(channel.chat_id), UserId(user_id as u64))
                .await
                .map_err(|e| MembershipError::QueryFailed(format!("{}: {e}", channel.name)))?;
            if member.kind.is_left() || member.kind.is_banned() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

pub(super) fn render_keyboard(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Inline(rows) => ReplyMarkup::InlineKeyboard(render_inline(rows)),
        Keyboard::Reply(rows) => {
            let rows = rows
                .iter()
                .map(|row| row.iter().map(|label| KeyboardButton::new(label.clone())).collect::<Vec<_>>());
            ReplyMarkup::Keyboard(KeyboardMarkup::new(rows).resize_keyboard(true))
        }
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

pub(super) fn render_inline(rows: &[Vec<InlineButton>]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = rows
        .iter()
        .map(|row| row.iter().filter_map(render_button).collect())
        .collect();
    InlineKeyboardMarkup::new(rows)
}

fn render_button(button: &InlineButton) -> Option<InlineKeyboardButton> {
    match &button.action {
        ButtonAction::OpenUrl(link) => match Url::parse(link) {
            Ok(url) => Some(InlineKeyboardButton::url(button.label.clone(), url)),
            Err(e) => {
                warn!(link, error = %e, "skipping button with an invalid url");
                None
            }
        },
        ButtonAction::Invoke(action) => Some(InlineKeyboardButton::callback(
            button.label.clone(),
            action.token(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CallbackAction;

    #[test]
    fn inline_rendering_skips_invalid_urls() {
        let rows = vec![vec![
            InlineButton::url("Good", "https://example.com"),
            InlineButton::url("Bad", "not a url"),
            InlineButton::callback("Check", CallbackAction::CheckSubscription),
        ]];

        let markup = render_inline(&rows);
        assert_eq!(markup.inline_keyboard.len(), 1);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
    }

    #[test]
    fn reply_keyboard_keeps_row_shape() {
        let keyboard = Keyboard::Reply(vec![
            vec!["AppX".to_string(), "AppY".to_string()],
            vec!["Help".to_string()],
        ]);

        let ReplyMarkup::Keyboard(markup) = render_keyboard(&keyboard) else {
            panic!("expected a reply keyboard");
        };
        assert_eq!(markup.keyboard.len(), 2);
        assert_eq!(markup.keyboard[0].len(), 2);
    }
}
