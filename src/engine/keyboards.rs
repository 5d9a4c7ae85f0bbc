use super::events::{CallbackAction, InlineButton, Keyboard};
use crate::configuration::{AppItem, Config};

pub const BTN_ADMIN_BROADCAST: &str = "📤 Broadcast to all users";
pub const BTN_ADMIN_STATS: &str = "📊 View statistics";
pub const BTN_ADMIN_CLOSE: &str = "❌ Close";
pub const BTN_CONFIRM_SEND: &str = "✅ Confirm and send";
pub const BTN_CANCEL_SEND: &str = "❌ Cancel";
pub const BTN_BACK_TO_MENU: &str = "🔙 Back to panel";

/// One URL button per configured channel, with the check button underneath.
pub fn channel_list(config: &Config) -> Keyboard {
    let mut rows: Vec<Vec<InlineButton>> = config
        .channels
        .iter()
        .map(|channel| vec![InlineButton::url(channel.name.clone(), channel.link.clone())])
        .collect();
    rows.push(vec![InlineButton::callback(
        config.button_labels.check.clone(),
        CallbackAction::CheckSubscription,
    )]);
    Keyboard::Inline(rows)
}

/// Apps two per row, help row at the bottom.
pub fn app_catalog(config: &Config) -> Keyboard {
    let mut rows: Vec<Vec<String>> = config
        .apps
        .chunks(2)
        .map(|pair| pair.iter().map(|app| app.name.clone()).collect())
        .collect();
    rows.push(vec![config.button_labels.help.clone()]);
    Keyboard::Reply(rows)
}

pub fn app_link(app: &AppItem) -> Keyboard {
    Keyboard::Inline(vec![vec![InlineButton::url(
        format!("📥 {}", app.name),
        app.link.clone(),
    )]])
}

pub fn back_only(config: &Config) -> Keyboard {
    Keyboard::Reply(vec![vec![config.button_labels.back.clone()]])
}

pub fn back_and_generate(config: &Config) -> Keyboard {
    Keyboard::Reply(vec![vec![
        config.button_labels.back.clone(),
        config.button_labels.generate.clone(),
    ]])
}

pub fn admin_menu() -> Keyboard {
    Keyboard::Inline(vec![
        vec![InlineButton::callback(
            BTN_ADMIN_BROADCAST,
            CallbackAction::AdminBroadcast,
        )],
        vec![InlineButton::callback(
            BTN_ADMIN_STATS,
            CallbackAction::AdminStats,
        )],
        vec![InlineButton::callback(
            BTN_ADMIN_CLOSE,
            CallbackAction::AdminClose,
        )],
    ])
}

pub fn broadcast_confirm() -> Keyboard {
    Keyboard::Inline(vec![
        vec![InlineButton::callback(
            BTN_CONFIRM_SEND,
            CallbackAction::ConfirmBroadcast,
        )],
        vec![InlineButton::callback(
            BTN_CANCEL_SEND,
            CallbackAction::CancelBroadcast,
        )],
    ])
}

pub fn stats_view() -> Keyboard {
    Keyboard::Inline(vec![
        vec![InlineButton::callback(
            BTN_BACK_TO_MENU,
            CallbackAction::AdminBack,
        )],
        vec![InlineButton::callback(
            BTN_ADMIN_CLOSE,
            CallbackAction::AdminClose,
        )],
    ])
}

pub fn back_to_menu() -> Keyboard {
    Keyboard::Inline(vec![vec![InlineButton::callback(
        BTN_BACK_TO_MENU,
        CallbackAction::AdminBack,
    )]])
}
