use crate::broadcast::BroadcastPayload;

/// One inbound platform event, already reduced to what the engine needs.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub user_id: i64,
    pub chat_id: i64,
    pub full_name: Option<String>,
    pub event: Event,
}

#[derive(Debug, Clone)]
pub enum Event {
    Command(Command),
    Action(CallbackAction),
    Message(BroadcastPayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Cancel,
}

/// Routing tokens carried by inline buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    CheckSubscription,
    AdminBroadcast,
    AdminStats,
    AdminClose,
    ConfirmBroadcast,
    CancelBroadcast,
    AdminBack,
}

impl CallbackAction {
    pub fn token(&self) -> &'static str {
        match self {
            CallbackAction::CheckSubscription => "check_subscription",
            CallbackAction::AdminBroadcast => "admin_send_message",
            CallbackAction::AdminStats => "admin_view_stats",
            CallbackAction::AdminClose => "admin_close",
            CallbackAction::ConfirmBroadcast => "confirm_send_message",
            CallbackAction::CancelBroadcast => "admin_cancel_send",
            CallbackAction::AdminBack => "admin_back_to_panel",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "check_subscription" => Some(CallbackAction::CheckSubscription),
            "admin_send_message" => Some(CallbackAction::AdminBroadcast),
            "admin_view_stats" => Some(CallbackAction::AdminStats),
            "admin_close" => Some(CallbackAction::AdminClose),
            "confirm_send_message" => Some(CallbackAction::ConfirmBroadcast),
            "admin_cancel_send" => Some(CallbackAction::CancelBroadcast),
            "admin_back_to_panel" => Some(CallbackAction::AdminBack),
            _ => None,
        }
    }

    pub fn is_admin_action(&self) -> bool {
        !matches!(self, CallbackAction::CheckSubscription)
    }
}

/// What a handler wants sent back; the gateway renders these.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Message {
        text: String,
        keyboard: Option<Keyboard>,
    },
    /// Rewrites the message the triggering button was attached to.
    Edit {
        text: String,
        keyboard: Option<Keyboard>,
    },
    Alert {
        text: String,
        show_alert: bool,
    },
}

impl Reply {
    pub fn message(text: impl Into<String>) -> Self {
        Reply::Message {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn message_with(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Reply::Message {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }

    pub fn edit(text: impl Into<String>) -> Self {
        Reply::Edit {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn edit_with(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Reply::Edit {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }

    pub fn alert(text: impl Into<String>, show_alert: bool) -> Self {
        Reply::Alert {
            text: text.into(),
            show_alert,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Keyboard {
    Inline(Vec<Vec<InlineButton>>),
    Reply(Vec<Vec<String>>),
    Remove,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineButton {
    pub label: String,
    pub action: ButtonAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ButtonAction {
    OpenUrl(String),
    Invoke(CallbackAction),
}

impl InlineButton {
    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::OpenUrl(url.into()),
        }
    }

    pub fn callback(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Invoke(action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_tokens_round_trip() {
        let actions = [
            CallbackAction::CheckSubscription,
            CallbackAction::AdminBroadcast,
            CallbackAction::AdminStats,
            CallbackAction::AdminClose,
            CallbackAction::ConfirmBroadcast,
            CallbackAction::CancelBroadcast,
            CallbackAction::AdminBack,
        ];
        for action in actions {
            assert_eq!(CallbackAction::parse(action.token()), Some(action));
        }
        assert_eq!(CallbackAction::parse("unknown_token"), None);
    }

    #[test]
    fn only_subscription_check_is_open_to_users() {
        assert!(!CallbackAction::CheckSubscription.is_admin_action());
        assert!(CallbackAction::AdminBroadcast.is_admin_action());
        assert!(CallbackAction::ConfirmBroadcast.is_admin_action());
    }
}
